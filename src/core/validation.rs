//! Accountant reconciliation rules.
//!
//! Each rule recomputes one aggregate of `InvoiceTotals` from finer-grained
//! data and compares it to the declared value with exact decimal equality.
//! A mismatch is returned as [`FacturaeError::Accountant`]; any other error
//! (missing field, malformed number, wrong tax parent) is passed through
//! unchanged.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::warn;

use super::decimal::{checked_add, checked_sub, decimal, missing_field, optional_decimal};
use super::element::Element;
use super::error::{AccountantValidation, FacturaeError};
use super::taxes::{sum_tax_amount, sum_to_max_scale};

/// The accountant reconciliation rules, in the order the validator runs them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rule {
    /// Σ line `GrossAmount` = `TotalGrossAmount`.
    GrossAmount,
    /// Σ `TaxesOutputs` amounts = `TotalTaxOutputs`.
    TaxOutputs,
    /// Σ `TaxesWithheld` amounts = `TotalTaxesWithheld`.
    TaxesWithheld,
    /// `TotalGrossAmountBeforeTaxes + TotalTaxOutputs − TotalTaxesWithheld` = `InvoiceTotal`.
    InvoiceTotal,
    /// `InvoiceTotal − Σ subsidies + TotalPaymentsOnAccount` = `TotalOutstandingAmount`.
    OutstandingAmount,
    /// Outstanding amount adjusted by withholdings, payment in kind and
    /// expenses = `TotalExecutableAmount`.
    ExecutableAmount,
    /// `TaxCurrencyCode` = EUR.
    TaxCurrency,
}

impl Rule {
    /// All rules in validation order.
    pub const ALL: [Rule; 7] = [
        Rule::GrossAmount,
        Rule::TaxOutputs,
        Rule::TaxesWithheld,
        Rule::InvoiceTotal,
        Rule::OutstandingAmount,
        Rule::ExecutableAmount,
        Rule::TaxCurrency,
    ];

    /// Snake-case name, used as the check name in the validator.
    pub fn name(&self) -> &'static str {
        match self {
            Self::GrossAmount => "gross_amount",
            Self::TaxOutputs => "tax_outputs",
            Self::TaxesWithheld => "taxes_withheld",
            Self::InvoiceTotal => "invoice_total",
            Self::OutstandingAmount => "outstanding_amount",
            Self::ExecutableAmount => "executable_amount",
            Self::TaxCurrency => "tax_currency",
        }
    }

    /// The function implementing this rule.
    pub fn check_fn(&self) -> fn(&Element) -> Result<(), FacturaeError> {
        match self {
            Self::GrossAmount => validate_invoice_gross_amount,
            Self::TaxOutputs => validate_invoice_tax_output,
            Self::TaxesWithheld => validate_invoice_tax_withheld,
            Self::InvoiceTotal => validate_invoice_total,
            Self::OutstandingAmount => validate_total_outstanding_amount,
            Self::ExecutableAmount => validate_total_executable_amount,
            Self::TaxCurrency => validate_tax_currency_code,
        }
    }

    /// Run this rule against one `Invoice` element.
    pub fn check(&self, invoice: &Element) -> Result<(), FacturaeError> {
        (self.check_fn())(invoice)
    }
}

/// Fields of `InvoiceTotals` taking part in the reconciliation, with the
/// English element name and the Spanish label used in accountant messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TotalsField {
    TotalGrossAmount,
    TotalGrossAmountBeforeTaxes,
    TotalTaxOutputs,
    TotalTaxesWithheld,
    InvoiceTotal,
    Subsidies,
    TotalPaymentsOnAccount,
    TotalOutstandingAmount,
    AmountsWithheld,
    PaymentInKind,
    TotalReimbursableExpenses,
    TotalFinancialExpenses,
    TotalExecutableAmount,
}

impl TotalsField {
    /// English name as it appears in messages.
    pub fn element(&self) -> &'static str {
        match self {
            Self::TotalGrossAmount => "TotalGrossAmount",
            Self::TotalGrossAmountBeforeTaxes => "TotalGrossAmountBeforeTaxes",
            Self::TotalTaxOutputs => "TotalTaxOutputs",
            Self::TotalTaxesWithheld => "TotalTaxesWithheld",
            Self::InvoiceTotal => "InvoiceTotal",
            Self::Subsidies => "Sum Subsidy",
            Self::TotalPaymentsOnAccount => "TotalPaymentsOnAccount",
            Self::TotalOutstandingAmount => "TotalOutstandingAmount",
            Self::AmountsWithheld => "AmountsWithheld",
            Self::PaymentInKind => "PaymentInKindAmount",
            Self::TotalReimbursableExpenses => "TotalReimbursableExpenses",
            Self::TotalFinancialExpenses => "TotalFinancialExpenses",
            Self::TotalExecutableAmount => "TotalExecutableAmount",
        }
    }

    /// Spanish label from the Facturae format description.
    pub fn label_es(&self) -> &'static str {
        match self {
            Self::TotalGrossAmount => "TotalImporteBruto",
            Self::TotalGrossAmountBeforeTaxes => "TotalImporteBrutoAntesImpuestos",
            Self::TotalTaxOutputs => "TotalImpuestosRepercutidos",
            Self::TotalTaxesWithheld => "TotalImpuestosRetenidos",
            Self::InvoiceTotal => "TotalFactura",
            Self::Subsidies => "Sumatorio de ImporteSubvencion",
            Self::TotalPaymentsOnAccount => "TotalAnticipos",
            Self::TotalOutstandingAmount => "TotalAPagar",
            Self::AmountsWithheld => "Total de Cantidades retenidas",
            Self::PaymentInKind => "ImportePagoEnEspecie",
            Self::TotalReimbursableExpenses => "TotalSuplidos",
            Self::TotalFinancialExpenses => "TotalGastosFinancieros",
            Self::TotalExecutableAmount => "TotalAEjecutar",
        }
    }

    /// Path of the amount below `InvoiceTotals`. `Subsidies` is the
    /// container of the repeated `Subsidy/SubsidyAmount`.
    pub fn path(&self) -> &'static str {
        match self {
            Self::TotalGrossAmount => "TotalGrossAmount",
            Self::TotalGrossAmountBeforeTaxes => "TotalGrossAmountBeforeTaxes",
            Self::TotalTaxOutputs => "TotalTaxOutputs",
            Self::TotalTaxesWithheld => "TotalTaxesWithheld",
            Self::InvoiceTotal => "InvoiceTotal",
            Self::Subsidies => "Subsidies",
            Self::TotalPaymentsOnAccount => "TotalPaymentsOnAccount",
            Self::TotalOutstandingAmount => "TotalOutstandingAmount",
            Self::AmountsWithheld => "AmountsWithheld/WithholdingAmount",
            Self::PaymentInKind => "PaymentInKind/PaymentInKindAmount",
            Self::TotalReimbursableExpenses => "TotalReimbursableExpenses",
            Self::TotalFinancialExpenses => "TotalFinancialExpenses",
            Self::TotalExecutableAmount => "TotalExecutableAmount",
        }
    }

    /// `"InvoiceTotal" (TotalFactura)`
    pub fn bilingual(&self) -> String {
        format!("\"{}\" ({})", self.element(), self.label_es())
    }
}

/// Sign of a term in a chained total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Plus,
    Minus,
}

/// `InvoiceHeader/InvoiceNumber`, if present.
pub fn invoice_number(invoice: &Element) -> Option<&str> {
    invoice.text_at("InvoiceHeader/InvoiceNumber").map(str::trim)
}

/// Σ `Items/InvoiceLine/GrossAmount` must equal `InvoiceTotals/TotalGrossAmount`.
pub fn validate_invoice_gross_amount(invoice: &Element) -> Result<(), FacturaeError> {
    let declared = total(invoice, TotalsField::TotalGrossAmount)?;

    let items = invoice
        .find("Items")
        .ok_or_else(|| missing_field(invoice, "Items"))?;
    let mut computed = Decimal::ZERO;
    for line in items.find_all("InvoiceLine") {
        computed = checked_add(computed, decimal(line, "GrossAmount")?)?;
    }

    if declared != computed {
        return Err(mismatch(
            Rule::GrossAmount,
            invoice,
            format!(
                "{}. {} no es igual a la suma de \"GrossAmount\" (ImporteBruto) de las líneas, debería ser: {computed}",
                invoice_heading(invoice),
                TotalsField::TotalGrossAmount.bilingual(),
            ),
        ));
    }
    Ok(())
}

/// Aggregated `TaxesOutputs` must equal `InvoiceTotals/TotalTaxOutputs`.
///
/// `TaxesOutputs` is mandatory for this rule.
pub fn validate_invoice_tax_output(invoice: &Element) -> Result<(), FacturaeError> {
    let declared = total(invoice, TotalsField::TotalTaxOutputs)?;
    let taxes = invoice
        .find("TaxesOutputs")
        .ok_or_else(|| missing_field(invoice, "TaxesOutputs"))?;
    let computed = sum_tax_amount(taxes)?;

    if declared != computed {
        return Err(mismatch(
            Rule::TaxOutputs,
            invoice,
            format!(
                "{}. {} no es igual a la suma de \"TaxAmount\" (ImporteImpuesto) de \"TaxesOutputs\" (ImpuestosRepercutidos), debería ser: {computed}",
                invoice_heading(invoice),
                TotalsField::TotalTaxOutputs.bilingual(),
            ),
        ));
    }
    Ok(())
}

/// Aggregated `TaxesWithheld` must equal `InvoiceTotals/TotalTaxesWithheld`.
///
/// An invoice without `TaxesWithheld` withholds exactly zero.
pub fn validate_invoice_tax_withheld(invoice: &Element) -> Result<(), FacturaeError> {
    let declared = total(invoice, TotalsField::TotalTaxesWithheld)?;
    let computed = match invoice.find("TaxesWithheld") {
        Some(taxes) => sum_tax_amount(taxes)?,
        None => Decimal::ZERO,
    };

    if declared != computed {
        return Err(mismatch(
            Rule::TaxesWithheld,
            invoice,
            format!(
                "{}. {} no es igual a la suma de \"TaxAmount\" (ImporteImpuesto) de \"TaxesWithheld\" (ImpuestosRetenidos), debería ser: {computed}",
                invoice_heading(invoice),
                TotalsField::TotalTaxesWithheld.bilingual(),
            ),
        ));
    }
    Ok(())
}

/// `InvoiceTotal = TotalGrossAmountBeforeTaxes + TotalTaxOutputs − TotalTaxesWithheld`.
pub fn validate_invoice_total(invoice: &Element) -> Result<(), FacturaeError> {
    let declared = total(invoice, TotalsField::InvoiceTotal)?;
    let tax_outputs = total(invoice, TotalsField::TotalTaxOutputs)?;
    let taxes_withheld = total(invoice, TotalsField::TotalTaxesWithheld)?;
    let before_taxes = total(invoice, TotalsField::TotalGrossAmountBeforeTaxes)?;

    let computed = checked_sub(checked_add(before_taxes, tax_outputs)?, taxes_withheld)?;

    if declared != computed {
        return Err(chain_mismatch(
            Rule::InvoiceTotal,
            invoice,
            TotalsField::InvoiceTotal,
            &[
                (Op::Plus, TotalsField::TotalGrossAmountBeforeTaxes),
                (Op::Plus, TotalsField::TotalTaxOutputs),
                (Op::Minus, TotalsField::TotalTaxesWithheld),
            ],
            computed,
        ));
    }
    Ok(())
}

/// `TotalOutstandingAmount = InvoiceTotal − Σ Subsidy/SubsidyAmount + TotalPaymentsOnAccount`.
///
/// Absent subsidies and payments on account count as zero.
pub fn validate_total_outstanding_amount(invoice: &Element) -> Result<(), FacturaeError> {
    let declared = total(invoice, TotalsField::TotalOutstandingAmount)?;

    let subsidies = match invoice.find_path("InvoiceTotals/Subsidies") {
        Some(subsidies) => sum_to_max_scale(
            subsidies
                .find_all("Subsidy")
                .map(|s| decimal(s, "SubsidyAmount"))
                .collect::<Result<Vec<_>, _>>()?,
        )?,
        None => Decimal::ZERO,
    };
    let payments_on_account = optional_total(invoice, TotalsField::TotalPaymentsOnAccount)?;
    let invoice_total = total(invoice, TotalsField::InvoiceTotal)?;

    let computed = checked_add(checked_sub(invoice_total, subsidies)?, payments_on_account)?;

    if declared != computed {
        return Err(chain_mismatch(
            Rule::OutstandingAmount,
            invoice,
            TotalsField::TotalOutstandingAmount,
            &[
                (Op::Plus, TotalsField::InvoiceTotal),
                (Op::Minus, TotalsField::Subsidies),
                (Op::Plus, TotalsField::TotalPaymentsOnAccount),
            ],
            computed,
        ));
    }
    Ok(())
}

/// `TotalExecutableAmount = TotalOutstandingAmount − WithholdingAmount −
/// PaymentInKindAmount + TotalReimbursableExpenses + TotalFinancialExpenses`.
///
/// Every optional term defaults to zero.
pub fn validate_total_executable_amount(invoice: &Element) -> Result<(), FacturaeError> {
    let declared = total(invoice, TotalsField::TotalExecutableAmount)?;
    let outstanding = total(invoice, TotalsField::TotalOutstandingAmount)?;
    let withheld = optional_total(invoice, TotalsField::AmountsWithheld)?;
    let in_kind = optional_total(invoice, TotalsField::PaymentInKind)?;
    let reimbursable = optional_total(invoice, TotalsField::TotalReimbursableExpenses)?;
    let financial = optional_total(invoice, TotalsField::TotalFinancialExpenses)?;

    let mut computed = checked_sub(outstanding, withheld)?;
    computed = checked_sub(computed, in_kind)?;
    computed = checked_add(computed, reimbursable)?;
    computed = checked_add(computed, financial)?;

    if declared != computed {
        return Err(chain_mismatch(
            Rule::ExecutableAmount,
            invoice,
            TotalsField::TotalExecutableAmount,
            &[
                (Op::Plus, TotalsField::TotalOutstandingAmount),
                (Op::Minus, TotalsField::AmountsWithheld),
                (Op::Minus, TotalsField::PaymentInKind),
                (Op::Plus, TotalsField::TotalReimbursableExpenses),
                (Op::Plus, TotalsField::TotalFinancialExpenses),
            ],
            computed,
        ));
    }
    Ok(())
}

/// `InvoiceIssueData/TaxCurrencyCode` must be EUR.
pub fn validate_tax_currency_code(invoice: &Element) -> Result<(), FacturaeError> {
    let path = "InvoiceIssueData/TaxCurrencyCode";
    let code = invoice
        .text_at(path)
        .ok_or_else(|| missing_field(invoice, path))?;

    if code.trim() != "EUR" {
        return Err(mismatch(
            Rule::TaxCurrency,
            invoice,
            "El nodo MonedaImpuesto(TaxCurrencyCode) debe ser obligatoriamente EUR",
        ));
    }
    Ok(())
}

fn total(invoice: &Element, field: TotalsField) -> Result<Decimal, FacturaeError> {
    let totals = invoice
        .find("InvoiceTotals")
        .ok_or_else(|| missing_field(invoice, "InvoiceTotals"))?;
    decimal(totals, field.path())
}

fn optional_total(invoice: &Element, field: TotalsField) -> Result<Decimal, FacturaeError> {
    match invoice.find("InvoiceTotals") {
        Some(totals) => Ok(optional_decimal(totals, field.path())?.unwrap_or(Decimal::ZERO)),
        None => Ok(Decimal::ZERO),
    }
}

fn invoice_heading(invoice: &Element) -> String {
    format!("Error en la factura nº{}", invoice_number(invoice).unwrap_or("-"))
}

fn chain_mismatch(
    rule: Rule,
    invoice: &Element,
    target: TotalsField,
    terms: &[(Op, TotalsField)],
    computed: Decimal,
) -> FacturaeError {
    let mut message = format!(
        "{}. Desde el elemento \"InvoiceTotals\", {} no es igual a ",
        invoice_heading(invoice),
        target.bilingual()
    );
    for (i, (op, field)) in terms.iter().enumerate() {
        match (i, *op) {
            (0, Op::Plus) => {}
            (0, Op::Minus) => message.push_str("- "),
            (_, Op::Plus) => message.push_str(" + "),
            (_, Op::Minus) => message.push_str(" - "),
        }
        message.push_str(&field.bilingual());
    }
    message.push_str(&format!(", debería ser: {computed}"));
    mismatch(rule, invoice, message)
}

fn mismatch(rule: Rule, invoice: &Element, message: impl Into<String>) -> FacturaeError {
    let number = invoice_number(invoice).map(str::to_string);
    warn!(
        rule = rule.name(),
        invoice = number.as_deref().unwrap_or("-"),
        "accountant validation failed"
    );
    AccountantValidation::new(rule, number, message).into()
}
