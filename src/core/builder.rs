use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::codes::{InvoiceClass, InvoiceDocumentType, TaxTypeCode};
use super::decimal::{checked_add, checked_sub};
use super::element::Element;
use super::error::FacturaeError;
use super::taxes::sum_to_max_scale;
use super::validation::TotalsField;

/// One `Tax` entry of `TaxesOutputs` or `TaxesWithheld`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxEntry {
    pub type_code: TaxTypeCode,
    /// Percentage, e.g. `21.00`.
    pub rate: Decimal,
    pub taxable_base: Decimal,
    pub amount: Decimal,
}

impl TaxEntry {
    pub fn new(type_code: TaxTypeCode, rate: Decimal, taxable_base: Decimal, amount: Decimal) -> Self {
        Self {
            type_code,
            rate,
            taxable_base,
            amount,
        }
    }

    pub fn to_element(&self) -> Element {
        Element::new("Tax")
            .with_child(Element::leaf("TaxTypeCode", self.type_code.code()))
            .with_child(Element::leaf("TaxRate", self.rate.to_string()))
            .with_child(
                Element::new("TaxableBase")
                    .with_child(Element::leaf("TotalAmount", self.taxable_base.to_string())),
            )
            .with_child(
                Element::new("TaxAmount")
                    .with_child(Element::leaf("TotalAmount", self.amount.to_string())),
            )
    }
}

/// Builder for a Facturae `Invoice` element.
///
/// Totals that are not [`declare`](Self::declare)d are calculated from the
/// lines, taxes and the other totals, so a freshly built invoice reconciles.
/// Declaring a wrong value, or [`omit`](Self::omit)ting a field, produces
/// the inconsistent invoices the accountant rules must reject.
///
/// ```
/// use facturae::core::*;
/// use rust_decimal_macros::dec;
///
/// let invoice = InvoiceBuilder::new("F-2024-007")
///     .add_line("Mantenimiento", dec!(200.00))
///     .add_tax_output(TaxEntry::new(TaxTypeCode::Iva, dec!(21.00), dec!(200.00), dec!(42.00)))
///     .add_tax_withheld(TaxEntry::new(TaxTypeCode::Irpf, dec!(15.00), dec!(200.00), dec!(30.00)))
///     .build()
///     .unwrap();
///
/// assert_eq!(invoice.text_at("InvoiceTotals/InvoiceTotal"), Some("212.00"));
/// ```
#[derive(Debug, Clone)]
pub struct InvoiceBuilder {
    number: String,
    series: Option<String>,
    document_type: InvoiceDocumentType,
    class: InvoiceClass,
    issue_date: Option<NaiveDate>,
    invoice_currency: String,
    tax_currency: String,
    lines: Vec<(String, Decimal)>,
    taxes_outputs: Vec<TaxEntry>,
    taxes_withheld: Vec<TaxEntry>,
    subsidies: Vec<Decimal>,
    declared: BTreeMap<TotalsField, Decimal>,
    omitted: BTreeSet<TotalsField>,
}

impl InvoiceBuilder {
    pub fn new(number: impl Into<String>) -> Self {
        Self {
            number: number.into(),
            series: None,
            document_type: InvoiceDocumentType::Complete,
            class: InvoiceClass::Original,
            issue_date: None,
            invoice_currency: "EUR".to_string(),
            tax_currency: "EUR".to_string(),
            lines: Vec::new(),
            taxes_outputs: Vec::new(),
            taxes_withheld: Vec::new(),
            subsidies: Vec::new(),
            declared: BTreeMap::new(),
            omitted: BTreeSet::new(),
        }
    }

    pub fn series(mut self, series: impl Into<String>) -> Self {
        self.series = Some(series.into());
        self
    }

    pub fn document_type(mut self, document_type: InvoiceDocumentType) -> Self {
        self.document_type = document_type;
        self
    }

    pub fn class(mut self, class: InvoiceClass) -> Self {
        self.class = class;
        self
    }

    pub fn issue_date(mut self, date: NaiveDate) -> Self {
        self.issue_date = Some(date);
        self
    }

    pub fn invoice_currency(mut self, code: impl Into<String>) -> Self {
        self.invoice_currency = code.into();
        self
    }

    pub fn tax_currency(mut self, code: impl Into<String>) -> Self {
        self.tax_currency = code.into();
        self
    }

    pub fn add_line(mut self, description: impl Into<String>, gross_amount: Decimal) -> Self {
        self.lines.push((description.into(), gross_amount));
        self
    }

    pub fn add_tax_output(mut self, tax: TaxEntry) -> Self {
        self.taxes_outputs.push(tax);
        self
    }

    pub fn add_tax_withheld(mut self, tax: TaxEntry) -> Self {
        self.taxes_withheld.push(tax);
        self
    }

    pub fn add_subsidy(mut self, amount: Decimal) -> Self {
        self.subsidies.push(amount);
        self
    }

    /// Set the declared value of a totals field, replacing the calculated
    /// one. Optional amounts (payments on account, withholdings, payment in
    /// kind, expenses) only appear when declared. Declaring
    /// [`TotalsField::Subsidies`] adds one subsidy.
    pub fn declare(mut self, field: TotalsField, value: Decimal) -> Self {
        if field == TotalsField::Subsidies {
            self.subsidies.push(value);
        } else {
            self.declared.insert(field, value);
        }
        self
    }

    /// Leave a totals field out of the built element.
    pub fn omit(mut self, field: TotalsField) -> Self {
        self.omitted.insert(field);
        self
    }

    /// Build the `Invoice` element.
    pub fn build(self) -> Result<Element, FacturaeError> {
        let totals = self.totals()?;

        let mut header = Element::new("InvoiceHeader").with_child(Element::leaf("InvoiceNumber", &self.number));
        if let Some(series) = &self.series {
            header.push_child(Element::leaf("InvoiceSeriesCode", series));
        }
        header.push_child(Element::leaf("InvoiceDocumentType", self.document_type.code()));
        header.push_child(Element::leaf("InvoiceClass", self.class.code()));

        let mut issue = Element::new("InvoiceIssueData");
        if let Some(date) = self.issue_date {
            issue.push_child(Element::leaf("IssueDate", date.format("%Y-%m-%d").to_string()));
        }
        issue.push_child(Element::leaf("InvoiceCurrencyCode", &self.invoice_currency));
        issue.push_child(Element::leaf("TaxCurrencyCode", &self.tax_currency));
        issue.push_child(Element::leaf("LanguageName", "es"));

        let mut invoice = Element::new("Invoice")
            .with_child(header)
            .with_child(issue)
            .with_child(
                Element::new("TaxesOutputs")
                    .with_children(self.taxes_outputs.iter().map(TaxEntry::to_element)),
            );
        if !self.taxes_withheld.is_empty() {
            invoice.push_child(
                Element::new("TaxesWithheld")
                    .with_children(self.taxes_withheld.iter().map(TaxEntry::to_element)),
            );
        }
        invoice.push_child(totals);
        invoice.push_child(Element::new("Items").with_children(self.lines.iter().map(
            |(description, gross)| {
                Element::new("InvoiceLine")
                    .with_child(Element::leaf("ItemDescription", description))
                    .with_child(Element::leaf("Quantity", "1.0"))
                    .with_child(Element::leaf("UnitPriceWithoutTax", gross.to_string()))
                    .with_child(Element::leaf("TotalCost", gross.to_string()))
                    .with_child(Element::leaf("GrossAmount", gross.to_string()))
            },
        )));

        Ok(invoice)
    }

    fn totals(&self) -> Result<Element, FacturaeError> {
        let declared = |field: TotalsField| self.declared.get(&field).copied();
        let optional = |field: TotalsField| declared(field).unwrap_or(Decimal::ZERO);

        let gross = self
            .lines
            .iter()
            .try_fold(Decimal::ZERO, |acc, (_, g)| checked_add(acc, *g))?;
        let gross = declared(TotalsField::TotalGrossAmount).unwrap_or(gross);
        let before_taxes = declared(TotalsField::TotalGrossAmountBeforeTaxes).unwrap_or(gross);
        let tax_outputs = match declared(TotalsField::TotalTaxOutputs) {
            Some(value) => value,
            None => sum_to_max_scale(self.taxes_outputs.iter().map(|t| t.amount))?,
        };
        let taxes_withheld = match declared(TotalsField::TotalTaxesWithheld) {
            Some(value) => value,
            None => sum_to_max_scale(self.taxes_withheld.iter().map(|t| t.amount))?,
        };
        let invoice_total = match declared(TotalsField::InvoiceTotal) {
            Some(value) => value,
            None => checked_sub(checked_add(before_taxes, tax_outputs)?, taxes_withheld)?,
        };
        let subsidies = sum_to_max_scale(self.subsidies.iter().copied())?;
        let outstanding = match declared(TotalsField::TotalOutstandingAmount) {
            Some(value) => value,
            None => checked_add(
                checked_sub(invoice_total, subsidies)?,
                optional(TotalsField::TotalPaymentsOnAccount),
            )?,
        };
        let executable = match declared(TotalsField::TotalExecutableAmount) {
            Some(value) => value,
            None => {
                let mut amount = checked_sub(outstanding, optional(TotalsField::AmountsWithheld))?;
                amount = checked_sub(amount, optional(TotalsField::PaymentInKind))?;
                amount = checked_add(amount, optional(TotalsField::TotalReimbursableExpenses))?;
                checked_add(amount, optional(TotalsField::TotalFinancialExpenses))?
            }
        };

        // Facturae schema order
        let fields = [
            (TotalsField::TotalGrossAmount, Some(gross)),
            (TotalsField::TotalGrossAmountBeforeTaxes, Some(before_taxes)),
            (TotalsField::TotalTaxOutputs, Some(tax_outputs)),
            (TotalsField::TotalTaxesWithheld, Some(taxes_withheld)),
            (TotalsField::InvoiceTotal, Some(invoice_total)),
            (TotalsField::Subsidies, None),
            (TotalsField::TotalPaymentsOnAccount, declared(TotalsField::TotalPaymentsOnAccount)),
            (TotalsField::AmountsWithheld, declared(TotalsField::AmountsWithheld)),
            (TotalsField::TotalOutstandingAmount, Some(outstanding)),
            (TotalsField::PaymentInKind, declared(TotalsField::PaymentInKind)),
            (TotalsField::TotalReimbursableExpenses, declared(TotalsField::TotalReimbursableExpenses)),
            (TotalsField::TotalFinancialExpenses, declared(TotalsField::TotalFinancialExpenses)),
            (TotalsField::TotalExecutableAmount, Some(executable)),
        ];

        let mut totals = Element::new("InvoiceTotals");
        for (field, value) in fields {
            if self.omitted.contains(&field) {
                continue;
            }
            match (field, value) {
                (TotalsField::Subsidies, _) if !self.subsidies.is_empty() => {
                    totals.push_child(Element::new("Subsidies").with_children(
                        self.subsidies.iter().map(|amount| {
                            Element::new("Subsidy")
                                .with_child(Element::leaf("SubsidyDescription", "Subvención"))
                                .with_child(Element::leaf("SubsidyAmount", amount.to_string()))
                        }),
                    ));
                }
                (TotalsField::AmountsWithheld, Some(amount)) => {
                    totals.push_child(
                        Element::new("AmountsWithheld")
                            .with_child(Element::leaf("WithholdingReason", "Retención en garantía"))
                            .with_child(Element::leaf("WithholdingAmount", amount.to_string())),
                    );
                }
                (TotalsField::PaymentInKind, Some(amount)) => {
                    totals.push_child(
                        Element::new("PaymentInKind")
                            .with_child(Element::leaf("PaymentInKindReason", "Pago en especie"))
                            .with_child(Element::leaf("PaymentInKindAmount", amount.to_string())),
                    );
                }
                (_, Some(amount)) => totals.set_text_at(field.path(), amount.to_string()),
                (_, None) => {}
            }
        }

        Ok(totals)
    }
}
