use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::codes::TaxTypeCode;
use super::element::Element;
use super::error::FacturaeError;
use super::taxes::validate_invoice_tax_entries;
use super::validation::{Rule, invoice_number};

/// Which optional checks the [`InvoiceValidator`] runs.
///
/// ```
/// use facturae::core::ValidationOptions;
///
/// let options = ValidationOptions::default().strict_taxes(true);
/// assert!(options.executable_amount);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationOptions {
    /// Reconcile `TotalExecutableAmount`.
    pub executable_amount: bool,
    /// Require `TaxCurrencyCode` to be EUR.
    pub tax_currency: bool,
    /// Recompute every tax amount from base and rate, and check its type code.
    pub strict_taxes: bool,
    /// Expected `TaxTypeCode` of `TaxesOutputs` entries in strict mode.
    pub output_tax_type: TaxTypeCode,
    /// Expected `TaxTypeCode` of `TaxesWithheld` entries in strict mode.
    pub withheld_tax_type: TaxTypeCode,
}

impl Default for ValidationOptions {
    fn default() -> Self {
        Self {
            executable_amount: true,
            tax_currency: true,
            strict_taxes: false,
            output_tax_type: TaxTypeCode::Iva,
            withheld_tax_type: TaxTypeCode::Irpf,
        }
    }
}

impl ValidationOptions {
    /// Enable or disable the executable-amount rule.
    pub fn executable_amount(mut self, enabled: bool) -> Self {
        self.executable_amount = enabled;
        self
    }

    /// Enable or disable the tax-currency rule.
    pub fn tax_currency(mut self, enabled: bool) -> Self {
        self.tax_currency = enabled;
        self
    }

    /// Run the per-tax type and amount checks after the rules.
    pub fn strict_taxes(mut self, enabled: bool) -> Self {
        self.strict_taxes = enabled;
        self
    }

    /// Tax type expected in `TaxesOutputs` under strict checks.
    pub fn output_tax_type(mut self, code: TaxTypeCode) -> Self {
        self.output_tax_type = code;
        self
    }

    /// Tax type expected in `TaxesWithheld` under strict checks.
    pub fn withheld_tax_type(mut self, code: TaxTypeCode) -> Self {
        self.withheld_tax_type = code;
        self
    }

    /// The accountant rules enabled by these options, in validation order.
    pub fn rules(&self) -> Vec<Rule> {
        Rule::ALL
            .into_iter()
            .filter(|rule| match rule {
                Rule::ExecutableAmount => self.executable_amount,
                Rule::TaxCurrency => self.tax_currency,
                _ => true,
            })
            .collect()
    }
}

type CheckFn<'a> = dyn Fn(&Element) -> Result<(), FacturaeError> + Send + Sync + 'a;

struct Check<'a> {
    name: &'static str,
    run: Box<CheckFn<'a>>,
}

/// Runs an ordered list of checks against one invoice, stopping at the
/// first failure.
///
/// ```
/// use facturae::core::*;
/// use rust_decimal_macros::dec;
///
/// let invoice = InvoiceBuilder::new("F-1")
///     .add_line("Servicio", dec!(50.00))
///     .declare(TotalsField::TotalGrossAmount, dec!(49.99))
///     .build()
///     .unwrap();
///
/// let err = InvoiceValidator::default().validate(&invoice).unwrap_err();
/// assert_eq!(err.as_accountant().unwrap().rule, Rule::GrossAmount);
/// ```
pub struct InvoiceValidator<'a> {
    checks: Vec<Check<'a>>,
}

impl<'a> InvoiceValidator<'a> {
    /// Validator with the standard rule sequence for `options`.
    pub fn new(options: &ValidationOptions) -> Self {
        let mut validator = options
            .rules()
            .into_iter()
            .fold(Self::empty(), |v, rule| v.rule(rule));

        if options.strict_taxes {
            let outputs = options.output_tax_type;
            let withheld = options.withheld_tax_type;
            validator = validator
                .check("strict_tax_outputs", move |invoice| {
                    validate_invoice_tax_entries(invoice, "TaxesOutputs", outputs)
                })
                .check("strict_taxes_withheld", move |invoice| {
                    validate_invoice_tax_entries(invoice, "TaxesWithheld", withheld)
                });
        }

        validator
    }

    /// Validator with no checks, to be filled with [`rule`](Self::rule) /
    /// [`check`](Self::check).
    pub fn empty() -> Self {
        Self { checks: Vec::new() }
    }

    /// Append one of the built-in accountant rules.
    pub fn rule(self, rule: Rule) -> Self {
        self.check(rule.name(), rule.check_fn())
    }

    /// Append a named check.
    pub fn check(
        mut self,
        name: &'static str,
        run: impl Fn(&Element) -> Result<(), FacturaeError> + Send + Sync + 'a,
    ) -> Self {
        self.checks.push(Check {
            name,
            run: Box::new(run),
        });
        self
    }

    /// Names of the registered checks, in execution order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.checks.iter().map(|c| c.name)
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }

    /// Run every check in order. The first error is returned unchanged and
    /// the remaining checks are not evaluated.
    pub fn validate(&self, invoice: &Element) -> Result<(), FacturaeError> {
        let number = invoice_number(invoice).unwrap_or("-");
        for check in &self.checks {
            debug!(check = check.name, invoice = number, "running accountant check");
            (check.run)(invoice)?;
        }
        Ok(())
    }
}

impl Default for InvoiceValidator<'_> {
    fn default() -> Self {
        Self::new(&ValidationOptions::default())
    }
}

impl fmt::Debug for InvoiceValidator<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InvoiceValidator")
            .field("checks", &self.names().collect::<Vec<_>>())
            .finish()
    }
}

/// Validate one invoice with the default options.
pub fn validate_invoice(invoice: &Element) -> Result<(), FacturaeError> {
    InvoiceValidator::default().validate(invoice)
}
