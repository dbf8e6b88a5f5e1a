use thiserror::Error;

use super::validation::Rule;

/// Errors that can occur while reading or reconciling a Facturae document.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FacturaeError {
    /// A required element or its text is absent.
    #[error("missing field: {path}")]
    MissingField {
        /// Slash-separated path of the absent element (e.g. "Invoice/InvoiceTotals/InvoiceTotal").
        path: String,
    },

    /// A field is present but its text cannot be read as the expected kind of value.
    #[error("invalid {expected} in {path}: '{value}'")]
    InvalidValue {
        /// Slash-separated path of the offending element.
        path: String,
        /// The raw text found.
        value: String,
        /// What the text should have been ("decimal", "date", ...).
        expected: &'static str,
    },

    /// A caller passed an argument the operation does not accept.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Declared totals do not reconcile with the recomputed values.
    #[error(transparent)]
    Accountant(#[from] AccountantValidation),

    /// A per-tax consistency check failed.
    #[error("validation failed: {0}")]
    Validation(String),

    /// A decimal operation overflowed.
    #[error("arithmetic error: {0}")]
    Arithmetic(String),

    /// XML reading error.
    #[error("XML error: {0}")]
    Xml(String),

    /// The document does not declare a supported Facturae schema version.
    #[error("version not found in XML: {0}")]
    VersionNotFound(String),
}

impl FacturaeError {
    /// True for reconciliation mismatches, the only kind meant to be shown
    /// to the accountant reviewing the invoice.
    pub fn is_accountant(&self) -> bool {
        matches!(self, Self::Accountant(_))
    }

    /// The reconciliation mismatch, if this is one.
    pub fn as_accountant(&self) -> Option<&AccountantValidation> {
        match self {
            Self::Accountant(a) => Some(a),
            _ => None,
        }
    }
}

/// A reconciliation mismatch found by one of the accountant rules.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Accountant Validation - {message}")]
pub struct AccountantValidation {
    /// The rule that failed.
    pub rule: Rule,
    /// `InvoiceHeader/InvoiceNumber` of the offending invoice, when present.
    pub invoice_number: Option<String>,
    /// Accountant-facing description (Spanish, with the English element names).
    pub message: String,
}

impl AccountantValidation {
    pub fn new(rule: Rule, invoice_number: Option<String>, message: impl Into<String>) -> Self {
        Self {
            rule,
            invoice_number,
            message: message.into(),
        }
    }
}
