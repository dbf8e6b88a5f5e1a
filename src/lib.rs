//! # facturae
//!
//! Reader and accountant validation for Facturae, the Spanish national
//! e-invoicing XML standard (versions 3.2, 3.2.1 and 3.2.2).
//!
//! The heart of the crate is the accountant validation: reconciliation
//! rules checking that the totals declared in an invoice agree with the
//! values recomputed from its lines and taxes. All amounts are
//! [`rust_decimal::Decimal`], never floating point, and every comparison
//! is exact.
//!
//! ## Quick Start
//!
//! ```rust
//! use facturae::core::*;
//! use rust_decimal_macros::dec;
//!
//! let invoice = InvoiceBuilder::new("F-2024-001")
//!     .add_line("Consultoría", dec!(100.00))
//!     .add_tax_output(TaxEntry::new(TaxTypeCode::Iva, dec!(21.00), dec!(100.00), dec!(21.00)))
//!     .build()
//!     .unwrap();
//!
//! assert!(validate_invoice(&invoice).is_ok());
//! assert_eq!(sum_tax_amount(invoice.find("TaxesOutputs").unwrap()).unwrap(), dec!(21.00));
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `core` (default) | Document tree, code lists, accountant validation |
//! | `xml` | Facturae XML reader and document summary |
//! | `all` | Everything |

#[cfg(feature = "core")]
pub mod core;

#[cfg(feature = "xml")]
pub mod xml;

// Re-export core types at crate root for convenience
#[cfg(feature = "core")]
pub use crate::core::*;
