//! Facturae XML reading.
//!
//! [`parse_element`] turns any XML text into the [`Element`](crate::core::Element)
//! tree the accountant rules work on; [`FacturaeDocument`] adds the
//! Facturae-specific views on top: schema version, the invoices of the
//! file, whole-document validation and a typed [`FacturaeSummary`].
//!
//! # Example
//!
//! ```no_run
//! use facturae::core::ValidationOptions;
//! use facturae::xml::FacturaeDocument;
//!
//! let xml = std::fs::read_to_string("factura.xsig").unwrap();
//! let doc = FacturaeDocument::from_xml(&xml).unwrap();
//! doc.validate(&ValidationOptions::default()).unwrap();
//! println!("{:?}", doc.summary().unwrap().batch);
//! ```

mod document;
mod reader;
mod summary;
pub(crate) mod xml_utils;

pub use document::FacturaeDocument;
pub use reader::parse_element;
pub use summary::*;
