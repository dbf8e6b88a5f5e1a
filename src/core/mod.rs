//! Document tree, code lists and accountant validation.
//!
//! Everything here works on an already-parsed [`Element`] tree, so the
//! rules can be driven from the `xml` reader or from trees assembled in
//! code with [`InvoiceBuilder`].

mod builder;
pub mod codes;
mod decimal;
mod element;
mod error;
mod taxes;
mod validation;
mod validator;

pub use builder::*;
pub use codes::*;
pub use decimal::*;
pub use element::*;
pub use error::*;
pub use taxes::*;
pub use validation::*;
pub use validator::*;
