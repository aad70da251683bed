//! # ldap-object-core
//!
//! Core types shared by the directory object model.
//!
//! ## Modules
//!
//! - [`error`] - Error taxonomy and error codes
//! - [`value`] - Wire and domain representations of attribute values

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod error;
pub mod value;

// Re-export commonly used types
pub use error::{Error, Result};
pub use value::{AttributeValue, DomainValue};
