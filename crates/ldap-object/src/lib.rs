//! Change-tracking LDAP directory objects.
//!
//! An [`LdapObject`] holds a case-insensitive, multi-valued attribute map and records every
//! mutation as a [`BatchModification`]. Attributes bound through an [`AttributeSchema`] pass
//! through an [`AttributeConverter`] on the way to and from their wire form.

#![deny(missing_docs)]

mod attributes;
mod batch;
pub mod converter;
mod dispatch;
mod object;
mod schema;

pub use attributes::AttributeMap;
pub use batch::{BatchCollection, BatchKind, BatchModification};
pub use converter::{
    AttributeConverter, ConversionContext, ConverterOptions, OperationKind,
    UserAccountControlConverter, UserAccountControlFlags,
};
pub use dispatch::{Accessor, AccessorError, CallOutcome, Verb};
pub use ldap_object_core::{AttributeValue, DomainValue, Error};
pub use object::{LastValueProvider, LdapObject, LdapObjectBuilder};
pub use schema::{
    AttributeBinding, AttributeSchema, ConverterBindingConfig, ConverterRegistry, SchemaConfig,
};

/// Convenient result alias that reuses the core error type.
pub type Result<T> = ldap_object_core::Result<T>;
