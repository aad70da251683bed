//! Attribute converter protocol.
//!
//! A converter translates one family of attributes between the wire form the directory stores
//! and the domain form callers work with. Converters hold no mutable state: everything they may
//! depend on (the attribute being converted, the kind of operation, the value currently on the
//! server and the options the schema bound them with) arrives in a [`ConversionContext`].

mod boolean;
mod enumeration;
mod generalized_time;
mod user_account_control;

pub use boolean::BooleanConverter;
pub use enumeration::EnumerationConverter;
pub use generalized_time::GeneralizedTimeConverter;
pub use user_account_control::{UserAccountControlConverter, UserAccountControlFlags};

use crate::attributes::same_name;
use crate::batch::BatchModification;
use ldap_object_core::{AttributeValue, DomainValue, Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// Operation a conversion is performed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    /// Building a new entry.
    Create,
    /// Rewriting values of an existing entry.
    Modify,
    /// Appending values.
    Add,
    /// Removing values.
    Remove,
    /// Read-only access (no write in progress).
    None,
}

impl OperationKind {
    /// Returns the lowercase name of the operation.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "create",
            Self::Modify => "modify",
            Self::Add => "add",
            Self::Remove => "remove",
            Self::None => "none",
        }
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options a converter instance is bound with (option name to JSON value).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConverterOptions(Map<String, Value>);

impl ConverterOptions {
    /// Creates an empty option set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets an option, builder style.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    /// Returns an option value.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// Returns a copy of `self` with every option of `overrides` applied on top.
    #[must_use]
    pub fn merged(&self, overrides: &Self) -> Self {
        let mut merged = self.0.clone();
        for (name, value) in &overrides.0 {
            merged.insert(name.clone(), value.clone());
        }
        Self(merged)
    }

    /// Looks up `attribute` (case-insensitive) inside the map-valued option `option`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] if the option is not a map or has no entry for the
    /// attribute.
    pub fn mapped(&self, option: &str, attribute: &str) -> Result<&Value> {
        let map = self
            .get(option)
            .and_then(Value::as_object)
            .ok_or_else(|| Error::ConfigError(format!("converter option `{option}` is not set")))?;

        map.iter()
            .find(|(name, _)| same_name(name, attribute))
            .map(|(_, value)| value)
            .ok_or_else(|| {
                Error::ConfigError(format!(
                    "attribute `{attribute}` has no entry in converter option `{option}`"
                ))
            })
    }
}

/// Everything a converter may depend on for one invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct ConversionContext<'a> {
    attribute: &'a str,
    operation: OperationKind,
    last_value: Option<AttributeValue>,
    options: &'a ConverterOptions,
}

impl<'a> ConversionContext<'a> {
    /// Creates a read-only context for `attribute`.
    #[must_use]
    pub const fn new(attribute: &'a str, options: &'a ConverterOptions) -> Self {
        Self {
            attribute,
            operation: OperationKind::None,
            last_value: None,
            options,
        }
    }

    /// Sets the operation kind.
    #[must_use]
    pub fn with_operation(mut self, operation: OperationKind) -> Self {
        self.operation = operation;
        self
    }

    /// Sets the value currently known for the attribute on the directory.
    #[must_use]
    pub fn with_last_value(mut self, last_value: Option<AttributeValue>) -> Self {
        self.last_value = last_value;
        self
    }

    /// Logical attribute being converted.
    #[must_use]
    pub const fn attribute(&self) -> &str {
        self.attribute
    }

    /// Operation kind.
    #[must_use]
    pub const fn operation(&self) -> OperationKind {
        self.operation
    }

    /// Last known wire value, if any.
    #[must_use]
    pub const fn last_value(&self) -> Option<&AttributeValue> {
        self.last_value.as_ref()
    }

    /// Converter options.
    #[must_use]
    pub const fn options(&self) -> &ConverterOptions {
        self.options
    }
}

/// Bidirectional transformation between wire and domain values for one attribute family.
pub trait AttributeConverter: fmt::Debug + Send + Sync {
    /// Name the converter is registered under.
    fn name(&self) -> &'static str;

    /// Options applied before the schema's own options.
    fn default_options(&self) -> ConverterOptions {
        ConverterOptions::new()
    }

    /// Converts a domain value into the wire value to send to the directory.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] when the options do not cover the attribute and
    /// [`Error::InvalidRequest`] for values the converter cannot represent.
    fn to_ldap(&self, value: &DomainValue, context: &ConversionContext<'_>)
        -> Result<AttributeValue>;

    /// Converts a wire value into its domain value. Depends only on the value, the attribute
    /// name and the options.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] when the options do not cover the attribute and
    /// [`Error::InvalidRequest`] for malformed wire values.
    fn from_ldap(&self, value: &AttributeValue, context: &ConversionContext<'_>)
        -> Result<DomainValue>;

    /// Whether several logical changes to the same wire attribute must be folded into one write.
    fn should_aggregate_values(&self, _context: &ConversionContext<'_>) -> bool {
        false
    }

    /// Whether the converter can correctly produce a batch of this kind.
    fn is_batch_supported(&self, _batch: &BatchModification) -> bool {
        true
    }

    /// Wire value assumed when the attribute has never been set.
    fn default_value(&self, _context: &ConversionContext<'_>) -> Option<AttributeValue> {
        None
    }
}

fn unexpected_value(converter: &str, attribute: &str, value: &DomainValue) -> Error {
    Error::InvalidRequest(format!(
        "{converter} converter cannot convert {value:?} for attribute `{attribute}`"
    ))
}

fn single_wire_value<'v>(value: &'v AttributeValue, attribute: &str) -> Result<&'v str> {
    match value {
        AttributeValue::Single(value) => Ok(value.as_str()),
        AttributeValue::Multi(values) if values.len() == 1 => Ok(values[0].as_str()),
        AttributeValue::Multi(values) => Err(Error::InvalidRequest(format!(
            "attribute `{attribute}` expects a single value, got {}",
            values.len()
        ))),
    }
}
