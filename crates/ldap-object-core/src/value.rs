//! Attribute value types.
//!
//! Two representations exist for every attribute value:
//!
//! - [`AttributeValue`] is the wire form exchanged with the directory. It is always text, either a
//!   single string or an ordered list of strings.
//! - [`DomainValue`] is what callers work with. Converters translate between the two; attributes
//!   without a converter map text to text.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// `strftime` pattern for LDAP GeneralizedTime values in UTC.
pub const GENERALIZED_TIME_FORMAT: &str = "%Y%m%d%H%M%SZ";

/// Wire representation of an attribute value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    /// Single-valued attribute.
    Single(String),
    /// Multi-valued attribute, order preserved.
    Multi(Vec<String>),
}

impl AttributeValue {
    /// Returns the first value (the value itself for a single-valued attribute).
    #[must_use]
    pub fn first(&self) -> Option<&str> {
        match self {
            Self::Single(value) => Some(value.as_str()),
            Self::Multi(values) => values.first().map(String::as_str),
        }
    }

    /// Returns the values as an ordered list of borrowed strings.
    #[must_use]
    pub fn values(&self) -> Vec<&str> {
        match self {
            Self::Single(value) => vec![value.as_str()],
            Self::Multi(values) => values.iter().map(String::as_str).collect(),
        }
    }

    /// Consumes the value and returns the owned list of strings.
    #[must_use]
    pub fn into_values(self) -> Vec<String> {
        match self {
            Self::Single(value) => vec![value],
            Self::Multi(values) => values,
        }
    }

    /// Returns true if any stored value equals `value` exactly.
    #[must_use]
    pub fn contains(&self, value: &str) -> bool {
        match self {
            Self::Single(stored) => stored == value,
            Self::Multi(values) => values.iter().any(|stored| stored == value),
        }
    }

    /// Returns true for an empty string or an empty list.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Single(value) => value.is_empty(),
            Self::Multi(values) => values.is_empty(),
        }
    }

    /// Returns true if the attribute holds a list.
    #[must_use]
    pub const fn is_multi(&self) -> bool {
        matches!(self, Self::Multi(_))
    }
}

impl Default for AttributeValue {
    fn default() -> Self {
        Self::Single(String::new())
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Single(value) => f.write_str(value),
            Self::Multi(values) => write!(f, "[{}]", values.join(", ")),
        }
    }
}

impl From<&str> for AttributeValue {
    fn from(value: &str) -> Self {
        Self::Single(value.to_string())
    }
}

impl From<String> for AttributeValue {
    fn from(value: String) -> Self {
        Self::Single(value)
    }
}

impl From<Vec<String>> for AttributeValue {
    fn from(values: Vec<String>) -> Self {
        Self::Multi(values)
    }
}

impl From<Vec<&str>> for AttributeValue {
    fn from(values: Vec<&str>) -> Self {
        Self::Multi(values.into_iter().map(str::to_string).collect())
    }
}

/// Caller-facing representation of an attribute value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum DomainValue {
    /// Boolean (flags, LDAP `TRUE`/`FALSE`).
    Bool(bool),
    /// Integer value.
    Integer(i64),
    /// Point in time.
    Timestamp(DateTime<Utc>),
    /// Plain text.
    Text(String),
    /// Ordered list of text values.
    List(Vec<String>),
}

impl DomainValue {
    /// Empty text, returned for attributes that are not set.
    #[must_use]
    pub const fn empty() -> Self {
        Self::Text(String::new())
    }

    /// Returns the boolean if this is a [`DomainValue::Bool`].
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// Returns the text if this is a [`DomainValue::Text`].
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(value) => Some(value.as_str()),
            _ => None,
        }
    }

    /// Returns the list if this is a [`DomainValue::List`].
    #[must_use]
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::List(values) => Some(values.as_slice()),
            _ => None,
        }
    }

    /// Returns the timestamp if this is a [`DomainValue::Timestamp`].
    #[must_use]
    pub const fn as_timestamp(&self) -> Option<&DateTime<Utc>> {
        match self {
            Self::Timestamp(value) => Some(value),
            _ => None,
        }
    }

    /// Returns true if the value equals `value` (text) or contains it (list).
    #[must_use]
    pub fn contains(&self, value: &str) -> bool {
        match self {
            Self::Text(text) => text == value,
            Self::List(values) => values.iter().any(|item| item == value),
            _ => false,
        }
    }

    /// Returns true if this value matches `other`, treating list membership as a match.
    #[must_use]
    pub fn matches(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::List(values), Self::Text(text)) => values.iter().any(|item| item == text),
            _ => self == other,
        }
    }

    /// Renders the value in its default wire form.
    ///
    /// Used for attributes without a converter: booleans become LDAP `TRUE`/`FALSE`, integers
    /// their decimal form and timestamps GeneralizedTime.
    #[must_use]
    pub fn to_wire(&self) -> AttributeValue {
        match self {
            Self::Bool(value) => AttributeValue::Single(ldap_bool(*value).to_string()),
            Self::Integer(value) => AttributeValue::Single(value.to_string()),
            Self::Timestamp(value) => {
                AttributeValue::Single(value.format(GENERALIZED_TIME_FORMAT).to_string())
            }
            Self::Text(value) => AttributeValue::Single(value.clone()),
            Self::List(values) => AttributeValue::Multi(values.clone()),
        }
    }
}

/// LDAP boolean syntax for `value`.
#[must_use]
pub const fn ldap_bool(value: bool) -> &'static str {
    if value {
        "TRUE"
    } else {
        "FALSE"
    }
}

impl Default for DomainValue {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<AttributeValue> for DomainValue {
    fn from(value: AttributeValue) -> Self {
        match value {
            AttributeValue::Single(value) => Self::Text(value),
            AttributeValue::Multi(values) => Self::List(values),
        }
    }
}

impl From<&str> for DomainValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for DomainValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<bool> for DomainValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for DomainValue {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<DateTime<Utc>> for DomainValue {
    fn from(value: DateTime<Utc>) -> Self {
        Self::Timestamp(value)
    }
}

impl From<Vec<String>> for DomainValue {
    fn from(values: Vec<String>) -> Self {
        Self::List(values)
    }
}

impl From<Vec<&str>> for DomainValue {
    fn from(values: Vec<&str>) -> Self {
        Self::List(values.into_iter().map(str::to_string).collect())
    }
}

impl PartialEq<&str> for DomainValue {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == Some(*other)
    }
}
