//! Name-based accessors (`getFirstName`, `setDisabled`, `hasEmailAddress`, ...).

use crate::object::LdapObject;
use ldap_object_core::{DomainValue, Error as CoreError, Result};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors raised while parsing an accessor name.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessorError {
    /// The name does not start with a known verb.
    #[error("unknown accessor `{0}`")]
    UnknownVerb(String),
    /// The name is a bare verb with no attribute.
    #[error("accessor `{0}` does not name an attribute")]
    MissingAttribute(String),
    /// The verb needs a value and none was supplied.
    #[error("accessor `{0}` requires a value")]
    MissingValue(String),
}

impl From<AccessorError> for CoreError {
    fn from(err: AccessorError) -> Self {
        CoreError::InvalidRequest(err.to_string())
    }
}

/// Accessor verb.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    /// Read a value.
    Get,
    /// Replace a value.
    Set,
    /// Append a value.
    Add,
    /// Remove a value.
    Remove,
    /// Drop the attribute.
    Reset,
    /// Test for presence (or for a value).
    Has,
}

impl Verb {
    const ALL: [Self; 6] = [
        Self::Get,
        Self::Set,
        Self::Add,
        Self::Remove,
        Self::Reset,
        Self::Has,
    ];

    /// Lowercase verb prefix.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "get",
            Self::Set => "set",
            Self::Add => "add",
            Self::Remove => "remove",
            Self::Reset => "reset",
            Self::Has => "has",
        }
    }
}

impl fmt::Display for Verb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed accessor: verb plus attribute name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Accessor {
    verb: Verb,
    attribute: String,
}

impl Accessor {
    /// Parses `{verb}{Attribute}`. The verb matches case-insensitively and the attribute gets
    /// its first character lowercased (`getFirstName` reads `firstName`).
    ///
    /// # Errors
    ///
    /// Returns [`AccessorError`] for an unknown verb or a missing attribute.
    pub fn parse(method: &str) -> std::result::Result<Self, AccessorError> {
        let verb = Verb::ALL
            .into_iter()
            .find(|verb| {
                method
                    .get(..verb.as_str().len())
                    .is_some_and(|prefix| prefix.eq_ignore_ascii_case(verb.as_str()))
            })
            .ok_or_else(|| AccessorError::UnknownVerb(method.to_string()))?;

        let suffix = &method[verb.as_str().len()..];
        let mut chars = suffix.chars();
        let attribute = match chars.next() {
            Some(first) => first.to_lowercase().chain(chars).collect(),
            None => return Err(AccessorError::MissingAttribute(method.to_string())),
        };

        Ok(Self { verb, attribute })
    }

    /// Verb.
    #[must_use]
    pub const fn verb(&self) -> Verb {
        self.verb
    }

    /// Attribute name.
    #[must_use]
    pub fn attribute(&self) -> &str {
        &self.attribute
    }
}

impl FromStr for Accessor {
    type Err = AccessorError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::parse(s)
    }
}

/// Result of [`LdapObject::call`].
#[derive(Debug, Clone, PartialEq)]
pub enum CallOutcome {
    /// Value read by `get`.
    Value(DomainValue),
    /// Answer to `has`.
    Exists(bool),
    /// A mutation was applied and recorded.
    Updated,
}

impl CallOutcome {
    /// The value read by `get`, if this outcome carries one.
    #[must_use]
    pub fn into_value(self) -> Option<DomainValue> {
        match self {
            Self::Value(value) => Some(value),
            _ => None,
        }
    }

    /// The answer to `has`, if this outcome carries one.
    #[must_use]
    pub const fn exists(&self) -> Option<bool> {
        match self {
            Self::Exists(exists) => Some(*exists),
            _ => None,
        }
    }
}

impl LdapObject {
    /// Invokes an accessor by name.
    ///
    /// `get` fails for attributes that are not set, `has` never fails, and the mutating verbs
    /// behave like their methods on [`LdapObject`].
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::InvalidRequest`] for a malformed name or a missing value, and whatever
    /// the underlying operation returns.
    pub fn call(&mut self, method: &str, argument: Option<DomainValue>) -> Result<CallOutcome> {
        let accessor = Accessor::parse(method)?;
        let attribute = accessor.attribute();

        match (accessor.verb(), argument) {
            (Verb::Get, _) => self.try_get(attribute).map(CallOutcome::Value),
            (Verb::Has, Some(value)) => Ok(CallOutcome::Exists(self.has_value(attribute, value))),
            (Verb::Has, None) => Ok(CallOutcome::Exists(self.has(attribute))),
            (Verb::Reset, _) => self.reset(attribute).map(|_| CallOutcome::Updated),
            (Verb::Set, Some(value)) => self.set(attribute, value).map(|_| CallOutcome::Updated),
            (Verb::Add, Some(value)) => self.add(attribute, value).map(|_| CallOutcome::Updated),
            (Verb::Remove, Some(value)) => {
                self.remove(attribute, value).map(|_| CallOutcome::Updated)
            }
            (Verb::Set | Verb::Add | Verb::Remove, None) => {
                Err(AccessorError::MissingValue(method.to_string()).into())
            }
        }
    }
}
