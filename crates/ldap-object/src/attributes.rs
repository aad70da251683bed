//! Case-insensitive, case-preserving attribute storage.

use ldap_object_core::AttributeValue;
use serde::{Serialize, Serializer};
use serde::ser::SerializeMap;
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq, Eq)]
struct AttributeEntry {
    name: String,
    value: AttributeValue,
}

/// Attribute storage keyed by name, compared case-insensitively.
///
/// The name used when an attribute is first stored is kept for output; later writes through a
/// different casing update the same entry. Entries keep insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeMap {
    entries: Vec<AttributeEntry>,
    index: HashMap<String, usize>,
}

impl AttributeMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored name for `name`, in its original case.
    #[must_use]
    pub fn resolve(&self, name: &str) -> Option<&str> {
        self.position(name).map(|idx| self.entries[idx].name.as_str())
    }

    /// Returns the value stored under `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&AttributeValue> {
        self.position(name).map(|idx| &self.entries[idx].value)
    }

    /// Mutable access to the value stored under `name`.
    pub fn get_mut(&mut self, name: &str) -> Option<&mut AttributeValue> {
        self.position(name).map(|idx| &mut self.entries[idx].value)
    }

    /// Returns true if `name` is stored.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.position(name).is_some()
    }

    /// Stores `value` under `name`, keeping the existing casing if the attribute is already set.
    pub fn insert(&mut self, name: &str, value: AttributeValue) {
        match self.position(name) {
            Some(idx) => self.entries[idx].value = value,
            None => {
                self.index.insert(normalize(name), self.entries.len());
                self.entries.push(AttributeEntry {
                    name: name.to_string(),
                    value,
                });
            }
        }
    }

    /// Removes `name` and returns its value.
    pub fn remove(&mut self, name: &str) -> Option<AttributeValue> {
        let idx = self.index.remove(&normalize(name))?;
        let entry = self.entries.remove(idx);
        for position in self.index.values_mut() {
            if *position > idx {
                *position -= 1;
            }
        }
        Some(entry.value)
    }

    /// Number of stored attributes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing is stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterates over `(name, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &AttributeValue)> + '_ {
        self.entries
            .iter()
            .map(|entry| (entry.name.as_str(), &entry.value))
    }

    /// Owned copy of every `(name, value)` pair, exactly as stored.
    #[must_use]
    pub fn to_entries(&self) -> Vec<(String, AttributeValue)> {
        self.entries
            .iter()
            .map(|entry| (entry.name.clone(), entry.value.clone()))
            .collect()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.index.get(&normalize(name)).copied()
    }
}

impl<K, V> FromIterator<(K, V)> for AttributeMap
where
    K: AsRef<str>,
    V: Into<AttributeValue>,
{
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut map = Self::new();
        for (name, value) in iter {
            map.insert(name.as_ref(), value.into());
        }
        map
    }
}

impl Serialize for AttributeMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for entry in &self.entries {
            map.serialize_entry(&entry.name, &entry.value)?;
        }
        map.end()
    }
}

/// Folds a name for comparison. Every case-insensitive name match in the crate goes through here.
pub(crate) fn normalize(name: &str) -> String {
    name.to_lowercase()
}

pub(crate) fn same_name(left: &str, right: &str) -> bool {
    left == right || normalize(left) == normalize(right)
}
