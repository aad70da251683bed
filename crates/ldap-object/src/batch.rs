//! Pending change-set entries destined for a directory modify operation.

use crate::attributes::same_name;
use ldap3::Mod;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Kind of change a batch modification applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchKind {
    /// Append values to the attribute.
    Add,
    /// Remove specific values from the attribute.
    Remove,
    /// Replace the whole attribute (no values clears it).
    Replace,
}

impl BatchKind {
    /// Returns the lowercase name of the kind.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Remove => "remove",
            Self::Replace => "replace",
        }
    }
}

impl fmt::Display for BatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One pending change for a single attribute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchModification {
    attribute: String,
    kind: BatchKind,
    values: Vec<String>,
}

impl BatchModification {
    /// Creates a batch modification.
    #[must_use]
    pub fn new(attribute: impl Into<String>, kind: BatchKind, values: Vec<String>) -> Self {
        Self {
            attribute: attribute.into(),
            kind,
            values,
        }
    }

    /// Appends `values` to the attribute.
    #[must_use]
    pub fn add(attribute: impl Into<String>, values: Vec<String>) -> Self {
        Self::new(attribute, BatchKind::Add, values)
    }

    /// Removes `values` from the attribute.
    #[must_use]
    pub fn remove(attribute: impl Into<String>, values: Vec<String>) -> Self {
        Self::new(attribute, BatchKind::Remove, values)
    }

    /// Replaces the attribute with `values`.
    #[must_use]
    pub fn replace(attribute: impl Into<String>, values: Vec<String>) -> Self {
        Self::new(attribute, BatchKind::Replace, values)
    }

    /// Clears the attribute on the server (a replace with no values).
    #[must_use]
    pub fn reset(attribute: impl Into<String>) -> Self {
        Self::new(attribute, BatchKind::Replace, Vec::new())
    }

    /// Attribute the change targets.
    #[must_use]
    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    /// Kind of change.
    #[must_use]
    pub const fn kind(&self) -> BatchKind {
        self.kind
    }

    /// Values carried by the change.
    #[must_use]
    pub fn values(&self) -> &[String] {
        &self.values
    }

    /// Returns true for an add.
    #[must_use]
    pub const fn is_type_add(&self) -> bool {
        matches!(self.kind, BatchKind::Add)
    }

    /// Returns true for a remove.
    #[must_use]
    pub const fn is_type_remove(&self) -> bool {
        matches!(self.kind, BatchKind::Remove)
    }

    /// Returns true for a replace, including a reset.
    #[must_use]
    pub const fn is_type_replace(&self) -> bool {
        matches!(self.kind, BatchKind::Replace)
    }

    /// Returns true for a replace that clears the attribute.
    #[must_use]
    pub fn is_reset(&self) -> bool {
        self.is_type_replace() && self.values.is_empty()
    }

    pub(crate) fn targets(&self, attribute: &str) -> bool {
        same_name(&self.attribute, attribute)
    }

    pub(crate) fn set_values(&mut self, values: Vec<String>) {
        self.values = values;
    }
}

impl From<&BatchModification> for Mod<String> {
    fn from(batch: &BatchModification) -> Self {
        let attribute = batch.attribute.clone();
        let values = batch.values.iter().cloned().collect::<HashSet<_>>();
        match batch.kind {
            BatchKind::Add => Mod::Add(attribute, values),
            BatchKind::Remove => Mod::Delete(attribute, values),
            BatchKind::Replace => Mod::Replace(attribute, values),
        }
    }
}

/// Ordered, append-only list of pending batch modifications.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BatchCollection {
    modifications: Vec<BatchModification>,
}

impl BatchCollection {
    /// Creates an empty collection.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            modifications: Vec::new(),
        }
    }

    /// Appends a modification.
    pub fn push(&mut self, batch: BatchModification) {
        self.modifications.push(batch);
    }

    /// Number of pending modifications.
    #[must_use]
    pub fn len(&self) -> usize {
        self.modifications.len()
    }

    /// Returns true when nothing is pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.modifications.is_empty()
    }

    /// Pending modifications in the order they were recorded.
    #[must_use]
    pub fn as_slice(&self) -> &[BatchModification] {
        &self.modifications
    }

    /// Iterates over pending modifications in order.
    pub fn iter(&self) -> std::slice::Iter<'_, BatchModification> {
        self.modifications.iter()
    }

    /// Drops all pending modifications.
    pub fn clear(&mut self) {
        self.modifications.clear();
    }

    /// Moves all pending modifications out, leaving the collection empty.
    pub fn take(&mut self) -> Vec<BatchModification> {
        std::mem::take(&mut self.modifications)
    }

    /// Maps every modification 1:1 to an `ldap3` modify entry.
    #[must_use]
    pub fn to_ldap_mods(&self) -> Vec<Mod<String>> {
        self.modifications.iter().map(Mod::from).collect()
    }

    /// Last pending replace for `attribute` (case-insensitive).
    pub(crate) fn pending_replace_mut(&mut self, attribute: &str) -> Option<&mut BatchModification> {
        self.modifications
            .iter_mut()
            .rev()
            .find(|batch| batch.is_type_replace() && batch.targets(attribute))
    }
}

impl<'a> IntoIterator for &'a BatchCollection {
    type Item = &'a BatchModification;
    type IntoIter = std::slice::Iter<'a, BatchModification>;

    fn into_iter(self) -> Self::IntoIter {
        self.modifications.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_set_kind() {
        assert!(BatchModification::add("member", vec!["cn=a".into()]).is_type_add());
        assert!(BatchModification::remove("member", vec!["cn=a".into()]).is_type_remove());
        assert!(BatchModification::replace("sn", vec!["Doe".into()]).is_type_replace());

        let reset = BatchModification::reset("mail");
        assert!(reset.is_type_replace());
        assert!(reset.is_reset());
        assert!(reset.values().is_empty());
    }

    #[test]
    fn maps_to_ldap_mods() {
        let mut batch = BatchCollection::new();
        batch.push(BatchModification::add("member", vec!["cn=a".into()]));
        batch.push(BatchModification::remove("member", vec!["cn=b".into()]));
        batch.push(BatchModification::reset("mail"));

        let mods = batch.to_ldap_mods();
        assert_eq!(mods.len(), 3);
        assert!(matches!(&mods[0], Mod::Add(attr, values) if attr == "member" && values.contains("cn=a")));
        assert!(matches!(&mods[1], Mod::Delete(attr, values) if attr == "member" && values.contains("cn=b")));
        assert!(matches!(&mods[2], Mod::Replace(attr, values) if attr == "mail" && values.is_empty()));
    }

    #[test]
    fn take_empties_collection() {
        let mut batch = BatchCollection::new();
        batch.push(BatchModification::replace("sn", vec!["Doe".into()]));

        let taken = batch.take();
        assert_eq!(taken.len(), 1);
        assert!(batch.is_empty());
    }

    #[test]
    fn pending_replace_lookup_is_case_insensitive() {
        let mut batch = BatchCollection::new();
        batch.push(BatchModification::add("userAccountControl", vec!["2".into()]));
        assert!(batch.pending_replace_mut("useraccountcontrol").is_none());

        batch.push(BatchModification::replace("userAccountControl", vec!["514".into()]));
        let pending = batch.pending_replace_mut("USERACCOUNTCONTROL").unwrap();
        pending.set_values(vec!["66050".into()]);
        assert_eq!(batch.as_slice()[1].values(), ["66050".to_string()]);
    }

    #[test]
    fn pending_replace_lookup_folds_non_ascii_names() {
        let mut batch = BatchCollection::new();
        batch.push(BatchModification::replace("Größe", vec!["1".into()]));
        batch.push(BatchModification::replace("ÄNDERUNG", vec!["2".into()]));

        assert!(batch.pending_replace_mut("änderung").is_some());
        assert!(batch.pending_replace_mut("GRÖßE").is_some());
    }

    #[test]
    fn kind_serializes_lowercase() {
        let json = serde_json::to_string(&BatchModification::reset("mail")).unwrap();
        assert_eq!(json, r#"{"attribute":"mail","kind":"replace","values":[]}"#);
    }
}
