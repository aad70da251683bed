//! Change-tracking directory objects.

use crate::attributes::{same_name, AttributeMap};
use crate::batch::{BatchCollection, BatchKind, BatchModification};
use crate::converter::OperationKind;
use crate::schema::{AttributeBinding, AttributeSchema};
use ldap_object_core::{AttributeValue, DomainValue, Error, Result};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Source of the values an entry currently holds on the directory server.
///
/// Consulted when a converter needs the current value of an attribute the object has not
/// loaded, for example to flip one bit of `userAccountControl` without touching the others.
#[cfg_attr(test, mockall::automock)]
pub trait LastValueProvider: Send + Sync {
    /// Returns the value of `attribute` on the entry `dn`, if it has one.
    ///
    /// # Errors
    ///
    /// Implementations report lookup failures as [`Error::ExternalServiceError`].
    fn last_value(&self, dn: &str, attribute: &str) -> Result<Option<AttributeValue>>;
}

/// One directory entry: attributes, classification and the pending change-set.
///
/// Attribute names are matched case-insensitively everywhere. Every mutation records a
/// [`BatchModification`] that stays pending until the caller clears or takes the batch.
#[derive(Clone)]
pub struct LdapObject {
    dn: Option<String>,
    attributes: AttributeMap,
    object_classes: Vec<String>,
    category: String,
    object_type: String,
    operation: OperationKind,
    schema: Option<Arc<AttributeSchema>>,
    last_values: Option<Arc<dyn LastValueProvider>>,
    batch: BatchCollection,
}

impl LdapObject {
    /// Creates an object from its loaded attributes and classification.
    #[must_use]
    pub fn new<I, K, V, C, S>(
        attributes: I,
        object_classes: C,
        category: impl Into<String>,
        object_type: impl Into<String>,
    ) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<AttributeValue>,
        C: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::builder(object_type)
            .attributes(attributes)
            .object_classes(object_classes)
            .category(category)
            .build()
    }

    /// Starts building an object of `object_type`.
    #[must_use]
    pub fn builder(object_type: impl Into<String>) -> LdapObjectBuilder {
        LdapObjectBuilder {
            dn: None,
            attributes: AttributeMap::new(),
            object_classes: Vec::new(),
            category: String::new(),
            object_type: object_type.into(),
            operation: OperationKind::Modify,
            schema: None,
            last_values: None,
        }
    }

    /// Starts building an object whose classification and converters come from `schema`.
    #[must_use]
    pub fn from_schema(schema: Arc<AttributeSchema>) -> LdapObjectBuilder {
        Self::builder(schema.object_type())
            .object_classes(schema.object_classes().to_vec())
            .category(schema.category().unwrap_or_default())
            .schema(schema)
    }

    /// Returns the value of `name`.
    ///
    /// Attributes bound to a converter are returned in domain form. A missing attribute yields
    /// the converter's default when it has one, and empty text otherwise.
    ///
    /// # Errors
    ///
    /// Returns converter errors ([`Error::ConfigError`], [`Error::InvalidRequest`]) and
    /// last value lookup failures.
    pub fn get(&self, name: &str) -> Result<DomainValue> {
        Ok(self.lookup(name)?.unwrap_or_default())
    }

    /// Returns the value of `name`, failing when it is not set and has no default.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidAttribute`] for a missing attribute, plus everything
    /// [`LdapObject::get`] can return.
    pub fn try_get(&self, name: &str) -> Result<DomainValue> {
        self.lookup(name)?.ok_or_else(|| {
            Error::InvalidAttribute(format!(
                "attribute `{name}` is not set on this {}",
                self.object_type
            ))
        })
    }

    /// Replaces the whole value of `name`.
    ///
    /// # Errors
    ///
    /// Returns converter errors for bound attributes; nothing changes on error.
    pub fn set(&mut self, name: &str, value: impl Into<DomainValue>) -> Result<&mut Self> {
        self.mutate(name, BatchKind::Replace, Some(value.into()))
    }

    /// Appends `value` to `name`, turning a single value into a list.
    ///
    /// # Errors
    ///
    /// Returns converter errors for bound attributes, including
    /// [`Error::UnsupportedBatch`] for converters that only rewrite whole values.
    pub fn add(&mut self, name: &str, value: impl Into<DomainValue>) -> Result<&mut Self> {
        self.mutate(name, BatchKind::Add, Some(value.into()))
    }

    /// Removes `value` from a list, or clears a single-valued attribute.
    ///
    /// Removing from an attribute that is not set changes nothing but is still recorded.
    ///
    /// # Errors
    ///
    /// Returns converter errors for bound attributes.
    pub fn remove(&mut self, name: &str, value: impl Into<DomainValue>) -> Result<&mut Self> {
        self.mutate(name, BatchKind::Remove, Some(value.into()))
    }

    /// Drops `name` entirely and records a replace with no values.
    ///
    /// # Errors
    ///
    /// Returns converter errors for bound attributes, including [`Error::UnsupportedBatch`]
    /// for a bit flag, which can only be cleared with `set(name, false)`.
    pub fn reset(&mut self, name: &str) -> Result<&mut Self> {
        self.mutate(name, BatchKind::Replace, None)
    }

    /// Returns true if `name` is set.
    ///
    /// For a bound attribute this checks the wire attribute it is stored in. A flag bound to
    /// `userAccountControl` is therefore present whenever that integer is stored, whatever the
    /// state of its bit; use [`LdapObject::get`] or [`LdapObject::has_value`] for the bit itself.
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        match self.binding(name) {
            Some(binding) => self.attributes.contains(binding.ldap_attribute()),
            None => self.attributes.contains(name),
        }
    }

    /// Returns true if `name` is set and holds `value`. An empty list never matches.
    #[must_use]
    pub fn has_value(&self, name: &str, value: impl Into<DomainValue>) -> bool {
        let value = value.into();
        if matches!(&value, DomainValue::List(values) if values.is_empty()) {
            return false;
        }
        if self.binding(name).is_some() {
            return self.has(name)
                && self
                    .get(name)
                    .is_ok_and(|current| current.matches(&value));
        }

        self.attributes.get(name).is_some_and(|stored| {
            value
                .to_wire()
                .values()
                .iter()
                .all(|candidate| stored.contains(candidate))
        })
    }

    /// Every attribute exactly as stored, in original case and insertion order.
    #[must_use]
    pub fn to_entries(&self) -> Vec<(String, AttributeValue)> {
        self.attributes.to_entries()
    }

    /// Borrows the attribute storage.
    #[must_use]
    pub const fn attributes(&self) -> &AttributeMap {
        &self.attributes
    }

    /// Returns true if the object carries the object class `name` (case-insensitive).
    #[must_use]
    pub fn is_class(&self, name: &str) -> bool {
        self.object_classes
            .iter()
            .any(|class| same_name(class, name))
    }

    /// Returns true if the object's category is `name` (case-insensitive).
    #[must_use]
    pub fn is_category(&self, name: &str) -> bool {
        same_name(&self.category, name)
    }

    /// Returns true if the object's type is `name` (case-insensitive).
    #[must_use]
    pub fn is_type(&self, name: &str) -> bool {
        same_name(&self.object_type, name)
    }

    /// Logical object type.
    #[must_use]
    pub fn object_type(&self) -> &str {
        &self.object_type
    }

    /// Directory category.
    #[must_use]
    pub fn category(&self) -> &str {
        &self.category
    }

    /// Object classes.
    #[must_use]
    pub fn object_classes(&self) -> &[String] {
        &self.object_classes
    }

    /// Distinguished name, when known.
    #[must_use]
    pub fn dn(&self) -> Option<&str> {
        self.dn.as_deref()
    }

    /// Operation the object is being prepared for.
    #[must_use]
    pub const fn operation(&self) -> OperationKind {
        self.operation
    }

    /// Pending modifications in the order they were recorded.
    #[must_use]
    pub fn batch_modifications(&self) -> &[BatchModification] {
        self.batch.as_slice()
    }

    /// Pending modifications as a collection (for mapping to protocol entries).
    #[must_use]
    pub const fn batch(&self) -> &BatchCollection {
        &self.batch
    }

    /// Drops all pending modifications.
    pub fn clear_batch_modifications(&mut self) -> &mut Self {
        self.batch.clear();
        self
    }

    /// Moves the pending modifications out, leaving none pending.
    pub fn take_batch_modifications(&mut self) -> Vec<BatchModification> {
        self.batch.take()
    }

    fn binding(&self, name: &str) -> Option<&AttributeBinding> {
        self.schema.as_deref().and_then(|schema| schema.binding(name))
    }

    fn lookup(&self, name: &str) -> Result<Option<DomainValue>> {
        let Some(binding) = self.binding(name) else {
            return Ok(self.attributes.get(name).cloned().map(DomainValue::from));
        };

        let context = binding.context(OperationKind::None, None);
        let wire = match self.last_value(binding.ldap_attribute())? {
            Some(value) => Some(value),
            None => binding.converter().default_value(&context),
        };

        wire.map(|value| binding.converter().from_ldap(&value, &context))
            .transpose()
    }

    fn last_value(&self, ldap_attribute: &str) -> Result<Option<AttributeValue>> {
        if let Some(value) = self.attributes.get(ldap_attribute) {
            return Ok(Some(value.clone()));
        }

        let (Some(provider), Some(dn)) = (&self.last_values, &self.dn) else {
            return Ok(None);
        };
        if self.operation == OperationKind::Create {
            return Ok(None);
        }

        provider.last_value(dn, ldap_attribute).map_err(|err| {
            if err.should_log() {
                warn!(dn = %dn, attribute = ldap_attribute, error = %err, "last value lookup failed");
            } else {
                debug!(dn = %dn, attribute = ldap_attribute, error = %err, "last value lookup rejected");
            }
            err
        })
    }

    fn operation_for(&self, kind: BatchKind, has_value: bool) -> OperationKind {
        match kind {
            BatchKind::Add => OperationKind::Add,
            BatchKind::Remove => OperationKind::Remove,
            BatchKind::Replace if has_value => self.operation,
            BatchKind::Replace => OperationKind::Modify,
        }
    }

    fn mutate(
        &mut self,
        name: &str,
        kind: BatchKind,
        value: Option<DomainValue>,
    ) -> Result<&mut Self> {
        let schema = self.schema.clone();
        let binding = schema.as_deref().and_then(|schema| schema.binding(name));

        let (target, wire, aggregate) = match binding {
            Some(binding) => {
                let operation = self.operation_for(kind, value.is_some());
                let context =
                    binding.context(operation, self.last_value(binding.ldap_attribute())?);
                trace!(
                    attribute = name,
                    converter = binding.converter().name(),
                    operation = %operation,
                    "converting attribute value"
                );
                let wire = value
                    .map(|value| binding.converter().to_ldap(&value, &context))
                    .transpose()?;
                let aggregate = binding.converter().should_aggregate_values(&context);
                (binding.ldap_attribute(), wire, aggregate)
            }
            None => (name, value.as_ref().map(DomainValue::to_wire), false),
        };

        let attribute = self
            .attributes
            .resolve(target)
            .unwrap_or(target)
            .to_string();
        let values = wire.clone().map(AttributeValue::into_values).unwrap_or_default();
        let batch = BatchModification::new(attribute.clone(), kind, values);

        if let Some(binding) = binding {
            if !binding.converter().is_batch_supported(&batch) {
                return Err(Error::UnsupportedBatch {
                    attribute,
                    kind: kind.to_string(),
                });
            }
        }

        self.apply(&attribute, kind, wire);

        if aggregate && kind == BatchKind::Replace {
            if let Some(pending) = self.batch.pending_replace_mut(&attribute) {
                debug!(attribute = %attribute, values = ?batch.values(), "aggregated into pending replace");
                pending.set_values(batch.values().to_vec());
                return Ok(self);
            }
        }

        debug!(attribute = %attribute, kind = %kind, values = ?batch.values(), "recorded batch modification");
        self.batch.push(batch);
        Ok(self)
    }

    fn apply(&mut self, attribute: &str, kind: BatchKind, wire: Option<AttributeValue>) {
        let Some(wire) = wire else {
            if kind == BatchKind::Replace {
                self.attributes.remove(attribute);
            }
            return;
        };

        match kind {
            BatchKind::Replace => self.attributes.insert(attribute, wire),
            BatchKind::Add => match self.attributes.get_mut(attribute) {
                Some(existing) => append_values(existing, wire.into_values()),
                None => self.attributes.insert(attribute, wire),
            },
            BatchKind::Remove => {
                if let Some(existing) = self.attributes.get_mut(attribute) {
                    remove_values(existing, &wire.into_values());
                }
            }
        }
    }
}

fn append_values(existing: &mut AttributeValue, values: Vec<String>) {
    let mut current = match std::mem::take(existing) {
        AttributeValue::Single(value) if value.is_empty() => Vec::new(),
        other => other.into_values(),
    };
    current.extend(values);
    *existing = AttributeValue::Multi(current);
}

fn remove_values(existing: &mut AttributeValue, values: &[String]) {
    match existing {
        AttributeValue::Single(value) => value.clear(),
        AttributeValue::Multi(current) => {
            for value in values {
                if let Some(idx) = current.iter().position(|stored| stored == value) {
                    current.remove(idx);
                }
            }
        }
    }
}

impl fmt::Debug for LdapObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LdapObject")
            .field("dn", &self.dn)
            .field("object_type", &self.object_type)
            .field("category", &self.category)
            .field("object_classes", &self.object_classes)
            .field("operation", &self.operation)
            .field("attributes", &self.attributes)
            .field("batch", &self.batch)
            .finish_non_exhaustive()
    }
}

/// Builder for [`LdapObject`].
#[must_use]
pub struct LdapObjectBuilder {
    dn: Option<String>,
    attributes: AttributeMap,
    object_classes: Vec<String>,
    category: String,
    object_type: String,
    operation: OperationKind,
    schema: Option<Arc<AttributeSchema>>,
    last_values: Option<Arc<dyn LastValueProvider>>,
}

impl LdapObjectBuilder {
    /// Sets the distinguished name.
    pub fn dn(mut self, dn: impl Into<String>) -> Self {
        self.dn = Some(dn.into());
        self
    }

    /// Loads attributes without recording batch modifications.
    pub fn attributes<I, K, V>(mut self, attributes: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<AttributeValue>,
    {
        for (name, value) in attributes {
            self.attributes.insert(name.as_ref(), value.into());
        }
        self
    }

    /// Sets the object classes.
    pub fn object_classes<C, S>(mut self, classes: C) -> Self
    where
        C: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.object_classes = classes.into_iter().map(Into::into).collect();
        self
    }

    /// Sets the category.
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    /// Sets the operation the object is prepared for (defaults to [`OperationKind::Modify`]).
    pub fn operation(mut self, operation: OperationKind) -> Self {
        self.operation = operation;
        self
    }

    /// Attaches the converter schema.
    pub fn schema(mut self, schema: Arc<AttributeSchema>) -> Self {
        self.schema = Some(schema);
        self
    }

    /// Attaches the source of server-side values.
    pub fn last_value_provider(mut self, provider: Arc<dyn LastValueProvider>) -> Self {
        self.last_values = Some(provider);
        self
    }

    /// Builds the object with an empty change-set.
    #[must_use]
    pub fn build(self) -> LdapObject {
        LdapObject {
            dn: self.dn,
            attributes: self.attributes,
            object_classes: self.object_classes,
            category: self.category,
            object_type: self.object_type,
            operation: self.operation,
            schema: self.schema,
            last_values: self.last_values,
            batch: BatchCollection::new(),
        }
    }
}
