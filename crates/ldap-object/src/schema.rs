//! Converter bindings supplied by the schema.
//!
//! Schema files are parsed elsewhere; this module only accepts their deserialized form
//! ([`SchemaConfig`]), validates it and resolves converter names through a
//! [`ConverterRegistry`] into an [`AttributeSchema`] that objects consult on every access.

use crate::attributes::normalize;
use crate::converter::{
    AttributeConverter, BooleanConverter, ConversionContext, ConverterOptions,
    EnumerationConverter, GeneralizedTimeConverter, OperationKind, UserAccountControlConverter,
};
use ldap_object_core::{AttributeValue, Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use tracing::debug;
use validator::Validate;

/// Deserialized schema for one object type.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct SchemaConfig {
    /// Logical object type (for example `user`).
    #[validate(length(min = 1))]
    #[serde(rename = "type")]
    pub object_type: String,

    /// Directory category (`objectCategory`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// Object classes entries of this type carry.
    #[serde(default)]
    pub object_classes: Vec<String>,

    /// Converter bindings.
    #[validate(nested)]
    #[serde(default)]
    pub converters: Vec<ConverterBindingConfig>,
}

/// Binds one converter, with its options, to a set of logical attributes.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ConverterBindingConfig {
    /// Registry name of the converter.
    #[validate(length(min = 1))]
    pub converter: String,

    /// Options layered over the converter's defaults.
    #[serde(default)]
    pub options: ConverterOptions,

    /// Logical attribute name to the wire attribute it is stored in.
    #[validate(length(min = 1))]
    pub attributes: BTreeMap<String, String>,
}

impl SchemaConfig {
    /// Creates an empty schema for `object_type`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValidationError`] if the type is empty.
    pub fn new(object_type: impl Into<String>) -> Result<Self> {
        let config = Self {
            object_type: object_type.into(),
            category: None,
            object_classes: Vec::new(),
            converters: Vec::new(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Parses and validates a schema from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] for malformed JSON and [`Error::ValidationError`] for a
    /// schema that fails validation.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Sets the category.
    #[must_use]
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Sets the object classes.
    #[must_use]
    pub fn with_object_classes<I, S>(mut self, classes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.object_classes = classes.into_iter().map(Into::into).collect();
        self
    }

    /// Adds a converter binding.
    #[must_use]
    pub fn with_converter(mut self, binding: ConverterBindingConfig) -> Self {
        self.converters.push(binding);
        self
    }
}

impl ConverterBindingConfig {
    /// Creates a binding for `converter` with no options and no attributes.
    #[must_use]
    pub fn new(converter: impl Into<String>) -> Self {
        Self {
            converter: converter.into(),
            options: ConverterOptions::new(),
            attributes: BTreeMap::new(),
        }
    }

    /// Sets the converter options.
    #[must_use]
    pub fn with_options(mut self, options: ConverterOptions) -> Self {
        self.options = options;
        self
    }

    /// Binds `attribute`, stored in the wire attribute `ldap_attribute`.
    #[must_use]
    pub fn with_attribute(
        mut self,
        attribute: impl Into<String>,
        ldap_attribute: impl Into<String>,
    ) -> Self {
        self.attributes.insert(attribute.into(), ldap_attribute.into());
        self
    }
}

/// Converter instances by name.
#[derive(Clone, Default)]
pub struct ConverterRegistry {
    converters: HashMap<String, Arc<dyn AttributeConverter>>,
}

impl ConverterRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a registry holding the built-in converters.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(UserAccountControlConverter);
        registry.register(BooleanConverter);
        registry.register(EnumerationConverter);
        registry.register(GeneralizedTimeConverter);
        registry
    }

    /// Registers `converter` under its own name, replacing any previous entry.
    pub fn register<C>(&mut self, converter: C)
    where
        C: AttributeConverter + 'static,
    {
        self.converters
            .insert(converter.name().to_string(), Arc::new(converter));
    }

    /// Looks up a converter by name.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigError`] for an unknown name.
    pub fn get(&self, name: &str) -> Result<Arc<dyn AttributeConverter>> {
        self.converters
            .get(name)
            .cloned()
            .ok_or_else(|| Error::ConfigError(format!("unknown attribute converter `{name}`")))
    }

    /// Registered converter names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.converters.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConverterRegistry")
            .field("converters", &self.names())
            .finish()
    }
}

/// A logical attribute bound to a converter.
#[derive(Debug, Clone)]
pub struct AttributeBinding {
    attribute: String,
    ldap_attribute: String,
    converter: Arc<dyn AttributeConverter>,
    options: ConverterOptions,
}

impl AttributeBinding {
    /// Logical attribute name as declared in the schema.
    #[must_use]
    pub fn attribute(&self) -> &str {
        &self.attribute
    }

    /// Wire attribute the converted value is stored in.
    #[must_use]
    pub fn ldap_attribute(&self) -> &str {
        &self.ldap_attribute
    }

    /// The bound converter.
    #[must_use]
    pub fn converter(&self) -> &dyn AttributeConverter {
        self.converter.as_ref()
    }

    /// Converter options (defaults merged with the schema's options).
    #[must_use]
    pub const fn options(&self) -> &ConverterOptions {
        &self.options
    }

    /// Builds a conversion context for this binding.
    #[must_use]
    pub fn context(
        &self,
        operation: OperationKind,
        last_value: Option<AttributeValue>,
    ) -> ConversionContext<'_> {
        ConversionContext::new(&self.attribute, &self.options)
            .with_operation(operation)
            .with_last_value(last_value)
    }
}

/// Resolved schema: classification plus case-insensitive converter bindings.
#[derive(Debug, Clone)]
pub struct AttributeSchema {
    object_type: String,
    category: Option<String>,
    object_classes: Vec<String>,
    bindings: HashMap<String, AttributeBinding>,
}

impl AttributeSchema {
    /// Resolves `config` against `registry`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ValidationError`] for an invalid config and [`Error::ConfigError`] for
    /// unknown converters or an attribute bound twice.
    pub fn from_config(config: &SchemaConfig, registry: &ConverterRegistry) -> Result<Self> {
        config.validate()?;

        let mut bindings = HashMap::new();
        for binding in &config.converters {
            let converter = registry.get(&binding.converter)?;
            let options = converter.default_options().merged(&binding.options);

            for (attribute, ldap_attribute) in &binding.attributes {
                let key = normalize(attribute);
                if bindings.contains_key(&key) {
                    return Err(Error::ConfigError(format!(
                        "attribute `{attribute}` is bound to more than one converter"
                    )));
                }
                debug!(
                    object_type = %config.object_type,
                    attribute = %attribute,
                    ldap_attribute = %ldap_attribute,
                    converter = converter.name(),
                    "bound attribute converter"
                );
                bindings.insert(
                    key,
                    AttributeBinding {
                        attribute: attribute.clone(),
                        ldap_attribute: ldap_attribute.clone(),
                        converter: Arc::clone(&converter),
                        options: options.clone(),
                    },
                );
            }
        }

        Ok(Self {
            object_type: config.object_type.clone(),
            category: config.category.clone(),
            object_classes: config.object_classes.clone(),
            bindings,
        })
    }

    /// Logical object type.
    #[must_use]
    pub fn object_type(&self) -> &str {
        &self.object_type
    }

    /// Directory category, if declared.
    #[must_use]
    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    /// Object classes.
    #[must_use]
    pub fn object_classes(&self) -> &[String] {
        &self.object_classes
    }

    /// Binding for `attribute` (case-insensitive).
    #[must_use]
    pub fn binding(&self, attribute: &str) -> Option<&AttributeBinding> {
        self.bindings.get(&normalize(attribute))
    }
}
