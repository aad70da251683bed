//! Enumerated values: friendly names on the domain side, fixed codes on the wire.

use super::{unexpected_value, AttributeConverter, ConversionContext};
use ldap_object_core::{AttributeValue, DomainValue, Error, Result};
use serde_json::{Map, Value};

/// Option holding, per logical attribute, the domain name to wire value map.
pub const VALUE_MAP_OPTION: &str = "valueMap";

/// Maps enumerated names to wire values and back, per attribute.
///
/// Options: `valueMap` is `{ attribute: { name: wireValue } }`. Names match case-insensitively,
/// wire values exactly (falling back to case-insensitive).
#[derive(Debug, Clone, Copy, Default)]
pub struct EnumerationConverter;

impl EnumerationConverter {
    /// Registry name of the converter.
    pub const NAME: &'static str = "enum";

    fn value_map<'o>(context: &'o ConversionContext<'_>) -> Result<&'o Map<String, Value>> {
        context
            .options()
            .mapped(VALUE_MAP_OPTION, context.attribute())?
            .as_object()
            .ok_or_else(|| {
                Error::ConfigError(format!(
                    "`{VALUE_MAP_OPTION}` entry for attribute `{}` is not a map",
                    context.attribute()
                ))
            })
    }

    fn encode(map: &Map<String, Value>, name: &str, attribute: &str) -> Result<String> {
        map.iter()
            .find(|(candidate, _)| candidate.eq_ignore_ascii_case(name))
            .map(|(_, wire)| wire_string(wire))
            .ok_or_else(|| {
                Error::InvalidRequest(format!(
                    "`{name}` is not a valid value for attribute `{attribute}`"
                ))
            })
    }

    fn decode(map: &Map<String, Value>, wire: &str, attribute: &str) -> Result<String> {
        map.iter()
            .find(|(_, candidate)| wire_string(candidate) == wire)
            .or_else(|| {
                map.iter()
                    .find(|(_, candidate)| wire_string(candidate).eq_ignore_ascii_case(wire))
            })
            .map(|(name, _)| name.clone())
            .ok_or_else(|| {
                Error::InvalidRequest(format!(
                    "attribute `{attribute}` holds an unmapped value `{wire}`"
                ))
            })
    }
}

impl AttributeConverter for EnumerationConverter {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn to_ldap(
        &self,
        value: &DomainValue,
        context: &ConversionContext<'_>,
    ) -> Result<AttributeValue> {
        let map = Self::value_map(context)?;
        let attribute = context.attribute();
        match value {
            DomainValue::Text(name) => Self::encode(map, name, attribute).map(AttributeValue::Single),
            DomainValue::List(names) => names
                .iter()
                .map(|name| Self::encode(map, name, attribute))
                .collect::<Result<Vec<_>>>()
                .map(AttributeValue::Multi),
            _ => Err(unexpected_value(Self::NAME, attribute, value)),
        }
    }

    fn from_ldap(
        &self,
        value: &AttributeValue,
        context: &ConversionContext<'_>,
    ) -> Result<DomainValue> {
        let map = Self::value_map(context)?;
        let attribute = context.attribute();
        match value {
            AttributeValue::Single(wire) => Self::decode(map, wire, attribute).map(DomainValue::Text),
            AttributeValue::Multi(wires) => wires
                .iter()
                .map(|wire| Self::decode(map, wire, attribute))
                .collect::<Result<Vec<_>>>()
                .map(DomainValue::List),
        }
    }
}

fn wire_string(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converter::ConverterOptions;
    use serde_json::json;

    fn options() -> ConverterOptions {
        ConverterOptions::new().with(
            VALUE_MAP_OPTION,
            json!({
                "groupType": {
                    "distribution": 2,
                    "security": "-2147483646",
                },
            }),
        )
    }

    #[test]
    fn encodes_names() {
        let options = options();
        let context = ConversionContext::new("groupType", &options);

        assert_eq!(
            EnumerationConverter
                .to_ldap(&DomainValue::from("Security"), &context)
                .unwrap(),
            AttributeValue::from("-2147483646")
        );
        assert_eq!(
            EnumerationConverter
                .to_ldap(&DomainValue::from(vec!["distribution"]), &context)
                .unwrap(),
            AttributeValue::from(vec!["2"])
        );
    }

    #[test]
    fn decodes_wire_values() {
        let options = options();
        let context = ConversionContext::new("grouptype", &options);

        assert_eq!(
            EnumerationConverter
                .from_ldap(&AttributeValue::from("2"), &context)
                .unwrap(),
            DomainValue::from("distribution")
        );
    }

    #[test]
    fn rejects_unknown_values_and_attributes() {
        let options = options();
        let context = ConversionContext::new("groupType", &options);
        assert!(matches!(
            EnumerationConverter.to_ldap(&DomainValue::from("universal"), &context),
            Err(Error::InvalidRequest(_))
        ));

        let context = ConversionContext::new("accountType", &options);
        assert!(matches!(
            EnumerationConverter.from_ldap(&AttributeValue::from("2"), &context),
            Err(Error::ConfigError(_))
        ));
    }
}
