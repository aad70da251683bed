//! LDAP boolean syntax (`TRUE` / `FALSE`).

use super::{single_wire_value, unexpected_value, AttributeConverter, ConversionContext};
use ldap_object_core::value::ldap_bool;
use ldap_object_core::{AttributeValue, DomainValue, Error, Result};

/// Converts between LDAP boolean strings and [`DomainValue::Bool`].
#[derive(Debug, Clone, Copy, Default)]
pub struct BooleanConverter;

impl BooleanConverter {
    /// Registry name of the converter.
    pub const NAME: &'static str = "bool";
}

impl AttributeConverter for BooleanConverter {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn to_ldap(
        &self,
        value: &DomainValue,
        context: &ConversionContext<'_>,
    ) -> Result<AttributeValue> {
        let flag = match value {
            DomainValue::Bool(flag) => Some(*flag),
            DomainValue::Integer(number) => Some(*number != 0),
            DomainValue::Text(text) => parse_bool(text),
            _ => None,
        }
        .ok_or_else(|| unexpected_value(Self::NAME, context.attribute(), value))?;

        Ok(AttributeValue::Single(ldap_bool(flag).to_string()))
    }

    fn from_ldap(
        &self,
        value: &AttributeValue,
        context: &ConversionContext<'_>,
    ) -> Result<DomainValue> {
        let raw = single_wire_value(value, context.attribute())?;
        parse_bool(raw).map(DomainValue::Bool).ok_or_else(|| {
            Error::InvalidRequest(format!(
                "attribute `{}` holds a non-boolean value `{raw}`",
                context.attribute()
            ))
        })
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    let value = value.trim();
    if ["true", "1", "yes"]
        .iter()
        .any(|candidate| value.eq_ignore_ascii_case(candidate))
    {
        Some(true)
    } else if ["false", "0", "no"]
        .iter()
        .any(|candidate| value.eq_ignore_ascii_case(candidate))
    {
        Some(false)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converter::ConverterOptions;

    #[test]
    fn converts_to_ldap_syntax() {
        let options = ConverterOptions::new();
        let context = ConversionContext::new("enabled", &options);

        assert_eq!(
            BooleanConverter.to_ldap(&DomainValue::Bool(true), &context).unwrap(),
            AttributeValue::from("TRUE")
        );
        assert_eq!(
            BooleanConverter.to_ldap(&DomainValue::from("no"), &context).unwrap(),
            AttributeValue::from("FALSE")
        );
        assert!(BooleanConverter
            .to_ldap(&DomainValue::from("maybe"), &context)
            .is_err());
    }

    #[test]
    fn parses_wire_values_leniently() {
        let options = ConverterOptions::new();
        let context = ConversionContext::new("enabled", &options);

        for (wire, expected) in [("TRUE", true), ("true", true), ("1", true), ("FALSE", false)] {
            assert_eq!(
                BooleanConverter
                    .from_ldap(&AttributeValue::from(wire), &context)
                    .unwrap(),
                DomainValue::Bool(expected)
            );
        }

        let err = BooleanConverter
            .from_ldap(&AttributeValue::from("enabled"), &context)
            .unwrap_err();
        assert!(matches!(err, Error::InvalidRequest(_)));
    }
}
