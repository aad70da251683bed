//! LDAP GeneralizedTime (`YYYYMMDDHHMMSS[.fraction]Z`).

use super::{single_wire_value, unexpected_value, AttributeConverter, ConversionContext};
use chrono::{DateTime, NaiveDateTime, TimeDelta, Utc};
use ldap_object_core::value::GENERALIZED_TIME_FORMAT;
use ldap_object_core::{AttributeValue, DomainValue, Error, Result};

/// Converts between GeneralizedTime strings and [`DomainValue::Timestamp`].
#[derive(Debug, Clone, Copy, Default)]
pub struct GeneralizedTimeConverter;

impl GeneralizedTimeConverter {
    /// Registry name of the converter.
    pub const NAME: &'static str = "generalized_time";
}

impl AttributeConverter for GeneralizedTimeConverter {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn to_ldap(
        &self,
        value: &DomainValue,
        context: &ConversionContext<'_>,
    ) -> Result<AttributeValue> {
        let timestamp = match value {
            DomainValue::Timestamp(timestamp) => *timestamp,
            DomainValue::Text(text) => DateTime::parse_from_rfc3339(text)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|_| unexpected_value(Self::NAME, context.attribute(), value))?,
            _ => return Err(unexpected_value(Self::NAME, context.attribute(), value)),
        };

        Ok(AttributeValue::Single(
            timestamp.format(GENERALIZED_TIME_FORMAT).to_string(),
        ))
    }

    fn from_ldap(
        &self,
        value: &AttributeValue,
        context: &ConversionContext<'_>,
    ) -> Result<DomainValue> {
        let raw = single_wire_value(value, context.attribute())?;
        parse_generalized_time(raw)
            .map(DomainValue::Timestamp)
            .ok_or_else(|| {
                Error::InvalidRequest(format!(
                    "attribute `{}` holds an invalid GeneralizedTime `{raw}`",
                    context.attribute()
                ))
            })
    }
}

fn parse_generalized_time(value: &str) -> Option<DateTime<Utc>> {
    let body = value.trim().strip_suffix(['Z', 'z'])?;
    let (seconds, fraction) = match body.find(['.', ',']) {
        Some(idx) => (&body[..idx], Some(&body[idx + 1..])),
        None => (body, None),
    };

    let base = NaiveDateTime::parse_from_str(seconds, "%Y%m%d%H%M%S").ok()?;
    let nanos = match fraction {
        None => 0,
        Some(digits) if digits.is_empty() || digits.len() > 9 => return None,
        Some(digits) if !digits.bytes().all(|b| b.is_ascii_digit()) => return None,
        Some(digits) => format!("{digits:0<9}").parse::<i64>().ok()?,
    };

    Some((base + TimeDelta::nanoseconds(nanos)).and_utc())
}
