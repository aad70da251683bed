//! Bit-flag converter for Active Directory `userAccountControl`.
//!
//! Each logical attribute (for example `disabled` or `passwordNeverExpires`) maps to one bit of
//! the integer stored on the server. Toggling a flag needs the current integer so the other bits
//! survive, which is why this converter reads the context's last value and asks for its results
//! to be aggregated into a single replace.

use super::{unexpected_value, AttributeConverter, ConversionContext, ConverterOptions, OperationKind};
use crate::batch::BatchModification;
use ldap_object_core::{AttributeValue, DomainValue, Error, Result};
use serde_json::{json, Value};
use tracing::trace;

/// Option holding the logical attribute to bit mask map.
pub const UAC_MAP_OPTION: &str = "uacMap";
/// Option holding the value assumed when the attribute has no value yet.
pub const DEFAULT_VALUE_OPTION: &str = "defaultValue";

/// Well-known `userAccountControl` bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UserAccountControlFlags;

impl UserAccountControlFlags {
    /// Logon script is executed.
    pub const SCRIPT: i64 = 0x0001;
    /// Account is disabled.
    pub const ACCOUNT_DISABLE: i64 = 0x0002;
    /// Home folder is required.
    pub const HOMEDIR_REQUIRED: i64 = 0x0008;
    /// Account is locked out.
    pub const LOCKOUT: i64 = 0x0010;
    /// No password is required.
    pub const PASSWORD_NOT_REQUIRED: i64 = 0x0020;
    /// User cannot change the password.
    pub const PASSWORD_CANT_CHANGE: i64 = 0x0040;
    /// Encrypted text password is allowed.
    pub const ENCRYPTED_TEXT_PASSWORD_ALLOWED: i64 = 0x0080;
    /// Local user account in another domain.
    pub const TEMP_DUPLICATE_ACCOUNT: i64 = 0x0100;
    /// Default account type.
    pub const NORMAL_ACCOUNT: i64 = 0x0200;
    /// Trust account for a domain that trusts other domains.
    pub const INTERDOMAIN_TRUST_ACCOUNT: i64 = 0x0800;
    /// Computer account for a workstation or member server.
    pub const WORKSTATION_TRUST_ACCOUNT: i64 = 0x1000;
    /// Computer account for a domain controller.
    pub const SERVER_TRUST_ACCOUNT: i64 = 0x2000;
    /// Password never expires.
    pub const DONT_EXPIRE_PASSWORD: i64 = 0x0001_0000;
    /// MNS logon account.
    pub const MNS_LOGON_ACCOUNT: i64 = 0x0002_0000;
    /// Smart card is required for logon.
    pub const SMARTCARD_REQUIRED: i64 = 0x0004_0000;
    /// Trusted for Kerberos delegation.
    pub const TRUSTED_FOR_DELEGATION: i64 = 0x0008_0000;
    /// Security context is never delegated.
    pub const NOT_DELEGATED: i64 = 0x0010_0000;
    /// Only DES encryption types are used.
    pub const USE_DES_KEY_ONLY: i64 = 0x0020_0000;
    /// Kerberos pre-authentication is not required.
    pub const DONT_REQUIRE_PREAUTH: i64 = 0x0040_0000;
    /// Password has expired.
    pub const PASSWORD_EXPIRED: i64 = 0x0080_0000;
    /// Trusted to authenticate for delegation.
    pub const TRUSTED_TO_AUTH_FOR_DELEGATION: i64 = 0x0100_0000;
    /// Read-only domain controller account.
    pub const PARTIAL_SECRETS_ACCOUNT: i64 = 0x0400_0000;
}

/// Converts boolean flags to and from bits of the `userAccountControl` integer.
///
/// Options:
///
/// - `uacMap`: logical attribute name to bit mask.
/// - `defaultValue`: integer assumed when the entry has no value yet (defaults to
///   [`UserAccountControlFlags::NORMAL_ACCOUNT`]).
#[derive(Debug, Clone, Copy, Default)]
pub struct UserAccountControlConverter;

impl UserAccountControlConverter {
    /// Registry name of the converter.
    pub const NAME: &'static str = "user_account_control";

    fn mask(context: &ConversionContext<'_>) -> Result<i64> {
        let value = context
            .options()
            .mapped(UAC_MAP_OPTION, context.attribute())?;
        option_integer(value).ok_or_else(|| {
            Error::ConfigError(format!(
                "bit mask for attribute `{}` is not an integer: {value}",
                context.attribute()
            ))
        })
    }

    fn configured_default(options: &ConverterOptions) -> Result<String> {
        match options.get(DEFAULT_VALUE_OPTION) {
            None => Ok(UserAccountControlFlags::NORMAL_ACCOUNT.to_string()),
            Some(value) => option_integer(value)
                .map(|value| value.to_string())
                .ok_or_else(|| {
                    Error::ConfigError(format!(
                        "option `{DEFAULT_VALUE_OPTION}` is not an integer: {value}"
                    ))
                }),
        }
    }

    fn resolve_last_value(context: &ConversionContext<'_>) -> Result<String> {
        match context.last_value().and_then(AttributeValue::first) {
            Some(value) => Ok(value.to_string()),
            None => Self::configured_default(context.options()),
        }
    }

    fn bit_is_set(value: &str, mask: i64) -> Result<bool> {
        Ok((parse_uac(value)? & mask) != 0)
    }
}

impl AttributeConverter for UserAccountControlConverter {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn default_options(&self) -> ConverterOptions {
        ConverterOptions::new()
            .with(UAC_MAP_OPTION, json!({}))
            .with(DEFAULT_VALUE_OPTION, UserAccountControlFlags::NORMAL_ACCOUNT)
    }

    fn to_ldap(
        &self,
        value: &DomainValue,
        context: &ConversionContext<'_>,
    ) -> Result<AttributeValue> {
        let mask = Self::mask(context)?;
        let enable = value
            .as_bool()
            .ok_or_else(|| unexpected_value(Self::NAME, context.attribute(), value))?;
        let last_value = Self::resolve_last_value(context)?;

        // Bit already in the requested state: hand back the current value untouched.
        if Self::bit_is_set(&last_value, mask)? == enable {
            return Ok(AttributeValue::Single(last_value));
        }

        let current = parse_uac(&last_value)?;
        // XOR only clears here because the short-circuit above proved the bit is set.
        let uac = if enable { current | mask } else { current ^ mask };
        trace!(
            attribute = context.attribute(),
            from = current,
            to = uac,
            "toggled userAccountControl bit"
        );

        Ok(AttributeValue::Single(uac.to_string()))
    }

    fn from_ldap(
        &self,
        value: &AttributeValue,
        context: &ConversionContext<'_>,
    ) -> Result<DomainValue> {
        let mask = Self::mask(context)?;
        let raw = value.first().unwrap_or_default();
        Ok(DomainValue::Bool(Self::bit_is_set(raw, mask)?))
    }

    fn should_aggregate_values(&self, context: &ConversionContext<'_>) -> bool {
        matches!(
            context.operation(),
            OperationKind::Create | OperationKind::Modify
        )
    }

    // Only a replace carrying the folded integer keeps the other bits intact.
    fn is_batch_supported(&self, batch: &BatchModification) -> bool {
        batch.is_type_replace() && !batch.is_reset()
    }

    fn default_value(&self, context: &ConversionContext<'_>) -> Option<AttributeValue> {
        Self::configured_default(context.options())
            .ok()
            .map(AttributeValue::Single)
    }
}

fn option_integer(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}

fn parse_uac(value: &str) -> Result<i64> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(0);
    }
    trimmed.parse().map_err(|_| {
        Error::InvalidRequest(format!("userAccountControl value `{value}` is not an integer"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options() -> ConverterOptions {
        UserAccountControlConverter.default_options().merged(
            &ConverterOptions::new().with(
                UAC_MAP_OPTION,
                json!({
                    "disabled": UserAccountControlFlags::ACCOUNT_DISABLE,
                    "passwordNeverExpires": UserAccountControlFlags::DONT_EXPIRE_PASSWORD,
                    "smartCardRequired": "262144",
                }),
            ),
        )
    }

    fn to_ldap(attribute: &str, value: bool, last: Option<&str>) -> Result<AttributeValue> {
        let options = options();
        let context = ConversionContext::new(attribute, &options)
            .with_operation(OperationKind::Modify)
            .with_last_value(last.map(AttributeValue::from));
        UserAccountControlConverter.to_ldap(&DomainValue::Bool(value), &context)
    }

    fn from_ldap(attribute: &str, value: &str) -> Result<DomainValue> {
        let options = options();
        let context = ConversionContext::new(attribute, &options);
        UserAccountControlConverter.from_ldap(&AttributeValue::from(value), &context)
    }

    #[test]
    fn sets_and_clears_the_disabled_bit() {
        assert_eq!(to_ldap("disabled", true, Some("0")).unwrap(), AttributeValue::from("2"));
        assert_eq!(to_ldap("disabled", true, Some("2")).unwrap(), AttributeValue::from("2"));
        assert_eq!(to_ldap("disabled", false, Some("2")).unwrap(), AttributeValue::from("0"));
    }

    #[test]
    fn unchanged_bit_returns_last_value_verbatim() {
        assert_eq!(
            to_ldap("disabled", false, Some("512")).unwrap(),
            AttributeValue::from("512")
        );
    }

    #[test]
    fn keeps_other_bits_intact() {
        assert_eq!(to_ldap("disabled", true, Some("512")).unwrap(), AttributeValue::from("514"));
        assert_eq!(
            to_ldap("passwordNeverExpires", true, Some("514")).unwrap(),
            AttributeValue::from("66050")
        );
        assert_eq!(
            to_ldap("disabled", false, Some("66050")).unwrap(),
            AttributeValue::from("66048")
        );
    }

    #[test]
    fn uses_default_without_last_value() {
        assert_eq!(to_ldap("disabled", true, None).unwrap(), AttributeValue::from("514"));
        assert_eq!(to_ldap("disabled", false, None).unwrap(), AttributeValue::from("512"));
    }

    #[test]
    fn takes_first_element_of_multi_valued_last_value() {
        let options = options();
        let context = ConversionContext::new("disabled", &options)
            .with_operation(OperationKind::Modify)
            .with_last_value(Some(AttributeValue::from(vec!["512", "0"])));
        let result = UserAccountControlConverter
            .to_ldap(&DomainValue::Bool(true), &context)
            .unwrap();
        assert_eq!(result, AttributeValue::from("514"));
    }

    #[test]
    fn is_idempotent() {
        let first = to_ldap("disabled", true, Some("66048")).unwrap();
        let second = to_ldap("disabled", true, first.first()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn round_trips_regardless_of_other_bits() {
        for last in ["0", "2", "512", "514", "66048", "66050", "8389122"] {
            for attribute in ["disabled", "passwordNeverExpires", "smartCardRequired"] {
                for value in [true, false] {
                    let wire = to_ldap(attribute, value, Some(last)).unwrap();
                    let back = from_ldap(attribute, wire.first().unwrap()).unwrap();
                    assert_eq!(back, DomainValue::Bool(value), "{attribute}={value} from {last}");
                }
            }
        }
    }

    #[test]
    fn reads_bits() {
        assert_eq!(from_ldap("disabled", "514").unwrap(), DomainValue::Bool(true));
        assert_eq!(from_ldap("disabled", "512").unwrap(), DomainValue::Bool(false));
        assert_eq!(from_ldap("smartCardRequired", "262656").unwrap(), DomainValue::Bool(true));
        assert_eq!(from_ldap("disabled", "").unwrap(), DomainValue::Bool(false));
    }

    #[test]
    fn unmapped_attribute_is_a_config_error() {
        assert!(matches!(
            to_ldap("accountExpired", true, Some("512")),
            Err(Error::ConfigError(_))
        ));
        assert!(matches!(
            from_ldap("accountExpired", "512"),
            Err(Error::ConfigError(_))
        ));
    }

    #[test]
    fn rejects_non_numeric_and_non_boolean_values() {
        assert!(matches!(
            to_ldap("disabled", true, Some("abc")),
            Err(Error::InvalidRequest(_))
        ));

        let options = options();
        let context = ConversionContext::new("disabled", &options);
        let result = UserAccountControlConverter.to_ldap(&DomainValue::from("yes"), &context);
        assert!(matches!(result, Err(Error::InvalidRequest(_))));
    }

    #[test]
    fn aggregates_only_for_create_and_modify() {
        let options = options();
        for (operation, expected) in [
            (OperationKind::Create, true),
            (OperationKind::Modify, true),
            (OperationKind::Add, false),
            (OperationKind::Remove, false),
            (OperationKind::None, false),
        ] {
            let context = ConversionContext::new("disabled", &options).with_operation(operation);
            assert_eq!(
                UserAccountControlConverter.should_aggregate_values(&context),
                expected,
                "{operation}"
            );
        }
    }

    #[test]
    fn supports_only_replace_batches() {
        let converter = UserAccountControlConverter;
        assert!(converter.is_batch_supported(&BatchModification::replace(
            "userAccountControl",
            vec!["514".into()]
        )));
        assert!(!converter.is_batch_supported(&BatchModification::add(
            "userAccountControl",
            vec!["2".into()]
        )));
        assert!(!converter.is_batch_supported(&BatchModification::remove(
            "userAccountControl",
            vec!["2".into()]
        )));
        assert!(!converter.is_batch_supported(&BatchModification::reset(
            "userAccountControl"
        )));
    }

    #[test]
    fn default_value_honours_option() {
        let options = ConverterOptions::new().with(DEFAULT_VALUE_OPTION, "4096");
        let context = ConversionContext::new("disabled", &options);
        assert_eq!(
            UserAccountControlConverter.default_value(&context),
            Some(AttributeValue::from("4096"))
        );
    }
}
