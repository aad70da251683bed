//! Integration tests for directory objects, with and without a converter schema.
//!
//! The schema comes from a JSON fixture shaped like the files a deployment would ship.

use chrono::{TimeZone, Utc};
use ldap3::Mod;
use ldap_object::{
    AttributeSchema, AttributeValue, BatchKind, CallOutcome, ConverterRegistry, DomainValue,
    Error, LastValueProvider, LdapObject, SchemaConfig,
};
use mockall::mock;
use serde_json::json;
use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

mock! {
    Directory {}

    impl LastValueProvider for Directory {
        fn last_value(&self, dn: &str, attribute: &str) -> ldap_object::Result<Option<AttributeValue>>;
    }
}

/// Get the path to the test fixtures directory.
fn fixtures_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
}

/// Load and resolve the user schema fixture.
fn load_user_schema() -> Arc<AttributeSchema> {
    let fixture_path = fixtures_dir().join("user_schema.json");
    let json = fs::read_to_string(&fixture_path).unwrap_or_else(|e| {
        panic!(
            "Failed to read schema fixture at {}: {}",
            fixture_path.display(),
            e
        )
    });

    let config = SchemaConfig::from_json(&json)
        .unwrap_or_else(|e| panic!("Failed to parse schema fixture: {e}"));
    Arc::new(AttributeSchema::from_config(&config, &ConverterRegistry::with_defaults()).unwrap())
}

fn chad() -> LdapObject {
    LdapObject::new(
        [
            ("firstName", "Chad"),
            ("lastName", "Sikorra"),
            ("emailAddress", "chad.sikorra@example.com"),
        ],
        ["top", "organizationalPerson", "user"],
        "user",
        "user",
    )
}

#[test]
fn test_plain_object_lifecycle() {
    let mut user = chad();

    assert_eq!(user.call("getFirstName", None).unwrap(), CallOutcome::Value("Chad".into()));
    assert!(matches!(user.call("getFoo", None), Err(Error::InvalidAttribute(_))));
    assert_eq!(
        user.call("hasFoo", Some("bar".into())).unwrap(),
        CallOutcome::Exists(false)
    );

    user.call("removeLastName", Some("Sikorra".into())).unwrap();
    assert_eq!(user.get("lastName").unwrap(), "");

    user.call("addEmailAddress", Some("foo@bar.com".into()))
        .unwrap();
    let email = user.get("emailAddress").unwrap();
    assert!(email.contains("chad.sikorra@example.com"));
    assert!(email.contains("foo@bar.com"));

    assert_eq!(user.batch_modifications().len(), 2);
    user.clear_batch_modifications();
    assert!(user.batch_modifications().is_empty());
}

#[test]
fn test_batch_modifications_count_and_order() {
    let mut user = chad();
    user.add("firstName", "Foo").unwrap();
    user.remove("lastName", "Sikorra").unwrap();
    user.reset("emailAddress").unwrap();
    user.set("phoneNumber", "555-5555").unwrap();

    let batches = user.batch_modifications();
    assert_eq!(batches.len(), 4);
    assert_eq!(batches[0].kind(), BatchKind::Add);
    assert_eq!(batches[1].kind(), BatchKind::Remove);
    assert!(batches[2].is_reset());
    assert_eq!(batches[3].attribute(), "phoneNumber");
    assert_eq!(batches[3].values(), ["555-5555".to_string()]);
}

#[test]
fn test_schema_fixture_classification() {
    let schema = load_user_schema();
    let user = LdapObject::from_schema(Arc::clone(&schema)).build();

    assert!(user.is_type("USER"));
    assert!(user.is_category("person"));
    assert!(user.is_class("organizationalPerson"));
    assert_eq!(
        schema.binding("smartcardrequired").unwrap().ldap_attribute(),
        "userAccountControl"
    );
}

#[test]
fn test_flags_share_one_replace_with_server_value() {
    let mut directory = MockDirectory::new();
    directory
        .expect_last_value()
        .withf(|dn, attribute| dn == "cn=Chad,dc=example,dc=local" && attribute == "userAccountControl")
        .times(1)
        .returning(|_, _| Ok(Some(AttributeValue::from("512"))));

    let mut user = LdapObject::from_schema(load_user_schema())
        .dn("cn=Chad,dc=example,dc=local")
        .last_value_provider(Arc::new(directory))
        .build();

    user.call("setDisabled", Some(true.into())).unwrap();
    user.call("setSmartCardRequired", Some(true.into())).unwrap();
    user.call("setDisabled", Some(false.into())).unwrap();

    assert_eq!(user.get("disabled").unwrap(), DomainValue::Bool(false));
    assert_eq!(user.get("smartCardRequired").unwrap(), DomainValue::Bool(true));
    assert_eq!(user.get("passwordNeverExpires").unwrap(), DomainValue::Bool(false));

    assert_eq!(
        serde_json::to_value(user.batch()).unwrap(),
        json!([{ "attribute": "userAccountControl", "kind": "replace", "values": ["262656"] }])
    );

    let mods = user.batch().to_ldap_mods();
    assert_eq!(mods.len(), 1);
    match &mods[0] {
        Mod::Replace(attribute, values) => {
            assert_eq!(attribute, "userAccountControl");
            assert!(values.contains("262656"));
            assert_eq!(values.len(), 1);
        }
        other => panic!("expected a replace, got {other:?}"),
    }
}

#[test]
fn test_flag_rejects_value_level_changes() {
    let mut user = LdapObject::from_schema(load_user_schema())
        .attributes([("userAccountControl", "512")])
        .build();

    assert!(matches!(
        user.remove("disabled", false),
        Err(Error::UnsupportedBatch { .. })
    ));
    assert!(matches!(
        user.set("disabled", "sometimes"),
        Err(Error::InvalidRequest(_))
    ));
    assert_eq!(user.get("userAccountControl").unwrap(), "512");
    assert!(user.batch_modifications().is_empty());
}

#[test]
fn test_time_and_enumerated_attributes() {
    let mut user = LdapObject::from_schema(load_user_schema())
        .attributes([
            ("whenCreated", "20150112180344.0Z"),
            ("sAMAccountType", "805306368"),
        ])
        .build();

    assert_eq!(
        user.get("created").unwrap(),
        DomainValue::Timestamp(Utc.with_ymd_and_hms(2015, 1, 12, 18, 3, 44).unwrap())
    );
    assert_eq!(user.get("accountType").unwrap(), "normal");

    user.set("accountType", "machine").unwrap();
    assert_eq!(user.get("sAMAccountType").unwrap(), "805306369");
    assert!(user.has_value("accountType", "machine"));
    assert_eq!(user.batch_modifications()[0].attribute(), "sAMAccountType");
}
