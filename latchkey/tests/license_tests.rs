mod common;

use common::{date, pro_license, sign, test_keypair};
use latchkey::{
    export_license, export_license_to, import_license, import_license_from, License,
};
use pretty_assertions::assert_eq;
use tempfile::tempdir;

fn full_license() -> License {
    let mut license = pro_license();
    license.set_start_date(date(2024, 1, 1));
    license.set_expiration_date(date(2024, 12, 31));
    license.set_floating_expiry(30 * 24 * 60 * 60 * 1000);
    license.add_property("seats", "5");
    license.add_hardware_address("AA:BB:CC:DD:EE:FF");
    license.add_hardware_address("11:22:33:44:55:66");
    license
}

#[test]
fn file_roundtrip_preserves_all_fields() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("full.lic");

    let mut license = full_license();
    sign(&test_keypair(), &mut license);

    export_license(&license, &path).unwrap();
    let restored = import_license(&path).unwrap();

    assert_eq!(license, restored);
}

#[test]
fn minimal_license_roundtrip() {
    let license = License::with_created_at(date(2024, 3, 15));

    let mut buf = Vec::new();
    export_license_to(&license, &mut buf).unwrap();
    let restored = import_license_from(buf.as_slice()).unwrap();

    assert_eq!(license, restored);
    assert!(restored.start_date().is_none());
    assert!(restored.expiration_date().is_none());
    assert!(restored.floating_expiry().is_none());
    assert!(restored.properties().is_empty());
    assert!(restored.hardware_addresses().is_empty());
    assert!(!restored.is_signed());
}

#[test]
fn unsigned_license_roundtrip_stays_unsigned() {
    let mut buf = Vec::new();
    export_license_to(&full_license(), &mut buf).unwrap();
    let restored = import_license_from(buf.as_slice()).unwrap();
    assert!(!restored.is_signed());
}

#[test]
fn roundtrip_preserves_canonical_payload() {
    let mut license = full_license();
    sign(&test_keypair(), &mut license);

    let mut buf = Vec::new();
    export_license_to(&license, &mut buf).unwrap();
    let restored = import_license_from(buf.as_slice()).unwrap();

    assert_eq!(license.canonical_payload(), restored.canonical_payload());
    assert_eq!(license.signature(), restored.signature());
}

#[test]
fn repeated_export_is_byte_stable() {
    let mut license = full_license();
    sign(&test_keypair(), &mut license);

    let mut first = Vec::new();
    export_license_to(&license, &mut first).unwrap();
    let reimported = import_license_from(first.as_slice()).unwrap();
    let mut second = Vec::new();
    export_license_to(&reimported, &mut second).unwrap();

    assert_eq!(first, second);
}

#[test]
fn properties_accessible_by_key() {
    let license = full_license();
    assert_eq!(license.property("tier"), Some("pro"));
    assert_eq!(license.property("seats"), Some("5"));
    assert_eq!(license.property("absent"), None);
}

#[test]
fn exported_hardware_addresses_are_sorted_and_normalized() {
    let mut buf = Vec::new();
    export_license_to(&full_license(), &mut buf).unwrap();
    let text = String::from_utf8(buf).unwrap();

    let first = text.find("11:22:33:44:55:66").unwrap();
    let second = text.find("aa:bb:cc:dd:ee:ff").unwrap();
    assert!(first < second);
    assert!(!text.contains("AA:BB:CC:DD:EE:FF"));
}
