//! Shared test helpers for latchkey tests.

#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use latchkey::{KeyPair, License, LicenseSigner, SigningKey};

/// Returns a deterministic Ed25519 key pair from a fixed seed.
pub fn test_keypair() -> KeyPair {
    let seed: [u8; 32] = [
        1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22, 23, 24,
        25, 26, 27, 28, 29, 30, 31, 32,
    ];
    KeyPair::from_signing_key(SigningKey::from_bytes(&seed))
}

/// Midnight UTC on the given day.
pub fn date(year: i32, month: u32, day: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, 0, 0, 0).unwrap()
}

/// An unsigned license created on 2024-01-01 with a `tier=pro` property.
pub fn pro_license() -> License {
    let mut license = License::with_created_at(date(2024, 1, 1));
    license.add_property("tier", "pro");
    license
}

/// Signs `license` in place with the pair's secret key.
pub fn sign(pair: &KeyPair, license: &mut License) {
    LicenseSigner::new(pair.signing_key.clone()).sign(license);
}
