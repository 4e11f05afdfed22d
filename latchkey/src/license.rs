//! The license entity and its canonical signable payload.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, Utc};

/// Leading tag of every canonical payload, so payloads from future
/// incompatible encodings can never collide with this one.
const PAYLOAD_TAG: &[u8] = b"latchkey.payload.v1";

/// A record of entitlement terms: validity window, vendor-defined
/// properties, and optional hardware locks.
///
/// A license is built unsigned by the issuer, populated, signed exactly
/// once, then treated as immutable. Verifiers reconstruct an equivalent
/// license purely by decoding; they never re-sign.
///
/// Properties and hardware addresses live in sorted collections so the
/// canonical payload is independent of insertion order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct License {
    created_at: DateTime<Utc>,
    starts_at: Option<DateTime<Utc>>,
    expires_at: Option<DateTime<Utc>>,
    floating_expiry_ms: Option<i64>,
    properties: BTreeMap<String, String>,
    hardware_addresses: BTreeSet<String>,
    signature: Option<Vec<u8>>,
}

impl License {
    /// Creates an unsigned license created now.
    #[must_use]
    pub fn new() -> Self {
        Self::with_created_at(Utc::now())
    }

    /// Creates an unsigned license with an explicit creation timestamp.
    /// The creation date is immutable after construction.
    #[must_use]
    pub fn with_created_at(created_at: DateTime<Utc>) -> Self {
        Self {
            created_at: truncate_to_millis(created_at),
            starts_at: None,
            expires_at: None,
            floating_expiry_ms: None,
            properties: BTreeMap::new(),
            hardware_addresses: BTreeSet::new(),
            signature: None,
        }
    }

    /// When the license was issued.
    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Start of the validity window, if one was set. Validity otherwise
    /// begins at creation.
    #[must_use]
    pub fn start_date(&self) -> Option<DateTime<Utc>> {
        self.starts_at
    }

    pub fn set_start_date(&mut self, date: DateTime<Utc>) {
        self.starts_at = Some(truncate_to_millis(date));
    }

    /// Absolute expiration date, if one was set. An unset expiration
    /// means the license never expires by calendar date.
    #[must_use]
    pub fn expiration_date(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    pub fn set_expiration_date(&mut self, date: DateTime<Utc>) {
        self.expires_at = Some(truncate_to_millis(date));
    }

    /// Milliseconds after the first validated use at which the license
    /// expires, if floating expiration was set. Tracked independently of
    /// the absolute expiration date; the earlier bound wins.
    #[must_use]
    pub fn floating_expiry(&self) -> Option<i64> {
        self.floating_expiry_ms
    }

    pub fn set_floating_expiry(&mut self, millis: i64) {
        self.floating_expiry_ms = Some(millis);
    }

    /// Vendor-defined entitlement metadata, sorted by key.
    #[must_use]
    pub fn properties(&self) -> &BTreeMap<String, String> {
        &self.properties
    }

    /// Looks up a single property value.
    #[must_use]
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties.get(key).map(String::as_str)
    }

    pub fn add_property(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.properties.insert(key.into(), value.into());
    }

    /// Hardware identifiers this license is locked to, normalized and
    /// sorted. An empty set means the license is not hardware-locked.
    #[must_use]
    pub fn hardware_addresses(&self) -> &BTreeSet<String> {
        &self.hardware_addresses
    }

    pub fn add_hardware_address(&mut self, address: impl AsRef<str>) {
        let normalized = normalize_hardware_address(address.as_ref());
        if !normalized.is_empty() {
            self.hardware_addresses.insert(normalized);
        }
    }

    /// Raw signature bytes, absent until the license is signed.
    #[must_use]
    pub fn signature(&self) -> Option<&[u8]> {
        self.signature.as_deref()
    }

    #[must_use]
    pub fn is_signed(&self) -> bool {
        self.signature.is_some()
    }

    pub(crate) fn set_signature(&mut self, signature: Vec<u8>) {
        self.signature = Some(signature);
    }

    /// Deterministic byte encoding of the signable fields, excluding the
    /// signature itself.
    ///
    /// Each field is framed as length-prefixed name and value bytes in a
    /// fixed order: creation date, start date, expiration date, floating
    /// period, properties (by key), hardware addresses. Two licenses with
    /// identical terms always produce identical payloads.
    #[must_use]
    pub fn canonical_payload(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(PAYLOAD_TAG);

        push_field(&mut buf, "created", &self.created_at.timestamp_millis().to_le_bytes());
        if let Some(date) = self.starts_at {
            push_field(&mut buf, "start", &date.timestamp_millis().to_le_bytes());
        }
        if let Some(date) = self.expires_at {
            push_field(&mut buf, "expires", &date.timestamp_millis().to_le_bytes());
        }
        if let Some(millis) = self.floating_expiry_ms {
            push_field(&mut buf, "float", &millis.to_le_bytes());
        }
        for (key, value) in &self.properties {
            push_field(&mut buf, &format!("prop.{key}"), value.as_bytes());
        }
        for address in &self.hardware_addresses {
            push_field(&mut buf, "hw", address.as_bytes());
        }

        buf
    }
}

impl Default for License {
    fn default() -> Self {
        Self::new()
    }
}

/// Appends one length-prefixed name/value field to the payload buffer.
fn push_field(buf: &mut Vec<u8>, name: &str, value: &[u8]) {
    buf.extend_from_slice(&(name.len() as u64).to_le_bytes());
    buf.extend_from_slice(name.as_bytes());
    buf.extend_from_slice(&(value.len() as u64).to_le_bytes());
    buf.extend_from_slice(value);
}

/// Canonical form used for hardware address comparison: trimmed and
/// lowercased, so `" AA:BB:CC:DD:EE:FF "` and `aa:bb:cc:dd:ee:ff` match.
pub(crate) fn normalize_hardware_address(address: &str) -> String {
    address.trim().to_ascii_lowercase()
}

/// Drops sub-millisecond precision so stored timestamps survive the
/// millisecond-granularity file format unchanged.
fn truncate_to_millis(date: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(date.timestamp_millis()).unwrap_or(date)
}
