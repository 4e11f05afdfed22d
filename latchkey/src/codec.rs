//! License file serialization.
//!
//! Licenses are stored as versioned JSON with millisecond epoch
//! timestamps:
//!
//! ```json
//! {
//!   "format_version": 1,
//!   "created_at": 1704067200000,
//!   "expires_at": 1735603200000,
//!   "properties": { "tier": "pro" },
//!   "hardware_addresses": ["aa:bb:cc:dd:ee:ff"],
//!   "signature": "<base64>"
//! }
//! ```
//!
//! Optional fields are omitted when unset and map back to absent on
//! import. Unknown fields are ignored so older readers tolerate newer
//! writers within the same format version. A missing creation date,
//! garbled signature, or unsupported version is an import error.

use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{LicenseError, LicenseResult};
use crate::license::License;

/// Current license file format version.
pub const FORMAT_VERSION: u32 = 1;

/// On-disk license representation.
#[derive(Serialize, Deserialize)]
struct LicenseFile {
    format_version: u32,
    created_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    starts_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    expires_at: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    floating_expiry_ms: Option<i64>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    properties: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    hardware_addresses: BTreeSet<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    signature: Option<String>,
}

/// Writes a license (including its signature, if present) to `path`.
pub fn export_license(license: &License, path: impl AsRef<Path>) -> LicenseResult<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    export_license_to(license, &mut writer)?;
    writer.flush()?;
    Ok(())
}

/// Writes a license to an arbitrary sink.
pub fn export_license_to(license: &License, mut writer: impl Write) -> LicenseResult<()> {
    let file = LicenseFile {
        format_version: FORMAT_VERSION,
        created_at: license.created_at().timestamp_millis(),
        starts_at: license.start_date().map(|d| d.timestamp_millis()),
        expires_at: license.expiration_date().map(|d| d.timestamp_millis()),
        floating_expiry_ms: license.floating_expiry(),
        properties: license.properties().clone(),
        hardware_addresses: license.hardware_addresses().clone(),
        signature: license.signature().map(|s| BASE64.encode(s)),
    };
    serde_json::to_writer_pretty(&mut writer, &file)
        .map_err(|e| LicenseError::Io(std::io::Error::other(e)))?;
    writer.write_all(b"\n")?;
    Ok(())
}

/// Reads a license from `path`.
///
/// # Errors
///
/// [`LicenseError::Io`] on read failure, [`LicenseError::Import`] on
/// malformed or unsupported data.
pub fn import_license(path: impl AsRef<Path>) -> LicenseResult<License> {
    import_license_from(BufReader::new(File::open(path)?))
}

/// Reads a license from an arbitrary source.
pub fn import_license_from(reader: impl Read) -> LicenseResult<License> {
    let file: LicenseFile = serde_json::from_reader(reader)
        .map_err(|e| LicenseError::Import(format!("malformed license file: {e}")))?;

    if file.format_version > FORMAT_VERSION {
        return Err(LicenseError::Import(format!(
            "unsupported format version {}",
            file.format_version
        )));
    }

    let created_at = timestamp(file.created_at, "creation date")?;
    let mut license = License::with_created_at(created_at);

    if let Some(millis) = file.starts_at {
        license.set_start_date(timestamp(millis, "start date")?);
    }
    if let Some(millis) = file.expires_at {
        license.set_expiration_date(timestamp(millis, "expiration date")?);
    }
    if let Some(millis) = file.floating_expiry_ms {
        license.set_floating_expiry(millis);
    }
    for (key, value) in file.properties {
        license.add_property(key, value);
    }
    for address in &file.hardware_addresses {
        license.add_hardware_address(address);
    }
    if let Some(encoded) = &file.signature {
        let bytes = BASE64
            .decode(encoded)
            .map_err(|e| LicenseError::Import(format!("garbled signature: {e}")))?;
        license.set_signature(bytes);
    }

    Ok(license)
}

fn timestamp(millis: i64, field: &str) -> LicenseResult<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
        .ok_or_else(|| LicenseError::Import(format!("{field} out of range: {millis}")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn import_rejects_missing_creation_date() {
        let result = import_license_from(r#"{"format_version":1}"#.as_bytes());
        assert!(matches!(result, Err(LicenseError::Import(_))));
    }

    #[test]
    fn import_rejects_newer_format_version() {
        let result =
            import_license_from(r#"{"format_version":9,"created_at":0}"#.as_bytes());
        assert!(matches!(result, Err(LicenseError::Import(_))));
    }

    #[test]
    fn import_rejects_garbled_signature() {
        let result = import_license_from(
            r#"{"format_version":1,"created_at":0,"signature":"!!not base64!!"}"#.as_bytes(),
        );
        assert!(matches!(result, Err(LicenseError::Import(_))));
    }

    #[test]
    fn import_ignores_unknown_fields() {
        let license = import_license_from(
            r#"{"format_version":1,"created_at":0,"future_field":true}"#.as_bytes(),
        )
        .unwrap();
        assert_eq!(license.created_at(), Utc.timestamp_millis_opt(0).unwrap());
        assert!(license.start_date().is_none());
        assert!(!license.is_signed());
    }

    #[test]
    fn import_rejects_truncated_input() {
        let result = import_license_from(r#"{"format_version":1,"crea"#.as_bytes());
        assert!(matches!(result, Err(LicenseError::Import(_))));
    }
}
