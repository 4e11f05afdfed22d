//! Error types for the latchkey crate.

use thiserror::Error;

/// Errors produced by key and license storage operations.
///
/// Signature mismatches are deliberately not represented here: a bad or
/// tampered signature is reported as a failed validation test so the
/// remaining test results stay available to the caller.
#[derive(Debug, Error)]
pub enum LicenseError {
    /// Underlying storage read or write failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialized license data is malformed, truncated, or missing a
    /// mandatory field.
    #[error("invalid license data: {0}")]
    Import(String),

    /// Key material is malformed or uses an unrecognized algorithm.
    #[error("invalid key material: {0}")]
    InvalidKey(String),

    /// A verification-only key file was supplied where a full key pair
    /// was required.
    #[error("key file contains no secret key")]
    MissingSecretKey,
}

/// Result type for license operations.
pub type LicenseResult<T> = Result<T, LicenseError>;
