//! License issuing and verification bound to an Ed25519 key pair.
//!
//! A vendor generates a key pair once, encodes entitlement terms into a
//! [`License`] (validity window, arbitrary properties, hardware locks),
//! and signs it with the secret key. A verifier reconstructs the license
//! from its file form and runs a fixed suite of validity tests against
//! the vendor's public key.
//!
//! # Signing model
//!
//! The signature covers [`License::canonical_payload`], a deterministic
//! byte encoding of the signable fields. Properties and hardware
//! addresses are kept in sorted collections so two licenses with the
//! same terms produce the same payload regardless of insertion order.
//!
//! # Validation model
//!
//! [`Validator::validate`] runs five independent tests (signature, start
//! date, expiration, floating expiration, hardware lock) and never
//! short-circuits: a failed signature still yields results for the
//! remaining tests so callers can diagnose exactly what is wrong. The
//! aggregate outcome is a [`LicenseState`]; an invalid license is a
//! normal, fully-described result rather than an error.

mod codec;
mod device;
mod error;
mod key;
mod license;
mod signer;
mod validator;

pub use codec::{
    export_license, export_license_to, import_license, import_license_from, FORMAT_VERSION,
};
pub use device::local_hardware_addresses;
pub use error::{LicenseError, LicenseResult};
pub use key::{
    export_key_pair, export_public_key, import_key_pair, import_verifying_key, KeyPair, Signature,
    SigningKey, VerifyingKey,
};
pub use license::License;
pub use signer::LicenseSigner;
pub use validator::{
    LicenseState, TestResult, ValidationFailure, ValidationTest, Validator,
};
