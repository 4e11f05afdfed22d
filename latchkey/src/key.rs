//! Ed25519 key pair lifecycle: generation, file export, and import.
//!
//! Key files are JSON objects of the form:
//!
//! ```json
//! { "algorithm": "ed25519", "public_key": "<base64>", "secret_key": "<base64>" }
//! ```
//!
//! The secret half is optional so that verification-only key files can be
//! distributed to license consumers. Keys round-trip byte-identically;
//! signature verification depends on exact key bytes.

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use ed25519_dalek::{
    Signature as DalekSignature, Signer as _, SigningKey as DalekSigningKey, Verifier as _,
    VerifyingKey as DalekVerifyingKey,
};
use rand::rngs::OsRng;
use serde::{Deserialize, Serialize};

use crate::error::{LicenseError, LicenseResult};

/// Algorithm identifier written to key files.
const ALGORITHM: &str = "ed25519";

/// Ed25519 signing key (secret half). Held only by the license issuer.
#[derive(Clone)]
pub struct SigningKey(DalekSigningKey);

/// Ed25519 verifying key (public half). Distributed to verifiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyingKey(DalekVerifyingKey);

/// Ed25519 signature bytes.
pub struct Signature(DalekSignature);

/// A signing/verification key pair.
#[derive(Clone)]
pub struct KeyPair {
    pub signing_key: SigningKey,
    pub verifying_key: VerifyingKey,
}

impl KeyPair {
    /// Generates a new random Ed25519 key pair.
    #[must_use]
    pub fn generate() -> Self {
        let signing = DalekSigningKey::generate(&mut OsRng);
        Self::from_signing_key(SigningKey(signing))
    }

    /// Builds a pair from an existing signing key.
    #[must_use]
    pub fn from_signing_key(signing_key: SigningKey) -> Self {
        let verifying_key = signing_key.verifying_key();
        Self {
            signing_key,
            verifying_key,
        }
    }
}

impl SigningKey {
    /// Creates a signing key from the raw 32-byte secret.
    #[must_use]
    pub fn from_bytes(bytes: &[u8; 32]) -> Self {
        Self(DalekSigningKey::from_bytes(bytes))
    }

    /// Returns the raw 32-byte secret key.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; 32] {
        self.0.to_bytes()
    }

    /// Signs a message and returns the signature.
    #[must_use]
    pub fn sign(&self, message: &[u8]) -> Signature {
        Signature(self.0.sign(message))
    }

    /// Returns the corresponding verifying key.
    #[must_use]
    pub fn verifying_key(&self) -> VerifyingKey {
        VerifyingKey(self.0.verifying_key())
    }
}

impl VerifyingKey {
    /// Creates a verifying key from the raw 32-byte public key.
    pub fn from_bytes(bytes: &[u8; 32]) -> LicenseResult<Self> {
        DalekVerifyingKey::from_bytes(bytes)
            .map(Self)
            .map_err(|_| LicenseError::InvalidKey("not a valid ed25519 public key".into()))
    }

    /// Returns the raw 32-byte public key.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; 32] {
        self.0.to_bytes()
    }

    /// Returns true if `signature` is a valid signature over `message`.
    #[must_use]
    pub fn verify(&self, message: &[u8], signature: &Signature) -> bool {
        self.0.verify(message, &signature.0).is_ok()
    }
}

impl Signature {
    /// Creates a signature from the raw 64-byte value.
    #[must_use]
    pub fn from_bytes(bytes: &[u8; 64]) -> Self {
        Self(DalekSignature::from_bytes(bytes))
    }

    /// Creates a signature from a byte slice of unchecked length.
    pub fn from_slice(bytes: &[u8]) -> LicenseResult<Self> {
        DalekSignature::from_slice(bytes)
            .map(Self)
            .map_err(|_| LicenseError::InvalidKey("invalid signature length".into()))
    }

    /// Returns the raw 64-byte signature.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; 64] {
        self.0.to_bytes()
    }
}

/// On-disk key file representation.
#[derive(Serialize, Deserialize)]
struct KeyFile {
    algorithm: String,
    public_key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    secret_key: Option<String>,
}

/// Writes both halves of a key pair to `path`.
pub fn export_key_pair(pair: &KeyPair, path: impl AsRef<Path>) -> LicenseResult<()> {
    let file = KeyFile {
        algorithm: ALGORITHM.to_string(),
        public_key: BASE64.encode(pair.verifying_key.to_bytes()),
        secret_key: Some(BASE64.encode(pair.signing_key.to_bytes())),
    };
    write_key_file(&file, path.as_ref())
}

/// Writes a verification-only key file to `path`.
pub fn export_public_key(key: &VerifyingKey, path: impl AsRef<Path>) -> LicenseResult<()> {
    let file = KeyFile {
        algorithm: ALGORITHM.to_string(),
        public_key: BASE64.encode(key.to_bytes()),
        secret_key: None,
    };
    write_key_file(&file, path.as_ref())
}

/// Reads a full key pair from `path`.
///
/// # Errors
///
/// Returns [`LicenseError::MissingSecretKey`] for a verification-only
/// file, and [`LicenseError::InvalidKey`] for malformed key material or
/// an unrecognized algorithm.
pub fn import_key_pair(path: impl AsRef<Path>) -> LicenseResult<KeyPair> {
    let file = read_key_file(path.as_ref())?;
    let secret = file.secret_key.as_ref().ok_or(LicenseError::MissingSecretKey)?;
    let signing_key = SigningKey::from_bytes(&decode_key_bytes("secret_key", secret)?);
    let verifying_key = VerifyingKey::from_bytes(&decode_key_bytes("public_key", &file.public_key)?)?;

    // The stored public half must match the one derived from the secret.
    if signing_key.verifying_key() != verifying_key {
        return Err(LicenseError::InvalidKey(
            "public key does not match secret key".into(),
        ));
    }

    Ok(KeyPair {
        signing_key,
        verifying_key,
    })
}

/// Reads the verifying key from `path`. Accepts both full key pair files
/// and verification-only files.
pub fn import_verifying_key(path: impl AsRef<Path>) -> LicenseResult<VerifyingKey> {
    let file = read_key_file(path.as_ref())?;
    VerifyingKey::from_bytes(&decode_key_bytes("public_key", &file.public_key)?)
}

fn write_key_file(file: &KeyFile, path: &Path) -> LicenseResult<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(&mut writer, file)
        .map_err(|e| LicenseError::InvalidKey(e.to_string()))?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

fn read_key_file(path: &Path) -> LicenseResult<KeyFile> {
    let reader = BufReader::new(File::open(path)?);
    let file: KeyFile = serde_json::from_reader(reader)
        .map_err(|e| LicenseError::InvalidKey(format!("malformed key file: {e}")))?;
    if file.algorithm != ALGORITHM {
        return Err(LicenseError::InvalidKey(format!(
            "unsupported algorithm: {}",
            file.algorithm
        )));
    }
    Ok(file)
}

fn decode_key_bytes<const N: usize>(field: &str, value: &str) -> LicenseResult<[u8; N]> {
    let bytes = BASE64
        .decode(value)
        .map_err(|e| LicenseError::InvalidKey(format!("{field}: {e}")))?;
    bytes
        .as_slice()
        .try_into()
        .map_err(|_| LicenseError::InvalidKey(format!("{field}: expected {N} bytes")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_verify_roundtrip() {
        let pair = KeyPair::generate();
        let sig = pair.signing_key.sign(b"hello world");
        assert!(pair.verifying_key.verify(b"hello world", &sig));
    }

    #[test]
    fn wrong_message_fails() {
        let pair = KeyPair::generate();
        let sig = pair.signing_key.sign(b"correct");
        assert!(!pair.verifying_key.verify(b"wrong", &sig));
    }

    #[test]
    fn wrong_key_fails() {
        let pair1 = KeyPair::generate();
        let pair2 = KeyPair::generate();
        let sig = pair1.signing_key.sign(b"message");
        assert!(!pair2.verifying_key.verify(b"message", &sig));
    }

    #[test]
    fn key_bytes_roundtrip() {
        let pair = KeyPair::generate();
        let sk = SigningKey::from_bytes(&pair.signing_key.to_bytes());
        let vk = VerifyingKey::from_bytes(&pair.verifying_key.to_bytes()).unwrap();
        let sig = sk.sign(b"test");
        assert!(vk.verify(b"test", &sig));
    }

    #[test]
    fn signature_slice_roundtrip() {
        let pair = KeyPair::generate();
        let sig = pair.signing_key.sign(b"data");
        let restored = Signature::from_slice(&sig.to_bytes()).unwrap();
        assert!(pair.verifying_key.verify(b"data", &restored));
    }

    #[test]
    fn signature_bad_length_rejected() {
        assert!(Signature::from_slice(&[0u8; 12]).is_err());
    }
}
