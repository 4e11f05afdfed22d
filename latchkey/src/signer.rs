//! Applying Ed25519 signatures to licenses.

use crate::key::SigningKey;
use crate::license::License;

/// Binds one signing key and signs licenses with it.
pub struct LicenseSigner {
    signing_key: SigningKey,
}

impl LicenseSigner {
    #[must_use]
    pub fn new(signing_key: SigningKey) -> Self {
        Self { signing_key }
    }

    /// Signs the license's canonical payload and attaches the signature.
    ///
    /// A license is write-once after signing: mutating a signed license
    /// and re-signing it invalidates any previously exported copies.
    pub fn sign(&self, license: &mut License) {
        let payload = license.canonical_payload();
        let signature = self.signing_key.sign(&payload);
        license.set_signature(signature.to_bytes().to_vec());
    }
}
