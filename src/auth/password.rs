//! Credential hashing and verification.

use secrecy::{ExposeSecret, SecretString};
use sha2::{Digest, Sha256};
use std::fmt::Write;

/// One-way password hasher with a deployment-wide pepper.
///
/// Stateless: verification is a hash-and-compare against the stored digest.
pub struct PasswordHasher {
    pepper: SecretString,
}

impl PasswordHasher {
    #[must_use]
    pub fn new(pepper: SecretString) -> Self {
        Self { pepper }
    }

    /// Hash a raw password into the hex digest stored on the user record.
    #[must_use]
    pub fn hash(&self, raw: &str) -> String {
        let mut hasher = Sha256::new();
        hasher.update(raw.as_bytes());
        hasher.update(self.pepper.expose_secret().as_bytes());
        let digest = hasher.finalize();
        let mut out = String::with_capacity(digest.len() * 2);
        for byte in digest {
            let _ = write!(out, "{byte:02x}");
        }
        out
    }

    /// Check a raw password against a stored digest.
    #[must_use]
    pub fn verify(&self, stored_hash: &str, raw: &str) -> bool {
        self.hash(raw) == stored_hash
    }
}
