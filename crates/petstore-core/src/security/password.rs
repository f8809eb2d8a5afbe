//! Password digests
//!
//! Passwords are never stored; users carry the uppercase hex SHA-256 digest
//! of their password and authentication compares digests.

use sha2::{Digest, Sha256};
use std::fmt;
use subtle::ConstantTimeEq;

/// Shortest password accepted when a user is created or changes password
pub const MIN_PASSWORD_LENGTH: usize = 6;

/// Longest password accepted
pub const MAX_PASSWORD_LENGTH: usize = 128;

/// Digest of a password as stored on a user
#[derive(Clone, PartialEq, Eq)]
pub struct PasswordHash(String);

impl PasswordHash {
    /// Digest a clear-text password
    pub fn digest(password: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(password.as_bytes());
        Self(hex::encode_upper(hasher.finalize()))
    }

    /// Wrap a digest read back from storage
    pub fn from_stored(hash: impl Into<String>) -> Self {
        Self(hash.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }

    /// Whether `password` digests to this hash, compared in constant time
    pub fn verify(&self, password: &str) -> bool {
        let candidate = Self::digest(password);
        self.0.as_bytes().ct_eq(candidate.0.as_bytes()).into()
    }
}

impl fmt::Debug for PasswordHash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordHash([REDACTED])")
    }
}
