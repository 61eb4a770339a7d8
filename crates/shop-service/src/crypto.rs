//! Cryptographic utilities for admin sessions and passwords.
//!
//! Passwords are hashed with Argon2id (PHC string format). Accounts created
//! before Argon2 carry an unsalted SHA-256 hex digest, which is still
//! accepted so the caller can upgrade it after a successful login.

use argon2::password_hash::rand_core::{OsRng, RngCore};
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

type HmacSha256 = Hmac<Sha256>;

/// Errors from hashing or signing.
#[derive(Debug, thiserror::Error)]
pub enum CryptoError {
    /// Argon2 failed to hash the password.
    #[error("password hashing failed: {0}")]
    Hash(String),

    /// The HMAC key was rejected.
    #[error("invalid HMAC key")]
    InvalidKey,
}

/// Outcome of checking a password against a stored hash.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PasswordCheck {
    /// Matches an Argon2 hash.
    Valid,
    /// Matches a legacy SHA-256 digest; the hash should be replaced.
    ValidLegacy,
    /// Does not match.
    Invalid,
}

/// Compute HMAC-SHA256 and return hex-encoded result.
///
/// # Errors
///
/// Returns `CryptoError::InvalidKey` if the key is rejected by the HMAC
/// implementation.
pub fn hmac_sha256_hex(secret: &str, message: &str) -> Result<String, CryptoError> {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).map_err(|_| CryptoError::InvalidKey)?;
    mac.update(message.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Hex-encoded SHA-256 digest.
#[must_use]
pub fn sha256_hex(input: &str) -> String {
    hex::encode(Sha256::digest(input.as_bytes()))
}

/// Constant-time string comparison to prevent timing attacks.
#[must_use]
pub fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }

    let mut result = 0u8;
    for (x, y) in a.bytes().zip(b.bytes()) {
        result |= x ^ y;
    }
    result == 0
}

/// Hash a password with Argon2id and a random salt.
///
/// # Errors
///
/// Returns `CryptoError::Hash` if hashing fails.
pub fn hash_password(password: &str) -> Result<String, CryptoError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| CryptoError::Hash(e.to_string()))
}

/// Check a password against an Argon2 PHC string or a legacy SHA-256 digest.
#[must_use]
pub fn verify_password(password: &str, stored: &str) -> PasswordCheck {
    if let Ok(parsed) = PasswordHash::new(stored) {
        return if Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
        {
            PasswordCheck::Valid
        } else {
            PasswordCheck::Invalid
        };
    }

    if constant_time_eq(&sha256_hex(password), stored) {
        PasswordCheck::ValidLegacy
    } else {
        PasswordCheck::Invalid
    }
}

/// Generate a random hex secret of `bytes` bytes.
#[must_use]
pub fn random_secret(bytes: usize) -> String {
    let mut buf = vec![0u8; bytes];
    OsRng.fill_bytes(&mut buf);
    hex::encode(buf)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hmac_sha256_hex() {
        // Known test vector
        let result = hmac_sha256_hex("secret", "message").unwrap();
        assert_eq!(result.len(), 64);
        assert_eq!(
            result,
            "8b5f48702995c1598c573db1e21866a9b825d4a794d169d7060a03605796360b"
        );
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq("hello", "hello"));
        assert!(!constant_time_eq("hello", "world"));
        assert!(!constant_time_eq("hello", "hell"));
        assert!(constant_time_eq("", ""));
    }

    #[test]
    fn argon2_round_trip() {
        let hash = hash_password("hunter2").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert_eq!(verify_password("hunter2", &hash), PasswordCheck::Valid);
        assert_eq!(verify_password("hunter3", &hash), PasswordCheck::Invalid);
    }

    #[test]
    fn legacy_sha256_is_flagged() {
        let legacy = sha256_hex("admin123");
        assert_eq!(verify_password("admin123", &legacy), PasswordCheck::ValidLegacy);
        assert_eq!(verify_password("admin124", &legacy), PasswordCheck::Invalid);
    }

    #[test]
    fn random_secrets_differ() {
        let a = random_secret(32);
        assert_eq!(a.len(), 64);
        assert_ne!(a, random_secret(32));
    }
}
