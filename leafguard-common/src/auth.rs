//! Authentication primitives: salted password hashes and opaque tokens
//!
//! Token issuance is deliberately thin. Access and refresh tokens are
//! random opaque strings; only their SHA-256 digests are persisted, so a
//! leaked database never yields a usable token.
//!
//! This module contains only pure functions. HTTP extraction and session
//! storage live in the server crate.

use rand::{distributions::Alphanumeric, Rng};
use sha2::{Digest, Sha256};

/// Length of generated salts
const SALT_LEN: usize = 16;

/// Length of generated access/refresh tokens
const TOKEN_LEN: usize = 48;

/// Generate a random alphanumeric salt
pub fn generate_salt() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(SALT_LEN)
        .map(char::from)
        .collect()
}

/// Generate a random opaque token (access or refresh)
pub fn generate_token() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_LEN)
        .map(char::from)
        .collect()
}

/// Hash a password with its salt (SHA-256 of salt || password, hex)
pub fn hash_password(password: &str, salt: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(password.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Verify a password against a stored hash
pub fn verify_password(password: &str, salt: &str, stored_hash: &str) -> bool {
    hash_password(password, salt) == stored_hash
}

/// Digest used to look up a token at rest (SHA-256 hex)
pub fn token_digest(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_roundtrip() {
        let salt = generate_salt();
        let hash = hash_password("hunter2", &salt);

        assert_eq!(hash.len(), 64);
        assert!(verify_password("hunter2", &salt, &hash));
        assert!(!verify_password("hunter3", &salt, &hash));
    }

    #[test]
    fn test_same_password_different_salt() {
        let a = hash_password("hunter2", "saltsaltsaltsalt");
        let b = hash_password("hunter2", "pepperpepperpepp");
        assert_ne!(a, b);
    }

    #[test]
    fn test_token_digest_stable() {
        let token = generate_token();
        assert_eq!(token.len(), 48);
        assert_eq!(token_digest(&token), token_digest(&token));
        assert_ne!(token_digest(&token), token_digest("other"));
    }
}
