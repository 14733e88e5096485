//! Password hashing
//!
//! Argon2id with per-password salts; hashes are stored as PHC strings so
//! parameters can evolve without invalidating existing credentials.

use anyhow::{anyhow, Result};
use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

/// Hash a plaintext password into a PHC string.
pub fn hash(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow!("Failed to hash password: {}", e))?;
    Ok(hash.to_string())
}

/// Verify a plaintext password against a stored PHC string.
///
/// A malformed stored hash verifies as false rather than erroring; a
/// corrupted credential must not be loggable-into.
pub fn verify(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hashed = hash("correct-horse").expect("hash");
        assert!(hashed.starts_with("$argon2id$"));
        assert!(verify("correct-horse", &hashed));
        assert!(!verify("wrong-horse", &hashed));
    }

    #[test]
    fn test_hashes_are_salted() {
        let a = hash("same-password").expect("hash");
        let b = hash("same-password").expect("hash");
        assert_ne!(a, b);
    }

    #[test]
    fn test_malformed_hash_never_verifies() {
        assert!(!verify("anything", "not-a-phc-string"));
        assert!(!verify("anything", ""));
    }
}
