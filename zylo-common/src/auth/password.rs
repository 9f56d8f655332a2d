//! Password hashing and verification using Argon2id

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

use crate::{Error, Result};

/// Hash a password, returning a PHC string suitable for storage
pub fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut rand::thread_rng());

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| Error::Internal(format!("Password hashing failed: {}", e)))
}

/// Verify a password against a stored hash
///
/// A mismatch is `Unauthorized`; a corrupt stored hash is `Internal`.
pub fn verify_password(password: &str, hash: &str) -> Result<()> {
    let parsed = PasswordHash::new(hash)
        .map_err(|e| Error::Internal(format!("Invalid password hash: {}", e)))?;

    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| Error::Unauthorized("Invalid credentials".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_password("correct horse battery").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("correct horse battery", &hash).is_ok());
    }

    #[test]
    fn test_wrong_password() {
        let hash = hash_password("correct horse battery").unwrap();
        assert!(matches!(
            verify_password("wrong horse", &hash),
            Err(Error::Unauthorized(_))
        ));
    }

    #[test]
    fn test_salts_differ() {
        let a = hash_password("same-password").unwrap();
        let b = hash_password("same-password").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_corrupt_hash_is_internal() {
        assert!(matches!(
            verify_password("x", "not-a-phc-string"),
            Err(Error::Internal(_))
        ));
    }
}
