//! Password hashing.
//!
//! New hashes are Argon2id PHC strings. Accounts imported from the previous
//! deployment carry bcrypt hashes (`$2a$`, `$2b$`, `$2y$`); those still verify so
//! users can log in, and [`needs_rehash`] tells the caller to upgrade them.

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand_core::OsRng;

use crate::AppError;

/// Hash a password for storage
pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AppError::Internal(format!("Failed to hash password: {}", e)))
}

/// Verify a password against a stored hash.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    if is_bcrypt_hash(hash) {
        return bcrypt::verify(password, hash)
            .map_err(|e| AppError::Internal(format!("Invalid bcrypt hash: {}", e)));
    }

    let parsed_hash = PasswordHash::new(hash)
        .map_err(|e| AppError::Internal(format!("Invalid hash format: {}", e)))?;

    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Whether a stored hash predates Argon2 and should be replaced after a successful login.
pub fn needs_rehash(hash: &str) -> bool {
    is_bcrypt_hash(hash)
}

fn is_bcrypt_hash(hash: &str) -> bool {
    hash.starts_with("$2a$") || hash.starts_with("$2b$") || hash.starts_with("$2y$")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_argon2_hash_and_verify() {
        let hash = hash_password("matkhau123").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("matkhau123", &hash).unwrap());
        assert!(!verify_password("wrong", &hash).unwrap());
        assert!(!needs_rehash(&hash));
    }

    #[test]
    fn test_legacy_bcrypt_hash_verifies() {
        let legacy = bcrypt::hash("matkhau123", 4).unwrap();
        assert!(verify_password("matkhau123", &legacy).unwrap());
        assert!(!verify_password("other", &legacy).unwrap());
        assert!(needs_rehash(&legacy));
    }

    #[test]
    fn test_garbage_hash_is_an_error() {
        assert!(verify_password("x", "not-a-hash").is_err());
    }
}
