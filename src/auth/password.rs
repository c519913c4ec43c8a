// Password hashing and verification

use crate::error::ApiError;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};

/// Password service for hashing and verification
pub struct PasswordService;

impl PasswordService {
    /// Hash a password using Argon2id with a random per-password salt
    ///
    /// Returns a PHC-formatted string; the plaintext is never stored.
    pub fn hash_password(password: &str) -> Result<String, ApiError> {
        let salt = SaltString::generate(&mut OsRng);

        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| ApiError::Server(format!("password hashing failed: {}", e)))
    }

    /// Verify a password against a stored hash
    ///
    /// `Ok(false)` means the password did not match. A stored value that is not
    /// a valid PHC string is a server fault, not a credential mismatch.
    pub fn verify_password(password: &str, hash: &str) -> Result<bool, ApiError> {
        let parsed = PasswordHash::new(hash)
            .map_err(|e| ApiError::Server(format!("stored password hash is invalid: {}", e)))?;

        match Argon2::default().verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(argon2::password_hash::Error::Password) => Ok(false),
            Err(e) => Err(ApiError::Server(format!("password verification failed: {}", e))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_not_plaintext_and_verifies() {
        let hash = PasswordService::hash_password("pw").unwrap();
        assert_ne!(hash, "pw");
        assert!(hash.starts_with("$argon2id$"));
        assert!(PasswordService::verify_password("pw", &hash).unwrap());
    }

    #[test]
    fn test_wrong_password_does_not_verify() {
        let hash = PasswordService::hash_password("correct horse").unwrap();
        assert!(!PasswordService::verify_password("battery staple", &hash).unwrap());
    }

    #[test]
    fn test_salts_differ_between_hashes() {
        let first = PasswordService::hash_password("same").unwrap();
        let second = PasswordService::hash_password("same").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_corrupt_hash_is_server_error() {
        let result = PasswordService::verify_password("pw", "not-a-phc-string");
        assert!(matches!(result, Err(ApiError::Server(_))));
    }
}
