//! # Password hashing
//!
//! Passwords are hashed with Argon2id using the library's default parameters and a random salt. The result is stored
//! in PHC string format (`$argon2id$v=19$...`), which carries the salt and parameters, so hashes made with different
//! parameters can still be verified.
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
pub enum PasswordError {
    #[error("Password hashing failed: {0}")]
    HashingFailed(String),
    #[error("The stored password hash is malformed: {0}")]
    MalformedHash(String),
}

pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| PasswordError::HashingFailed(e.to_string()))?;
    Ok(hash.to_string())
}

/// Returns `Ok(false)` if the password does not match. An error means the stored hash itself is unusable.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, PasswordError> {
    let parsed = PasswordHash::new(stored_hash).map_err(|e| PasswordError::MalformedHash(e.to_string()))?;
    Ok(Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
}
