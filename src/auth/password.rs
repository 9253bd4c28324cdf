//! Argon2id password hashing and verification.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, SaltString},
    Argon2, PasswordVerifier,
};

#[derive(Debug, thiserror::Error)]
#[error("Password hashing failed: {0}")]
pub struct HashingError(pub String);

/// Hashes a plaintext password with a fresh random salt.
///
/// The result is a PHC string, so the salt and cost parameters travel with the hash.
pub fn hash_password(password: &str) -> Result<String, HashingError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| HashingError(e.to_string()))
}

/// Checks a plaintext password against a stored hash.
///
/// A wrong password is `Ok(false)`. Only a malformed stored hash is an error.
pub fn verify_password(password: &str, password_hash: &str) -> Result<bool, HashingError> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|e| HashingError(format!("invalid password hash format: {}", e)))?;

    match Argon2::default().verify_password(password.as_bytes(), &parsed_hash) {
        Ok(()) => Ok(true),
        Err(argon2::password_hash::Error::Password) => Ok(false),
        Err(e) => Err(HashingError(e.to_string())),
    }
}
