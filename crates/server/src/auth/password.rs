use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use shared_types::AppError;

pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, hash: &str) -> Result<bool, argon2::password_hash::Error> {
    let parsed_hash = PasswordHash::new(hash)?;
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

/// Hash for storage, mapping hasher failures to an internal error.
pub fn hash_for_storage(password: &str) -> Result<String, AppError> {
    hash_password(password).map_err(|e| {
        tracing::error!(%e, "Password hashing failed");
        AppError::internal("Failed to hash password")
    })
}

/// Verify credentials. A malformed stored hash counts as a mismatch.
pub fn credentials_match(password: &str, stored_hash: &str) -> bool {
    verify_password(password, stored_hash).unwrap_or(false)
}
