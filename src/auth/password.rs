use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use rand::rngs::OsRng;
use tracing::error;

use crate::error::AppError;

const MIN_PASSWORD_LEN: usize = 6;
const PASSWORD_SYMBOLS: &str = "!@#$%^&*(),.?\":{}|<>";

/// Signup password rule: at least six characters, one of them a symbol.
pub fn check_password_policy(plain: &str) -> Result<(), AppError> {
    if plain.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::validation(
            "Password must be at least 6 characters long.",
        ));
    }
    if !plain.chars().any(|c| PASSWORD_SYMBOLS.contains(c)) {
        return Err(AppError::validation(
            "Password must contain at least one special character.",
        ));
    }
    Ok(())
}

pub fn hash_password(plain: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let hash = argon2
        .hash_password(plain.as_bytes(), &salt)
        .map_err(|e| {
            error!(error = %e, "argon2 hash_password error");
            anyhow::anyhow!(e.to_string())
        })?
        .to_string();
    Ok(hash)
}

pub fn verify_password(plain: &str, hash: &str) -> anyhow::Result<bool> {
    let parsed = PasswordHash::new(hash).map_err(|e| {
        error!(error = %e, "argon2 parse hash error");
        anyhow::anyhow!(e.to_string())
    })?;
    Ok(Argon2::default()
        .verify_password(plain.as_bytes(), &parsed)
        .is_ok())
}

pub fn is_password_hash(stored: &str) -> bool {
    PasswordHash::new(stored).is_ok()
}

/// Check `plain` against a stored credential.
///
/// Records written before hashing was introduced hold the password itself;
/// those are compared by equality.
pub fn verify_stored(plain: &str, stored: &str) -> anyhow::Result<bool> {
    if is_password_hash(stored) {
        verify_password(plain, stored)
    } else {
        Ok(plain == stored)
    }
}
