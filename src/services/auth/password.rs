use crate::error::AppError;
use bcrypt::{hash, verify, BcryptError, DEFAULT_COST};

pub fn hash_password(password: &str) -> Result<String, AppError> {
    hash_password_with_cost(password, DEFAULT_COST)
}

pub(crate) fn hash_password_with_cost(password: &str, cost: u32) -> Result<String, AppError> {
    hash(password, cost)
        .map_err(|e| AppError::InternalServerError(format!("Failed to hash password: {}", e)))
}

/// Checks a plain-text password against a stored bcrypt hash.
///
/// A stored value that is not a bcrypt hash counts as a mismatch rather than an error, so a
/// corrupted row cannot be told apart from a wrong password by the caller.
pub fn verify_password(password: &str, hashed_password: &str) -> Result<bool, AppError> {
    match verify(password, hashed_password) {
        Ok(matches) => Ok(matches),
        Err(BcryptError::InvalidHash(_)) | Err(BcryptError::InvalidPrefix(_)) => {
            log::warn!("stored password hash is malformed");
            Ok(false)
        }
        Err(e) => Err(AppError::InternalServerError(format!(
            "Failed to verify password: {}",
            e
        ))),
    }
}
