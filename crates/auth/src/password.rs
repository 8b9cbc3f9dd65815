use thiserror::Error;

pub const MIN_PASSWORD_LEN: usize = 6;

pub const DEFAULT_COST: u32 = bcrypt::DEFAULT_COST;

#[derive(Debug, Error)]
pub enum PasswordError {
    #[error("password must be at least {MIN_PASSWORD_LEN} characters")]
    TooShort,

    #[error("password hashing failed: {0}")]
    Hash(#[from] bcrypt::BcryptError),
}

pub fn validate_password(password: &str) -> Result<(), PasswordError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(PasswordError::TooShort);
    }
    Ok(())
}

/// bcrypt hash with the given cost ([`DEFAULT_COST`] in production).
pub fn hash_password(password: &str, cost: u32) -> Result<String, PasswordError> {
    validate_password(password)?;
    Ok(bcrypt::hash(password, cost)?)
}

/// A malformed stored hash counts as a mismatch.
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    match bcrypt::verify(password, password_hash) {
        Ok(valid) => valid,
        Err(e) => {
            tracing::warn!(error = %e, "stored password hash could not be verified");
            false
        }
    }
}
