use crate::error::{AppError, AppResult};
use anyhow::{Context, Result};

/// Hash a password using bcrypt. The salt is generated per call and
/// embedded in the output; the cost lives here, not at call sites.
pub fn hash_password(password: &str) -> Result<String> {
    bcrypt::hash(password, bcrypt::DEFAULT_COST).context("Failed to hash password")
}

/// Verify a password against a stored hash.
/// A hash that bcrypt cannot parse surfaces as `CorruptCredential`.
pub fn verify_password(password: &str, hash: &str) -> AppResult<bool> {
    bcrypt::verify(password, hash).map_err(|_| AppError::CorruptCredential)
}

/// Burn a bcrypt verification against a throwaway hash. Used on the
/// unknown-email login path so its timing matches the wrong-password path.
pub fn verify_dummy(password: &str) {
    const DUMMY_HASH: &str = "$2b$12$C6UzMDM.H6dfI/f/IKcEeO7hS3nV0kx0N1l7mD5rYyBpZ5y5yZx5u";
    let _ = bcrypt::verify(password, DUMMY_HASH);
}
