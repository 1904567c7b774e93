use crate::error::{AppError, AppResult};
use anyhow::Result;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

static JWT_CONFIG: OnceLock<crate::config::jwt::JwtConfig> = OnceLock::new();

/// Initialize JWT config from environment. Must be called once at startup.
pub fn init_jwt_config(config: crate::config::jwt::JwtConfig) -> Result<()> {
    JWT_CONFIG
        .set(config)
        .map_err(|_| anyhow::anyhow!("JWT config already initialized"))?;
    Ok(())
}

fn get_config() -> &'static crate::config::jwt::JwtConfig {
    JWT_CONFIG
        .get()
        .expect("JWT config not initialized — call init_jwt_config() at startup")
}

/// Token purpose. A verification token cannot be replayed as a session
/// token or vice versa.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenPurpose {
    Verification,
    Session,
}

impl TokenPurpose {
    fn as_str(self) -> &'static str {
        match self {
            TokenPurpose::Verification => "verify",
            TokenPurpose::Session => "session",
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // user_id
    pub exp: usize,  // expiration time
    pub iat: usize,  // issued at
    pub purpose: String,
}

fn encode_token(user_id: i32, purpose: TokenPurpose, ttl_seconds: u64) -> Result<String> {
    let config = get_config();
    let now = chrono::Utc::now().timestamp() as usize;
    let claims = Claims {
        sub: user_id.to_string(),
        exp: now + ttl_seconds as usize,
        iat: now,
        purpose: purpose.as_str().to_string(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )
    .map_err(|e| anyhow::anyhow!("Failed to encode {} token: {}", purpose.as_str(), e))
}

/// Issue a signed email-verification token (1 day by default).
pub fn encode_verification_token(user_id: i32) -> Result<String> {
    encode_token(
        user_id,
        TokenPurpose::Verification,
        get_config().verification_token_expiry,
    )
}

/// Issue a signed session token (1 hour by default).
pub fn encode_session_token(user_id: i32) -> Result<String> {
    encode_token(user_id, TokenPurpose::Session, get_config().session_token_expiry)
}

/// Verify a signed token and return the bound user id.
///
/// `TokenExpired` when past the embedded expiry, `TokenInvalid` on a bad
/// signature, malformed token, or purpose mismatch.
pub fn verify_token(token: &str, expected: TokenPurpose) -> AppResult<i32> {
    let config = get_config();

    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => AppError::TokenExpired,
        _ => AppError::TokenInvalid,
    })?;

    if data.claims.purpose != expected.as_str() {
        return Err(AppError::TokenInvalid);
    }

    data.claims.sub.parse().map_err(|_| AppError::TokenInvalid)
}
