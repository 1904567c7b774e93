use anyhow::Result;
use std::env;

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub secret: String,
    /// Email-verification token lifetime in seconds (default: 1 day).
    pub verification_token_expiry: u64,
    /// Session token lifetime in seconds (default: 1 hour).
    pub session_token_expiry: u64,
}

impl JwtConfig {
    pub fn from_env() -> Result<Self> {
        let secret = env::var("JWT_SECRET")
            .map_err(|_| anyhow::anyhow!("JWT_SECRET environment variable must be set"))?;

        if secret.len() < 32 {
            return Err(anyhow::anyhow!(
                "JWT_SECRET must be at least 32 characters"
            ));
        }

        let verification_token_expiry = env::var("JWT_VERIFICATION_EXPIRATION")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(86400); // 1 day

        let session_token_expiry = env::var("JWT_SESSION_EXPIRATION")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(3600); // 1 hour

        Ok(Self {
            secret,
            verification_token_expiry,
            session_token_expiry,
        })
    }
}
