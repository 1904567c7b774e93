use std::env;

#[derive(Debug, Clone, Copy)]
pub struct AuthConfig {
    /// Lifetime of a stored password-reset token in seconds.
    /// A token older than this is treated as invalid even if still present.
    pub reset_token_ttl_seconds: i64,
}

impl AuthConfig {
    pub fn from_env() -> Self {
        let reset_token_ttl_seconds = env::var("RESET_TOKEN_TTL_SECONDS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(3600); // 1 hour

        Self {
            reset_token_ttl_seconds,
        }
    }
}
