use std::env;
use std::time::Duration;

#[derive(Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub smtp_username: String,
    pub smtp_password: String,
    pub from_address: String,
    pub frontend_url: String,
    /// Bound on how long a single SMTP send may block a request.
    pub send_timeout: Duration,
}

impl EmailConfig {
    /// Read email config from environment variables.
    /// Returns None if SMTP is not configured (graceful degradation).
    pub fn from_env() -> Option<Self> {
        let smtp_host = env::var("SMTP_HOST").ok()?;
        let smtp_port = env::var("SMTP_PORT")
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or(587);
        let smtp_username = env::var("SMTP_USERNAME").ok()?;
        let smtp_password = env::var("SMTP_PASSWORD").ok()?;
        let from_address = env::var("SMTP_FROM")
            .unwrap_or_else(|_| format!("Pinstack <{}>", smtp_username.clone()));
        let frontend_url = frontend_url_from_env();
        let send_timeout = send_timeout_from_env();

        Some(Self {
            smtp_host,
            smtp_port,
            smtp_username,
            smtp_password,
            from_address,
            frontend_url,
            send_timeout,
        })
    }
}

pub fn frontend_url_from_env() -> String {
    env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:3000".to_string())
}

pub fn send_timeout_from_env() -> Duration {
    let secs = env::var("EMAIL_SEND_TIMEOUT_SECONDS")
        .ok()
        .and_then(|s| s.parse().ok())
        .unwrap_or(10);
    Duration::from_secs(secs)
}
