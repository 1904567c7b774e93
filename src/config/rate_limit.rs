use std::env;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitRule {
    pub per_second: u64,
    pub burst_size: u32,
}

impl RateLimitRule {
    const fn new(per_second: u64, burst_size: u32) -> Self {
        Self {
            per_second,
            burst_size,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    pub enabled: bool,
    /// Credential endpoints: register, login, password reset.
    pub auth: RateLimitRule,
    /// Everything else.
    pub general: RateLimitRule,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            auth: RateLimitRule::new(5, 10),
            general: RateLimitRule::new(30, 60),
        }
    }
}

impl RateLimitConfig {
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(value) = env::var("RATE_LIMIT_ENABLED") {
            match value.trim().to_ascii_lowercase().as_str() {
                "1" | "true" | "yes" | "on" => cfg.enabled = true,
                "0" | "false" | "no" | "off" => cfg.enabled = false,
                other => tracing::warn!("Ignoring invalid RATE_LIMIT_ENABLED '{}'", other),
            }
        }

        if let Ok(raw) = env::var("RATE_LIMIT_AUTH") {
            match parse_rule(&raw) {
                Ok(rule) => cfg.auth = rule,
                Err(err) => tracing::warn!("Invalid RATE_LIMIT_AUTH '{}': {}", raw, err),
            }
        }

        if let Ok(raw) = env::var("RATE_LIMIT_GENERAL") {
            match parse_rule(&raw) {
                Ok(rule) => cfg.general = rule,
                Err(err) => tracing::warn!("Invalid RATE_LIMIT_GENERAL '{}': {}", raw, err),
            }
        }

        cfg
    }
}

/// Parse "per_second:burst" into a rule.
fn parse_rule(raw: &str) -> Result<RateLimitRule, String> {
    let (per, burst) = raw
        .trim()
        .split_once(':')
        .ok_or_else(|| "expected per_second:burst".to_string())?;
    let per_second: u64 = per
        .trim()
        .parse()
        .map_err(|_| format!("invalid per_second '{}'", per))?;
    let burst_size: u32 = burst
        .trim()
        .parse()
        .map_err(|_| format!("invalid burst '{}'", burst))?;
    if per_second == 0 || burst_size == 0 {
        return Err("per_second and burst must be positive".to_string());
    }
    Ok(RateLimitRule {
        per_second,
        burst_size,
    })
}
