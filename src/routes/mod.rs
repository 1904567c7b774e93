use crate::config::rate_limit::{RateLimitConfig, RateLimitRule};
use crate::handlers;
use crate::services::upload::UPLOAD_BODY_LIMIT;
use axum::{extract::DefaultBodyLimit, routing, Router};
use tower_governor::{governor::GovernorConfigBuilder, GovernorLayer};

pub fn create_routes() -> Router {
    let rate_limit_config = RateLimitConfig::from_env();

    let auth = auth_routes(&rate_limit_config);
    let general = general_routes(&rate_limit_config);

    auth.merge(general)
}

/// Credential endpoints: register, verify, login, password reset.
fn auth_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new()
        .route("/register", routing::post(handlers::register))
        .route("/verify/{token}", routing::get(handlers::verify_email))
        .route("/login", routing::post(handlers::login))
        .route(
            "/forgot-password",
            routing::post(handlers::forgot_password),
        )
        .route(
            "/reset-password/{token}",
            routing::post(handlers::reset_password),
        );

    with_optional_rate_limit(router, config.enabled, config.auth)
}

/// Posts and notifications.
fn general_routes(config: &RateLimitConfig) -> Router {
    let router = Router::new()
        .route(
            "/posts",
            routing::post(handlers::post::create_post)
                .get(handlers::post::list_posts)
                .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route(
            "/posts/{post_id}/like",
            routing::post(handlers::post::toggle_like),
        )
        .route(
            "/posts/{post_id}/save",
            routing::post(handlers::post::toggle_save),
        )
        .route(
            "/notify-follow",
            routing::post(handlers::notify::notify_follow),
        );

    with_optional_rate_limit(router, config.enabled, config.general)
}

fn with_optional_rate_limit(router: Router, enabled: bool, rule: RateLimitRule) -> Router {
    if !enabled {
        return router;
    }

    let governor_conf = GovernorConfigBuilder::default()
        .per_second(rule.per_second)
        .burst_size(rule.burst_size)
        .finish()
        .expect("Invalid rate limit configuration");

    router.layer(GovernorLayer::new(governor_conf))
}
