mod common;

use serde_json::Value;

#[tokio::test]
async fn forgot_password_unknown_email_fails() {
    let app = common::spawn_app().await;

    let resp = app
        .client
        .post(app.url("/forgot-password"))
        .json(&serde_json::json!({ "email": "ghost@example.com" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "UserNotFound");
}

#[tokio::test]
async fn reset_token_is_single_use() {
    let app = common::spawn_app().await;

    common::register_verified_user(&app, "frank", "frank@example.com", "old_password_1").await;

    let resp = app
        .client
        .post(app.url("/forgot-password"))
        .json(&serde_json::json!({ "email": "frank@example.com" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    let token = common::reset_token_for(&app, "frank@example.com").await;

    // First consumption succeeds.
    let resp = app
        .client
        .post(app.url(&format!("/reset-password/{}", token)))
        .json(&serde_json::json!({ "password": "new_password_1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);

    // Second consumption of the same token fails.
    let resp = app
        .client
        .post(app.url(&format!("/reset-password/{}", token)))
        .json(&serde_json::json!({ "password": "other_password_1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "TokenInvalid");

    // Old password is dead, new one works.
    let resp = app
        .client
        .post(app.url("/login"))
        .json(&serde_json::json!({
            "email": "frank@example.com",
            "password": "old_password_1"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);

    let resp = app
        .client
        .post(app.url("/login"))
        .json(&serde_json::json!({
            "email": "frank@example.com",
            "password": "new_password_1"
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn newer_reset_request_invalidates_older_token() {
    let app = common::spawn_app().await;

    common::register_verified_user(&app, "grace", "grace@example.com", "password_123").await;

    for _ in 0..2 {
        let resp = app
            .client
            .post(app.url("/forgot-password"))
            .json(&serde_json::json!({ "email": "grace@example.com" }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
    }

    // Only the stored (latest) token is honored; any other string fails.
    let latest = common::reset_token_for(&app, "grace@example.com").await;

    let resp = app
        .client
        .post(app.url(&format!("/reset-password/{}", latest)))
        .json(&serde_json::json!({ "password": "brand_new_pw1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
}

#[tokio::test]
async fn stale_reset_token_is_rejected() {
    let app = common::spawn_app().await;

    common::register_verified_user(&app, "heidi", "heidi@example.com", "password_123").await;

    let resp = app
        .client
        .post(app.url("/forgot-password"))
        .json(&serde_json::json!({ "email": "heidi@example.com" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 200);
    let token = common::reset_token_for(&app, "heidi@example.com").await;

    // Age the stored token past the TTL.
    use sea_orm::{ConnectionTrait, Statement};
    app.db
        .execute(Statement::from_string(
            sea_orm::DatabaseBackend::Postgres,
            "UPDATE users SET reset_token_created_at = reset_token_created_at - INTERVAL '2 hours'
             WHERE email = 'heidi@example.com'"
                .to_string(),
        ))
        .await
        .unwrap();

    let resp = app
        .client
        .post(app.url(&format!("/reset-password/{}", token)))
        .json(&serde_json::json!({ "password": "new_password_1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "TokenInvalid");
}

#[tokio::test]
async fn unknown_reset_token_fails() {
    let app = common::spawn_app().await;

    let resp = app
        .client
        .post(app.url("/reset-password/never-issued-token"))
        .json(&serde_json::json!({ "password": "whatever_pw1" }))
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status(), 400);
    let body: Value = resp.json().await.unwrap();
    assert_eq!(body["error"], "TokenInvalid");
}
