use crate::error::{AppError, AppResult};
use crate::handlers::auth::MessageResponse;
use crate::services::email::EmailService;
use axum::{response::IntoResponse, Extension, Json};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct NotifyFollowRequest {
    /// Email of the user who followed
    #[serde(alias = "followerEmail")]
    #[validate(email)]
    pub follower_email: String,
    /// Email of the user being notified
    #[serde(alias = "followedEmail")]
    #[validate(email)]
    pub followed_email: String,
}

#[utoipa::path(
    post,
    path = "/notify-follow",
    request_body = NotifyFollowRequest,
    responses(
        (status = 200, description = "Notification sent", body = MessageResponse),
        (status = 400, description = "Validation or delivery error", body = AppError),
    ),
    tag = "notifications"
)]
pub async fn notify_follow(
    Extension(email_service): Extension<EmailService>,
    Json(payload): Json<NotifyFollowRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    // Unlike registration mail, delivery is the whole point here, so a
    // failed send fails the request.
    email_service
        .send_follow_notification(&payload.followed_email, &payload.follower_email)
        .await
        .map_err(|e| {
            tracing::warn!("Failed to send follow notification: {e}");
            AppError::Validation("Failed to send notification".to_string())
        })?;

    Ok(Json(MessageResponse {
        message: "Notification sent".to_string(),
    }))
}
