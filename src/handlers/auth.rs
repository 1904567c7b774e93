use crate::error::{AppError, AppResult};
use crate::services::auth::AuthService;
use crate::services::email::EmailService;
use axum::{
    extract::Path,
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::Validate;

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    /// Username (3-50 characters)
    #[validate(length(min = 3, max = 50))]
    pub username: String,
    /// Email address
    #[validate(email)]
    pub email: String,
    /// Password (non-empty; hashed before storage)
    #[validate(length(min = 1))]
    pub password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    /// Email address (the login key)
    pub email: String,
    /// User password
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    /// Success message
    pub message: String,
    /// Signed session token (1 hour)
    pub token: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ForgotPasswordRequest {
    /// Email address
    #[validate(email)]
    pub email: String,
}

#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct ResetPasswordRequest {
    /// New password (non-empty; hashed before storage)
    #[validate(length(min = 1))]
    pub password: String,
}

#[utoipa::path(
    post,
    path = "/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "User registered, verification email dispatched", body = MessageResponse),
        (status = 400, description = "Duplicate email or validation error", body = AppError),
    ),
    tag = "auth"
)]
pub async fn register(
    Extension(db): Extension<DatabaseConnection>,
    Extension(email_service): Extension<EmailService>,
    Json(payload): Json<RegisterRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let service = AuthService::new(db);
    service
        .register(
            &payload.username,
            &payload.email,
            &payload.password,
            &email_service,
        )
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "User registered successfully. Check your email to verify your account."
                .to_string(),
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/verify/{token}",
    params(("token" = String, Path, description = "Signed email-verification token")),
    responses(
        (status = 200, description = "Email verified", body = MessageResponse),
        (status = 400, description = "Invalid or expired token", body = AppError),
    ),
    tag = "auth"
)]
pub async fn verify_email(
    Extension(db): Extension<DatabaseConnection>,
    Path(token): Path<String>,
) -> AppResult<impl IntoResponse> {
    let service = AuthService::new(db);
    service.verify_email(&token).await?;

    Ok(Json(MessageResponse {
        message: "Email verified successfully!".to_string(),
    }))
}

#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 400, description = "Invalid credentials or unverified email", body = AppError),
    ),
    tag = "auth"
)]
pub async fn login(
    Extension(db): Extension<DatabaseConnection>,
    Json(payload): Json<LoginRequest>,
) -> AppResult<impl IntoResponse> {
    let service = AuthService::new(db);
    let (_user, token) = service.login(&payload.email, &payload.password).await?;

    Ok(Json(LoginResponse {
        message: "Login successful".to_string(),
        token,
    }))
}

#[utoipa::path(
    post,
    path = "/forgot-password",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 200, description = "Password reset email sent", body = MessageResponse),
        (status = 400, description = "User not found", body = AppError),
    ),
    tag = "auth"
)]
pub async fn forgot_password(
    Extension(db): Extension<DatabaseConnection>,
    Extension(email_service): Extension<EmailService>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let service = AuthService::new(db);
    service
        .request_password_reset(&payload.email, &email_service)
        .await?;

    Ok(Json(MessageResponse {
        message: "Password reset email sent".to_string(),
    }))
}

#[utoipa::path(
    post,
    path = "/reset-password/{token}",
    params(("token" = String, Path, description = "Opaque single-use reset token")),
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password reset", body = MessageResponse),
        (status = 400, description = "Invalid token", body = AppError),
    ),
    tag = "auth"
)]
pub async fn reset_password(
    Extension(db): Extension<DatabaseConnection>,
    Path(token): Path<String>,
    Json(payload): Json<ResetPasswordRequest>,
) -> AppResult<impl IntoResponse> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let service = AuthService::new(db);
    service
        .confirm_password_reset(&token, &payload.password)
        .await?;

    Ok(Json(MessageResponse {
        message: "Password reset successful".to_string(),
    }))
}
