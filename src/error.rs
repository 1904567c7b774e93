use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Email already in use")]
    DuplicateEmail,

    #[error("User not found")]
    UserNotFound,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Please verify your email first")]
    EmailNotVerified,

    #[error("Invalid or expired token")]
    TokenInvalid,

    #[error("Token expired")]
    TokenExpired,

    #[error("Stored credential is corrupt")]
    CorruptCredential,

    #[error("Image is required")]
    MissingImage,

    #[error("Not found")]
    NotFound,

    #[error("Internal server error: {0}")]
    Internal(#[from] anyhow::Error),

    #[error("Payload too large")]
    PayloadTooLarge,
}

impl AppError {
    /// Machine-stable kind exposed in the response body.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Database(_) => "DatabaseError",
            AppError::Validation(_) => "ValidationError",
            AppError::DuplicateEmail => "DuplicateEmail",
            AppError::UserNotFound => "UserNotFound",
            AppError::InvalidCredentials => "InvalidCredentials",
            AppError::EmailNotVerified => "EmailNotVerified",
            AppError::TokenInvalid => "TokenInvalid",
            AppError::TokenExpired => "TokenExpired",
            AppError::CorruptCredential => "CorruptCredential",
            AppError::MissingImage => "MissingImage",
            AppError::NotFound => "NotFound",
            AppError::Internal(_) => "InternalError",
            AppError::PayloadTooLarge => "PayloadTooLarge",
        }
    }
}

#[derive(serde::Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}

impl utoipa::ToSchema for AppError {
    fn name() -> std::borrow::Cow<'static, str> {
        "ErrorResponse".into()
    }
}

impl utoipa::PartialSchema for AppError {
    fn schema() -> utoipa::openapi::RefOr<utoipa::openapi::schema::Schema> {
        ErrorResponse::schema()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error".to_string(),
                )
            }
            AppError::Internal(e) => {
                tracing::error!("Internal error: {:?}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
            AppError::CorruptCredential => {
                tracing::error!("Stored password hash failed to parse");
                (StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
            AppError::NotFound => (StatusCode::NOT_FOUND, self.to_string()),
            AppError::PayloadTooLarge => (StatusCode::PAYLOAD_TOO_LARGE, self.to_string()),
            _ => (StatusCode::BAD_REQUEST, self.to_string()),
        };

        let body = json!({
            "error": self.kind(),
            "message": message,
        });

        (status, Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
