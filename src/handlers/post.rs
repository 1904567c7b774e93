use crate::error::{AppError, AppResult};
use crate::services::post::{PostDetail, PostService};
use crate::services::upload::{UploadConfig, UploadService};
use axum::{
    extract::{multipart::MultipartError, Multipart, Path},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use sea_orm::DatabaseConnection;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PostResponse {
    pub id: i32,
    pub title: String,
    /// Public path of the stored image
    pub image_url: String,
    pub user_id: i32,
    /// Resolved owner username
    pub username: String,
    /// User ids that currently like this post
    pub liked_by: Vec<i32>,
    pub created_at: chrono::NaiveDateTime,
}

impl From<PostDetail> for PostResponse {
    fn from(detail: PostDetail) -> Self {
        Self {
            id: detail.post.id,
            title: detail.post.title,
            image_url: detail.post.image_url,
            user_id: detail.post.user_id,
            username: detail.username,
            liked_by: detail.liked_by,
            created_at: detail.post.created_at,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CreatePostResponse {
    pub message: String,
    pub post: PostResponse,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LikeResponse {
    pub message: String,
    pub post: PostResponse,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SaveResponse {
    pub message: String,
    #[serde(rename = "savedPosts")]
    pub saved_posts: Vec<i32>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ActorRequest {
    /// Id of the user performing the toggle
    #[serde(alias = "userId")]
    pub user_id: i32,
}

/// Multipart fields accepted by `create_post`.
struct CreatePostForm {
    title: Option<String>,
    user_id: Option<i32>,
    image: Option<(Vec<u8>, String)>,
}

/// Over-limit bodies surface as `PayloadTooLarge`; anything else that goes
/// wrong mid-stream is a malformed request.
fn multipart_error(context: &str, e: MultipartError) -> AppError {
    if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge
    } else {
        AppError::Validation(format!("{}: {}", context, e))
    }
}

async fn read_create_post_form(mut multipart: Multipart) -> AppResult<CreatePostForm> {
    let mut form = CreatePostForm {
        title: None,
        user_id: None,
        image: None,
    };

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| multipart_error("Failed to read upload", e))?
    {
        let name = field.name().map(|s| s.to_string());
        match name.as_deref() {
            Some("title") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Invalid title field: {}", e)))?;
                form.title = Some(value);
            }
            Some("user_id") | Some("userId") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Invalid user_id field: {}", e)))?;
                let id = value
                    .trim()
                    .parse()
                    .map_err(|_| AppError::Validation("user_id must be an integer".to_string()))?;
                form.user_id = Some(id);
            }
            Some("image") => {
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| multipart_error("Failed to read image", e))?;
                form.image = Some((data.to_vec(), content_type));
            }
            _ => {}
        }
    }

    Ok(form)
}

/// Best-effort removal of a stored upload whose post row never
/// materialized.
async fn remove_upload(config: &UploadConfig, image_url: &str) {
    let Some(relative) = image_url.strip_prefix("/uploads/") else {
        return;
    };
    let path = std::path::Path::new(&config.upload_dir).join(relative);
    if let Err(e) = tokio::fs::remove_file(&path).await {
        tracing::warn!("Failed to remove upload {}: {}", path.display(), e);
    }
}

// Multipart body: title (text), user_id (text), image (file).
#[utoipa::path(
    post,
    path = "/posts",
    responses(
        (status = 201, description = "Post created", body = CreatePostResponse),
        (status = 400, description = "Missing image or validation error", body = AppError),
        (status = 413, description = "Image exceeds the size cap", body = AppError),
    ),
    tag = "posts"
)]
pub async fn create_post(
    Extension(db): Extension<DatabaseConnection>,
    Extension(upload_config): Extension<UploadConfig>,
    multipart: Multipart,
) -> AppResult<impl IntoResponse> {
    let form = read_create_post_form(multipart).await?;

    let title = form
        .title
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| AppError::Validation("Title is required".to_string()))?;
    let user_id = form
        .user_id
        .ok_or_else(|| AppError::Validation("user_id is required".to_string()))?;
    let (image_data, content_type) = form.image.ok_or(AppError::MissingImage)?;

    let image_url =
        UploadService::save_image(&upload_config, &image_data, &content_type, "posts").await?;

    let service = PostService::new(db);
    let detail = match service.create_post(user_id, title.trim(), &image_url).await {
        Ok(detail) => detail,
        Err(e) => {
            // The image landed on disk before the owner check; do not leave
            // it orphaned.
            remove_upload(&upload_config, &image_url).await;
            return Err(e);
        }
    };

    Ok((
        StatusCode::CREATED,
        Json(CreatePostResponse {
            message: "Post created successfully".to_string(),
            post: detail.into(),
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/posts",
    responses(
        (status = 200, description = "All posts, newest first", body = [PostResponse]),
    ),
    tag = "posts"
)]
pub async fn list_posts(
    Extension(db): Extension<DatabaseConnection>,
) -> AppResult<impl IntoResponse> {
    let service = PostService::new(db);
    let posts = service.list_posts().await?;

    let body: Vec<PostResponse> = posts.into_iter().map(PostResponse::from).collect();
    Ok(Json(body))
}

#[utoipa::path(
    post,
    path = "/posts/{post_id}/like",
    params(("post_id" = i32, Path, description = "Post id")),
    request_body = ActorRequest,
    responses(
        (status = 200, description = "Like toggled", body = LikeResponse),
        (status = 404, description = "Post or user not found", body = AppError),
    ),
    tag = "posts"
)]
pub async fn toggle_like(
    Extension(db): Extension<DatabaseConnection>,
    Path(post_id): Path<i32>,
    Json(payload): Json<ActorRequest>,
) -> AppResult<impl IntoResponse> {
    let service = PostService::new(db);
    let detail = service.toggle_like(payload.user_id, post_id).await?;

    Ok(Json(LikeResponse {
        message: "Post like updated".to_string(),
        post: detail.into(),
    }))
}

#[utoipa::path(
    post,
    path = "/posts/{post_id}/save",
    params(("post_id" = i32, Path, description = "Post id")),
    request_body = ActorRequest,
    responses(
        (status = 200, description = "Save toggled", body = SaveResponse),
        (status = 404, description = "Post or user not found", body = AppError),
    ),
    tag = "posts"
)]
pub async fn toggle_save(
    Extension(db): Extension<DatabaseConnection>,
    Path(post_id): Path<i32>,
    Json(payload): Json<ActorRequest>,
) -> AppResult<impl IntoResponse> {
    let service = PostService::new(db);
    let saved_posts = service.toggle_save(payload.user_id, post_id).await?;

    Ok(Json(SaveResponse {
        message: "Post saved successfully".to_string(),
        saved_posts,
    }))
}
