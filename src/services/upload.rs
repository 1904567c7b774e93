use crate::error::{AppError, AppResult};
use std::path::Path;
use tokio::fs;
use uuid::Uuid;

#[derive(Clone)]
pub struct UploadConfig {
    pub upload_dir: String,
}

pub const MAX_IMAGE_SIZE: usize = 5 * 1024 * 1024; // 5 MB

/// Request body ceiling for multipart uploads. Sits above the image cap so
/// an oversize image reaches the explicit size check instead of dying in
/// the transport layer; the headroom covers the other form fields and
/// multipart framing.
pub const UPLOAD_BODY_LIMIT: usize = MAX_IMAGE_SIZE + 64 * 1024;

/// Declared content type, stored extension, and magic-byte check.
fn image_extension(data: &[u8], content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/jpeg" if data.len() >= 3 && data[..3] == [0xFF, 0xD8, 0xFF] => Some("jpg"),
        "image/png" if data.len() >= 4 && data[..4] == [0x89, 0x50, 0x4E, 0x47] => Some("png"),
        "image/gif" if data.len() >= 4 && data[..4] == [0x47, 0x49, 0x46, 0x38] => Some("gif"),
        "image/webp"
            if data.len() >= 12
                && data[..4] == [0x52, 0x49, 0x46, 0x46]
                && data[8..12] == [0x57, 0x45, 0x42, 0x50] =>
        {
            Some("webp")
        }
        _ => None,
    }
}

pub struct UploadService;

impl UploadService {
    /// Persist an uploaded image under `upload_dir/<subdirectory>/`.
    /// Returns the public URL path (e.g., `/uploads/posts/<uuid>.jpg`).
    pub async fn save_image(
        config: &UploadConfig,
        data: &[u8],
        content_type: &str,
        subdirectory: &str,
    ) -> AppResult<String> {
        if data.len() > MAX_IMAGE_SIZE {
            return Err(AppError::PayloadTooLarge);
        }

        let ext = image_extension(data, content_type).ok_or_else(|| {
            AppError::Validation(format!(
                "Unsupported or mismatched image type: {}. Allowed: jpeg, png, gif, webp",
                content_type
            ))
        })?;

        let filename = format!("{}.{}", Uuid::new_v4(), ext);
        let dir = Path::new(&config.upload_dir).join(subdirectory);

        fs::create_dir_all(&dir).await.map_err(|e| {
            AppError::Internal(anyhow::anyhow!("Failed to create upload directory: {}", e))
        })?;

        let file_path = dir.join(&filename);
        fs::write(&file_path, data)
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to write file: {}", e)))?;

        Ok(format!("/uploads/{}/{}", subdirectory, filename))
    }
}
