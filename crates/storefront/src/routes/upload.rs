//! Multipart image handling shared by avatar and product uploads.

use axum::extract::Multipart;
use uuid::Uuid;

use arthive_core::ProfileId;

use crate::error::{AppError, Result};

/// Largest accepted image, in bytes.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// An image pulled out of a multipart form.
#[derive(Debug)]
pub struct ImageUpload {
    pub bytes: Vec<u8>,
    pub content_type: String,
    pub extension: &'static str,
}

impl ImageUpload {
    /// Object path that cannot collide: `<user id>-<uuid>.<ext>`.
    #[must_use]
    pub fn object_path(&self, owner: &ProfileId) -> String {
        format!("{owner}-{}.{}", Uuid::new_v4(), self.extension)
    }
}

/// File extension for an accepted image content type.
pub fn image_extension(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/jpeg" | "image/jpg" => Some("jpg"),
        "image/png" => Some("png"),
        "image/webp" => Some("webp"),
        "image/gif" => Some("gif"),
        _ => None,
    }
}

/// Validate raw file bytes and their declared type.
///
/// # Errors
///
/// Rejects empty files, oversized files and non-image content types.
pub fn validate_image(bytes: Vec<u8>, content_type: &str) -> Result<Option<ImageUpload>> {
    if bytes.is_empty() {
        // Browsers send an empty part when no file was chosen
        return Ok(None);
    }
    if bytes.len() > MAX_IMAGE_BYTES {
        return Err(AppError::BadRequest(format!(
            "Image must be at most {} MB",
            MAX_IMAGE_BYTES / (1024 * 1024)
        )));
    }
    let extension = image_extension(content_type).ok_or_else(|| {
        AppError::BadRequest("Image must be JPEG, PNG, WebP or GIF".to_string())
    })?;

    Ok(Some(ImageUpload {
        bytes,
        content_type: content_type.to_owned(),
        extension,
    }))
}

/// Fields of a multipart form: text fields plus at most one image.
#[derive(Debug, Default)]
pub struct MultipartForm {
    pub fields: Vec<(String, String)>,
    pub image: Option<ImageUpload>,
}

impl MultipartForm {
    /// Read every part; the part named `image_field` is treated as the file.
    ///
    /// # Errors
    ///
    /// Returns `BadRequest` for malformed multipart bodies or invalid images.
    pub async fn read(mut multipart: Multipart, image_field: &str) -> Result<Self> {
        let mut form = Self::default();

        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?
        {
            let name = field.name().unwrap_or_default().to_owned();
            if name == image_field {
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_owned();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.body_text()))?;
                form.image = validate_image(bytes.to_vec(), &content_type)?;
            } else {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.body_text()))?;
                form.fields.push((name, value));
            }
        }

        Ok(form)
    }

    /// Trimmed, non-empty value of a text field.
    #[must_use]
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.trim())
            .filter(|v| !v.is_empty())
    }
}
