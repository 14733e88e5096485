//! Multipart form handling for article routes
//!
//! Article create and update arrive as multipart forms: text fields plus
//! an optional photo. The photo is validated and written to the upload
//! directory under a random name; the stored relative path is what lands
//! in the database.

use axum::extract::Multipart;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::api::common::ApiError;
use crate::config::UploadConfig;

/// Text fields and the stored photo path, if a photo was uploaded.
pub struct ArticleForm {
    pub fields: BTreeMap<String, String>,
    pub photo_path: Option<String>,
}

/// Drain a multipart request into text fields plus at most one stored photo.
pub async fn read_article_form(
    mut multipart: Multipart,
    upload: &UploadConfig,
) -> Result<ArticleForm, ApiError> {
    let mut fields = BTreeMap::new();
    let mut photo_path = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::unprocessable(format!("Malformed multipart body: {}", e)))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        if name == "photo" {
            let content_type = field.content_type().map(str::to_string).unwrap_or_default();
            let data = field
                .bytes()
                .await
                .map_err(|e| ApiError::unprocessable(format!("Failed to read photo: {}", e)))?;

            // An empty photo part means no photo was attached.
            if data.is_empty() {
                continue;
            }

            photo_path = Some(store_photo(upload, &content_type, &data).await?);
        } else {
            let value = field
                .text()
                .await
                .map_err(|e| ApiError::unprocessable(format!("Malformed field {}: {}", name, e)))?;
            fields.insert(name, value);
        }
    }

    Ok(ArticleForm { fields, photo_path })
}

async fn store_photo(
    upload: &UploadConfig,
    content_type: &str,
    data: &[u8],
) -> Result<String, ApiError> {
    if !upload.is_type_allowed(content_type) {
        return Err(ApiError::unprocessable(format!(
            "Photo type {} is not allowed",
            content_type
        )));
    }

    if data.len() as u64 > upload.max_file_size {
        return Err(ApiError::unprocessable(format!(
            "Photo exceeds the maximum size of {} bytes",
            upload.max_file_size
        )));
    }

    let extension = extension_for(content_type);
    let file_name = format!("{}.{}", Uuid::new_v4(), extension);

    tokio::fs::create_dir_all(&upload.path)
        .await
        .map_err(|e| ApiError::internal(anyhow::anyhow!("Failed to create upload dir: {}", e)))?;

    let target = upload.path.join(&file_name);
    tokio::fs::write(&target, data)
        .await
        .map_err(|e| ApiError::internal(anyhow::anyhow!("Failed to store photo: {}", e)))?;

    Ok(target.to_string_lossy().to_string())
}

fn extension_for(content_type: &str) -> &'static str {
    match content_type {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        _ => "bin",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_mapping() {
        assert_eq!(extension_for("image/jpeg"), "jpg");
        assert_eq!(extension_for("image/webp"), "webp");
        assert_eq!(extension_for("text/plain"), "bin");
    }

    #[tokio::test]
    async fn test_store_photo_rejects_disallowed_type() {
        let upload = UploadConfig::default();
        let result = store_photo(&upload, "application/zip", b"data").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_store_photo_rejects_oversized_file() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let upload = UploadConfig {
            path: temp_dir.path().to_path_buf(),
            max_file_size: 4,
            ..Default::default()
        };

        let result = store_photo(&upload, "image/png", b"too big").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_store_photo_writes_file() {
        let temp_dir = tempfile::tempdir().expect("temp dir");
        let upload = UploadConfig {
            path: temp_dir.path().to_path_buf(),
            ..Default::default()
        };

        let path = store_photo(&upload, "image/png", b"fake png")
            .await
            .expect("store");
        assert!(path.ends_with(".png"));
        assert!(std::path::Path::new(&path).exists());
    }
}
