/**
 * Image Upload Routes
 * Multipart image upload into blob storage and deletion of stored images
 */
use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::builder::{is_valid_slug, slugify};
use crate::error::AppJson;
use crate::routes::{AppState, ErrorResponse, SuccessResponse};
use crate::services::gallery;
use crate::storage::StorageError;

pub const MAX_FILE_SIZE: usize = 5 * 1024 * 1024; // 5 MiB
/// Multipart framing on top of the largest accepted file
pub const MAX_UPLOAD_BODY: usize = MAX_FILE_SIZE + 1024 * 1024;

const ALLOWED_MIME_TYPES: &[&str] = &["image/jpeg", "image/png", "image/gif", "image/webp"];
const ALLOWED_CATEGORIES: &[&str] = &["gallery", "blog", "components"];
const DEFAULT_CATEGORY: &str = "gallery";

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub url: String,
    pub path: String,
    pub size: usize,
    pub mime_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_id: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteImageRequest {
    #[serde(default)]
    pub image_id: Option<String>,
    #[serde(default)]
    pub storage_path: Option<String>,
}

struct UploadedFile {
    file_name: String,
    content_type: String,
    bytes: axum::body::Bytes,
}

fn error_response(status: StatusCode, error: &str) -> Response {
    (status, Json(ErrorResponse::new(error))).into_response()
}

fn bad_request(error: &str) -> Response {
    error_response(StatusCode::BAD_REQUEST, error)
}

fn validate_image_magic_bytes(bytes: &[u8]) -> Option<&'static str> {
    if bytes.len() < 4 {
        return None;
    }
    match bytes {
        [0xFF, 0xD8, 0xFF, ..] => Some("image/jpeg"),
        [0x89, 0x50, 0x4E, 0x47, ..] => Some("image/png"),
        [0x47, 0x49, 0x46, 0x38, ..] => Some("image/gif"),
        [0x52, 0x49, 0x46, 0x46, _, _, _, _, 0x57, 0x45, 0x42, 0x50, ..] => Some("image/webp"),
        _ => None,
    }
}

fn get_extension_from_mime(mime: &str) -> &str {
    match mime {
        "image/jpeg" => "jpg",
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        _ => "bin",
    }
}

/// `{category}/[{slug}/]{millis}-{stem}.{ext}`
fn storage_path(category: &str, slug: Option<&str>, file_name: &str, mime: &str) -> String {
    let stem = file_name
        .rsplit_once('.')
        .map(|(stem, _)| stem)
        .unwrap_or(file_name);
    let stem = match slugify(stem) {
        s if s.is_empty() => "image".to_string(),
        s => s,
    };
    let file = format!(
        "{}-{}.{}",
        Utc::now().timestamp_millis(),
        stem,
        get_extension_from_mime(mime)
    );

    match slug {
        Some(slug) => format!("{}/{}/{}", category, slug, file),
        None => format!("{}/{}", category, file),
    }
}

/// POST /api/upload-image
/// Fields: `file` (required), `category`, `slug`, `name`
pub async fn upload_image(State(state): State<AppState>, mut multipart: Multipart) -> impl IntoResponse {
    let mut file: Option<UploadedFile> = None;
    let mut category: Option<String> = None;
    let mut slug: Option<String> = None;
    let mut display_name: Option<String> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                tracing::warn!("Multipart error: {}", e);
                return bad_request("Invalid multipart data");
            }
        };

        let field_name = field.name().unwrap_or("").to_string();
        match field_name.as_str() {
            "file" => {
                let file_name = field.file_name().unwrap_or("upload").to_string();
                let content_type = field.content_type().unwrap_or("").to_lowercase();

                // Reject on the declared type before buffering anything
                if !ALLOWED_MIME_TYPES.contains(&content_type.as_str()) {
                    return bad_request("Unsupported file type. Allowed: JPEG, PNG, WebP, GIF.");
                }

                let bytes = match field.bytes().await {
                    Ok(b) => b,
                    Err(e) => {
                        tracing::warn!("Failed to read upload bytes: {}", e);
                        return bad_request("Failed to read file data");
                    }
                };

                file = Some(UploadedFile {
                    file_name,
                    content_type,
                    bytes,
                });
            }
            "category" | "slug" | "name" => {
                let text = match field.text().await {
                    Ok(t) => t.trim().to_string(),
                    Err(e) => {
                        tracing::warn!("Failed to read multipart field {}: {}", field_name, e);
                        return bad_request("Invalid multipart data");
                    }
                };
                if text.is_empty() {
                    continue;
                }
                match field_name.as_str() {
                    "category" => category = Some(text),
                    "slug" => slug = Some(text),
                    _ => display_name = Some(text),
                }
            }
            other => {
                tracing::debug!("Ignoring multipart field {}", other);
            }
        }
    }

    let file = match file {
        Some(f) => f,
        None => return bad_request("No file provided"),
    };

    if file.bytes.len() > MAX_FILE_SIZE {
        return bad_request("File too large. Maximum size is 5MB.");
    }

    if file.bytes.is_empty() {
        return bad_request("Empty file");
    }

    match validate_image_magic_bytes(&file.bytes) {
        Some(detected) if detected == file.content_type => {}
        _ => return bad_request("File content does not match an allowed image type."),
    }

    let category = category.unwrap_or_else(|| DEFAULT_CATEGORY.to_string());
    if !ALLOWED_CATEGORIES.contains(&category.as_str()) {
        return bad_request("Invalid category. Allowed: gallery, blog, components.");
    }

    if let Some(slug) = slug.as_deref() {
        if !is_valid_slug(slug) {
            return bad_request("Slug must contain only lowercase letters, numbers, and hyphens");
        }
    }

    let path = storage_path(&category, slug.as_deref(), &file.file_name, &file.content_type);

    let stored = match state.blobs.put(&path, &file.bytes).await {
        Ok(stored) => stored,
        Err(e) => {
            tracing::error!("Failed to store upload {}: {}", path, e);
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to save file");
        }
    };

    let mut image_id = None;
    if category == DEFAULT_CATEGORY {
        let name = display_name.unwrap_or_else(|| file.file_name.clone());
        match gallery::record_image(&state.store, &name, &stored.url, &stored.path).await {
            Ok(image) => image_id = Some(image.id),
            Err(e) => {
                tracing::error!("Failed to record gallery image {}: {}", path, e);
                if let Err(cleanup) = state.blobs.delete(&path).await {
                    tracing::warn!("Failed to remove orphaned blob {}: {}", path, cleanup);
                }
                return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to save image record");
            }
        }
    }

    tracing::info!("Image uploaded: {} ({} bytes)", stored.path, stored.size);

    (
        StatusCode::CREATED,
        Json(UploadResponse {
            url: stored.url,
            path: stored.path,
            size: stored.size,
            mime_type: file.content_type,
            image_id,
        }),
    )
        .into_response()
}

/// POST /api/delete-image
/// Deletes the blob and its gallery record. A missing blob is not an error
/// as long as something was deleted.
pub async fn delete_image(
    State(state): State<AppState>,
    AppJson(payload): AppJson<DeleteImageRequest>,
) -> impl IntoResponse {
    let image_id = payload.image_id.filter(|id| !id.trim().is_empty());
    let mut storage_path = payload.storage_path.filter(|p| !p.trim().is_empty());

    if image_id.is_none() && storage_path.is_none() {
        return bad_request("imageId or storagePath is required");
    }

    if storage_path.is_none() {
        if let Some(id) = image_id.as_deref() {
            match gallery::get_image(&state.store, id).await {
                Ok(Some(image)) if !image.storage_path.is_empty() => {
                    storage_path = Some(image.storage_path)
                }
                Ok(_) => {}
                Err(e) => return e.into_response(),
            }
        }
    }

    let mut deleted_blob = false;
    if let Some(path) = storage_path.as_deref() {
        match state.blobs.delete(path).await {
            Ok(()) => deleted_blob = true,
            Err(StorageError::NotFound(_)) => {
                tracing::warn!("Blob {} already missing", path);
            }
            Err(StorageError::InvalidPath(_)) => return bad_request("Invalid storage path"),
            Err(e) => {
                tracing::error!("Failed to delete blob {}: {}", path, e);
                return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Failed to delete file");
            }
        }
    }

    let mut deleted_record = false;
    if let Some(id) = image_id.as_deref() {
        match gallery::delete_image_record(&state.store, id).await {
            Ok(()) => deleted_record = true,
            Err(crate::error::AppError::NotFound(_)) => {}
            Err(e) => return e.into_response(),
        }
    }

    if !deleted_blob && !deleted_record {
        return error_response(StatusCode::NOT_FOUND, "Image not found");
    }

    tracing::info!(
        image_id = ?image_id,
        storage_path = ?storage_path,
        "Image deleted"
    );
    (StatusCode::OK, Json(SuccessResponse { success: true })).into_response()
}
