use axum::{extract::State, Json};

use crate::db::{models::GalleryImage, DocumentStore};
use crate::error::AppResult;
use crate::services::gallery;

/// GET /api/gallery - newest first
pub async fn list_images(State(store): State<DocumentStore>) -> AppResult<Json<Vec<GalleryImage>>> {
    Ok(Json(gallery::list_images(&store).await?))
}
