/**
 * Component Library Routes
 * Bundles shown as draggable entries in the builder sidebar
 */
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::db::{models::ComponentEditor, DocumentStore};
use crate::error::{AppJson, AppResult};
use crate::routes::SuccessResponse;
use crate::services::components::{self as service, ComponentBundleInput, ComponentBundlePatch};

/// GET /api/components
pub async fn list_components(
    State(store): State<DocumentStore>,
) -> AppResult<Json<Vec<ComponentEditor>>> {
    Ok(Json(service::list_bundles(&store).await?))
}

/// POST /api/components
pub async fn create_component(
    State(store): State<DocumentStore>,
    AppJson(payload): AppJson<ComponentBundleInput>,
) -> AppResult<impl IntoResponse> {
    let bundle = service::create_bundle(&store, payload).await?;
    Ok((StatusCode::CREATED, Json(bundle)))
}

/// GET /api/components/{id}
pub async fn get_component(
    State(store): State<DocumentStore>,
    Path(id): Path<String>,
) -> AppResult<Json<ComponentEditor>> {
    Ok(Json(service::get_bundle(&store, &id).await?))
}

/// PATCH /api/components/{id}
pub async fn update_component(
    State(store): State<DocumentStore>,
    Path(id): Path<String>,
    AppJson(payload): AppJson<ComponentBundlePatch>,
) -> AppResult<Json<ComponentEditor>> {
    Ok(Json(service::update_bundle(&store, &id, payload).await?))
}

/// DELETE /api/components/{id}
pub async fn delete_component(
    State(store): State<DocumentStore>,
    Path(id): Path<String>,
) -> AppResult<Json<SuccessResponse>> {
    service::delete_bundle(&store, &id).await?;
    Ok(Json(SuccessResponse { success: true }))
}
