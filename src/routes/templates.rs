/**
 * Template Routes
 * CRUD for page templates plus drag-and-drop edits of their components
 */
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;

use crate::db::{
    models::{Template, TemplateComponent},
    DocumentStore,
};
use crate::error::{AppJson, AppResult};
use crate::routes::SuccessResponse;
use crate::services::templates::{
    self as service, DropRequest, DropResult, MoveRequest, TemplateInput, TemplatePatch,
};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TemplateListQuery {
    pub category_id: Option<String>,
}

/// GET /api/templates
pub async fn list_templates(
    State(store): State<DocumentStore>,
    Query(query): Query<TemplateListQuery>,
) -> AppResult<Json<Vec<Template>>> {
    let templates = service::list_templates(&store, query.category_id.as_deref()).await?;
    Ok(Json(templates))
}

/// POST /api/templates
pub async fn create_template(
    State(store): State<DocumentStore>,
    AppJson(payload): AppJson<TemplateInput>,
) -> AppResult<impl IntoResponse> {
    let template = service::create_template(&store, payload).await?;
    Ok((StatusCode::CREATED, Json(template)))
}

/// GET /api/templates/{id}
pub async fn get_template(
    State(store): State<DocumentStore>,
    Path(id): Path<String>,
) -> AppResult<Json<Template>> {
    Ok(Json(service::get_template(&store, &id).await?))
}

/// PATCH /api/templates/{id}
pub async fn update_template(
    State(store): State<DocumentStore>,
    Path(id): Path<String>,
    AppJson(payload): AppJson<TemplatePatch>,
) -> AppResult<Json<Template>> {
    Ok(Json(service::update_template(&store, &id, payload).await?))
}

/// DELETE /api/templates/{id}
pub async fn delete_template(
    State(store): State<DocumentStore>,
    Path(id): Path<String>,
) -> AppResult<Json<SuccessResponse>> {
    service::delete_template(&store, &id).await?;
    Ok(Json(SuccessResponse { success: true }))
}

/// POST /api/templates/{id}/components - drop a bundle or component
pub async fn drop_components(
    State(store): State<DocumentStore>,
    Path(id): Path<String>,
    AppJson(payload): AppJson<DropRequest>,
) -> AppResult<Json<DropResult>> {
    Ok(Json(service::drop_components(&store, &id, payload).await?))
}

/// POST /api/templates/{id}/components/move
pub async fn move_component(
    State(store): State<DocumentStore>,
    Path(id): Path<String>,
    AppJson(payload): AppJson<MoveRequest>,
) -> AppResult<Json<Template>> {
    Ok(Json(service::move_component(&store, &id, payload).await?))
}

/// PATCH /api/templates/{id}/components/{component_id}
pub async fn update_component(
    State(store): State<DocumentStore>,
    Path((id, component_id)): Path<(String, String)>,
    AppJson(payload): AppJson<TemplateComponent>,
) -> AppResult<Json<Template>> {
    Ok(Json(
        service::update_component(&store, &id, &component_id, payload).await?,
    ))
}

/// DELETE /api/templates/{id}/components/{component_id}
pub async fn delete_component(
    State(store): State<DocumentStore>,
    Path((id, component_id)): Path<(String, String)>,
) -> AppResult<Json<Template>> {
    Ok(Json(
        service::delete_component(&store, &id, &component_id).await?,
    ))
}
