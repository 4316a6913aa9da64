use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::db::{models::Staff, DocumentStore};
use crate::error::{AppJson, AppResult};
use crate::routes::SuccessResponse;
use crate::services::staff::{self as service, LevelPermissions, StaffInput, StaffPatch};

/// GET /api/staff
pub async fn list_staff(State(store): State<DocumentStore>) -> AppResult<Json<Vec<Staff>>> {
    Ok(Json(service::list_staff(&store).await?))
}

/// GET /api/staff/permissions
pub async fn permission_table() -> Json<Vec<LevelPermissions>> {
    Json(service::permission_table())
}

/// POST /api/staff
pub async fn create_staff(
    State(store): State<DocumentStore>,
    AppJson(payload): AppJson<StaffInput>,
) -> AppResult<impl IntoResponse> {
    let staff = service::create_staff(&store, payload).await?;
    Ok((StatusCode::CREATED, Json(staff)))
}

/// PATCH /api/staff/{id}
pub async fn update_staff(
    State(store): State<DocumentStore>,
    Path(id): Path<String>,
    AppJson(payload): AppJson<StaffPatch>,
) -> AppResult<Json<Staff>> {
    Ok(Json(service::update_staff(&store, &id, payload).await?))
}

/// DELETE /api/staff/{id}
pub async fn delete_staff(
    State(store): State<DocumentStore>,
    Path(id): Path<String>,
) -> AppResult<Json<SuccessResponse>> {
    service::delete_staff(&store, &id).await?;
    Ok(Json(SuccessResponse { success: true }))
}
