use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use crate::db::{models::TemplateCategory, DocumentStore};
use crate::error::{AppJson, AppResult};
use crate::routes::SuccessResponse;
use crate::services::categories::{self as service, CategoryInput, CategoryPatch};

/// GET /api/template-categories - seeds the default set on first use
pub async fn list_categories(
    State(store): State<DocumentStore>,
) -> AppResult<Json<Vec<TemplateCategory>>> {
    Ok(Json(service::list_categories(&store).await?))
}

/// POST /api/template-categories
pub async fn create_category(
    State(store): State<DocumentStore>,
    AppJson(payload): AppJson<CategoryInput>,
) -> AppResult<impl IntoResponse> {
    let category = service::create_category(&store, payload).await?;
    Ok((StatusCode::CREATED, Json(category)))
}

/// PATCH /api/template-categories/{id}
pub async fn update_category(
    State(store): State<DocumentStore>,
    Path(id): Path<String>,
    AppJson(payload): AppJson<CategoryPatch>,
) -> AppResult<Json<TemplateCategory>> {
    Ok(Json(service::update_category(&store, &id, payload).await?))
}

/// DELETE /api/template-categories/{id}
pub async fn delete_category(
    State(store): State<DocumentStore>,
    Path(id): Path<String>,
) -> AppResult<Json<SuccessResponse>> {
    service::delete_category(&store, &id).await?;
    Ok(Json(SuccessResponse { success: true }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::test_support::{empty_request, json_request, send, test_state};
    use serde_json::json;

    #[tokio::test]
    async fn test_list_seeds_and_duplicate_create_conflicts() {
        let app = crate::create_app(test_state());

        let (status, bytes) = send(app.clone(), empty_request("GET", "/api/template-categories")).await;
        assert_eq!(status, StatusCode::OK);
        let categories: Vec<TemplateCategory> = serde_json::from_slice(&bytes).unwrap();
        assert!(categories.iter().any(|c| c.name == "Portfolio"));

        let (status, bytes) = send(app.clone(), empty_request("GET", "/api/template-categories")).await;
        assert_eq!(status, StatusCode::OK);
        let again: Vec<TemplateCategory> = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(again.len(), categories.len());

        let (status, _) = send(
            app,
            json_request(
                "POST",
                "/api/template-categories",
                &json!({ "name": "portfolio" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }
}
