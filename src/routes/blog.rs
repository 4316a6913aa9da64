/**
 * Blog Routes
 * CRUD API endpoints for blog posts and AI-assisted drafting
 */
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use std::sync::Arc;

use crate::db::{models::BlogPost, DocumentStore};
use crate::error::{AppError, AppJson, AppResult};
use crate::generator::{ContentGenerator, GenerateRequest, GeneratedContent};
use crate::routes::SuccessResponse;
use crate::services::blog::{
    self as service, BlogListQuery, BlogListResponse, CreateBlogRequest, UpdateBlogRequest,
};

// ============================================================================
// Handlers
// ============================================================================

/// GET /api/blog - List blog posts with filters and pagination
pub async fn list_posts(
    State(store): State<DocumentStore>,
    Query(query): Query<BlogListQuery>,
) -> AppResult<Json<BlogListResponse>> {
    Ok(Json(service::list_posts(&store, query).await?))
}

/// GET /api/blog/{id}
pub async fn get_post(
    State(store): State<DocumentStore>,
    Path(id): Path<String>,
) -> AppResult<Json<BlogPost>> {
    Ok(Json(service::get_post(&store, &id).await?))
}

/// GET /api/blog/slug/{slug}
pub async fn get_post_by_slug(
    State(store): State<DocumentStore>,
    Path(slug): Path<String>,
) -> AppResult<Json<BlogPost>> {
    Ok(Json(service::get_post_by_slug(&store, &slug).await?))
}

/// POST /api/blog - Create new blog post
pub async fn create_post(
    State(store): State<DocumentStore>,
    AppJson(payload): AppJson<CreateBlogRequest>,
) -> AppResult<impl IntoResponse> {
    let post = service::create_post(&store, payload).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

/// PATCH /api/blog/{id} - Update blog post
pub async fn update_post(
    State(store): State<DocumentStore>,
    Path(id): Path<String>,
    AppJson(payload): AppJson<UpdateBlogRequest>,
) -> AppResult<Json<BlogPost>> {
    Ok(Json(service::update_post(&store, &id, payload).await?))
}

/// DELETE /api/blog/{id} - Delete blog post
pub async fn delete_post(
    State(store): State<DocumentStore>,
    Path(id): Path<String>,
) -> AppResult<Json<SuccessResponse>> {
    service::delete_post(&store, &id).await?;
    Ok(Json(SuccessResponse { success: true }))
}

/// POST /api/blog/generate - Draft content with the generative-text API
pub async fn generate_content(
    State(generator): State<Arc<ContentGenerator>>,
    AppJson(payload): AppJson<GenerateRequest>,
) -> AppResult<Json<GeneratedContent>> {
    if payload.title.trim().is_empty() {
        return Err(AppError::validation("Title is required"));
    }

    tracing::info!(title = %payload.title, "generating blog content");
    let content = generator.generate(&payload).await?;
    Ok(Json(content))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::test_support::{empty_request, json_request, send, test_state};
    use serde_json::{json, Value};

    #[tokio::test]
    async fn test_create_get_by_slug_and_delete() {
        let app = crate::create_app(test_state());

        let (status, bytes) = send(
            app.clone(),
            json_request(
                "POST",
                "/api/blog",
                &json!({
                    "title": "Ten Hero Sections",
                    "content": "<p>Intro</p>",
                    "status": "published",
                    "tags": ["design"]
                }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let post: BlogPost = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(post.slug, "ten-hero-sections");
        assert!(post.published_at.is_some());

        let (status, bytes) = send(
            app.clone(),
            empty_request("GET", "/api/blog/slug/ten-hero-sections"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let by_slug: BlogPost = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(by_slug.id, post.id);

        let (status, bytes) = send(
            app.clone(),
            empty_request("GET", "/api/blog?status=published&tag=design"),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let list: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(list["total"], 1);

        let (status, _) = send(
            app.clone(),
            empty_request("DELETE", &format!("/api/blog/{}", post.id)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = send(app, empty_request("DELETE", &format!("/api/blog/{}", post.id))).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_create_with_invalid_slug_is_bad_request() {
        let app = crate::create_app(test_state());
        let (status, bytes) = send(
            app,
            json_request(
                "POST",
                "/api/blog",
                &json!({ "title": "Hello", "slug": "Not Valid" }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert!(body["error"].as_str().unwrap().contains("Slug"));
    }

    #[tokio::test]
    async fn test_generate_requires_title() {
        let app = crate::create_app(test_state());
        let (status, _) = send(
            app,
            json_request(
                "POST",
                "/api/blog/generate",
                &json!({ "title": "  ", "categories": [], "tags": [] }),
            ),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_huge_page_number_returns_empty_page() {
        let app = crate::create_app(test_state());
        send(
            app.clone(),
            json_request("POST", "/api/blog", &json!({ "title": "Only post" })),
        )
        .await;

        let (status, bytes) = send(
            app,
            empty_request("GET", &format!("/api/blog?page={}", usize::MAX)),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        let list: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(list["total"], 1);
        assert_eq!(list["items"].as_array().unwrap().len(), 0);
    }
}
