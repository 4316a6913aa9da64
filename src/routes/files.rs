//! Signed blob downloads: `GET /files/{*path}?expires=..&signature=..`

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use std::sync::Arc;

use crate::error::ErrorResponse;
use crate::storage::{content_type_for, BlobStore, StorageError};

#[derive(Debug, Deserialize)]
pub struct SignedQuery {
    pub expires: Option<i64>,
    pub signature: Option<String>,
}

pub async fn serve_file(
    State(blobs): State<Arc<BlobStore>>,
    Path(path): Path<String>,
    Query(query): Query<SignedQuery>,
) -> Response {
    let signed = match (query.expires, query.signature.as_deref()) {
        (Some(expires), Some(signature)) => blobs.verify(&path, expires, signature),
        _ => false,
    };
    if !signed {
        tracing::warn!(path = %path, "rejected unsigned or expired file request");
        return (
            StatusCode::FORBIDDEN,
            Json(ErrorResponse::new("Invalid or expired signature")),
        )
            .into_response();
    }

    match blobs.read(&path).await {
        Ok(bytes) => (
            [
                (header::CONTENT_TYPE, content_type_for(&path)),
                (header::CACHE_CONTROL, "public, max-age=31536000, immutable"),
            ],
            bytes,
        )
            .into_response(),
        Err(StorageError::NotFound(_)) => (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new("File not found")),
        )
            .into_response(),
        Err(StorageError::InvalidPath(_)) => (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new("Invalid file path")),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(path = %path, error = %e, "failed to read blob");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(ErrorResponse::new("Failed to read file")),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routes::test_support::{send, test_state};
    use axum::{body::Body, http::Request};

    fn public_path(url: &str) -> String {
        // drop scheme and host, keep "/files/..?.."
        let start = url.find("/files/").unwrap();
        url[start..].to_string()
    }

    #[tokio::test]
    async fn test_signed_url_serves_bytes() {
        let state = test_state();
        let stored = state.blobs.put("gallery/1-a.png", b"\x89PNGdata").await.unwrap();
        let app = crate::create_app(state);

        let req = Request::get(public_path(&stored.url))
            .body(Body::empty())
            .unwrap();
        let res = tower::ServiceExt::oneshot(app, req).await.unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers()[header::CONTENT_TYPE], "image/png");
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX).await.unwrap();
        assert_eq!(&bytes[..], b"\x89PNGdata");
    }

    #[tokio::test]
    async fn test_bad_signature_is_forbidden() {
        let state = test_state();
        state.blobs.put("gallery/1-a.png", b"\x89PNGdata").await.unwrap();
        let app = crate::create_app(state);

        let req = Request::get("/files/gallery/1-a.png?expires=16725225600&signature=deadbeef")
            .body(Body::empty())
            .unwrap();
        let (status, _) = send(app.clone(), req).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let req = Request::get("/files/gallery/1-a.png").body(Body::empty()).unwrap();
        let (status, _) = send(app, req).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_missing_blob_is_not_found() {
        let state = test_state();
        let url = state.blobs.signed_url("gallery/missing.png");
        let app = crate::create_app(state);

        let req = Request::get(public_path(&url)).body(Body::empty()).unwrap();
        let (status, _) = send(app, req).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
