/**
 * Routes Module
 * API route handlers and shared application state
 */
pub mod blog;
pub mod categories;
pub mod components;
pub mod files;
pub mod gallery;
pub mod guard;
pub mod health;
pub mod staff;
pub mod templates;
pub mod upload;

use axum::extract::FromRef;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::config::AppConfig;
use crate::db::DocumentStore;
use crate::generator::ContentGenerator;
use crate::storage::BlobStore;

pub use crate::error::ErrorResponse;

/// Shared application state
#[derive(Clone, FromRef)]
pub struct AppState {
    pub store: DocumentStore,
    pub blobs: Arc<BlobStore>,
    pub generator: Arc<ContentGenerator>,
    pub config: Arc<AppConfig>,
}

/// Body returned by delete endpoints
#[derive(Debug, Serialize, Deserialize)]
pub struct SuccessResponse {
    pub success: bool,
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use axum::{body::Body, http::Request, http::StatusCode, Router};
    use tower::ServiceExt;

    use crate::config::StoreBackend;
    use crate::generator::GeneratorConfig;
    use crate::storage::tests::temp_blob_store;

    pub const SESSION_COOKIE: &str = "session=test-session";

    pub fn test_config() -> AppConfig {
        AppConfig {
            environment: "test".to_string(),
            host: "127.0.0.1".to_string(),
            port: 3001,
            store: StoreBackend::Memory,
            blob: crate::storage::BlobConfig {
                root: std::env::temp_dir(),
                public_base_url: "http://localhost:3001".to_string(),
                signing_secret: "test-secret".to_string(),
            },
            generator: GeneratorConfig {
                api_base: "http://127.0.0.1:9".to_string(),
                api_key: "test-key".to_string(),
                model: "test-model".to_string(),
            },
            session_cookie: "session".to_string(),
            allowed_origins: vec!["http://localhost:3000".to_string()],
        }
    }

    pub fn test_state() -> AppState {
        let config = test_config();
        AppState {
            store: DocumentStore::memory(),
            blobs: Arc::new(temp_blob_store()),
            generator: Arc::new(ContentGenerator::new(config.generator.clone())),
            config: Arc::new(config),
        }
    }

    pub async fn send(app: Router, request: Request<Body>) -> (StatusCode, axum::body::Bytes) {
        let res = app.oneshot(request).await.unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, bytes)
    }

    pub fn json_request(method: &str, uri: &str, json: &serde_json::Value) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("content-type", "application/json")
            .header("cookie", SESSION_COOKIE)
            .body(Body::from(serde_json::to_vec(json).unwrap()))
            .unwrap()
    }

    pub fn empty_request(method: &str, uri: &str) -> Request<Body> {
        Request::builder()
            .method(method)
            .uri(uri)
            .header("cookie", SESSION_COOKIE)
            .body(Body::empty())
            .unwrap()
    }
}
