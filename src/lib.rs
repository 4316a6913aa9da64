//! Landing Admin - backend for the landing-page builder dashboard

pub mod builder;
pub mod config;
pub mod db;
pub mod error;
pub mod generator;
pub mod logging;
pub mod routes;
pub mod services;
pub mod storage;

use axum::{
    extract::DefaultBodyLimit,
    http::{HeaderValue, Method},
    middleware,
    routing::{get, patch, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer, cors::CorsLayer, limit::RequestBodyLimitLayer, trace::TraceLayer,
};

use crate::config::{AppConfig, StoreBackend};
use crate::db::DocumentStore;
use crate::generator::ContentGenerator;
use crate::routes::AppState;
use crate::storage::BlobStore;

/// Configure CORS from the configured origin list.
pub fn configure_cors(config: &AppConfig) -> CorsLayer {
    let allowed_origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::AUTHORIZATION,
        ])
        .allow_credentials(true)
}

/// Create and configure the application router.
pub fn create_app(state: AppState) -> Router {
    let cors = configure_cors(&state.config);

    Router::new()
        // Templates and the builder canvas
        .route(
            "/api/templates",
            get(routes::templates::list_templates).post(routes::templates::create_template),
        )
        .route(
            "/api/templates/{id}",
            get(routes::templates::get_template)
                .patch(routes::templates::update_template)
                .delete(routes::templates::delete_template),
        )
        .route(
            "/api/templates/{id}/components",
            post(routes::templates::drop_components),
        )
        .route(
            "/api/templates/{id}/components/move",
            post(routes::templates::move_component),
        )
        .route(
            "/api/templates/{id}/components/{component_id}",
            patch(routes::templates::update_component).delete(routes::templates::delete_component),
        )
        .route(
            "/api/template-categories",
            get(routes::categories::list_categories).post(routes::categories::create_category),
        )
        .route(
            "/api/template-categories/{id}",
            patch(routes::categories::update_category).delete(routes::categories::delete_category),
        )
        // Component library
        .route(
            "/api/components",
            get(routes::components::list_components).post(routes::components::create_component),
        )
        .route(
            "/api/components/{id}",
            get(routes::components::get_component)
                .patch(routes::components::update_component)
                .delete(routes::components::delete_component),
        )
        // Blog
        .route(
            "/api/blog",
            get(routes::blog::list_posts).post(routes::blog::create_post),
        )
        .route("/api/blog/generate", post(routes::blog::generate_content))
        .route("/api/blog/slug/{slug}", get(routes::blog::get_post_by_slug))
        .route(
            "/api/blog/{id}",
            get(routes::blog::get_post)
                .patch(routes::blog::update_post)
                .delete(routes::blog::delete_post),
        )
        // Media
        .route("/api/gallery", get(routes::gallery::list_images))
        .route(
            "/api/upload-image",
            post(routes::upload::upload_image)
                .layer(DefaultBodyLimit::max(routes::upload::MAX_UPLOAD_BODY)),
        )
        .route("/api/delete-image", post(routes::upload::delete_image))
        .route("/files/{*path}", get(routes::files::serve_file))
        // Staff
        .route(
            "/api/staff",
            get(routes::staff::list_staff).post(routes::staff::create_staff),
        )
        .route("/api/staff/permissions", get(routes::staff::permission_table))
        .route(
            "/api/staff/{id}",
            patch(routes::staff::update_staff).delete(routes::staff::delete_staff),
        )
        .route("/health", get(routes::health::health_ping))
        .route("/health/ready", get(routes::health::health_ready))
        .layer(middleware::from_fn_with_state(
            state.config.clone(),
            routes::guard::require_session,
        ))
        .layer(logging::middleware::propagate_request_id_layer())
        .layer(middleware::from_fn(logging::middleware::log_request))
        .layer(logging::middleware::request_id_layer())
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        // Global request body cap; uploads are capped tighter on their route
        .layer(RequestBodyLimitLayer::new(10 * 1024 * 1024))
        .layer(cors)
        .with_state(state)
}

async fn connect_store(config: &AppConfig) -> Result<DocumentStore, sqlx::Error> {
    match &config.store {
        StoreBackend::Postgres(db_config) => {
            let pool = db::init_pool(db_config).await?;
            db::run_migrations(&pool).await?;
            Ok(DocumentStore::Postgres(Arc::new(pool)))
        }
        StoreBackend::Memory => {
            if config.is_production() {
                tracing::error!("DOCUMENT_STORE=memory in production: all data is lost on restart");
            } else {
                tracing::warn!("DOCUMENT_STORE=memory: data is lost on restart");
            }
            Ok(DocumentStore::memory())
        }
    }
}

/// Run the server (used by main).
pub async fn run() {
    dotenvy::dotenv().ok();

    // Held for the life of the process; dropping them stops the log writers.
    let _log_guards = logging::init();

    routes::health::init_start_time();

    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("Invalid configuration: {}", e);
            eprintln!("FATAL: {}", e);
            std::process::exit(1);
        }
    };

    let store = match connect_store(&config).await {
        Ok(store) => store,
        Err(e) => {
            tracing::error!("Failed to initialize document store: {}", e);
            std::process::exit(1);
        }
    };
    tracing::info!("Document store ready ({})", store.backend_name());

    let addr: SocketAddr = match format!("{}:{}", config.host, config.port).parse() {
        Ok(addr) => addr,
        Err(e) => {
            tracing::error!("Invalid HOST/PORT configuration: {}", e);
            std::process::exit(1);
        }
    };

    let state = AppState {
        store,
        blobs: Arc::new(BlobStore::new(config.blob.clone())),
        generator: Arc::new(ContentGenerator::new(config.generator.clone())),
        config: Arc::new(config),
    };
    let app = create_app(state);

    tracing::info!("Starting server on {}", addr);
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind to {}: {}", addr, e);
            std::process::exit(1);
        }
    };

    if let Err(e) = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    {
        tracing::error!("Server error: {}", e);
    }
}
