//! Document store: schemaless collections of JSON property bags keyed by a
//! generated identifier. Backed by PostgreSQL (one JSONB table) in
//! deployments and by an in-process map for tests and local runs.

pub mod memory;
pub mod models;
pub mod postgres;

use serde::{de::DeserializeOwned, Serialize};
use serde_json::{Map, Value};
use sqlx::{postgres::PgPoolOptions, PgPool};
use std::sync::Arc;
use std::time::{Duration, Instant};
use uuid::Uuid;

pub use memory::MemoryStore;
pub use models::Entity;

/// Collection names as persisted
pub mod collections {
    pub const TEMPLATES: &str = "templates";
    pub const TEMPLATE_CATEGORIES: &str = "templateCategories";
    pub const COMPONENT_EDITORS: &str = "componentEditors";
    pub const BLOGS: &str = "blogs";
    pub const GALLERY: &str = "gallery";
    pub const STAFF: &str = "staff";
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// A raw stored record
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub data: Value,
}

impl Document {
    /// Decode into a typed entity. Missing fields take their defaults; a
    /// record that cannot be decoded at all becomes `T::default()` with
    /// only its id kept.
    pub fn decode<T>(self) -> T
    where
        T: Entity + DeserializeOwned,
    {
        let mut fields = match self.data {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        fields.insert("id".to_string(), Value::String(self.id.clone()));

        match serde_json::from_value::<T>(Value::Object(fields)) {
            Ok(entity) => entity,
            Err(e) => {
                tracing::warn!(
                    collection = T::COLLECTION,
                    id = %self.id,
                    error = %e,
                    "malformed document, falling back to defaults"
                );
                let mut entity = T::default();
                entity.set_id(self.id);
                entity
            }
        }
    }
}

/// Serialize an entity into the property bag stored for it. The id lives
/// outside the bag.
pub fn encode<T: Serialize>(entity: &T) -> StoreResult<Value> {
    let mut value = serde_json::to_value(entity)?;
    if let Value::Object(map) = &mut value {
        map.remove("id");
    }
    Ok(value)
}

pub fn new_document_id() -> String {
    Uuid::new_v4().simple().to_string()
}

/// Handle to whichever backend is configured. Cheap to clone.
#[derive(Debug, Clone)]
pub enum DocumentStore {
    Postgres(Arc<PgPool>),
    Memory(Arc<MemoryStore>),
}

impl DocumentStore {
    pub fn memory() -> Self {
        DocumentStore::Memory(Arc::new(MemoryStore::default()))
    }

    pub fn backend_name(&self) -> &'static str {
        match self {
            DocumentStore::Postgres(_) => "postgres",
            DocumentStore::Memory(_) => "memory",
        }
    }

    /// All documents of a collection in insertion order
    pub async fn list(&self, collection: &str) -> StoreResult<Vec<Document>> {
        match self {
            DocumentStore::Postgres(pool) => postgres::list(pool, collection).await,
            DocumentStore::Memory(mem) => Ok(mem.list(collection).await),
        }
    }

    pub async fn get(&self, collection: &str, id: &str) -> StoreResult<Option<Document>> {
        match self {
            DocumentStore::Postgres(pool) => postgres::get(pool, collection, id).await,
            DocumentStore::Memory(mem) => Ok(mem.get(collection, id).await),
        }
    }

    /// Documents whose top-level string `field` equals `value`
    pub async fn find_by_field(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> StoreResult<Vec<Document>> {
        match self {
            DocumentStore::Postgres(pool) => {
                postgres::find_by_field(pool, collection, field, value).await
            }
            DocumentStore::Memory(mem) => Ok(mem.find_by_field(collection, field, value).await),
        }
    }

    /// Insert a new document and return its generated id
    pub async fn insert(&self, collection: &str, data: Value) -> StoreResult<String> {
        let id = new_document_id();
        match self {
            DocumentStore::Postgres(pool) => postgres::insert(pool, collection, &id, &data).await?,
            DocumentStore::Memory(mem) => mem.insert(collection, &id, data).await,
        }
        Ok(id)
    }

    /// Insert several documents in one batched commit
    pub async fn insert_many(&self, collection: &str, items: Vec<Value>) -> StoreResult<Vec<String>> {
        let docs: Vec<Document> = items
            .into_iter()
            .map(|data| Document {
                id: new_document_id(),
                data,
            })
            .collect();
        let ids = docs.iter().map(|d| d.id.clone()).collect();

        match self {
            DocumentStore::Postgres(pool) => postgres::insert_many(pool, collection, &docs).await?,
            DocumentStore::Memory(mem) => mem.insert_many(collection, docs).await,
        }
        Ok(ids)
    }

    /// Overwrite an existing document. Returns false when it does not exist.
    pub async fn replace(&self, collection: &str, id: &str, data: Value) -> StoreResult<bool> {
        match self {
            DocumentStore::Postgres(pool) => postgres::replace(pool, collection, id, &data).await,
            DocumentStore::Memory(mem) => Ok(mem.replace(collection, id, data).await),
        }
    }

    pub async fn delete(&self, collection: &str, id: &str) -> StoreResult<bool> {
        match self {
            DocumentStore::Postgres(pool) => postgres::delete(pool, collection, id).await,
            DocumentStore::Memory(mem) => Ok(mem.delete(collection, id).await),
        }
    }

    /// Round-trip check used by `/health/ready`
    pub async fn health_check(&self) -> StoreResult<Duration> {
        let start = Instant::now();
        match self {
            DocumentStore::Postgres(pool) => {
                sqlx::query("SELECT 1").fetch_one(pool.as_ref()).await?;
            }
            DocumentStore::Memory(_) => {}
        }
        Ok(start.elapsed())
    }
}

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub connect_timeout_secs: u64,
    pub idle_timeout_secs: u64,
}

pub async fn init_pool(config: &DbConfig) -> Result<PgPool, sqlx::Error> {
    tracing::info!("Initializing database connection pool...");
    tracing::debug!(
        "Database URL: {}",
        config.url.replace(
            |c: char| !c.is_ascii_alphanumeric() && c != ':' && c != '/' && c != '@' && c != '.',
            "*"
        )
    );

    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
        .idle_timeout(Duration::from_secs(config.idle_timeout_secs))
        .max_lifetime(Duration::from_secs(1800))
        .test_before_acquire(true)
        .connect(&config.url)
        .await?;

    sqlx::query("SELECT 1").fetch_one(&pool).await?;

    tracing::info!("Database connection pool initialized successfully");

    Ok(pool)
}

pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::Error> {
    tracing::info!("Running database migrations...");

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS documents (
            collection TEXT NOT NULL,
            id TEXT NOT NULL,
            data JSONB NOT NULL DEFAULT '{}'::jsonb,
            created_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT now(),
            PRIMARY KEY (collection, id)
        )
    "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_documents_collection_created
            ON documents(collection, created_at)
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE INDEX IF NOT EXISTS idx_documents_data
            ON documents USING GIN(data)
        "#,
    )
    .execute(pool)
    .await?;

    tracing::info!("Database migrations completed successfully");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::models::TemplateCategory;
    use super::*;
    use serde_json::json;

    #[test]
    fn test_encode_strips_id() {
        let category = TemplateCategory {
            id: "abc".to_string(),
            name: "Business".to_string(),
            ..Default::default()
        };
        let value = encode(&category).unwrap();
        assert!(value.get("id").is_none());
        assert_eq!(value["name"], "Business");
    }

    #[test]
    fn test_decode_fills_missing_fields() {
        let doc = Document {
            id: "c1".to_string(),
            data: json!({ "name": "Portfolio" }),
        };
        let category: TemplateCategory = doc.decode();
        assert_eq!(category.id, "c1");
        assert_eq!(category.name, "Portfolio");
        assert_eq!(category.description, "");
    }

    #[test]
    fn test_decode_malformed_falls_back_to_default() {
        let doc = Document {
            id: "c2".to_string(),
            data: json!({ "name": 42 }),
        };
        let category: TemplateCategory = doc.decode();
        assert_eq!(category.id, "c2");
        assert_eq!(category.name, "");
    }

    #[tokio::test]
    async fn test_memory_store_crud() {
        let store = DocumentStore::memory();
        let id = store
            .insert(collections::GALLERY, json!({ "name": "a.png" }))
            .await
            .unwrap();

        let doc = store.get(collections::GALLERY, &id).await.unwrap().unwrap();
        assert_eq!(doc.data["name"], "a.png");

        assert!(store
            .replace(collections::GALLERY, &id, json!({ "name": "b.png" }))
            .await
            .unwrap());
        let found = store
            .find_by_field(collections::GALLERY, "name", "b.png")
            .await
            .unwrap();
        assert_eq!(found.len(), 1);

        assert!(store.delete(collections::GALLERY, &id).await.unwrap());
        assert!(!store.delete(collections::GALLERY, &id).await.unwrap());
        assert!(store.get(collections::GALLERY, &id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_replace_missing_document_returns_false() {
        let store = DocumentStore::memory();
        let replaced = store
            .replace(collections::STAFF, "nope", json!({}))
            .await
            .unwrap();
        assert!(!replaced);
    }

    #[tokio::test]
    async fn test_health_check_memory() {
        let store = DocumentStore::memory();
        assert!(store.health_check().await.is_ok());
    }
}
