//! PostgreSQL backend: every collection lives in the `documents` table.

use serde_json::Value;
use sqlx::PgPool;

use super::{Document, StoreResult};

fn into_document((id, data): (String, Value)) -> Document {
    Document { id, data }
}

pub async fn list(pool: &PgPool, collection: &str) -> StoreResult<Vec<Document>> {
    let rows: Vec<(String, Value)> = sqlx::query_as(
        r#"
        SELECT id, data
        FROM documents
        WHERE collection = $1
        ORDER BY created_at ASC, id ASC
        "#,
    )
    .bind(collection)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(into_document).collect())
}

pub async fn get(pool: &PgPool, collection: &str, id: &str) -> StoreResult<Option<Document>> {
    let row: Option<(String, Value)> =
        sqlx::query_as("SELECT id, data FROM documents WHERE collection = $1 AND id = $2")
            .bind(collection)
            .bind(id)
            .fetch_optional(pool)
            .await?;

    Ok(row.map(into_document))
}

pub async fn find_by_field(
    pool: &PgPool,
    collection: &str,
    field: &str,
    value: &str,
) -> StoreResult<Vec<Document>> {
    let rows: Vec<(String, Value)> = sqlx::query_as(
        r#"
        SELECT id, data
        FROM documents
        WHERE collection = $1 AND data ->> $2 = $3
        ORDER BY created_at ASC, id ASC
        "#,
    )
    .bind(collection)
    .bind(field)
    .bind(value)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().map(into_document).collect())
}

pub async fn insert(pool: &PgPool, collection: &str, id: &str, data: &Value) -> StoreResult<()> {
    sqlx::query(
        r#"
        INSERT INTO documents (collection, id, data, created_at, updated_at)
        VALUES ($1, $2, $3, now(), now())
        "#,
    )
    .bind(collection)
    .bind(id)
    .bind(data)
    .execute(pool)
    .await?;

    Ok(())
}

/// All-or-nothing insert of several documents
pub async fn insert_many(pool: &PgPool, collection: &str, docs: &[Document]) -> StoreResult<()> {
    let mut tx = pool.begin().await?;

    for doc in docs {
        sqlx::query(
            r#"
            INSERT INTO documents (collection, id, data, created_at, updated_at)
            VALUES ($1, $2, $3, clock_timestamp(), clock_timestamp())
            "#,
        )
        .bind(collection)
        .bind(&doc.id)
        .bind(&doc.data)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;
    Ok(())
}

pub async fn replace(pool: &PgPool, collection: &str, id: &str, data: &Value) -> StoreResult<bool> {
    let result = sqlx::query(
        r#"
        UPDATE documents
        SET data = $3, updated_at = now()
        WHERE collection = $1 AND id = $2
        "#,
    )
    .bind(collection)
    .bind(id)
    .bind(data)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() > 0)
}

pub async fn delete(pool: &PgPool, collection: &str, id: &str) -> StoreResult<bool> {
    let result = sqlx::query("DELETE FROM documents WHERE collection = $1 AND id = $2")
        .bind(collection)
        .bind(id)
        .execute(pool)
        .await?;

    Ok(result.rows_affected() > 0)
}
