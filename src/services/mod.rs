//! Entity data-access layer over the document store.

pub mod blog;
pub mod categories;
pub mod components;
pub mod gallery;
pub mod staff;
pub mod templates;

use serde::{de::DeserializeOwned, Serialize};

use crate::db::{encode, DocumentStore, Entity, StoreResult};

pub async fn fetch_all<T>(store: &DocumentStore) -> StoreResult<Vec<T>>
where
    T: Entity + DeserializeOwned,
{
    let docs = store.list(T::COLLECTION).await?;
    Ok(docs.into_iter().map(|d| d.decode()).collect())
}

pub async fn fetch<T>(store: &DocumentStore, id: &str) -> StoreResult<Option<T>>
where
    T: Entity + DeserializeOwned,
{
    Ok(store.get(T::COLLECTION, id).await?.map(|d| d.decode()))
}

pub async fn find_one_by<T>(store: &DocumentStore, field: &str, value: &str) -> StoreResult<Option<T>>
where
    T: Entity + DeserializeOwned,
{
    let docs = store.find_by_field(T::COLLECTION, field, value).await?;
    Ok(docs.into_iter().next().map(|d| d.decode()))
}

/// Persist a new entity and write the generated id back into it
pub async fn create<T>(store: &DocumentStore, mut entity: T) -> StoreResult<T>
where
    T: Entity + Serialize,
{
    let id = store.insert(T::COLLECTION, encode(&entity)?).await?;
    entity.set_id(id);
    Ok(entity)
}

/// Overwrite the stored entity; false when it no longer exists
pub async fn save<T>(store: &DocumentStore, entity: &T) -> StoreResult<bool>
where
    T: Entity + Serialize,
{
    store
        .replace(T::COLLECTION, entity.id(), encode(entity)?)
        .await
}

pub async fn remove<T: Entity>(store: &DocumentStore, id: &str) -> StoreResult<bool> {
    store.delete(T::COLLECTION, id).await
}

/// Insert the seed entries whose key is not present yet. An empty
/// collection receives the whole seed list in one batched write.
///
/// Read-then-write without locking: two concurrent first loads can both see
/// an empty collection and insert duplicates.
pub async fn seed_missing<T, K>(store: &DocumentStore, seeds: Vec<T>, key: K) -> StoreResult<usize>
where
    T: Entity + Serialize + DeserializeOwned,
    K: Fn(&T) -> &str,
{
    let existing: Vec<T> = fetch_all(store).await?;
    let existing_keys: Vec<String> = existing.iter().map(|e| key(e).to_lowercase()).collect();

    let missing: Vec<T> = seeds
        .into_iter()
        .filter(|seed| !existing_keys.contains(&key(seed).to_lowercase()))
        .collect();

    if missing.is_empty() {
        return Ok(0);
    }

    let count = missing.len();
    if existing.is_empty() {
        let values = missing.iter().map(encode).collect::<StoreResult<Vec<_>>>()?;
        store.insert_many(T::COLLECTION, values).await?;
    } else {
        for seed in missing {
            create(store, seed).await?;
        }
    }

    tracing::info!(collection = T::COLLECTION, inserted = count, "seeded default entries");
    Ok(count)
}
