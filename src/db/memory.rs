use serde_json::Value;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::Document;

/// In-process document store. Collections keep insertion order.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Vec<Document>>>,
}

impl MemoryStore {
    pub async fn list(&self, collection: &str) -> Vec<Document> {
        let collections = self.collections.read().await;
        collections.get(collection).cloned().unwrap_or_default()
    }

    pub async fn get(&self, collection: &str, id: &str) -> Option<Document> {
        let collections = self.collections.read().await;
        collections
            .get(collection)
            .and_then(|docs| docs.iter().find(|d| d.id == id))
            .cloned()
    }

    pub async fn find_by_field(&self, collection: &str, field: &str, value: &str) -> Vec<Document> {
        let collections = self.collections.read().await;
        collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .filter(|d| d.data.get(field).and_then(Value::as_str) == Some(value))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    pub async fn insert(&self, collection: &str, id: &str, data: Value) {
        let mut collections = self.collections.write().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .push(Document {
                id: id.to_string(),
                data,
            });
    }

    pub async fn insert_many(&self, collection: &str, docs: Vec<Document>) {
        let mut collections = self.collections.write().await;
        collections
            .entry(collection.to_string())
            .or_default()
            .extend(docs);
    }

    pub async fn replace(&self, collection: &str, id: &str, data: Value) -> bool {
        let mut collections = self.collections.write().await;
        match collections
            .get_mut(collection)
            .and_then(|docs| docs.iter_mut().find(|d| d.id == id))
        {
            Some(doc) => {
                doc.data = data;
                true
            }
            None => false,
        }
    }

    pub async fn delete(&self, collection: &str, id: &str) -> bool {
        let mut collections = self.collections.write().await;
        match collections.get_mut(collection) {
            Some(docs) => {
                let before = docs.len();
                docs.retain(|d| d.id != id);
                docs.len() != before
            }
            None => false,
        }
    }
}
