//! In-memory document store
//!
//! Used when MongoDB is unavailable in dev mode, and by tests. Ids are UUIDs.

use async_trait::async_trait;
use bson::{Bson, Document};
use dashmap::DashMap;
use std::cmp::Ordering;
use tracing::debug;
use uuid::Uuid;

use super::{DocumentStore, FieldFilter, StoreError, StoredDocument};

/// Process-local store keyed by collection name
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: DashMap<String, Vec<StoredDocument>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert without going through the async trait (seeding, tests)
    pub fn seed(&self, collection: &str, fields: Document) -> String {
        let id = Uuid::new_v4().simple().to_string();
        self.collections
            .entry(collection.to_string())
            .or_default()
            .push(StoredDocument {
                id: id.clone(),
                fields,
            });
        id
    }

    /// Snapshot of every document in `collection`, in insertion order
    pub fn documents(&self, collection: &str) -> Vec<StoredDocument> {
        self.collections
            .get(collection)
            .map(|docs| docs.clone())
            .unwrap_or_default()
    }

    pub fn count(&self, collection: &str) -> usize {
        self.collections
            .get(collection)
            .map(|docs| docs.len())
            .unwrap_or(0)
    }
}

fn compare_field(a: Option<&Bson>, b: Option<&Bson>) -> Ordering {
    match (a, b) {
        (Some(Bson::String(a)), Some(Bson::String(b))) => a.cmp(b),
        (Some(a), Some(b)) => a.to_string().cmp(&b.to_string()),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => Ordering::Equal,
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn query(
        &self,
        collection: &str,
        filter: Option<FieldFilter>,
        order_by: Option<&str>,
    ) -> Result<Vec<StoredDocument>, StoreError> {
        let mut results: Vec<StoredDocument> = self
            .documents(collection)
            .into_iter()
            .filter(|doc| match &filter {
                Some(f) => doc.fields.get(&f.field) == Some(&f.value),
                None => true,
            })
            .collect();

        if let Some(field) = order_by {
            results.sort_by(|a, b| compare_field(a.fields.get(field), b.fields.get(field)));
        }

        Ok(results)
    }

    async fn insert(&self, collection: &str, fields: Document) -> Result<String, StoreError> {
        let id = self.seed(collection, fields);
        debug!("memory store: inserted {}/{}", collection, id);
        Ok(id)
    }

    async fn set(&self, collection: &str, id: &str, fields: Document) -> Result<(), StoreError> {
        let mut docs = self.collections.entry(collection.to_string()).or_default();
        match docs.iter().position(|doc| doc.id == id) {
            Some(index) => docs[index].fields = fields,
            None => docs.push(StoredDocument {
                id: id.to_string(),
                fields,
            }),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;

    #[tokio::test]
    async fn test_query_filters_and_orders_by_name() {
        let store = MemoryStore::new();
        store.seed("taluks", doc! { "name": "Nanjangud", "districtId": "d1" });
        store.seed("taluks", doc! { "name": "Hunsur", "districtId": "d1" });
        store.seed("taluks", doc! { "name": "Alur", "districtId": "d2" });

        let found = store
            .query("taluks", Some(FieldFilter::eq("districtId", "d1")), Some("name"))
            .await
            .unwrap();

        let names: Vec<&str> = found
            .iter()
            .map(|d| d.fields.get_str("name").unwrap())
            .collect();
        assert_eq!(names, vec!["Hunsur", "Nanjangud"]);
    }

    #[tokio::test]
    async fn test_set_replaces_existing_document() {
        let store = MemoryStore::new();
        store.set("users", "u1", doc! { "name": "A" }).await.unwrap();
        store.set("users", "u1", doc! { "name": "B" }).await.unwrap();

        let docs = store.documents("users");
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].fields.get_str("name").unwrap(), "B");
    }

    #[tokio::test]
    async fn test_unknown_collection_is_empty() {
        let store = MemoryStore::new();
        let found = store.query("villages", None, None).await.unwrap();
        assert!(found.is_empty());
        assert_eq!(store.count("villages"), 0);
    }
}
