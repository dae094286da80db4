//! Document store abstraction
//!
//! Registration only needs four operations from its database: an ordered,
//! optionally filtered query, an insert that generates an id, a keyed upsert,
//! and a write-time timestamp. `MongoStore` backs production; `MemoryStore`
//! backs dev mode and tests.

mod memory;
mod mongo;
pub mod schemas;

pub use memory::MemoryStore;
pub use mongo::{IntoIndexes, MongoStore};

use async_trait::async_trait;
use bson::{Bson, DateTime, Document};
use serde::de::DeserializeOwned;
use thiserror::Error;

/// Errors surfaced by a document store
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// The store's access rules rejected the operation
    #[error("Permission denied. Please check your database access rules.")]
    PermissionDenied,

    /// A unique index rejected the write
    #[error("document already exists")]
    Duplicate,

    #[error("{0}")]
    Backend(String),

    #[error("failed to decode document: {0}")]
    Decode(String),
}

/// Equality filter on a single field
#[derive(Debug, Clone, PartialEq)]
pub struct FieldFilter {
    pub field: String,
    pub value: Bson,
}

impl FieldFilter {
    pub fn eq(field: impl Into<String>, value: impl Into<Bson>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
        }
    }

    /// Render as a MongoDB-style filter document
    pub fn to_document(&self) -> Document {
        let mut doc = Document::new();
        doc.insert(self.field.clone(), self.value.clone());
        doc
    }
}

/// A document as read back from a store, with its store-assigned id
#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: String,
    pub fields: Document,
}

impl StoredDocument {
    /// Decode into a schema type. The store id is exposed to the schema as
    /// the `id` field.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, StoreError> {
        let mut fields = self.fields.clone();
        fields.insert("id", self.id.clone());
        bson::from_document(fields).map_err(|e| StoreError::Decode(e.to_string()))
    }
}

/// Collection-style document store
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Documents of `collection` matching `filter`, ascending by `order_by`
    async fn query(
        &self,
        collection: &str,
        filter: Option<FieldFilter>,
        order_by: Option<&str>,
    ) -> Result<Vec<StoredDocument>, StoreError>;

    /// Insert a new document and return its generated id
    async fn insert(&self, collection: &str, fields: Document) -> Result<String, StoreError>;

    /// Create or replace the document stored under `id`
    async fn set(&self, collection: &str, id: &str, fields: Document) -> Result<(), StoreError>;

    /// Timestamp to stamp on documents written now
    fn server_timestamp(&self) -> DateTime {
        DateTime::now()
    }
}

/// Serialize a schema value into a store document
pub fn to_fields<T: serde::Serialize>(value: &T) -> Result<Document, StoreError> {
    bson::to_document(value).map_err(|e| StoreError::Decode(e.to_string()))
}
