//! MongoDB-backed document store
//!
//! Connections use short server selection timeouts so an unreachable
//! database fails fast at startup. The client is pinged before it is handed
//! out.

use async_trait::async_trait;
use bson::{doc, Bson, Document};
use futures_util::TryStreamExt;
use mongodb::{
    error::{Error as MongoError, ErrorKind, WriteFailure},
    options::IndexOptions,
    Client, Collection, IndexModel,
};
use tracing::{info, warn};

use super::{DocumentStore, FieldFilter, StoreError, StoredDocument};
use crate::types::VitalError;

/// MongoDB "Unauthorized" server error code
const UNAUTHORIZED_CODE: i32 = 13;

/// MongoDB unique index violation (E11000)
const DUPLICATE_KEY_CODE: i32 = 11000;

/// Trait for schemas that provide index definitions
pub trait IntoIndexes {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)>;
}

/// MongoDB client wrapper
#[derive(Clone)]
pub struct MongoStore {
    client: Client,
    db_name: String,
}

impl MongoStore {
    /// Connect and verify the connection with a ping
    pub async fn connect(uri: &str, db_name: &str) -> Result<Self, VitalError> {
        info!("Connecting to MongoDB at {}", uri);

        let timeout_uri = if uri.contains('?') {
            format!("{}&serverSelectionTimeoutMS=3000&connectTimeoutMS=3000", uri)
        } else {
            format!("{}?serverSelectionTimeoutMS=3000&connectTimeoutMS=3000", uri)
        };

        let client = Client::with_uri_str(&timeout_uri)
            .await
            .map_err(|e| VitalError::Database(format!("Failed to connect to MongoDB: {}", e)))?;

        client
            .database(db_name)
            .run_command(doc! { "ping": 1 })
            .await
            .map_err(|e| VitalError::Database(format!("MongoDB ping failed: {}", e)))?;

        info!("Connected to MongoDB database '{}'", db_name);

        Ok(Self {
            client,
            db_name: db_name.to_string(),
        })
    }

    fn collection(&self, name: &str) -> Collection<Document> {
        self.client.database(&self.db_name).collection::<Document>(name)
    }

    /// Apply schema-defined indexes to `collection`
    pub async fn ensure_indexes<T: IntoIndexes>(&self, collection: &str) -> Result<(), VitalError> {
        let schema_indices = T::into_indices();
        if schema_indices.is_empty() {
            return Ok(());
        }

        let indices: Vec<IndexModel> = schema_indices
            .into_iter()
            .map(|(keys, opts)| IndexModel::builder().keys(keys).options(opts).build())
            .collect();

        self.collection(collection)
            .create_indexes(indices)
            .await
            .map_err(|e| VitalError::Database(format!("Failed to create indexes on {}: {}", collection, e)))?;

        Ok(())
    }

    pub fn db_name(&self) -> &str {
        &self.db_name
    }
}

fn map_error(e: MongoError) -> StoreError {
    match classify(&e.kind) {
        Some(mapped) => mapped,
        None => StoreError::Backend(e.to_string()),
    }
}

fn classify(kind: &ErrorKind) -> Option<StoreError> {
    let code = match kind {
        ErrorKind::Command(command) => command.code,
        ErrorKind::Write(WriteFailure::WriteError(write)) => write.code,
        _ => return None,
    };
    match code {
        UNAUTHORIZED_CODE => Some(StoreError::PermissionDenied),
        DUPLICATE_KEY_CODE => Some(StoreError::Duplicate),
        _ => None,
    }
}

fn take_id(fields: &mut Document) -> Result<String, StoreError> {
    match fields.remove("_id") {
        Some(Bson::ObjectId(oid)) => Ok(oid.to_hex()),
        Some(Bson::String(s)) => Ok(s),
        Some(other) => Ok(other.to_string()),
        None => Err(StoreError::Decode("document without _id".into())),
    }
}

#[async_trait]
impl DocumentStore for MongoStore {
    async fn query(
        &self,
        collection: &str,
        filter: Option<FieldFilter>,
        order_by: Option<&str>,
    ) -> Result<Vec<StoredDocument>, StoreError> {
        let filter = filter.map(|f| f.to_document()).unwrap_or_default();

        let coll = self.collection(collection);
        let mut find = coll.find(filter);
        if let Some(field) = order_by {
            let mut sort = Document::new();
            sort.insert(field, 1);
            find = find.sort(sort);
        }

        let raw: Vec<Document> = find
            .await
            .map_err(map_error)?
            .try_collect()
            .await
            .map_err(map_error)?;

        let mut results = Vec::with_capacity(raw.len());
        for mut fields in raw {
            match take_id(&mut fields) {
                Ok(id) => results.push(StoredDocument { id, fields }),
                Err(e) => warn!("Skipping document in {}: {}", collection, e),
            }
        }
        Ok(results)
    }

    async fn insert(&self, collection: &str, fields: Document) -> Result<String, StoreError> {
        let result = self
            .collection(collection)
            .insert_one(fields)
            .await
            .map_err(map_error)?;

        match result.inserted_id {
            Bson::ObjectId(oid) => Ok(oid.to_hex()),
            Bson::String(s) => Ok(s),
            other => Ok(other.to_string()),
        }
    }

    async fn set(&self, collection: &str, id: &str, fields: Document) -> Result<(), StoreError> {
        self.collection(collection)
            .replace_one(doc! { "_id": id }, fields)
            .upsert(true)
            .await
            .map_err(map_error)?;
        Ok(())
    }
}
