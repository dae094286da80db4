//! Credential document schema
//!
//! Email/password credentials for the bundled auth service.

use bson::{doc, DateTime, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::IntoIndexes;

/// Collection name for credentials
pub const CREDENTIAL_COLLECTION: &str = "credentials";

/// Credential document, keyed by identity id
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CredentialDoc {
    pub uid: String,
    /// Lowercased email used for sign-in
    pub email: String,
    /// Argon2 password hash
    pub password_hash: String,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub created_at: DateTime,
}

fn default_true() -> bool {
    true
}

impl IntoIndexes for CredentialDoc {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "email": 1 },
            Some(
                IndexOptions::builder()
                    .unique(true)
                    .name("email_unique".to_string())
                    .build(),
            ),
        )]
    }
}
