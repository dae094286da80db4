//! User lookup schema
//!
//! Generic identity record shared with the rest of the application. Every
//! authority also gets one of these with `role = "authority"`.

use bson::{doc, DateTime, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::IntoIndexes;
use crate::form::Role;

/// Collection name for users
pub const USER_COLLECTION: &str = "users";

/// Tag for users registered through the authority flow
pub const AUTHORITY_USER_ROLE: &str = "authority";

/// User document
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    pub uid: String,
    pub name: String,
    pub email: String,
    /// Application-wide role tag
    pub role: String,
    /// Authority role when `role` is "authority"
    pub authority_role: Role,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl UserRecord {
    /// Record for a newly registered authority
    pub fn authority(uid: &str, name: &str, email: &str, role: Role, now: DateTime) -> Self {
        Self {
            uid: uid.to_string(),
            name: name.to_string(),
            email: email.to_string(),
            role: AUTHORITY_USER_ROLE.to_string(),
            authority_role: role,
            created_at: now,
            updated_at: now,
        }
    }
}

impl IntoIndexes for UserRecord {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![(
            doc! { "email": 1 },
            Some(IndexOptions::builder().name("email_index".to_string()).build()),
        )]
    }
}
