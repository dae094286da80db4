//! Administrative hierarchy schemas
//!
//! District → Taluk → Village → Panchayat. Each child stores its ancestors'
//! ids and denormalized names so lists can be shown without joins.

use bson::{doc, DateTime, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::IntoIndexes;

/// Collection name for districts
pub const DISTRICT_COLLECTION: &str = "districts";
/// Collection name for taluks
pub const TALUK_COLLECTION: &str = "taluks";
/// Collection name for villages
pub const VILLAGE_COLLECTION: &str = "villages";
/// Collection name for panchayats
pub const PANCHAYAT_COLLECTION: &str = "panchayats";

/// District document
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct District {
    /// Store-assigned id; absent before the district is persisted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    /// Identity id of the authority that entered this district manually
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime>,
}

/// Taluk (block) document
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Taluk {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub district_id: String,
    pub district_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime>,
}

/// Village document
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Village {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub district_id: String,
    pub district_name: String,
    pub taluk_id: String,
    pub taluk_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime>,
}

/// Panchayat document
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Panchayat {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    pub village_id: String,
    pub village_name: String,
    pub taluk_id: String,
    pub taluk_name: String,
    pub district_id: String,
    pub district_name: String,
    /// Official Gram Panchayat identifier
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gram_panchayat_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime>,
}

fn named_index(keys: Document, name: &str) -> (Document, Option<IndexOptions>) {
    (
        keys,
        Some(IndexOptions::builder().name(name.to_string()).build()),
    )
}

impl IntoIndexes for District {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![named_index(doc! { "name": 1 }, "name_index")]
    }
}

impl IntoIndexes for Taluk {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        // Serves the "taluks of a district, by name" lookup
        vec![named_index(doc! { "districtId": 1, "name": 1 }, "district_name_index")]
    }
}

impl IntoIndexes for Village {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![named_index(doc! { "talukId": 1, "name": 1 }, "taluk_name_index")]
    }
}

impl IntoIndexes for Panchayat {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            named_index(doc! { "villageId": 1, "name": 1 }, "village_name_index"),
            named_index(doc! { "gramPanchayatId": 1 }, "gram_panchayat_id_index"),
        ]
    }
}
