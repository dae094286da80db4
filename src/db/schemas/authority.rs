//! Authority profile schema
//!
//! One document per registered authority in `authorities`, keyed by the
//! identity id. Written once at registration; verification happens elsewhere.

use bson::{doc, DateTime, Document};
use mongodb::options::IndexOptions;
use serde::{Deserialize, Serialize};

use crate::db::mongo::IntoIndexes;
use crate::form::Role;

/// Collection name for authority profiles
pub const AUTHORITY_COLLECTION: &str = "authorities";

/// Verification state of a profile
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum VerificationStatus {
    /// Awaiting admin review
    #[default]
    Pending,
    Approved,
    Rejected,
}

impl VerificationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VerificationStatus::Pending => "pending",
            VerificationStatus::Approved => "approved",
            VerificationStatus::Rejected => "rejected",
        }
    }
}

/// Verification block
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Verification {
    pub status: VerificationStatus,
    pub requested_at: DateTime,
}

/// Which hierarchy levels were typed in rather than picked from a list
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ManualEntryFlags {
    pub district: bool,
    pub taluk: bool,
    pub village: bool,
    pub panchayat: bool,
}

/// Authority profile document
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AuthorityProfile {
    pub uid: String,
    pub role: Role,
    pub name: String,
    pub email: String,
    pub mobile: String,
    /// Full 12-digit Aadhaar number
    pub aadhaar: String,
    /// Last four Aadhaar digits, the only part shown to admins
    pub aadhaar_last4: String,
    pub office_address: String,
    pub gram_panchayat_id: String,

    pub district_id: String,
    pub district: String,
    // Levels the role does not require are stored as null
    pub taluk_id: Option<String>,
    pub taluk: Option<String>,
    pub village_id: Option<String>,
    pub village: Option<String>,
    pub panchayat_id: Option<String>,
    pub panchayat: Option<String>,

    pub is_manual_entry: ManualEntryFlags,

    pub verified: bool,
    pub verification: Verification,
    pub status: VerificationStatus,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

impl IntoIndexes for AuthorityProfile {
    fn into_indices() -> Vec<(Document, Option<IndexOptions>)> {
        vec![
            (
                doc! { "email": 1 },
                Some(IndexOptions::builder().name("email_index".to_string()).build()),
            ),
            (
                doc! { "verification.status": 1, "districtId": 1 },
                Some(
                    IndexOptions::builder()
                        .name("verification_district_index".to_string())
                        .build(),
                ),
            ),
        ]
    }
}
