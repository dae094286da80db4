//! Database schemas for VITAL
//!
//! Document structures for the administrative hierarchy, authority profiles,
//! user records and credentials.

mod authority;
mod credential;
mod location;
mod user;

pub use authority::{
    AuthorityProfile, ManualEntryFlags, Verification, VerificationStatus, AUTHORITY_COLLECTION,
};
pub use credential::{CredentialDoc, CREDENTIAL_COLLECTION};
pub use location::{
    District, Panchayat, Taluk, Village, DISTRICT_COLLECTION, PANCHAYAT_COLLECTION,
    TALUK_COLLECTION, VILLAGE_COLLECTION,
};
pub use user::{UserRecord, AUTHORITY_USER_ROLE, USER_COLLECTION};
