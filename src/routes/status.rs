//! GET /{locale}/authority/status?uid= - verification state of a profile

use hyper::{Response, StatusCode};
use serde::Serialize;
use tracing::warn;

use super::{error_response, json_response, parse_query, BoxBody};
use crate::db::schemas::{AuthorityProfile, VerificationStatus, AUTHORITY_COLLECTION};
use crate::db::FieldFilter;
use crate::form::Role;
use crate::i18n::{Catalog, Locale};
use crate::server::AppState;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub uid: String,
    pub title: String,
    pub status: VerificationStatus,
    /// Localized explanation of `status`
    pub message: String,
    pub verified: bool,
    pub role: Role,
    pub name: String,
    pub district: String,
}

fn status_key(status: VerificationStatus) -> &'static str {
    match status {
        VerificationStatus::Pending => "statusPending",
        VerificationStatus::Approved => "statusApproved",
        VerificationStatus::Rejected => "statusRejected",
    }
}

fn to_response(profile: AuthorityProfile, catalog: Catalog<'_>) -> StatusResponse {
    let status = profile.verification.status;
    StatusResponse {
        uid: profile.uid,
        title: catalog.text("statusTitle").to_string(),
        status,
        message: catalog.text(status_key(status)).to_string(),
        verified: profile.verified,
        role: profile.role,
        name: profile.name,
        district: profile.district,
    }
}

pub async fn handle_status(state: &AppState, locale: Locale, query: Option<&str>) -> Response<BoxBody> {
    let catalog = state.catalogs.for_locale(locale);
    let params = parse_query(query);
    let Some(uid) = params.get("uid").filter(|uid| !uid.is_empty()) else {
        return error_response(StatusCode::BAD_REQUEST, "uid is required", "MISSING_PARAMETER");
    };

    let docs = match state
        .store
        .query(AUTHORITY_COLLECTION, Some(FieldFilter::eq("uid", uid.as_str())), None)
        .await
    {
        Ok(docs) => docs,
        Err(e) => {
            warn!(uid = %uid, "Error loading authority profile: {}", e);
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string(), "STORE_FAILED");
        }
    };

    let Some(doc) = docs.first() else {
        return error_response(StatusCode::NOT_FOUND, catalog.text("statusNotFound"), "NOT_FOUND");
    };

    match doc.decode::<AuthorityProfile>() {
        Ok(profile) => json_response(StatusCode::OK, &to_response(profile, catalog)),
        Err(e) => {
            warn!(uid = %uid, "Malformed authority profile: {}", e);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string(), "STORE_FAILED")
        }
    }
}
