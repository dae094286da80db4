//! Hierarchy listing API
//!
//! - GET /api/hierarchy/districts
//! - GET /api/hierarchy/taluks?districtId=
//! - GET /api/hierarchy/villages?talukId=
//! - GET /api/hierarchy/panchayats?villageId=
//!
//! Lookups fail open: a store error comes back as an empty list with manual
//! entry switched on, never as an error status.

use hyper::{Response, StatusCode};
use serde::Serialize;
use tracing::warn;

use super::{error_response, json_response, parse_query, BoxBody};
use crate::form::{Level, LevelNotice, LocationOption};
use crate::i18n::Locale;
use crate::server::AppState;

#[derive(Debug, Serialize)]
pub struct NoticeBody {
    pub key: &'static str,
    pub message: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HierarchyResponse {
    pub items: Vec<LocationOption>,
    /// No list to pick from; the name has to be typed in
    pub manual_entry: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notice: Option<NoticeBody>,
}

/// Level served by a `/api/hierarchy/{segment}` path
pub fn level_for_segment(segment: &str) -> Option<Level> {
    match segment {
        "districts" => Some(Level::District),
        "taluks" => Some(Level::Taluk),
        "villages" => Some(Level::Village),
        "panchayats" => Some(Level::Panchayat),
        _ => None,
    }
}

/// Query parameter naming the parent of `level`
pub fn parent_param(level: Level) -> Option<&'static str> {
    match level {
        Level::District => None,
        Level::Taluk => Some("districtId"),
        Level::Village => Some("talukId"),
        Level::Panchayat => Some("villageId"),
    }
}

pub async fn handle_hierarchy_request(
    state: &AppState,
    segment: &str,
    query: Option<&str>,
) -> Response<BoxBody> {
    let Some(level) = level_for_segment(segment) else {
        return error_response(
            StatusCode::NOT_FOUND,
            format!("Unknown hierarchy level: {}", segment),
            "NOT_FOUND",
        );
    };

    let params = parse_query(query);
    let locale = params
        .get("locale")
        .and_then(|l| l.parse::<Locale>().ok())
        .unwrap_or_default();

    let parent_id = match parent_param(level) {
        None => None,
        Some(param) => match params.get(param).map(|id| id.trim()).filter(|id| !id.is_empty()) {
            Some(id) => Some(id),
            None => {
                return error_response(
                    StatusCode::BAD_REQUEST,
                    format!("{} is required", param),
                    "MISSING_PARAMETER",
                )
            }
        },
    };

    let response = match state.loader.options(level, parent_id).await {
        Ok(items) => HierarchyResponse {
            manual_entry: items.is_empty(),
            items,
            notice: None,
        },
        Err(e) => {
            warn!("Error loading {}s: {}", level, e);
            let notice = (level == Level::Panchayat).then(|| {
                let key = LevelNotice::NoPanchayatFound.message_key();
                NoticeBody {
                    key,
                    message: state.catalogs.for_locale(locale).text(key).to_string(),
                }
            });
            HierarchyResponse {
                items: Vec::new(),
                manual_entry: true,
                notice,
            }
        }
    };

    json_response(StatusCode::OK, &response)
}
