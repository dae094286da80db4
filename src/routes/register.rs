//! Registration page and submission
//!
//! - GET  /{locale}/authority/register - Localized page model
//! - POST /{locale}/authority/register - Submit the registration form
//!
//! A submission is replayed through `RegistrationForm` level by level, with
//! each level's options loaded from the store exactly as the interactive form
//! would, so selections are checked against what the store actually lists.
//! A choice the store does not list leaves its level unfilled; the ordered
//! form validation then decides which error the user sees.

use http_body_util::{BodyExt, LengthLimitError, Limited};
use hyper::body::{Body, Incoming};
use hyper::{Request, Response, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{error_response, json_response, BoxBody, MAX_BODY_BYTES};
use crate::form::validation::PASSWORD_SPECIAL_CHARS;
use crate::form::{Level, RegistrationForm, Role};
use crate::hierarchy::HierarchyLoader;
use crate::i18n::{substitute, Locale};
use crate::registration::RegistrationError;
use crate::server::AppState;

// =============================================================================
// Request/Response Types
// =============================================================================

/// How the user filled a hierarchy level
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LevelInput {
    /// Id of a listed option
    Selected(String),
    /// Name typed in by the user
    Manual(String),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub mobile: String,
    #[serde(default)]
    pub aadhaar: String,
    #[serde(default)]
    pub office_address: String,
    #[serde(default)]
    pub gram_panchayat_id: String,
    pub district: Option<LevelInput>,
    pub taluk: Option<LevelInput>,
    pub village: Option<LevelInput>,
    pub panchayat: Option<LevelInput>,
}

impl RegisterRequest {
    pub fn level(&self, level: Level) -> Option<&LevelInput> {
        match level {
            Level::District => self.district.as_ref(),
            Level::Taluk => self.taluk.as_ref(),
            Level::Village => self.village.as_ref(),
            Level::Panchayat => self.panchayat.as_ref(),
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterResponse {
    pub uid: String,
    pub redirect: String,
}

#[derive(Debug, Serialize)]
pub struct RoleOption {
    pub value: Role,
    pub label: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelField {
    pub level: Level,
    pub label: String,
    pub cant_find: String,
    pub new_entry: String,
    /// Roles that must fill this level
    pub required_for: Vec<Role>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordRule {
    pub key: &'static str,
    pub label: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterPage<'a> {
    pub locale: Locale,
    pub labels: std::collections::BTreeMap<&'a str, &'a str>,
    pub roles: Vec<RoleOption>,
    pub levels: Vec<LevelField>,
    pub password_rules: Vec<PasswordRule>,
    pub special_chars: &'static str,
    pub submit_url: String,
    pub status_url: String,
}

const PASSWORD_RULE_KEYS: [&str; 5] = ["uppercase", "lowercase", "number", "specialChar", "minLength"];

// =============================================================================
// Route Handlers
// =============================================================================

/// GET /{locale}/authority/register
pub fn register_page(state: &AppState, locale: Locale) -> Response<BoxBody> {
    let catalog = state.catalogs.for_locale(locale);

    let roles = Role::ALL
        .iter()
        .map(|role| RoleOption {
            value: *role,
            label: catalog.text(role.label_key()).to_string(),
        })
        .collect();

    let levels = Level::ALL
        .iter()
        .map(|level| LevelField {
            level: *level,
            label: catalog.text(level.as_str()).to_string(),
            cant_find: substitute(catalog.text("cantFind"), level.as_str()),
            new_entry: substitute(catalog.text("newEntry"), level.as_str()),
            required_for: Role::ALL.into_iter().filter(|r| r.requires(*level)).collect(),
        })
        .collect();

    let password_rules = PASSWORD_RULE_KEYS
        .iter()
        .map(|key| PasswordRule {
            key: *key,
            label: catalog.text(*key).to_string(),
        })
        .collect();

    let page = RegisterPage {
        locale,
        labels: catalog.entries(),
        roles,
        levels,
        password_rules,
        special_chars: PASSWORD_SPECIAL_CHARS,
        submit_url: format!("/{}/authority/register", locale),
        status_url: state.registration.status_redirect(locale),
    };
    json_response(StatusCode::OK, &page)
}

/// POST /{locale}/authority/register
pub async fn handle_register(
    state: &AppState,
    locale: Locale,
    req: Request<Incoming>,
) -> Response<BoxBody> {
    match read_request(req.into_body()).await {
        Ok(request) => submit(state, locale, &request).await,
        Err(response) => response,
    }
}

/// Buffer at most `MAX_BODY_BYTES` of `body` and parse it as a submission
async fn read_request<B>(body: B) -> Result<RegisterRequest, Response<BoxBody>>
where
    B: Body,
    B::Error: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    let bytes = match Limited::new(body, MAX_BODY_BYTES).collect().await {
        Ok(body) => body.to_bytes(),
        Err(e) if e.is::<LengthLimitError>() => {
            return Err(error_response(
                StatusCode::PAYLOAD_TOO_LARGE,
                "Request body too large",
                "INVALID_REQUEST",
            ));
        }
        Err(e) => {
            return Err(error_response(
                StatusCode::BAD_REQUEST,
                format!("Failed to read body: {}", e),
                "INVALID_REQUEST",
            ))
        }
    };

    serde_json::from_slice(&bytes).map_err(|e| {
        error_response(
            StatusCode::BAD_REQUEST,
            format!("Invalid JSON: {}", e),
            "INVALID_REQUEST",
        )
    })
}

/// Replay, validate and register a parsed submission
pub async fn submit(state: &AppState, locale: Locale, request: &RegisterRequest) -> Response<BoxBody> {
    let mut form = build_form(&state.loader, request).await;

    let validated = match form.validate() {
        Ok(v) => v,
        Err(e) => return registration_error(RegistrationError::Validation(e)),
    };

    match state.registration.register(&validated, locale).await {
        Ok(outcome) => {
            info!(uid = %outcome.uid, "Registration accepted");
            json_response(
                StatusCode::CREATED,
                &RegisterResponse {
                    uid: outcome.uid,
                    redirect: outcome.redirect,
                },
            )
        }
        Err(e) => registration_error(e),
    }
}

fn registration_error(e: RegistrationError) -> Response<BoxBody> {
    error_response(e.status_code(), e.user_message(), e.code())
}

/// Drive a fresh form through the submitted choices, loading each level's
/// options as its parent is selected
pub async fn build_form(loader: &HierarchyLoader, request: &RegisterRequest) -> RegistrationForm {
    let mut form = RegistrationForm::new();
    form.set_role(request.role);
    form.set_name(request.name.as_str());
    form.set_email(request.email.as_str());
    form.set_password(request.password.as_str());
    form.set_mobile(&request.mobile);
    form.set_aadhaar(&request.aadhaar);
    form.set_office_address(request.office_address.as_str());

    if let Some(ticket) = form.begin_fetch(Level::District) {
        loader.load(&mut form, ticket).await;
    }

    for level in request.role.required_levels() {
        match request.level(*level) {
            Some(LevelInput::Selected(id)) => match form.select(*level, id) {
                Ok(Some(ticket)) => {
                    loader.load(&mut form, ticket).await;
                }
                Ok(None) => {}
                Err(e) => debug!("Ignoring {} choice: {}", level, e),
            },
            Some(LevelInput::Manual(text)) => {
                if !form.level(*level).is_manual() {
                    form.enter_manual(*level);
                }
                if let Err(e) = form.set_manual_text(*level, text.as_str()) {
                    debug!("Ignoring {} text: {}", level, e);
                }
            }
            None => {}
        }
    }

    // Set last: a role switch clears it
    form.set_gram_panchayat_id(request.gram_panchayat_id.as_str());
    form
}
