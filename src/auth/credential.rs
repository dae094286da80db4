//! Store-backed authentication service
//!
//! Keeps Argon2 credential hashes in the `credentials` collection and tracks
//! open sessions in memory. Server-side rules mirror the hosted auth service
//! the form was built against: a malformed email or a password shorter than
//! six characters is rejected regardless of any client-side strength check.
//!
//! An email is reserved in memory while its credential is being written, so
//! concurrent sign-ups for one address cannot both pass the duplicate check.
//! The `email_unique` index covers writers in other processes.

use argon2::password_hash::{PasswordHasher, SaltString};
use argon2::Argon2;
use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use rand::rngs::OsRng;
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use super::{AuthError, AuthService, AuthSession};
use crate::db::schemas::{CredentialDoc, CREDENTIAL_COLLECTION};
use crate::db::{to_fields, DocumentStore, FieldFilter, StoreError};

/// Shortest password the service itself accepts
pub const MIN_SERVICE_PASSWORD_LEN: usize = 6;

/// Email/password identities persisted through a `DocumentStore`
pub struct CredentialAuthService {
    store: Arc<dyn DocumentStore>,
    email_signin_enabled: bool,
    /// session id -> identity id
    sessions: DashMap<String, String>,
    /// Emails with a credential write in flight
    pending: DashMap<String, ()>,
}

/// Holds an email in `pending` until dropped
struct Reservation<'a> {
    pending: &'a DashMap<String, ()>,
    email: String,
}

impl Drop for Reservation<'_> {
    fn drop(&mut self) {
        self.pending.remove(&self.email);
    }
}

impl CredentialAuthService {
    pub fn new(store: Arc<dyn DocumentStore>, email_signin_enabled: bool) -> Self {
        Self {
            store,
            email_signin_enabled,
            sessions: DashMap::new(),
            pending: DashMap::new(),
        }
    }

    fn reserve(&self, email: &str) -> Option<Reservation<'_>> {
        match self.pending.entry(email.to_string()) {
            Entry::Occupied(_) => None,
            Entry::Vacant(slot) => {
                slot.insert(());
                Some(Reservation {
                    pending: &self.pending,
                    email: email.to_string(),
                })
            }
        }
    }

    pub fn active_sessions(&self) -> usize {
        self.sessions.len()
    }
}

fn is_well_formed_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

/// Argon2id hash in PHC string form, salt included
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Backend(format!("Failed to hash password: {e}")))
}

fn backend(e: StoreError) -> AuthError {
    match e {
        StoreError::Duplicate => AuthError::EmailAlreadyInUse,
        other => AuthError::Backend(other.to_string()),
    }
}

#[async_trait]
impl AuthService for CredentialAuthService {
    async fn create_identity(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        if !self.email_signin_enabled {
            return Err(AuthError::OperationNotAllowed);
        }

        let email = email.trim().to_lowercase();
        if !is_well_formed_email(&email) {
            return Err(AuthError::InvalidEmail);
        }
        if password.chars().count() < MIN_SERVICE_PASSWORD_LEN {
            return Err(AuthError::WeakPassword);
        }

        let Some(_reservation) = self.reserve(&email) else {
            debug!("Sign-up for {} already in flight", email);
            return Err(AuthError::EmailAlreadyInUse);
        };

        let existing = self
            .store
            .query(CREDENTIAL_COLLECTION, Some(FieldFilter::eq("email", email.as_str())), None)
            .await
            .map_err(backend)?;
        if !existing.is_empty() {
            return Err(AuthError::EmailAlreadyInUse);
        }

        let uid = Uuid::new_v4().simple().to_string();
        let credential = CredentialDoc {
            uid: uid.clone(),
            email: email.clone(),
            password_hash: hash_password(password)?,
            is_active: true,
            created_at: self.store.server_timestamp(),
        };
        let fields = to_fields(&credential).map_err(backend)?;
        self.store
            .set(CREDENTIAL_COLLECTION, &uid, fields)
            .await
            .map_err(backend)?;

        let session_id = Uuid::new_v4().to_string();
        self.sessions.insert(session_id.clone(), uid.clone());
        info!("Created identity {} for {}", uid, email);

        Ok(AuthSession { uid, session_id })
    }

    async fn end_session(&self, session: &AuthSession) -> Result<(), AuthError> {
        if self.sessions.remove(&session.session_id).is_none() {
            debug!("Session {} already ended", session.session_id);
        }
        Ok(())
    }
}
