//! Authentication for VITAL
//!
//! Registration talks to an authentication service through `AuthService`:
//! create an email/password identity, then end the session it opened.
//! The error set is closed so the registration flow can map each kind to a
//! user-facing message.
//!
//! Provides:
//! - `AuthService` trait and `AuthError`
//! - `CredentialAuthService`, a store-backed implementation hashing with Argon2

pub mod credential;

pub use credential::CredentialAuthService;

use async_trait::async_trait;
use thiserror::Error;

/// Failures reported by the authentication service
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("Email already registered")]
    EmailAlreadyInUse,

    #[error("Invalid email address")]
    InvalidEmail,

    /// Rejected by the service's own password rules
    #[error("Password is too weak")]
    WeakPassword,

    #[error("Email/password sign-in is disabled")]
    OperationNotAllowed,

    #[error("{0}")]
    Backend(String),
}

/// A freshly created identity together with the session it opened
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthSession {
    /// Identity (account) id, used as the key for profile documents
    pub uid: String,
    pub session_id: String,
}

/// Authentication service seam
#[async_trait]
pub trait AuthService: Send + Sync {
    /// Create an identity for `email` and sign it in
    async fn create_identity(&self, email: &str, password: &str) -> Result<AuthSession, AuthError>;

    /// Sign the session out
    async fn end_session(&self, session: &AuthSession) -> Result<(), AuthError>;
}
