//! Registration failures and their user-facing form

use hyper::StatusCode;
use thiserror::Error;

use crate::auth::AuthError;
use crate::db::StoreError;
use crate::form::ValidationError;

/// Shown when a failure carries no message of its own
pub const FALLBACK_MESSAGE: &str = "Registration failed. Please try again.";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum RegistrationError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("{0}")]
    Other(String),
}

impl RegistrationError {
    /// Message for the registering user
    pub fn user_message(&self) -> String {
        let message = self.to_string();
        if message.trim().is_empty() {
            FALLBACK_MESSAGE.to_string()
        } else {
            message
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            RegistrationError::Validation(_) => StatusCode::BAD_REQUEST,
            RegistrationError::Auth(e) => match e {
                AuthError::EmailAlreadyInUse => StatusCode::CONFLICT,
                AuthError::InvalidEmail | AuthError::WeakPassword => StatusCode::BAD_REQUEST,
                AuthError::OperationNotAllowed => StatusCode::FORBIDDEN,
                AuthError::Backend(_) => StatusCode::INTERNAL_SERVER_ERROR,
            },
            RegistrationError::Store(StoreError::PermissionDenied) => StatusCode::FORBIDDEN,
            RegistrationError::Store(_) | RegistrationError::Other(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Machine-readable error code
    pub fn code(&self) -> &'static str {
        match self {
            RegistrationError::Validation(e) => e.code(),
            RegistrationError::Auth(e) => match e {
                AuthError::EmailAlreadyInUse => "EMAIL_ALREADY_IN_USE",
                AuthError::InvalidEmail => "INVALID_EMAIL",
                AuthError::WeakPassword => "WEAK_PASSWORD",
                AuthError::OperationNotAllowed => "OPERATION_NOT_ALLOWED",
                AuthError::Backend(_) => "AUTH_FAILED",
            },
            RegistrationError::Store(StoreError::PermissionDenied) => "PERMISSION_DENIED",
            RegistrationError::Store(_) => "STORE_FAILED",
            RegistrationError::Other(_) => "REGISTRATION_FAILED",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::form::Level;

    #[test]
    fn test_known_kinds_map_to_fixed_messages() {
        let cases = [
            (RegistrationError::from(AuthError::EmailAlreadyInUse), "Email already registered", 409),
            (AuthError::InvalidEmail.into(), "Invalid email address", 400),
            (AuthError::WeakPassword.into(), "Password is too weak", 400),
            (AuthError::OperationNotAllowed.into(), "Email/password sign-in is disabled", 403),
            (
                StoreError::PermissionDenied.into(),
                "Permission denied. Please check your database access rules.",
                403,
            ),
        ];
        for (err, message, status) in cases {
            assert_eq!(err.user_message(), message);
            assert_eq!(err.status_code().as_u16(), status, "{}", message);
        }
    }

    #[test]
    fn test_unknown_failures_surface_raw_message() {
        let err = RegistrationError::from(AuthError::Backend("quota exceeded".into()));
        assert_eq!(err.user_message(), "quota exceeded");
        assert_eq!(err.code(), "AUTH_FAILED");

        let err = RegistrationError::Other(String::new());
        assert_eq!(err.user_message(), FALLBACK_MESSAGE);
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_validation_keeps_field_code() {
        let err = RegistrationError::from(ValidationError::LevelNotSelected(Level::Village));
        assert_eq!(err.user_message(), "Please select a village");
        assert_eq!(err.code(), "VALIDATION_VILLAGE");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }
}
