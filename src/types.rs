//! Process-level error type for VITAL
//!
//! Seam-specific errors (validation, auth, store, registration) live next to
//! the code that raises them; `VitalError` covers startup and serving.

use thiserror::Error;

/// Errors raised while configuring or running the service
#[derive(Debug, Error)]
pub enum VitalError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("catalog error: {0}")]
    Catalog(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<crate::db::StoreError> for VitalError {
    fn from(e: crate::db::StoreError) -> Self {
        VitalError::Database(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, VitalError>;
