//! Registration notifications
//!
//! After a registration is stored, a notice is sent on a detached task. The
//! registering user never waits for it and delivery failures are only logged.

use async_trait::async_trait;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::form::Role;

/// Action tag carried by every registration notice
pub const REGISTRATION_COMPLETE: &str = "registration_complete";

/// Notification payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationNotice {
    pub user_id: String,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub action: &'static str,
}

impl RegistrationNotice {
    pub fn registration_complete(user_id: String, email: String, name: String, role: Role) -> Self {
        Self {
            user_id,
            email,
            name,
            role,
            action: REGISTRATION_COMPLETE,
        }
    }
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("Notification request failed: {0}")]
    Network(String),

    #[error("Notification endpoint returned HTTP {0}")]
    Rejected(u16),
}

/// Notification sink
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notice: &RegistrationNotice) -> Result<(), NotifyError>;
}

/// POSTs the notice as JSON to a configured endpoint
pub struct HttpNotifier {
    url: String,
    http_client: reqwest::Client,
}

impl HttpNotifier {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("vital/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_default();

        Self {
            url: url.into(),
            http_client,
        }
    }
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn notify(&self, notice: &RegistrationNotice) -> Result<(), NotifyError> {
        let response = self
            .http_client
            .post(&self.url)
            .json(notice)
            .send()
            .await
            .map_err(|e| NotifyError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(NotifyError::Rejected(response.status().as_u16()));
        }

        debug!(user_id = %notice.user_id, url = %self.url, "Registration notice delivered");
        Ok(())
    }
}

/// Delivery disabled: records what would have been sent
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, notice: &RegistrationNotice) -> Result<(), NotifyError> {
        info!(
            user_id = %notice.user_id,
            role = %notice.role,
            action = notice.action,
            "[DEV] Email would be sent to {}",
            notice.email
        );
        Ok(())
    }
}

/// Send `notice` on its own task. The handle is only for tests; callers
/// normally drop it.
pub fn spawn_notification(notifier: Arc<dyn Notifier>, notice: RegistrationNotice) -> JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = notifier.notify(&notice).await {
            warn!(user_id = %notice.user_id, "Failed to send registration notification: {}", e);
        }
    })
}
