//! Configuration for VITAL
//!
//! CLI arguments and environment variable handling using clap.

use clap::Parser;
use std::net::SocketAddr;
use std::time::Duration;

/// VITAL - authority registration service
#[derive(Parser, Debug, Clone)]
#[command(name = "vital")]
#[command(about = "Authority registration service for village administration")]
pub struct Args {
    /// Address to listen on
    #[arg(long, env = "LISTEN", default_value = "0.0.0.0:8080")]
    pub listen: SocketAddr,

    /// MongoDB connection URI
    #[arg(long, env = "MONGODB_URI", default_value = "mongodb://localhost:27017")]
    pub mongodb_uri: String,

    /// MongoDB database name
    #[arg(long, env = "MONGODB_DB", default_value = "vital")]
    pub mongodb_db: String,

    /// Enable development mode (in-memory store when MongoDB is unreachable)
    #[arg(long, env = "DEV_MODE", default_value = "false")]
    pub dev_mode: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    pub log_level: String,

    /// Deliver registration notices to NOTIFY_URL instead of logging them
    #[arg(long, env = "NOTIFY_ENABLED", default_value = "false")]
    pub notify_enabled: bool,

    /// Endpoint receiving registration notices as JSON
    #[arg(long, env = "NOTIFY_URL")]
    pub notify_url: Option<String>,

    /// Notification request timeout in milliseconds
    #[arg(long, env = "NOTIFY_TIMEOUT_MS", default_value = "5000")]
    pub notify_timeout_ms: u64,

    /// State recorded on manually entered districts
    #[arg(long, env = "DEFAULT_STATE", default_value = "Karnataka")]
    pub default_state: String,

    /// Whether the bundled auth service accepts email/password sign-up
    #[arg(long, env = "EMAIL_SIGNIN_ENABLED", default_value_t = true, action = clap::ArgAction::Set)]
    pub email_signin_enabled: bool,

    /// Post-registration page, appended to the locale prefix
    #[arg(long, env = "STATUS_PATH", default_value = "/authority/status")]
    pub status_path: String,
}

impl Args {
    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.notify_enabled && self.notify_url.is_none() {
            return Err("NOTIFY_URL is required when NOTIFY_ENABLED is set".to_string());
        }

        if !self.status_path.starts_with('/') {
            return Err("STATUS_PATH must start with '/'".to_string());
        }

        if self.default_state.trim().is_empty() {
            return Err("DEFAULT_STATE must not be empty".to_string());
        }

        Ok(())
    }

    pub fn notify_timeout(&self) -> Duration {
        Duration::from_millis(self.notify_timeout_ms)
    }
}
