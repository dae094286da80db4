//! VITAL - authority registration service
//!
//! Government authorities (PDOs, village incharges, TDOs and DDOs) register
//! against an administrative hierarchy of districts, taluks, villages and
//! panchayats. Registrations are stored with verification pending until an
//! administrator approves them.
//!
//! ## Components
//!
//! - **Locale routing**: every page lives under `/en`, `/kn` or `/hi`
//! - **Catalogs**: embedded translation tables with English fallback
//! - **Hierarchy**: store-backed option lists, one level at a time
//! - **Form**: the registration state machine and its validation rules
//! - **Registration**: identity creation and profile persistence

pub mod auth;
pub mod config;
pub mod db;
pub mod form;
pub mod hierarchy;
pub mod i18n;
pub mod notify;
pub mod registration;
pub mod routes;
pub mod server;
pub mod types;

pub use config::Args;
pub use server::{run, AppState};
pub use types::{Result, VitalError};
