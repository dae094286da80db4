//! Localization: locale-prefixed routing and message catalogs
//!
//! The locale is resolved from the request path and passed explicitly to
//! everything that produces text.

pub mod catalog;
pub mod locale;

pub use catalog::{substitute, Catalog, Catalogs};
pub use locale::{resolve, resolve_with_query, strip_locale, Locale, LocaleRoute};
