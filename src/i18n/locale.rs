//! Locale-prefix routing
//!
//! Every page path carries a locale as its first segment (`/en/...`). Paths
//! without one are redirected to the default locale; API, framework and
//! static asset paths are never touched.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Supported locales
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Kn,
    Hi,
}

impl Locale {
    pub const ALL: [Locale; 3] = [Locale::En, Locale::Kn, Locale::Hi];
    pub const DEFAULT: Locale = Locale::En;

    pub fn as_str(&self) -> &'static str {
        match self {
            Locale::En => "en",
            Locale::Kn => "kn",
            Locale::Hi => "hi",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Locale {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "en" => Ok(Locale::En),
            "kn" => Ok(Locale::Kn),
            "hi" => Ok(Locale::Hi),
            _ => Err(()),
        }
    }
}

/// Outcome of running a request path through the locale router
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LocaleRoute {
    /// Path is outside the matcher (API, framework internals, static files)
    Excluded,
    /// Path already starts with a supported locale
    Localized(Locale),
    /// Path needs the default locale prepended
    Redirect(String),
}

/// True for paths the locale router must leave alone
pub fn is_excluded(path: &str) -> bool {
    let rest = path.strip_prefix('/').unwrap_or(path);
    rest.starts_with("api") || rest.starts_with("_next") || rest.contains('.')
}

/// The locale named by the first path segment, if it is a supported one
pub fn locale_segment(path: &str) -> Option<Locale> {
    path.trim_start_matches('/')
        .split('/')
        .next()
        .and_then(|segment| segment.parse().ok())
}

/// Resolve a request path (without query string) against the supported locales
pub fn resolve(path: &str) -> LocaleRoute {
    resolve_with_query(path, None)
}

/// Like [`resolve`], carrying the query string over to any redirect target
pub fn resolve_with_query(path: &str, query: Option<&str>) -> LocaleRoute {
    if is_excluded(path) {
        return LocaleRoute::Excluded;
    }
    if let Some(locale) = locale_segment(path) {
        return LocaleRoute::Localized(locale);
    }

    let mut target = format!("/{}", Locale::DEFAULT);
    if path != "/" && !path.is_empty() {
        if !path.starts_with('/') {
            target.push('/');
        }
        target.push_str(path);
    }
    if let Some(q) = query.filter(|q| !q.is_empty()) {
        target.push('?');
        target.push_str(q);
    }
    LocaleRoute::Redirect(target)
}

/// Strip the leading locale segment: `/kn/authority/register` → `/authority/register`
pub fn strip_locale(path: &str) -> (Option<Locale>, &str) {
    let trimmed = path.strip_prefix('/').unwrap_or(path);
    let (head, tail) = match trimmed.find('/') {
        Some(i) => (&trimmed[..i], &trimmed[i..]),
        None => (trimmed, ""),
    };
    match head.parse::<Locale>() {
        Ok(locale) => (Some(locale), if tail.is_empty() { "/" } else { tail }),
        Err(()) => (None, path),
    }
}
