//! Translation catalogs
//!
//! One flat key → string table per locale, embedded at build time and parsed
//! once at startup. A lookup the requested locale cannot answer is answered
//! from the default locale's table.

use std::collections::{BTreeMap, HashMap};

use super::Locale;
use crate::types::VitalError;

/// Placeholder replaced by [`substitute`]
pub const ITEM_PLACEHOLDER: &str = "{item}";

fn source(locale: Locale) -> &'static str {
    match locale {
        Locale::En => include_str!("../../messages/en.json"),
        Locale::Kn => include_str!("../../messages/kn.json"),
        Locale::Hi => include_str!("../../messages/hi.json"),
    }
}

/// All locale tables, loaded once
#[derive(Debug, Clone)]
pub struct Catalogs {
    tables: HashMap<Locale, HashMap<String, String>>,
}

impl Catalogs {
    /// Parse the embedded message files
    pub fn load() -> Result<Self, VitalError> {
        let mut tables = HashMap::new();
        for locale in Locale::ALL {
            let table: HashMap<String, String> = serde_json::from_str(source(locale))
                .map_err(|e| VitalError::Catalog(format!("messages/{}.json: {}", locale, e)))?;
            tables.insert(locale, table);
        }
        Ok(Self { tables })
    }

    /// Build from explicit tables (tests)
    pub fn from_tables(tables: HashMap<Locale, HashMap<String, String>>) -> Self {
        Self { tables }
    }

    /// The catalog for `locale`
    pub fn for_locale(&self, locale: Locale) -> Catalog<'_> {
        Catalog {
            locale,
            catalogs: self,
        }
    }

    fn lookup(&self, locale: Locale, key: &str) -> Option<&str> {
        self.tables
            .get(&locale)
            .and_then(|table| table.get(key))
            .map(String::as_str)
    }
}

/// Messages for a single resolved locale
#[derive(Debug, Clone, Copy)]
pub struct Catalog<'a> {
    locale: Locale,
    catalogs: &'a Catalogs,
}

impl<'a> Catalog<'a> {
    pub fn locale(&self) -> Locale {
        self.locale
    }

    /// Message for `key`, falling back to the default locale
    pub fn get(&self, key: &str) -> Option<&'a str> {
        self.catalogs
            .lookup(self.locale, key)
            .or_else(|| self.catalogs.lookup(Locale::DEFAULT, key))
    }

    /// Message for `key`, or the key itself when no locale defines it
    pub fn text(&self, key: &'a str) -> &'a str {
        self.get(key).unwrap_or(key)
    }

    /// Every key visible from this locale, with fallbacks applied
    pub fn entries(&self) -> BTreeMap<&'a str, &'a str> {
        let mut merged = BTreeMap::new();
        for locale in [Locale::DEFAULT, self.locale] {
            if let Some(table) = self.catalogs.tables.get(&locale) {
                for (k, v) in table {
                    merged.insert(k.as_str(), v.as_str());
                }
            }
        }
        merged
    }
}

/// Replace the first `{item}` in `template` with `item`
pub fn substitute(template: &str, item: &str) -> String {
    template.replacen(ITEM_PLACEHOLDER, item, 1)
}
