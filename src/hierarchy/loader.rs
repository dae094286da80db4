//! Store-backed option lists for each hierarchy level

use std::sync::Arc;
use tracing::{debug, warn};

use crate::db::schemas::{
    DISTRICT_COLLECTION, PANCHAYAT_COLLECTION, TALUK_COLLECTION, VILLAGE_COLLECTION,
};
use crate::db::{DocumentStore, FieldFilter, StoreError, StoredDocument};
use crate::form::{FetchOutcome, FetchTicket, Level, LocationOption, RegistrationForm};

/// Field every level's list is ordered by
const ORDER_FIELD: &str = "name";

/// Collection holding `level` and the field linking it to its parent
fn source(level: Level) -> (&'static str, Option<&'static str>) {
    match level {
        Level::District => (DISTRICT_COLLECTION, None),
        Level::Taluk => (TALUK_COLLECTION, Some("districtId")),
        Level::Village => (VILLAGE_COLLECTION, Some("talukId")),
        Level::Panchayat => (PANCHAYAT_COLLECTION, Some("villageId")),
    }
}

/// `None` for an entry without a usable name
fn to_option(doc: StoredDocument) -> Option<LocationOption> {
    let name = doc.fields.get_str(ORDER_FIELD).ok()?.to_string();
    Some(LocationOption { id: doc.id, name })
}

/// A fetch that has finished but not yet been applied to a form
#[derive(Debug)]
pub struct FetchCompletion {
    pub ticket: FetchTicket,
    pub result: Result<Vec<LocationOption>, StoreError>,
}

impl FetchCompletion {
    pub fn apply(self, form: &mut RegistrationForm) -> FetchOutcome {
        form.apply_fetch(&self.ticket, self.result)
    }
}

pub struct HierarchyLoader {
    store: Arc<dyn DocumentStore>,
}

impl HierarchyLoader {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn districts(&self) -> Result<Vec<LocationOption>, StoreError> {
        self.options(Level::District, None).await
    }

    pub async fn taluks(&self, district_id: &str) -> Result<Vec<LocationOption>, StoreError> {
        self.options(Level::Taluk, Some(district_id)).await
    }

    pub async fn villages(&self, taluk_id: &str) -> Result<Vec<LocationOption>, StoreError> {
        self.options(Level::Village, Some(taluk_id)).await
    }

    pub async fn panchayats(&self, village_id: &str) -> Result<Vec<LocationOption>, StoreError> {
        self.options(Level::Panchayat, Some(village_id)).await
    }

    /// Entries of `level` under `parent_id`, ascending by name. A level with
    /// a parent link and no parent id lists nothing. Entries without a
    /// name are skipped.
    pub async fn options(
        &self,
        level: Level,
        parent_id: Option<&str>,
    ) -> Result<Vec<LocationOption>, StoreError> {
        let (collection, parent_field) = source(level);
        let filter = match (parent_field, parent_id) {
            (None, _) => None,
            (Some(field), Some(id)) => Some(FieldFilter::eq(field, id)),
            (Some(_), None) => return Ok(Vec::new()),
        };

        let docs = self.store.query(collection, filter, Some(ORDER_FIELD)).await?;
        debug!("Loaded {} {}s", docs.len(), level);

        let mut options = Vec::with_capacity(docs.len());
        for doc in docs {
            let id = doc.id.clone();
            match to_option(doc) {
                Some(option) => options.push(option),
                None => warn!("Skipping {} {} without a name", level, id),
            }
        }
        Ok(options)
    }

    /// Run the fetch a ticket describes without holding the form
    pub async fn fetch(&self, ticket: FetchTicket) -> FetchCompletion {
        let result = self.options(ticket.level, ticket.parent_id.as_deref()).await;
        FetchCompletion { ticket, result }
    }

    /// Fetch and apply in one step
    pub async fn load(&self, form: &mut RegistrationForm, ticket: FetchTicket) -> FetchOutcome {
        self.fetch(ticket).await.apply(form)
    }
}
