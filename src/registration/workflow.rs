//! Submission: identity, manual hierarchy entries, profile, user record

use bson::DateTime;
use std::sync::Arc;
use tracing::{info, warn};

use super::RegistrationError;
use crate::auth::{AuthService, AuthSession};
use crate::db::schemas::{
    AuthorityProfile, District, ManualEntryFlags, Panchayat, Taluk, UserRecord, Verification,
    VerificationStatus, Village, AUTHORITY_COLLECTION, DISTRICT_COLLECTION,
    PANCHAYAT_COLLECTION, TALUK_COLLECTION, USER_COLLECTION, VILLAGE_COLLECTION,
};
use crate::db::{to_fields, DocumentStore, StoreError};
use crate::form::{Level, LevelChoice, ValidatedRegistration};
use crate::i18n::Locale;
use crate::notify::{spawn_notification, Notifier, RegistrationNotice};

/// Deployment-specific values stamped on new records
#[derive(Debug, Clone)]
pub struct RegistrationSettings {
    /// State recorded on manually entered districts
    pub default_state: String,
    /// Page shown after registering, below the locale prefix
    pub status_path: String,
}

impl Default for RegistrationSettings {
    fn default() -> Self {
        Self {
            default_state: "Karnataka".to_string(),
            status_path: "/authority/status".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrationOutcome {
    pub uid: String,
    /// Locale-prefixed status page
    pub redirect: String,
}

/// A hierarchy level after submission: the stored entity it refers to, if any
#[derive(Debug, Clone, PartialEq, Eq)]
struct Resolved {
    id: Option<String>,
    name: String,
    manual: bool,
}

impl Resolved {
    fn existing(id: &str, name: &str) -> Self {
        Self {
            id: Some(id.to_string()),
            name: name.to_string(),
            manual: false,
        }
    }
}

pub struct RegistrationService {
    store: Arc<dyn DocumentStore>,
    auth: Arc<dyn AuthService>,
    notifier: Arc<dyn Notifier>,
    settings: RegistrationSettings,
}

impl RegistrationService {
    pub fn new(
        store: Arc<dyn DocumentStore>,
        auth: Arc<dyn AuthService>,
        notifier: Arc<dyn Notifier>,
        settings: RegistrationSettings,
    ) -> Self {
        Self {
            store,
            auth,
            notifier,
            settings,
        }
    }

    pub fn settings(&self) -> &RegistrationSettings {
        &self.settings
    }

    /// Status page for `locale`
    pub fn status_redirect(&self, locale: Locale) -> String {
        format!("/{}{}", locale, self.settings.status_path)
    }

    /// Register a validated form.
    ///
    /// Writes are not transactional. When a write fails after the identity was
    /// created, the identity and any hierarchy entries already inserted stay
    /// behind and are logged.
    pub async fn register(
        &self,
        registration: &ValidatedRegistration,
        locale: Locale,
    ) -> Result<RegistrationOutcome, RegistrationError> {
        let session = self
            .auth
            .create_identity(&registration.email, &registration.password)
            .await
            .map_err(|e| {
                warn!(email = %registration.email, "Identity creation failed: {}", e);
                RegistrationError::Auth(e)
            })?;
        let uid = session.uid.clone();

        let mut created = Vec::new();
        if let Err(e) = self.persist(&uid, registration, &mut created).await {
            warn!(
                uid = %uid,
                created = ?created,
                "Registration failed after identity creation; earlier writes are kept: {}",
                e
            );
            self.close_session(&session).await;
            return Err(e.into());
        }

        spawn_notification(
            Arc::clone(&self.notifier),
            RegistrationNotice::registration_complete(
                uid.clone(),
                registration.email.clone(),
                registration.name.clone(),
                registration.role,
            ),
        );

        self.close_session(&session).await;

        info!(uid = %uid, role = %registration.role, "Authority registered, verification pending");
        Ok(RegistrationOutcome {
            uid,
            redirect: self.status_redirect(locale),
        })
    }

    async fn close_session(&self, session: &AuthSession) {
        if let Err(e) = self.auth.end_session(session).await {
            warn!(uid = %session.uid, "Failed to end session: {}", e);
        }
    }

    async fn persist(
        &self,
        uid: &str,
        registration: &ValidatedRegistration,
        created: &mut Vec<String>,
    ) -> Result<(), StoreError> {
        let now = self.store.server_timestamp();

        let district = self
            .resolve_district(uid, &registration.district, now, created)
            .await?;
        let taluk = match registration.choice(Level::Taluk) {
            Some(choice) => Some(self.resolve_taluk(uid, choice, &district, now, created).await?),
            None => None,
        };
        let village = match (registration.choice(Level::Village), &taluk) {
            (Some(choice), Some(taluk)) => {
                Some(self.resolve_village(uid, choice, &district, taluk, now, created).await?)
            }
            _ => None,
        };
        let panchayat = match (registration.choice(Level::Panchayat), &taluk, &village) {
            (Some(choice), Some(taluk), Some(village)) => Some(
                self.resolve_panchayat(uid, registration, choice, &district, taluk, village, now, created)
                    .await?,
            ),
            _ => None,
        };

        let profile = AuthorityProfile {
            uid: uid.to_string(),
            role: registration.role,
            name: registration.name.clone(),
            email: registration.email.clone(),
            mobile: registration.mobile.clone(),
            aadhaar: registration.aadhaar.clone(),
            aadhaar_last4: registration.aadhaar_last4().to_string(),
            office_address: registration.office_address.clone(),
            gram_panchayat_id: registration.gram_panchayat_id.clone(),
            district_id: district.id.clone().unwrap_or_default(),
            district: district.name.clone(),
            taluk_id: taluk.as_ref().and_then(|t| t.id.clone()),
            taluk: taluk.as_ref().map(|t| t.name.clone()),
            village_id: village.as_ref().and_then(|v| v.id.clone()),
            village: village.as_ref().map(|v| v.name.clone()),
            panchayat_id: panchayat.as_ref().and_then(|p| p.id.clone()),
            panchayat: panchayat.as_ref().map(|p| p.name.clone()),
            is_manual_entry: ManualEntryFlags {
                district: district.manual,
                taluk: taluk.as_ref().is_some_and(|t| t.manual),
                village: village.as_ref().is_some_and(|v| v.manual),
                panchayat: panchayat.as_ref().is_some_and(|p| p.manual),
            },
            verified: false,
            verification: Verification {
                status: VerificationStatus::Pending,
                requested_at: now,
            },
            status: VerificationStatus::Pending,
            created_at: now,
            updated_at: now,
        };
        self.store
            .set(AUTHORITY_COLLECTION, uid, to_fields(&profile)?)
            .await?;

        let user = UserRecord::authority(uid, &registration.name, &registration.email, registration.role, now);
        self.store.set(USER_COLLECTION, uid, to_fields(&user)?).await?;

        Ok(())
    }

    async fn insert_new(
        &self,
        collection: &str,
        fields: bson::Document,
        created: &mut Vec<String>,
    ) -> Result<String, StoreError> {
        let id = self.store.insert(collection, fields).await?;
        info!(collection, id = %id, "Stored manually entered location");
        created.push(format!("{}/{}", collection, id));
        Ok(id)
    }

    async fn resolve_district(
        &self,
        uid: &str,
        choice: &LevelChoice,
        now: DateTime,
        created: &mut Vec<String>,
    ) -> Result<Resolved, StoreError> {
        let name = match choice {
            LevelChoice::Existing { id, name } => return Ok(Resolved::existing(id, name)),
            LevelChoice::New { name } => name,
        };
        let district = District {
            name: name.clone(),
            state: Some(self.settings.default_state.clone()),
            is_active: Some(true),
            created_by: Some(uid.to_string()),
            created_at: Some(now),
            ..Default::default()
        };
        let id = self.insert_new(DISTRICT_COLLECTION, to_fields(&district)?, created).await?;
        Ok(Resolved {
            id: Some(id),
            name: name.clone(),
            manual: true,
        })
    }

    async fn resolve_taluk(
        &self,
        uid: &str,
        choice: &LevelChoice,
        district: &Resolved,
        now: DateTime,
        created: &mut Vec<String>,
    ) -> Result<Resolved, StoreError> {
        let name = match choice {
            LevelChoice::Existing { id, name } => return Ok(Resolved::existing(id, name)),
            LevelChoice::New { name } => name,
        };
        let id = match &district.id {
            Some(district_id) => {
                let taluk = Taluk {
                    name: name.clone(),
                    district_id: district_id.clone(),
                    district_name: district.name.clone(),
                    is_active: Some(true),
                    created_by: Some(uid.to_string()),
                    created_at: Some(now),
                    ..Default::default()
                };
                Some(self.insert_new(TALUK_COLLECTION, to_fields(&taluk)?, created).await?)
            }
            None => None,
        };
        Ok(Resolved {
            id,
            name: name.clone(),
            manual: true,
        })
    }

    async fn resolve_village(
        &self,
        uid: &str,
        choice: &LevelChoice,
        district: &Resolved,
        taluk: &Resolved,
        now: DateTime,
        created: &mut Vec<String>,
    ) -> Result<Resolved, StoreError> {
        let name = match choice {
            LevelChoice::Existing { id, name } => return Ok(Resolved::existing(id, name)),
            LevelChoice::New { name } => name,
        };
        let id = match &taluk.id {
            Some(taluk_id) => {
                let village = Village {
                    name: name.clone(),
                    district_id: district.id.clone().unwrap_or_default(),
                    district_name: district.name.clone(),
                    taluk_id: taluk_id.clone(),
                    taluk_name: taluk.name.clone(),
                    is_active: Some(true),
                    created_by: Some(uid.to_string()),
                    created_at: Some(now),
                    ..Default::default()
                };
                Some(self.insert_new(VILLAGE_COLLECTION, to_fields(&village)?, created).await?)
            }
            None => None,
        };
        Ok(Resolved {
            id,
            name: name.clone(),
            manual: true,
        })
    }

    #[allow(clippy::too_many_arguments)]
    async fn resolve_panchayat(
        &self,
        uid: &str,
        registration: &ValidatedRegistration,
        choice: &LevelChoice,
        district: &Resolved,
        taluk: &Resolved,
        village: &Resolved,
        now: DateTime,
        created: &mut Vec<String>,
    ) -> Result<Resolved, StoreError> {
        let name = match choice {
            LevelChoice::Existing { id, name } => return Ok(Resolved::existing(id, name)),
            LevelChoice::New { name } => name,
        };
        let id = match &village.id {
            Some(village_id) => {
                let gram_panchayat_id = Some(registration.gram_panchayat_id.clone())
                    .filter(|id| !id.is_empty());
                let panchayat = Panchayat {
                    name: name.clone(),
                    village_id: village_id.clone(),
                    village_name: village.name.clone(),
                    taluk_id: taluk.id.clone().unwrap_or_default(),
                    taluk_name: taluk.name.clone(),
                    district_id: district.id.clone().unwrap_or_default(),
                    district_name: district.name.clone(),
                    gram_panchayat_id,
                    is_active: Some(true),
                    created_by: Some(uid.to_string()),
                    created_at: Some(now),
                    ..Default::default()
                };
                Some(self.insert_new(PANCHAYAT_COLLECTION, to_fields(&panchayat)?, created).await?)
            }
            None => None,
        };
        Ok(Resolved {
            id,
            name: name.clone(),
            manual: true,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{AuthError, CredentialAuthService};
    use crate::db::{FieldFilter, MemoryStore, StoredDocument};
    use crate::form::Role;
    use crate::notify::LogNotifier;
    use async_trait::async_trait;
    use bson::{doc, Document};
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn registration(role: Role) -> ValidatedRegistration {
        ValidatedRegistration {
            role,
            name: "Manjunath".into(),
            email: "manju@example.in".into(),
            password: "Hobli#2024".into(),
            mobile: "9448012345".into(),
            aadhaar: "123412341234".into(),
            office_address: "Gram Panchayat Office".into(),
            gram_panchayat_id: String::new(),
            district: LevelChoice::Existing {
                id: "d1".into(),
                name: "Mysuru".into(),
            },
            taluk: None,
            village: None,
            panchayat: None,
        }
    }

    fn service(store: Arc<dyn DocumentStore>, auth: Arc<dyn AuthService>) -> RegistrationService {
        RegistrationService::new(store, auth, Arc::new(LogNotifier), RegistrationSettings::default())
    }

    /// Store that rejects writes to one collection
    struct DenyingStore {
        inner: MemoryStore,
        deny: &'static str,
    }

    #[async_trait]
    impl DocumentStore for DenyingStore {
        async fn query(
            &self,
            collection: &str,
            filter: Option<FieldFilter>,
            order_by: Option<&str>,
        ) -> Result<Vec<StoredDocument>, StoreError> {
            self.inner.query(collection, filter, order_by).await
        }

        async fn insert(&self, collection: &str, fields: Document) -> Result<String, StoreError> {
            if collection == self.deny {
                return Err(StoreError::PermissionDenied);
            }
            self.inner.insert(collection, fields).await
        }

        async fn set(&self, collection: &str, id: &str, fields: Document) -> Result<(), StoreError> {
            if collection == self.deny {
                return Err(StoreError::PermissionDenied);
            }
            self.inner.set(collection, id, fields).await
        }
    }

    #[derive(Default)]
    struct CountingAuth {
        ended: AtomicUsize,
        reject: Option<AuthError>,
    }

    #[async_trait]
    impl AuthService for CountingAuth {
        async fn create_identity(&self, _email: &str, _password: &str) -> Result<AuthSession, AuthError> {
            match &self.reject {
                Some(e) => Err(e.clone()),
                None => Ok(AuthSession {
                    uid: "uid-42".into(),
                    session_id: "s-1".into(),
                }),
            }
        }

        async fn end_session(&self, _session: &AuthSession) -> Result<(), AuthError> {
            self.ended.fetch_add(1, Ordering::SeqCst);
            Err(AuthError::Backend("already signed out".into()))
        }
    }

    #[tokio::test]
    async fn test_selected_hierarchy_writes_profile_and_user_only() {
        let store = Arc::new(MemoryStore::new());
        let auth = Arc::new(CredentialAuthService::new(store.clone(), true));
        let svc = service(store.clone(), auth.clone());

        let outcome = svc.register(&registration(Role::Ddo), Locale::Kn).await.unwrap();

        assert_eq!(outcome.redirect, "/kn/authority/status");
        assert_eq!(store.count(DISTRICT_COLLECTION), 0);
        assert_eq!(auth.active_sessions(), 0);

        let profiles = store.documents(AUTHORITY_COLLECTION);
        assert_eq!(profiles.len(), 1);
        assert_eq!(profiles[0].id, outcome.uid);
        let profile: AuthorityProfile = profiles[0].decode().unwrap();
        assert_eq!(profile.status, VerificationStatus::Pending);
        assert_eq!(profile.aadhaar_last4, "1234");
        assert_eq!(profile.district_id, "d1");
        assert!(profile.taluk.is_none());
        assert!(!profile.verified);
        assert!(profiles[0].fields.get("talukId").is_some_and(|v| v == &bson::Bson::Null));

        let users = store.documents(USER_COLLECTION);
        let user: UserRecord = users[0].decode().unwrap();
        assert_eq!(user.role, "authority");
        assert_eq!(user.authority_role, Role::Ddo);
    }

    #[tokio::test]
    async fn test_manual_levels_chain_new_entities() {
        let store = Arc::new(MemoryStore::new());
        let auth = Arc::new(CountingAuth::default());
        let svc = service(store.clone(), auth);

        let mut reg = registration(Role::Pdo);
        reg.district = LevelChoice::New { name: "Vijayanagara".into() };
        reg.taluk = Some(LevelChoice::New { name: "Hosapete".into() });
        reg.village = Some(LevelChoice::New { name: "Kamalapura".into() });
        reg.panchayat = Some(LevelChoice::New { name: "Kamalapura GP".into() });
        reg.gram_panchayat_id = "GP-5521".into();

        svc.register(&reg, Locale::En).await.unwrap();

        let district = &store.documents(DISTRICT_COLLECTION)[0];
        assert_eq!(district.fields.get_str("state").unwrap(), "Karnataka");
        assert_eq!(district.fields.get_str("createdBy").unwrap(), "uid-42");

        let taluk = &store.documents(TALUK_COLLECTION)[0];
        assert_eq!(taluk.fields.get_str("districtId").unwrap(), district.id);

        let village: Village = store.documents(VILLAGE_COLLECTION)[0].decode().unwrap();
        assert_eq!(village.taluk_id, taluk.id);
        assert_eq!(village.district_name, "Vijayanagara");

        let panchayat: Panchayat = store.documents(PANCHAYAT_COLLECTION)[0].decode().unwrap();
        assert_eq!(panchayat.village_id, village.id.clone().unwrap());
        assert_eq!(panchayat.gram_panchayat_id.as_deref(), Some("GP-5521"));

        let profile: AuthorityProfile = store.documents(AUTHORITY_COLLECTION)[0].decode().unwrap();
        assert_eq!(
            profile.is_manual_entry,
            ManualEntryFlags {
                district: true,
                taluk: true,
                village: true,
                panchayat: true
            }
        );
        assert_eq!(profile.panchayat_id, panchayat.id);
    }

    #[tokio::test]
    async fn test_identity_failure_writes_nothing() {
        let store = Arc::new(MemoryStore::new());
        let auth = Arc::new(CountingAuth {
            reject: Some(AuthError::EmailAlreadyInUse),
            ..Default::default()
        });
        let svc = service(store.clone(), auth.clone());

        let err = svc.register(&registration(Role::Ddo), Locale::En).await.unwrap_err();

        assert_eq!(err.user_message(), "Email already registered");
        assert_eq!(store.count(AUTHORITY_COLLECTION), 0);
        assert_eq!(auth.ended.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_profile_write_failure_keeps_earlier_writes() {
        let store = Arc::new(DenyingStore {
            inner: MemoryStore::new(),
            deny: AUTHORITY_COLLECTION,
        });
        let auth = Arc::new(CountingAuth::default());
        let svc = service(store.clone(), auth.clone());

        let mut reg = registration(Role::Ddo);
        reg.district = LevelChoice::New { name: "Kodagu".into() };
        let err = svc.register(&reg, Locale::Hi).await.unwrap_err();

        assert_eq!(err, RegistrationError::Store(StoreError::PermissionDenied));
        assert_eq!(
            err.user_message(),
            "Permission denied. Please check your database access rules."
        );
        // Session ended even though sign-out itself reported an error
        assert_eq!(auth.ended.load(Ordering::SeqCst), 1);
        assert_eq!(store.inner.count(DISTRICT_COLLECTION), 1);
        assert_eq!(store.inner.count(USER_COLLECTION), 0);
    }

    #[tokio::test]
    async fn test_duplicate_email_through_credential_service() {
        let store = Arc::new(MemoryStore::new());
        store.seed(
            crate::db::schemas::CREDENTIAL_COLLECTION,
            doc! { "uid": "older", "email": "manju@example.in", "passwordHash": "x", "isActive": true },
        );
        let auth = Arc::new(CredentialAuthService::new(store.clone(), true));
        let svc = service(store.clone(), auth);

        let err = svc.register(&registration(Role::Tdo), Locale::En).await.unwrap_err();
        assert_eq!(err.status_code().as_u16(), 409);
    }
}
