//! Registration form state machine

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use super::level::{FetchOutcome, FetchTicket, LevelMode, LevelNotice, LevelSlot, LocationOption, ManualOrigin};
use super::validation::{
    digits_only, is_valid_aadhaar, is_valid_mobile, normalize_aadhaar, PasswordStrength,
    ValidationError, AADHAAR_DIGITS, MOBILE_DIGITS,
};
use super::{Level, Role};
use crate::db::StoreError;

/// Rejected form transitions
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FormError {
    #[error("{id} is not a listed {level}")]
    UnknownOption { level: Level, id: String },

    #[error("{0} is being entered manually")]
    ManualEntryActive(Level),

    #[error("{0} is not in manual entry mode")]
    NotManual(Level),
}

/// Fields the user has been told are wrong
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Touched {
    pub name: bool,
    pub email: bool,
    pub password: bool,
    pub mobile: bool,
    pub aadhaar: bool,
    pub office_address: bool,
}

/// How a validated level will be written
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LevelChoice {
    /// Picked from the fetched list
    Existing { id: String, name: String },
    /// Typed in; persisted as a new entity on submit
    New { name: String },
}

impl LevelChoice {
    pub fn name(&self) -> &str {
        match self {
            LevelChoice::Existing { name, .. } | LevelChoice::New { name } => name,
        }
    }

    pub fn is_manual(&self) -> bool {
        matches!(self, LevelChoice::New { .. })
    }
}

/// Snapshot of a form that passed validation, with inputs trimmed and
/// normalized
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRegistration {
    pub role: Role,
    pub name: String,
    pub email: String,
    pub password: String,
    pub mobile: String,
    pub aadhaar: String,
    pub office_address: String,
    pub gram_panchayat_id: String,
    pub district: LevelChoice,
    // Present only when the role requires the level
    pub taluk: Option<LevelChoice>,
    pub village: Option<LevelChoice>,
    pub panchayat: Option<LevelChoice>,
}

impl ValidatedRegistration {
    pub fn choice(&self, level: Level) -> Option<&LevelChoice> {
        match level {
            Level::District => Some(&self.district),
            Level::Taluk => self.taluk.as_ref(),
            Level::Village => self.village.as_ref(),
            Level::Panchayat => self.panchayat.as_ref(),
        }
    }

    pub fn aadhaar_last4(&self) -> &str {
        let start = self.aadhaar.len().saturating_sub(4);
        &self.aadhaar[start..]
    }
}

/// In-progress authority registration
#[derive(Debug, Clone, Default)]
pub struct RegistrationForm {
    role: Role,
    name: String,
    email: String,
    password: String,
    password_strength: PasswordStrength,
    mobile: String,
    aadhaar: String,
    office_address: String,
    gram_panchayat_id: String,
    levels: [LevelSlot; 4],
    touched: Touched,
    error: Option<ValidationError>,
}

impl RegistrationForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn role(&self) -> Role {
        self.role
    }

    /// Switch role; every location choice and the gram panchayat id are cleared
    pub fn set_role(&mut self, role: Role) {
        self.role = role;
        self.gram_panchayat_id.clear();
        self.levels[Level::District.index()].clear_choice();
        self.cascade_below(Level::District);
    }

    /// Bring the levels below `level` in line with it: typed-in levels force
    /// typed-in children, anything else leaves them empty
    fn cascade_below(&mut self, level: Level) {
        let manual = self.level(level).is_manual();
        for below in level.descendants() {
            let slot = self.slot_mut(*below);
            if manual {
                slot.follow_manual_parent();
            } else {
                slot.reset();
            }
        }
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    pub fn set_email(&mut self, email: impl Into<String>) {
        self.email = email.into();
    }

    pub fn set_password(&mut self, password: impl Into<String>) {
        self.password = password.into();
        self.password_strength = PasswordStrength::evaluate(&self.password);
    }

    /// Digits only, first ten kept
    pub fn set_mobile(&mut self, mobile: &str) {
        self.mobile = digits_only(mobile, MOBILE_DIGITS);
    }

    /// Digits only, first twelve kept
    pub fn set_aadhaar(&mut self, aadhaar: &str) {
        self.aadhaar = digits_only(aadhaar, AADHAAR_DIGITS);
    }

    pub fn set_office_address(&mut self, address: impl Into<String>) {
        self.office_address = address.into();
    }

    pub fn set_gram_panchayat_id(&mut self, id: impl Into<String>) {
        self.gram_panchayat_id = id.into();
    }

    pub fn mobile(&self) -> &str {
        &self.mobile
    }

    pub fn aadhaar(&self) -> &str {
        &self.aadhaar
    }

    pub fn gram_panchayat_id(&self) -> &str {
        &self.gram_panchayat_id
    }

    pub fn password_strength(&self) -> PasswordStrength {
        self.password_strength
    }

    pub fn touched(&self) -> Touched {
        self.touched
    }

    /// Message of the last failed validation
    pub fn error(&self) -> Option<&ValidationError> {
        self.error.as_ref()
    }

    pub fn level(&self, level: Level) -> &LevelSlot {
        &self.levels[level.index()]
    }

    fn slot_mut(&mut self, level: Level) -> &mut LevelSlot {
        &mut self.levels[level.index()]
    }

    /// Start loading options for `level`. Returns `None` when the level cannot
    /// be listed: its parent has no selection, or the role does not need it.
    pub fn begin_fetch(&mut self, level: Level) -> Option<FetchTicket> {
        if !self.role.requires(level) {
            return None;
        }
        let parent_id = match level.parent() {
            None => None,
            Some(parent) => Some(self.level(parent).selected_id()?.to_string()),
        };
        Some(self.slot_mut(level).next_ticket(level, parent_id))
    }

    /// Pick an option. Every level below is cleared; the returned ticket loads
    /// the next level's options.
    pub fn select(&mut self, level: Level, id: &str) -> Result<Option<FetchTicket>, FormError> {
        let slot = self.slot_mut(level);
        if slot.is_user_manual() {
            return Err(FormError::ManualEntryActive(level));
        }
        if !slot.options.iter().any(|o| o.id == id) {
            return Err(FormError::UnknownOption {
                level,
                id: id.to_string(),
            });
        }
        slot.mode = LevelMode::Selected(id.to_string());
        slot.notice = None;

        for below in level.descendants() {
            self.slot_mut(*below).reset();
        }

        Ok(level.child().and_then(|child| self.begin_fetch(child)))
    }

    /// Switch `level` to typed entry at the user's request. Levels below can
    /// no longer be listed and follow into manual entry.
    pub fn enter_manual(&mut self, level: Level) {
        let slot = self.slot_mut(level);
        let text = slot.manual_text().unwrap_or_default().to_string();
        slot.mode = LevelMode::Manual {
            text,
            origin: ManualOrigin::User,
        };
        slot.notice = None;

        for below in level.descendants() {
            self.slot_mut(*below).follow_manual_parent();
        }
    }

    pub fn set_manual_text(&mut self, level: Level, value: impl Into<String>) -> Result<(), FormError> {
        match &mut self.slot_mut(level).mode {
            LevelMode::Manual { text, .. } => {
                *text = value.into();
                Ok(())
            }
            _ => Err(FormError::NotManual(level)),
        }
    }

    /// Apply a fetch completion. Completions for a superseded ticket are
    /// dropped; failures are treated as an empty list.
    pub fn apply_fetch(
        &mut self,
        ticket: &FetchTicket,
        result: Result<Vec<LocationOption>, StoreError>,
    ) -> FetchOutcome {
        let level = ticket.level;
        let parent_matches = match level.parent() {
            None => true,
            Some(parent) => self.level(parent).selected_id() == ticket.parent_id.as_deref(),
        };
        if !parent_matches || self.level(level).generation != ticket.generation {
            debug!(
                "Discarding stale {} fetch (generation {}, current {})",
                level,
                ticket.generation,
                self.level(level).generation
            );
            return FetchOutcome::Discarded;
        }

        let slot = self.slot_mut(level);
        match result {
            Ok(options) => slot.apply_options(options),
            Err(e) => {
                warn!("Error loading {}s: {}", level, e);
                slot.apply_options(Vec::new());
                if level == Level::Panchayat {
                    slot.notice = Some(LevelNotice::NoPanchayatFound);
                }
            }
        }
        if self.level(level).is_manual() {
            for below in level.descendants() {
                self.slot_mut(*below).follow_manual_parent();
            }
        }
        FetchOutcome::Applied
    }

    /// Run the submit-time rules in order, stopping at the first failure. The
    /// failure is also kept as the form's current error.
    pub fn validate(&mut self) -> Result<ValidatedRegistration, ValidationError> {
        match self.check() {
            Ok(validated) => {
                self.error = None;
                Ok(validated)
            }
            Err(e) => {
                match e {
                    ValidationError::NameRequired => self.touched.name = true,
                    ValidationError::EmailInvalid => self.touched.email = true,
                    ValidationError::PasswordInvalid => self.touched.password = true,
                    ValidationError::MobileInvalid => self.touched.mobile = true,
                    ValidationError::AadhaarInvalid => self.touched.aadhaar = true,
                    ValidationError::OfficeAddressRequired => self.touched.office_address = true,
                    _ => {}
                }
                self.error = Some(e.clone());
                Err(e)
            }
        }
    }

    fn check(&self) -> Result<ValidatedRegistration, ValidationError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ValidationError::NameRequired);
        }
        let email = self.email.trim();
        if email.is_empty() || !email.contains('@') {
            return Err(ValidationError::EmailInvalid);
        }
        if !self.password_strength.is_valid() {
            return Err(ValidationError::PasswordInvalid);
        }
        if !is_valid_mobile(&self.mobile) {
            return Err(ValidationError::MobileInvalid);
        }
        if !is_valid_aadhaar(&self.aadhaar) {
            return Err(ValidationError::AadhaarInvalid);
        }
        let office_address = self.office_address.trim();
        if office_address.is_empty() {
            return Err(ValidationError::OfficeAddressRequired);
        }

        let district = self.check_level(Level::District)?;
        let mut below = [None, None, None];
        for level in Level::District.descendants() {
            if self.role.requires(*level) {
                below[level.index() - 1] = Some(self.check_level(*level)?);
            }
        }
        let [taluk, village, panchayat] = below;

        let gram_panchayat_id = self.gram_panchayat_id.trim();
        if self.role.requires_gram_panchayat_id() && gram_panchayat_id.is_empty() {
            return Err(ValidationError::GramPanchayatIdRequired);
        }

        Ok(ValidatedRegistration {
            role: self.role,
            name: name.to_string(),
            email: email.to_string(),
            password: self.password.clone(),
            mobile: self.mobile.clone(),
            aadhaar: normalize_aadhaar(&self.aadhaar),
            office_address: office_address.to_string(),
            gram_panchayat_id: gram_panchayat_id.to_string(),
            district,
            taluk,
            village,
            panchayat,
        })
    }

    fn check_level(&self, level: Level) -> Result<LevelChoice, ValidationError> {
        let slot = self.level(level);
        match slot.mode() {
            LevelMode::Manual { text, .. } => {
                let name = text.trim();
                if name.is_empty() {
                    Err(ValidationError::LevelNameRequired(level))
                } else {
                    Ok(LevelChoice::New {
                        name: name.to_string(),
                    })
                }
            }
            LevelMode::Selected(_) => slot
                .selected_option()
                .map(|option| LevelChoice::Existing {
                    id: option.id.clone(),
                    name: option.name.clone(),
                })
                .ok_or(ValidationError::LevelNotSelected(level)),
            LevelMode::Unselected => Err(ValidationError::LevelNotSelected(level)),
        }
    }
}
