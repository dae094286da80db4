//! Authority registration form
//!
//! The form is a small state machine: personal fields, a role, and one slot
//! per administrative level. Each slot is either unselected, pointing at an
//! option fetched from the store, or holding a manually typed name. Which
//! levels must be filled is a pure function of the role.

mod level;
mod state;
pub mod validation;

pub use level::{
    FetchOutcome, FetchTicket, LevelMode, LevelNotice, LevelSlot, LocationOption, ManualOrigin,
};
pub use state::{FormError, LevelChoice, RegistrationForm, Touched, ValidatedRegistration};
pub use validation::{PasswordStrength, ValidationError};

use serde::{Deserialize, Serialize};
use std::fmt;

/// Authority roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Panchayat Development Officer
    #[default]
    Pdo,
    VillageIncharge,
    /// Taluk Development Officer
    Tdo,
    /// District Development Officer
    Ddo,
}

impl Role {
    pub const ALL: [Role; 4] = [Role::Pdo, Role::VillageIncharge, Role::Tdo, Role::Ddo];

    /// Hierarchy levels this role must supply, outermost first
    pub fn required_levels(self) -> &'static [Level] {
        match self {
            Role::Pdo | Role::VillageIncharge => &LEVEL_ORDER,
            Role::Tdo => &[Level::District, Level::Taluk],
            Role::Ddo => &[Level::District],
        }
    }

    pub fn requires(self, level: Level) -> bool {
        self.required_levels().contains(&level)
    }

    pub fn requires_gram_panchayat_id(self) -> bool {
        matches!(self, Role::Pdo | Role::VillageIncharge)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Pdo => "pdo",
            Role::VillageIncharge => "village_incharge",
            Role::Tdo => "tdo",
            Role::Ddo => "ddo",
        }
    }

    /// Catalog key of the role's display label
    pub fn label_key(&self) -> &'static str {
        match self {
            Role::Pdo => "rolePdo",
            Role::VillageIncharge => "roleVillageIncharge",
            Role::Tdo => "roleTdo",
            Role::Ddo => "roleDdo",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Administrative hierarchy levels, outermost first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    District,
    Taluk,
    Village,
    Panchayat,
}

static LEVEL_ORDER: [Level; 4] = Level::ALL;

impl Level {
    pub const ALL: [Level; 4] = [Level::District, Level::Taluk, Level::Village, Level::Panchayat];

    pub fn index(self) -> usize {
        match self {
            Level::District => 0,
            Level::Taluk => 1,
            Level::Village => 2,
            Level::Panchayat => 3,
        }
    }

    pub fn parent(self) -> Option<Level> {
        match self {
            Level::District => None,
            Level::Taluk => Some(Level::District),
            Level::Village => Some(Level::Taluk),
            Level::Panchayat => Some(Level::Village),
        }
    }

    pub fn child(self) -> Option<Level> {
        match self {
            Level::District => Some(Level::Taluk),
            Level::Taluk => Some(Level::Village),
            Level::Village => Some(Level::Panchayat),
            Level::Panchayat => None,
        }
    }

    /// Every level below this one
    pub fn descendants(self) -> &'static [Level] {
        &LEVEL_ORDER[self.index() + 1..]
    }

    /// Lowercase name, also the catalog key of the field label
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::District => "district",
            Level::Taluk => "taluk",
            Level::Village => "village",
            Level::Panchayat => "panchayat",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Level::District => "District",
            Level::Taluk => "Taluk",
            Level::Village => "Village",
            Level::Panchayat => "Panchayat",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
