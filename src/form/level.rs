//! Per-level state of the location cascade

use serde::Serialize;

use super::Level;

/// A selectable entry in a level's dropdown
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocationOption {
    pub id: String,
    pub name: String,
}

impl LocationOption {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

/// Why a level is in manual mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ManualOrigin {
    /// Nothing to pick from: the fetch came back empty, failed, or the parent
    /// was itself typed in. A later non-empty fetch leaves manual mode.
    Auto,
    /// The user chose to type the name. Only a new parent selection undoes it.
    User,
}

/// What a level currently holds
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LevelMode {
    Unselected,
    Selected(String),
    Manual { text: String, origin: ManualOrigin },
}

/// User-facing notice attached to a level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum LevelNotice {
    /// Panchayat lookup for the chosen village failed
    NoPanchayatFound,
}

impl LevelNotice {
    /// Catalog key of the notice text
    pub fn message_key(&self) -> &'static str {
        match self {
            LevelNotice::NoPanchayatFound => "noPanchayat",
        }
    }
}

/// Identifies one fetch of a level's options. Completions carrying a stale
/// generation are dropped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchTicket {
    pub level: Level,
    /// Parent selection the fetch was issued for; `None` only for districts
    pub parent_id: Option<String>,
    pub generation: u64,
}

/// Result of applying a fetch completion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchOutcome {
    Applied,
    /// The level moved on (new parent, role switch, newer fetch) before the
    /// completion arrived
    Discarded,
}

/// One level of the cascade
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LevelSlot {
    pub(super) mode: LevelMode,
    pub(super) options: Vec<LocationOption>,
    /// Whether a fetch for the current parent has completed
    pub(super) loaded: bool,
    pub(super) generation: u64,
    pub(super) notice: Option<LevelNotice>,
}

impl Default for LevelSlot {
    fn default() -> Self {
        Self {
            mode: LevelMode::Unselected,
            options: Vec::new(),
            loaded: false,
            generation: 0,
            notice: None,
        }
    }
}

impl LevelSlot {
    pub fn mode(&self) -> &LevelMode {
        &self.mode
    }

    pub fn options(&self) -> &[LocationOption] {
        &self.options
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn notice(&self) -> Option<LevelNotice> {
        self.notice
    }

    pub fn is_manual(&self) -> bool {
        matches!(self.mode, LevelMode::Manual { .. })
    }

    pub fn is_user_manual(&self) -> bool {
        matches!(
            self.mode,
            LevelMode::Manual {
                origin: ManualOrigin::User,
                ..
            }
        )
    }

    pub fn selected_id(&self) -> Option<&str> {
        match &self.mode {
            LevelMode::Selected(id) => Some(id),
            _ => None,
        }
    }

    pub fn manual_text(&self) -> Option<&str> {
        match &self.mode {
            LevelMode::Manual { text, .. } => Some(text),
            _ => None,
        }
    }

    /// The option the current selection points at
    pub fn selected_option(&self) -> Option<&LocationOption> {
        let id = self.selected_id()?;
        self.options.iter().find(|o| o.id == id)
    }

    fn invalidate(&mut self) {
        self.generation += 1;
        self.notice = None;
    }

    /// Parent selection went away: nothing to list, nothing chosen
    pub(super) fn reset(&mut self) {
        self.mode = LevelMode::Unselected;
        self.options.clear();
        self.loaded = false;
        self.invalidate();
    }

    /// Parent was typed in, so this level can only be typed in too.
    /// Text already typed here survives.
    pub(super) fn follow_manual_parent(&mut self) {
        if !self.is_manual() {
            self.mode = LevelMode::Manual {
                text: String::new(),
                origin: ManualOrigin::Auto,
            };
        }
        self.options.clear();
        self.loaded = false;
        self.invalidate();
    }

    /// Issue a fetch ticket, superseding any fetch in flight
    pub(super) fn next_ticket(&mut self, level: Level, parent_id: Option<String>) -> FetchTicket {
        self.generation += 1;
        FetchTicket {
            level,
            parent_id,
            generation: self.generation,
        }
    }

    /// Apply fetched options. An empty list switches to manual entry unless
    /// the level is already manual.
    pub(super) fn apply_options(&mut self, options: Vec<LocationOption>) {
        self.options = options;
        self.loaded = true;
        self.notice = None;

        if self.options.is_empty() {
            if !self.is_manual() {
                self.mode = LevelMode::Manual {
                    text: String::new(),
                    origin: ManualOrigin::Auto,
                };
            }
            return;
        }

        let clear = match &self.mode {
            LevelMode::Manual {
                origin: ManualOrigin::Auto,
                ..
            } => true,
            LevelMode::Selected(id) => !self.options.iter().any(|o| &o.id == id),
            _ => false,
        };
        if clear {
            self.mode = LevelMode::Unselected;
        }
    }

    /// Role switch: clear the choice but keep fetched options. A level whose
    /// fetch came back empty stays in manual mode with blank text.
    pub(super) fn clear_choice(&mut self) {
        self.mode = if self.loaded && self.options.is_empty() {
            LevelMode::Manual {
                text: String::new(),
                origin: ManualOrigin::Auto,
            }
        } else {
            LevelMode::Unselected
        };
        self.notice = None;
    }
}
