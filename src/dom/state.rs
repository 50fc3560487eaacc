//! Translation unit workflow state
//!
//! The transition graph is a pure function over [`UnitState`] pairs; edit
//! operations consult it and never compare state strings.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Workflow state of a translation unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnitState {
    New,
    Translated,
    Reviewed,
    Confirmed,
    Locked,
}

impl UnitState {
    /// Every state, in workflow order
    pub const ALL: [UnitState; 5] = [
        UnitState::New,
        UnitState::Translated,
        UnitState::Reviewed,
        UnitState::Confirmed,
        UnitState::Locked,
    ];

    /// The value written in the `state` attribute
    pub fn as_str(self) -> &'static str {
        match self {
            UnitState::New => "new",
            UnitState::Translated => "translated",
            UnitState::Reviewed => "reviewed",
            UnitState::Confirmed => "confirmed",
            UnitState::Locked => "locked",
        }
    }

    /// States a locked unit may be unlocked back to
    pub fn is_unlock_target(self) -> bool {
        matches!(self, UnitState::Translated | UnitState::Reviewed | UnitState::Confirmed)
    }
}

impl fmt::Display for UnitState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

/// Unrecognised state value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownState(pub String);

impl fmt::Display for UnknownState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown unit state '{}'", self.0)
    }
}

impl std::error::Error for UnknownState {}

impl FromStr for UnitState {
    type Err = UnknownState;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        UnitState::ALL
            .into_iter()
            .find(|state| state.as_str() == s)
            .ok_or_else(|| UnknownState(s.to_string()))
    }
}

/// Vendor attributes that stand in for an explicit `state`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct StateHints {
    /// `m:locked`
    pub locked: Option<bool>,
    /// `m:confirmed`
    pub confirmed: Option<bool>,
}

impl StateHints {
    /// The state a unit has when no `state` attribute is written
    pub fn derive(&self, has_translation: bool) -> UnitState {
        if self.locked == Some(true) {
            UnitState::Locked
        } else if self.confirmed == Some(true) {
            UnitState::Confirmed
        } else if has_translation {
            UnitState::Translated
        } else {
            UnitState::New
        }
    }

    /// Hints rewritten to express `state`. Only hints that were present
    /// are kept; the caller writes them back in their original spelling.
    pub fn expressing(&self, state: UnitState) -> StateHints {
        match state {
            UnitState::Locked => StateHints {
                locked: self.locked.map(|_| true),
                confirmed: self.confirmed,
            },
            other => StateHints {
                locked: self.locked.map(|_| false),
                confirmed: self.confirmed.map(|_| other == UnitState::Confirmed),
            },
        }
    }
}

/// Read a vendor boolean such as `m:confirmed="1"` or `m:locked="true"`
pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" | "" => Some(false),
        _ => None,
    }
}

/// Write a vendor boolean in the same vocabulary as `original`
pub fn format_flag(original: &str, value: bool) -> &'static str {
    match (original.trim(), value) {
        ("true" | "false", true) => "true",
        ("true" | "false", false) => "false",
        ("yes" | "no", true) => "yes",
        ("yes" | "no", false) => "no",
        (_, true) => "1",
        (_, false) => "0",
    }
}

/// Whether `set_state` may move a unit from `from` to `to`.
///
/// Locked has no outgoing edges here; leaving it goes through
/// [`check_unlock`].
pub fn is_allowed(from: UnitState, to: UnitState) -> bool {
    use UnitState::*;

    matches!(
        (from, to),
        (New, Translated)
            | (Translated, Reviewed)
            | (Reviewed, Confirmed)
            | (Translated | Reviewed | Confirmed, Locked)
            | (Confirmed | Reviewed, Translated)
    )
}

/// Whether an unlock from `current` back to `prior` is valid
pub fn check_unlock(current: UnitState, prior: UnitState) -> bool {
    current == UnitState::Locked && prior.is_unlock_target()
}

/// The state a unit ends up in after its target text is replaced, or
/// `None` when the edit must be refused because the unit is locked.
pub fn after_target_edit(current: UnitState, target_is_empty: bool) -> Option<UnitState> {
    match current {
        UnitState::Locked => None,
        UnitState::Reviewed | UnitState::Confirmed => Some(UnitState::Translated),
        UnitState::New if !target_is_empty => Some(UnitState::Translated),
        other => Some(other),
    }
}
