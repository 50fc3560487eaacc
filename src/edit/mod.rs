//! Edit API
//!
//! The only mutation path into a [`Document`]. Every operation validates
//! first and mutates last, so a rejected edit leaves the document exactly as
//! it was. Segments are shared immutably; an edit swaps in a new `Arc`
//! and keeps the old one as the unit's previous revision.

pub mod history;

use crate::dom::document::{Document, FileBlock};
use crate::dom::segment::{Segment, TagDiff};
use crate::dom::state::{self, UnitState};
use crate::dom::unit::{Revision, TranslationUnit, UnitKey};
use crate::error::EditError;
use log::debug;
use std::sync::Arc;

/// Which segment of a unit an edit addresses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentRole {
    Source,
    Target,
}

fn locate<'d>(files: &'d mut [FileBlock], key: &UnitKey) -> Result<&'d mut TranslationUnit, EditError> {
    files
        .get_mut(key.file)
        .and_then(|f| f.unit_mut(&key.id))
        .ok_or_else(|| {
            reject(EditError::UnknownUnit {
                file: key.file,
                unit_id: key.id.clone(),
            })
        })
}

fn reject(error: EditError) -> EditError {
    debug!("edit rejected: {}", error);
    error
}

impl Document {
    /// Replace the target of a unit.
    ///
    /// The new segment must carry the same inline tag identifiers as the
    /// source, in any order, with every split pair complete. Reviewed and
    /// confirmed units drop back to translated; a new unit becomes
    /// translated once it has text.
    pub fn set_target_segment(&mut self, key: &UnitKey, segment: Segment) -> Result<(), EditError> {
        let unit = locate(&mut self.files, key)?;

        if unit.state == UnitState::Locked {
            return Err(reject(EditError::LockedUnit {
                unit_id: key.id.clone(),
            }));
        }

        if let Some(character) = segment.find_invalid_char() {
            return Err(reject(EditError::InvalidCharacter {
                unit_id: key.id.clone(),
                character,
            }));
        }

        if let Some((tag, reason)) = segment.find_malformed_tag() {
            return Err(reject(EditError::MalformedTag {
                unit_id: key.id.clone(),
                tag: tag.name.clone(),
                reason,
            }));
        }

        let diff = TagDiff::between(&unit.source, &segment);
        if !diff.is_clean() {
            return Err(reject(EditError::TagMismatch {
                unit_id: key.id.clone(),
                missing: diff.missing,
                extra: diff.extra,
                unpaired: diff.unpaired,
            }));
        }

        let Some(next_state) = state::after_target_edit(unit.state, segment.is_empty()) else {
            return Err(reject(EditError::LockedUnit {
                unit_id: key.id.clone(),
            }));
        };

        self.history.record(key.clone(), unit.revision());
        unit.target = Some(Arc::new(segment));
        unit.state = next_state;
        unit.dirty = true;
        Ok(())
    }

    /// Move a unit along the workflow graph
    pub fn set_state(&mut self, key: &UnitKey, new_state: UnitState) -> Result<(), EditError> {
        let unit = locate(&mut self.files, key)?;

        if !state::is_allowed(unit.state, new_state) {
            return Err(reject(EditError::InvalidTransition {
                unit_id: key.id.clone(),
                from: unit.state,
                to: new_state,
            }));
        }

        self.history.record(key.clone(), unit.revision());
        unit.state = new_state;
        unit.dirty = true;
        Ok(())
    }

    /// Leave the locked state. The engine does not know which state a unit
    /// was locked from, so the caller names it.
    pub fn unlock(&mut self, key: &UnitKey, prior: UnitState) -> Result<(), EditError> {
        let unit = locate(&mut self.files, key)?;

        if !state::check_unlock(unit.state, prior) {
            return Err(reject(EditError::InvalidTransition {
                unit_id: key.id.clone(),
                from: unit.state,
                to: prior,
            }));
        }

        self.history.record(key.clone(), unit.revision());
        unit.state = prior;
        unit.dirty = true;
        Ok(())
    }

    /// Replace a segment by role. Sources are read-only.
    pub fn set_segment(&mut self, key: &UnitKey, role: SegmentRole, segment: Segment) -> Result<(), EditError> {
        match role {
            SegmentRole::Target => self.set_target_segment(key, segment),
            SegmentRole::Source => {
                locate(&mut self.files, key)?;
                Err(reject(EditError::ReadOnlyViolation {
                    unit_id: key.id.clone(),
                }))
            }
        }
    }

    /// Target and state before the most recent edit of a unit, if still
    /// retained
    pub fn previous_revision(&self, key: &UnitKey) -> Option<Revision> {
        self.history.peek(key).cloned()
    }

    /// Swap a unit's current target and state with its previous revision.
    /// Reverting twice restores the edit. Reverting out of `locked` is an
    /// unlock and must land on a state [`Document::unlock`] would accept.
    pub fn revert(&mut self, key: &UnitKey) -> Result<(), EditError> {
        let unit = locate(&mut self.files, key)?;

        let previous = match self.history.peek(key) {
            None => {
                return Err(reject(EditError::NoRevision {
                    unit_id: key.id.clone(),
                }))
            }
            Some(previous) if unit.state == UnitState::Locked && !state::check_unlock(unit.state, previous.state) => {
                return Err(reject(EditError::InvalidTransition {
                    unit_id: key.id.clone(),
                    from: unit.state,
                    to: previous.state,
                }))
            }
            Some(previous) => previous.clone(),
        };

        self.history.record(key.clone(), unit.revision());
        unit.target = previous.target;
        unit.state = previous.state;
        unit.dirty = true;
        Ok(())
    }
}
