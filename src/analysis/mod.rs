//! Review helpers
//!
//! Read-only reports over a loaded document: note metadata, dialogue order,
//! length expansion and gender variants.

pub mod length;
pub mod notes;
pub mod variants;

pub use length::{length_report, significant_expansions, LengthReport};
pub use notes::{main_key, NoteFields};
pub use variants::{gender_variants, GenderVariant};

use crate::dom::document::Document;
use crate::dom::state::UnitState;
use crate::dom::unit::UnitKey;
use serde::Serialize;
use std::collections::BTreeMap;

/// Note fields of a unit, read from its own note or else its key note
pub fn note_fields(document: &Document, key: &UnitKey) -> Option<NoteFields> {
    let unit = document.unit(key)?;
    let text = unit.note().or(unit.context().key_note.as_deref())?;
    Some(NoteFields::parse(text))
}

/// Units of a file sorted by their note's `Order:` value. Units without one
/// go last; ties keep document order.
pub fn dialogue_order(document: &Document, file: usize) -> Vec<UnitKey> {
    let mut keyed: Vec<(u32, UnitKey)> = document
        .list_units(file)
        .into_iter()
        .map(|summary| {
            let order = note_fields(document, &summary.key).map_or(notes::DEFAULT_ORDER, |f| f.order);
            (order, summary.key)
        })
        .collect();
    keyed.sort_by_key(|(order, _)| *order);
    keyed.into_iter().map(|(_, key)| key).collect()
}

/// Unit counts per state across all files
pub fn state_counts(document: &Document) -> BTreeMap<UnitState, usize> {
    let mut counts = BTreeMap::new();
    for file in 0..document.file_count() {
        for unit in document.list_units(file) {
            *counts.entry(unit.state).or_insert(0) += 1;
        }
    }
    counts
}

/// Summary printed by `mxliff stats`
#[derive(Debug, Clone, Serialize)]
pub struct Stats {
    pub units: usize,
    pub states: BTreeMap<UnitState, usize>,
    pub expansions: Vec<LengthReport>,
    pub variants: Vec<GenderVariant>,
}

impl Stats {
    pub fn collect(document: &Document) -> Self {
        let files = 0..document.file_count();
        Stats {
            units: document.unit_count(),
            states: state_counts(document),
            expansions: files.clone().flat_map(|f| significant_expansions(document, f)).collect(),
            variants: files.flat_map(|f| gender_variants(document, f)).collect(),
        }
    }
}
