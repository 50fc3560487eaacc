//! Target length against source length

use crate::dom::document::Document;
use crate::dom::unit::UnitKey;
use serde::Serialize;
use std::fmt;

/// Character counts of one translated unit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LengthReport {
    pub key: UnitKey,
    pub source_chars: usize,
    pub target_chars: usize,
    /// Percent change of the target over the source
    pub expansion: f64,
}

impl LengthReport {
    pub fn new(key: UnitKey, source: &str, target: &str) -> Self {
        let source_chars = source.chars().count();
        let target_chars = target.chars().count();
        let expansion = if source_chars == 0 {
            0.0
        } else {
            (target_chars as f64 - source_chars as f64) / source_chars as f64 * 100.0
        };
        LengthReport {
            key,
            source_chars,
            target_chars,
            expansion,
        }
    }

    /// Whether the change exceeds `threshold` percent either way
    pub fn is_significant(&self, threshold: f64) -> bool {
        self.expansion.abs() > threshold
    }
}

impl fmt::Display for LengthReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {} chars, source {} chars, ", self.key, self.target_chars, self.source_chars)?;
        let rounded = (self.expansion.abs() + 0.5) as u64;
        if self.expansion.abs() < 1.0 {
            f.write_str("same length as source")
        } else if self.expansion > 0.0 {
            write!(f, "{}% longer than source", rounded)
        } else {
            write!(f, "{}% shorter than source", rounded)
        }
    }
}

/// Reports for every unit of `file` that has a translation, in document
/// order. Tags are not counted.
pub fn length_report(document: &Document, file: usize) -> Vec<LengthReport> {
    let Some(block) = document.file(file) else {
        return Vec::new();
    };

    block
        .units()
        .iter()
        .filter_map(|unit| {
            let target = unit.target().filter(|t| !t.is_empty())?;
            Some(LengthReport::new(
                UnitKey::new(file, unit.id()),
                &unit.source().plain_text(),
                &target.plain_text(),
            ))
        })
        .collect()
}

/// Reports whose expansion exceeds the configured threshold
pub fn significant_expansions(document: &Document, file: usize) -> Vec<LengthReport> {
    let threshold = document.config().expansion_threshold;
    length_report(document, file)
        .into_iter()
        .filter(|r| r.is_significant(threshold))
        .collect()
}
