//! Gender variants
//!
//! A line with a female form is exported twice: under key `K` and under
//! `K.F`. Pairs are matched by their context key and compared word by word.

use crate::dom::document::Document;
use crate::dom::unit::UnitKey;
use serde::Serialize;
use std::collections::HashMap;

/// Suffix marking the female form of a line
pub const FEMALE_SUFFIX: &str = ".F";

/// A base unit and its female form
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GenderVariant {
    pub context_key: String,
    pub base: UnitKey,
    pub variant: UnitKey,
    /// Words of the variant's target that the base target does not have
    pub added_words: Vec<String>,
}

/// Pairs in `file`, in the document order of their base unit
pub fn gender_variants(document: &Document, file: usize) -> Vec<GenderVariant> {
    let Some(block) = document.file(file) else {
        return Vec::new();
    };

    let by_key: HashMap<&str, usize> = block
        .units()
        .iter()
        .enumerate()
        .filter_map(|(i, u)| u.context().key.as_deref().map(|k| (k, i)))
        .collect();

    let target_text = |i: usize| {
        block.units()[i]
            .target()
            .map(|t| t.plain_text())
            .unwrap_or_default()
    };

    let mut pairs: Vec<(usize, GenderVariant)> = by_key
        .iter()
        .filter(|(key, _)| !key.ends_with(FEMALE_SUFFIX))
        .filter_map(|(key, &base)| {
            let variant = *by_key.get(format!("{}{}", key, FEMALE_SUFFIX).as_str())?;
            Some((
                base,
                GenderVariant {
                    context_key: key.to_string(),
                    base: UnitKey::new(file, block.units()[base].id()),
                    variant: UnitKey::new(file, block.units()[variant].id()),
                    added_words: added_words(&target_text(base), &target_text(variant)),
                },
            ))
        })
        .collect();

    pairs.sort_by_key(|(base, _)| *base);
    pairs.into_iter().map(|(_, pair)| pair).collect()
}

/// Words of `changed` outside the longest common word subsequence of the
/// two texts
pub fn added_words(original: &str, changed: &str) -> Vec<String> {
    if original == changed {
        return Vec::new();
    }

    let a: Vec<&str> = original.split_whitespace().collect();
    let b: Vec<&str> = changed.split_whitespace().collect();

    // lcs[i][j] = LCS length of a[i..] and b[j..]
    let mut lcs = vec![vec![0usize; b.len() + 1]; a.len() + 1];
    for i in (0..a.len()).rev() {
        for j in (0..b.len()).rev() {
            lcs[i][j] = if a[i] == b[j] {
                lcs[i + 1][j + 1] + 1
            } else {
                lcs[i + 1][j].max(lcs[i][j + 1])
            };
        }
    }

    let mut added = Vec::new();
    let (mut i, mut j) = (0, 0);
    while j < b.len() {
        if i < a.len() && a[i] == b[j] {
            i += 1;
            j += 1;
        } else if i < a.len() && lcs[i + 1][j] >= lcs[i][j + 1] {
            i += 1;
        } else {
            added.push(b[j].to_string());
            j += 1;
        }
    }
    added
}
