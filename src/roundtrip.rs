//! Round-trip Validator
//!
//! Parses a document, writes it back with no edits, and compares the result
//! with the input byte for byte. Batches are validated in parallel with Rayon.

use crate::config::EngineConfig;
use crate::dom::document::Document;
use crate::error::{Diff, RoundTripError};
use crate::serializer::serialize;
use log::{info, warn};
use rayon::prelude::*;

/// Equal bytes needed between two differences before they are reported
/// separately
const MERGE_GAP: usize = 8;

/// Validate with the default configuration
pub fn validate_round_trip(bytes: &[u8]) -> Result<(), RoundTripError> {
    validate_with(bytes, &EngineConfig::default())
}

/// Validate, reporting at most `config.max_diffs` differing ranges
pub fn validate_with(bytes: &[u8], config: &EngineConfig) -> Result<(), RoundTripError> {
    let document = Document::load_with(bytes, config)?;
    let output = serialize(&document);
    if output == bytes {
        return Ok(());
    }

    let diffs = diff_bytes(bytes, &output, config.max_diffs.max(1));
    warn!(
        "round trip diverged in {} place(s), first at byte {}",
        diffs.len(),
        diffs.first().map_or(0, |d| d.expected_range.start)
    );
    Err(RoundTripError::Diverged(diffs))
}

/// Validate many documents in parallel. Results keep the input order.
pub fn validate_many<B>(inputs: &[B], config: &EngineConfig) -> Vec<Result<(), RoundTripError>>
where
    B: AsRef<[u8]> + Sync,
{
    let results: Vec<_> = inputs
        .par_iter()
        .map(|input| validate_with(input.as_ref(), config))
        .collect();

    let failed = results.iter().filter(|r| r.is_err()).count();
    info!("validated {} document(s), {} failed", results.len(), failed);
    results
}

/// First `limit` differing ranges between `expected` and `actual`.
///
/// Equal-length inputs are compared position by position. Otherwise the
/// common prefix and suffix are stripped and the middle is one difference.
pub fn diff_bytes(expected: &[u8], actual: &[u8], limit: usize) -> Vec<Diff> {
    let diff = |e: std::ops::Range<usize>, a: std::ops::Range<usize>| Diff {
        expected: expected[e.clone()].to_vec(),
        actual: actual[a.clone()].to_vec(),
        expected_range: e,
        actual_range: a,
    };

    if expected.len() != actual.len() {
        let prefix = expected.iter().zip(actual).take_while(|(e, a)| e == a).count();
        let max_suffix = expected.len().min(actual.len()) - prefix;
        let suffix = expected
            .iter()
            .rev()
            .zip(actual.iter().rev())
            .take(max_suffix)
            .take_while(|(e, a)| e == a)
            .count();
        return vec![diff(
            prefix..expected.len() - suffix,
            prefix..actual.len() - suffix,
        )];
    }

    let mut ranges: Vec<std::ops::Range<usize>> = Vec::new();
    for (i, _) in expected.iter().zip(actual).enumerate().filter(|(_, (e, a))| e != a) {
        if let Some(last) = ranges.last_mut() {
            if i - last.end < MERGE_GAP {
                last.end = i + 1;
                continue;
            }
        }
        if ranges.len() == limit {
            break;
        }
        ranges.push(i..i + 1);
    }

    ranges.into_iter().map(|r| diff(r.clone(), r)).collect()
}
