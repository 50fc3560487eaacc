//! Serializer
//!
//! Copies the loaded text up to each unit that has to be rebuilt, writes
//! that unit from its records, and continues copying after it. A document
//! with no effective edits is written back byte for byte.

pub(crate) mod markup;

use crate::core::encoding;
use crate::dom::document::Document;
use log::debug;

/// Write a document in its original encoding.
///
/// # Panics
///
/// Panics if a rebuilt target holds unpaired inline tags. The edit API
/// never lets such a segment in.
pub fn serialize(document: &Document) -> Vec<u8> {
    let input = document.source.as_str();
    let style = document.escape;
    let mut out = String::with_capacity(input.len() + input.len() / 16);
    let mut cursor = 0usize;
    let mut rebuilt = 0usize;

    for unit in document.files.iter().flat_map(|f| f.units()) {
        if !unit.needs_render() {
            continue;
        }
        out.push_str(&input[cursor..unit.span.start()]);
        markup::write_unit(&mut out, input, unit, &style);
        cursor = unit.span.end();
        rebuilt += 1;
    }
    out.push_str(&input[cursor..]);

    debug!(
        "serialized {} byte(s), {} unit(s) rebuilt",
        out.len(),
        rebuilt
    );
    encoding::encode(&out, document.encoding)
}
