//! mxliff - round-trip preserving MXLIFF document engine
//!
//! Layers:
//! - core: tokenizer, entities, encodings over the raw text
//! - reader: namespace-resolved pull events
//! - parser: builds the document model in one forward pass
//! - dom: document, units, segments and the state machine
//! - edit: validated mutation with per-unit undo
//! - serializer: span-copy writer, rebuilding only edited units
//! - roundtrip: zero-edit byte comparison
//! - analysis: review reports over notes, lengths and gender variants
//!
//! Unedited content is written back byte for byte: every model node keeps
//! the span it was parsed from.

pub mod analysis;
pub mod config;
pub mod core;
pub mod dom;
pub mod edit;
pub mod error;
pub mod parser;
pub mod reader;
pub mod roundtrip;
pub mod serializer;

pub use config::EngineConfig;
pub use dom::{
    Document, FileInfo, Group, InlineTag, Namespace, Revision, Run, Segment, SegmentPair, TagDiff, TagForm,
    TagKind, TranslationUnit, UnitContext, UnitKey, UnitMetadata, UnitState, UnitSummary,
};
pub use edit::SegmentRole;
pub use error::{Diff, EditError, MalformedXml, ParseError, Position, RoundTripError, StructuralError};
pub use roundtrip::{validate_many, validate_round_trip, validate_with};
pub use serializer::serialize;

// ============================================================================
// Function-style API
// ============================================================================

/// Parse a document with the default configuration
pub fn load(bytes: &[u8]) -> Result<Document, ParseError> {
    Document::load(bytes)
}

/// Unit summaries of one file in document order
pub fn list_units(document: &Document, file: usize) -> Vec<UnitSummary> {
    document.list_units(file)
}

pub fn get_segments(document: &Document, key: &UnitKey) -> Option<SegmentPair> {
    document.get_segments(key)
}

pub fn set_target_segment(document: &mut Document, key: &UnitKey, segment: Segment) -> Result<(), EditError> {
    document.set_target_segment(key, segment)
}

pub fn set_state(document: &mut Document, key: &UnitKey, state: UnitState) -> Result<(), EditError> {
    document.set_state(key, state)
}
