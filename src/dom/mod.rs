//! Document model
//!
//! - Document: owned model of a loaded file, with read accessors
//! - Unit: translation units, their layout records and addressing keys
//! - Segment: run content and inline tags
//! - State: the workflow state machine
//! - Namespace: namespace resolution stack

pub mod document;
pub mod namespace;
pub mod segment;
pub mod state;
pub mod unit;

pub use document::{Document, FileInfo, Group};
pub use namespace::Namespace;
pub use segment::{InlineTag, Run, Segment, TagDiff, TagForm, TagKind};
pub use state::UnitState;
pub use unit::{Revision, SegmentPair, TranslationUnit, UnitContext, UnitKey, UnitMetadata, UnitSummary};
