//! Translation units
//!
//! A unit owns its current segments and state plus the spans it was parsed
//! from. Clean units are written back by copying those spans; dirty units are
//! rebuilt from the records kept here.

use super::segment::Segment;
use super::state::{StateHints, UnitState};
use crate::core::span::Span;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Address of a unit: ids are only unique inside one `file` block
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitKey {
    pub file: usize,
    pub id: String,
}

impl UnitKey {
    pub fn new(file: usize, id: impl Into<String>) -> Self {
        UnitKey { file, id: id.into() }
    }
}

impl fmt::Display for UnitKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.id)
    }
}

/// Key and key note from `context-group` elements
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UnitContext {
    pub key: Option<String>,
    pub key_note: Option<String>,
}

impl UnitContext {
    /// Fill fields that are still missing from `outer`
    pub fn inherit(&mut self, outer: &UnitContext) {
        if self.key.is_none() {
            self.key = outer.key.clone();
        }
        if self.key_note.is_none() {
            self.key_note = outer.key_note.clone();
        }
    }
}

/// An attribute the serializer may need to rewrite
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttributeRecord {
    /// Value as written
    pub raw: String,
    pub value_span: Span,
}

/// Where a child element sits in the document text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElementRecord {
    /// Qualified name as written
    pub qname: String,
    /// Whole element
    pub span: Span,
    /// Start tag only (the whole element when `empty`)
    pub start_tag: Span,
    /// Written as `<name/>`
    pub empty: bool,
}

/// Layout of a unit's content, in document order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitPart {
    /// Whitespace, comments and elements copied as-is
    Verbatim(Span),
    Source,
    /// The target element, or where one is inserted
    Target,
}

/// A previous target/state pair kept for undo
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Revision {
    pub target: Option<Arc<Segment>>,
    pub state: UnitState,
}

/// One translation unit
#[derive(Debug, Clone)]
pub struct TranslationUnit {
    pub(crate) id: String,
    pub(crate) state: UnitState,
    pub(crate) source: Arc<Segment>,
    pub(crate) target: Option<Arc<Segment>>,
    pub(crate) dirty: bool,
    pub(crate) note: Option<String>,
    pub(crate) context: UnitContext,
    /// Innermost enclosing group
    pub(crate) group: Option<usize>,

    // Values as loaded
    pub(crate) original_state: UnitState,
    pub(crate) original_target: Option<Arc<Segment>>,

    // Layout records
    pub(crate) span: Span,
    pub(crate) start_tag: Span,
    pub(crate) end_tag: Span,
    /// Offset where a new attribute can be inserted
    pub(crate) attribute_insert_at: usize,
    /// Quote character of the first attribute
    pub(crate) quote: char,
    pub(crate) state_attr: Option<AttributeRecord>,
    pub(crate) locked_attr: Option<AttributeRecord>,
    pub(crate) confirmed_attr: Option<AttributeRecord>,
    pub(crate) parts: Vec<UnitPart>,
    pub(crate) source_element: ElementRecord,
    pub(crate) target_element: Option<ElementRecord>,
    /// Whitespace before `<source>`, reused for an inserted target
    pub(crate) indent: Span,
    pub(crate) opaque_attributes: Vec<Span>,
    pub(crate) opaque_elements: Vec<Span>,
}

impl TranslationUnit {
    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn state(&self) -> UnitState {
        self.state
    }

    pub fn source(&self) -> &Arc<Segment> {
        &self.source
    }

    pub fn target(&self) -> Option<&Arc<Segment>> {
        self.target.as_ref()
    }

    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }

    pub fn context(&self) -> &UnitContext {
        &self.context
    }

    /// Mutated since load
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Has a non-empty target
    pub fn has_translation(&self) -> bool {
        self.target.as_ref().is_some_and(|t| !t.is_empty())
    }

    /// Span of the whole `trans-unit` element
    pub fn span(&self) -> Span {
        self.span
    }

    /// Whether the current content differs from what was loaded
    pub(crate) fn needs_render(&self) -> bool {
        self.dirty && (self.state != self.original_state || self.target_changed())
    }

    pub(crate) fn target_changed(&self) -> bool {
        self.target != self.original_target
    }

    /// Vendor hints as loaded
    pub(crate) fn hints(&self) -> StateHints {
        use super::state::parse_flag;
        StateHints {
            locked: self.locked_attr.as_ref().and_then(|a| parse_flag(&a.raw)),
            confirmed: self.confirmed_attr.as_ref().and_then(|a| parse_flag(&a.raw)),
        }
    }

    pub(crate) fn revision(&self) -> Revision {
        Revision {
            target: self.target.clone(),
            state: self.state,
        }
    }

    pub(crate) fn summary(&self, file: usize) -> UnitSummary {
        UnitSummary {
            key: UnitKey::new(file, self.id.clone()),
            state: self.state,
            has_translation: self.has_translation(),
            dirty: self.dirty,
            context_key: self.context.key.clone(),
        }
    }
}

/// Read-only view of a unit for listings
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitSummary {
    pub key: UnitKey,
    pub state: UnitState,
    pub has_translation: bool,
    pub dirty: bool,
    pub context_key: Option<String>,
}

impl UnitSummary {
    pub fn id(&self) -> &str {
        &self.key.id
    }
}

/// Source and target of a unit
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SegmentPair {
    pub source: Arc<Segment>,
    pub target: Option<Arc<Segment>>,
}

/// Unrecognised attributes and child elements of a unit, as raw text
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UnitMetadata {
    pub attributes: Vec<String>,
    pub elements: Vec<String>,
}
