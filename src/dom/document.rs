//! MXLIFF Document - owned model of one loaded file
//!
//! The document owns the decoded input text. Units keep spans into it so
//! untouched regions are written back by copying, and every accessor hands
//! out owned values or shared immutable segments, never live handles.

use super::namespace::Namespace;
use super::state::UnitState;
use super::unit::{SegmentPair, TranslationUnit, UnitContext, UnitKey, UnitMetadata, UnitSummary};
use crate::config::EngineConfig;
use crate::core::encoding::SourceEncoding;
use crate::core::entities::EscapeStyle;
use crate::core::span::Span;
use crate::edit::history::History;
use crate::error::ParseError;
use serde::Serialize;
use std::collections::HashMap;

/// Attributes of a `file` block
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileInfo {
    pub source_language: String,
    pub target_language: Option<String>,
    /// `original` attribute
    pub original: Option<String>,
    pub datatype: Option<String>,
    pub unit_count: usize,
}

/// A `group` element, possibly nested
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Group {
    pub id: Option<String>,
    pub parent: Option<usize>,
    pub context: UnitContext,
}

/// One `file` block
#[derive(Debug)]
pub struct FileBlock {
    pub(crate) info: FileInfo,
    pub(crate) units: Vec<TranslationUnit>,
    pub(crate) groups: Vec<Group>,
    pub(crate) index: HashMap<String, usize>,
    /// The `header` element, kept verbatim
    pub(crate) header: Option<Span>,
    /// Unrecognised children of `file`
    pub(crate) opaque_elements: Vec<Span>,
    pub(crate) span: Span,
}

impl FileBlock {
    pub(crate) fn unit(&self, id: &str) -> Option<&TranslationUnit> {
        self.index.get(id).map(|&i| &self.units[i])
    }

    pub(crate) fn unit_mut(&mut self, id: &str) -> Option<&mut TranslationUnit> {
        match self.index.get(id) {
            Some(&i) => self.units.get_mut(i),
            None => None,
        }
    }

    pub(crate) fn units(&self) -> &[TranslationUnit] {
        &self.units
    }
}

/// A loaded MXLIFF document
#[derive(Debug)]
pub struct Document {
    /// Decoded input text
    pub(crate) source: String,
    pub(crate) encoding: SourceEncoding,
    /// Everything before the root element
    pub(crate) prolog: Span,
    /// Declarations on the root element
    pub(crate) namespaces: Vec<Namespace>,
    pub(crate) files: Vec<FileBlock>,
    pub(crate) escape: EscapeStyle,
    pub(crate) history: History,
    pub(crate) config: EngineConfig,
}

impl Document {
    /// Parse a document with the default configuration
    pub fn load(bytes: &[u8]) -> Result<Document, ParseError> {
        Self::load_with(bytes, &EngineConfig::default())
    }

    /// Parse a document
    pub fn load_with(bytes: &[u8], config: &EngineConfig) -> Result<Document, ParseError> {
        crate::parser::parse_document(bytes, config)
    }

    /// Number of `file` blocks
    pub fn file_count(&self) -> usize {
        self.files.len()
    }

    pub fn file_info(&self, file: usize) -> Option<FileInfo> {
        self.files.get(file).map(|f| f.info.clone())
    }

    /// Summaries of the units of one file in document order. An unknown
    /// file index yields an empty list.
    pub fn list_units(&self, file: usize) -> Vec<UnitSummary> {
        self.files
            .get(file)
            .map(|f| f.units.iter().map(|u| u.summary(file)).collect())
            .unwrap_or_default()
    }

    /// Source and target of a unit
    pub fn get_segments(&self, key: &UnitKey) -> Option<SegmentPair> {
        self.unit(key).map(|u| SegmentPair {
            source: u.source.clone(),
            target: u.target.clone(),
        })
    }

    pub fn state(&self, key: &UnitKey) -> Option<UnitState> {
        self.unit(key).map(|u| u.state)
    }

    pub fn note(&self, key: &UnitKey) -> Option<String> {
        self.unit(key).and_then(|u| u.note.clone())
    }

    /// Context key and key note, including values inherited from groups
    pub fn context(&self, key: &UnitKey) -> Option<UnitContext> {
        self.unit(key).map(|u| u.context.clone())
    }

    /// Unrecognised attributes and elements of a unit
    pub fn unit_metadata(&self, key: &UnitKey) -> Option<UnitMetadata> {
        self.unit(key).map(|u| UnitMetadata {
            attributes: u.opaque_attributes.iter().map(|s| s.slice(&self.source).to_string()).collect(),
            elements: u.opaque_elements.iter().map(|s| s.slice(&self.source).to_string()).collect(),
        })
    }

    /// The `header` element of a file, verbatim
    pub fn file_header(&self, file: usize) -> Option<&str> {
        self.files
            .get(file)
            .and_then(|f| f.header)
            .map(|span| span.slice(&self.source))
    }

    /// Groups of a file in document order
    pub fn groups(&self, file: usize) -> &[Group] {
        self.files.get(file).map(|f| f.groups.as_slice()).unwrap_or(&[])
    }

    /// First unit with this id, in document order
    pub fn find_unit(&self, id: &str) -> Option<UnitKey> {
        self.files
            .iter()
            .position(|f| f.index.contains_key(id))
            .map(|file| UnitKey::new(file, id))
    }

    pub fn namespaces(&self) -> &[Namespace] {
        &self.namespaces
    }

    /// XML declaration, DOCTYPE and anything else before the root, verbatim
    pub fn prolog(&self) -> &str {
        self.prolog.slice(&self.source)
    }

    pub fn encoding(&self) -> SourceEncoding {
        self.encoding
    }

    /// Escaping conventions used for rewritten text
    pub fn escape_style(&self) -> EscapeStyle {
        self.escape
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Units mutated since load
    pub fn dirty_units(&self) -> Vec<UnitKey> {
        self.files
            .iter()
            .enumerate()
            .flat_map(|(file, f)| {
                f.units
                    .iter()
                    .filter(|u| u.dirty)
                    .map(move |u| UnitKey::new(file, u.id.clone()))
            })
            .collect()
    }

    /// Whether there are unsaved changes
    pub fn is_dirty(&self) -> bool {
        self.files.iter().any(|f| f.units.iter().any(|u| u.dirty))
    }

    /// Total number of units across files
    pub fn unit_count(&self) -> usize {
        self.files.iter().map(|f| f.units.len()).sum()
    }

    pub(crate) fn unit(&self, key: &UnitKey) -> Option<&TranslationUnit> {
        self.files.get(key.file).and_then(|f| f.unit(&key.id))
    }

    pub(crate) fn unit_mut(&mut self, key: &UnitKey) -> Option<&mut TranslationUnit> {
        self.files.get_mut(key.file).and_then(|f| f.unit_mut(&key.id))
    }

    pub(crate) fn file(&self, file: usize) -> Option<&FileBlock> {
        self.files.get(file)
    }
}
