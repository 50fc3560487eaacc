//! Error types for the MXLIFF engine
//!
//! Parse-time errors abort a load and carry a source position. Edit-time
//! errors are per call and leave the document untouched.

use crate::dom::state::UnitState;
use serde::Serialize;
use std::fmt;
use std::ops::Range;
use thiserror::Error;

/// A location in the decoded document text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct Position {
    /// Byte offset
    pub offset: usize,
    /// 1-based line
    pub line: usize,
    /// 1-based column, counted in bytes
    pub column: usize,
}

impl Position {
    /// Locate a byte offset inside `input`
    pub fn locate(input: &[u8], offset: usize) -> Self {
        let offset = offset.min(input.len());
        let before = &input[..offset];
        let line = memchr::memchr_iter(b'\n', before).count() + 1;
        let line_start = memchr::memrchr(b'\n', before).map_or(0, |p| p + 1);
        Position {
            offset,
            line,
            column: offset - line_start + 1,
        }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// The input is not well-formed XML
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("malformed XML at {position}: {reason}")]
pub struct MalformedXml {
    pub position: Position,
    pub reason: String,
}

impl MalformedXml {
    pub fn at(input: &[u8], offset: usize, reason: impl Into<String>) -> Self {
        MalformedXml {
            position: Position::locate(input, offset),
            reason: reason.into(),
        }
    }
}

/// The XML is well-formed but does not describe a valid MXLIFF document
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid document at {position}{}: {reason}", unit_suffix(.unit_id))]
pub struct StructuralError {
    /// Offending translation unit, when one is known
    pub unit_id: Option<String>,
    pub position: Position,
    pub reason: String,
}

impl StructuralError {
    pub fn at(
        input: &[u8],
        offset: usize,
        unit_id: Option<&str>,
        reason: impl Into<String>,
    ) -> Self {
        StructuralError {
            unit_id: unit_id.map(str::to_string),
            position: Position::locate(input, offset),
            reason: reason.into(),
        }
    }
}

fn unit_suffix(unit_id: &Option<String>) -> String {
    match unit_id {
        Some(id) => format!(" (trans-unit '{}')", id),
        None => String::new(),
    }
}

/// Any error that aborts a load
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error(transparent)]
    Malformed(#[from] MalformedXml),

    #[error(transparent)]
    Structural(#[from] StructuralError),
}

impl ParseError {
    /// Where the error was detected
    pub fn position(&self) -> Position {
        match self {
            ParseError::Malformed(e) => e.position,
            ParseError::Structural(e) => e.position,
        }
    }
}

/// A rejected edit. The document is unchanged when one of these is returned.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EditError {
    /// The new target does not carry the source's inline tags
    #[error(
        "inline tags of trans-unit '{unit_id}' do not match the source \
         (missing: [{}], extra: [{}], unpaired: [{}])",
        .missing.join(", "), .extra.join(", "), .unpaired.join(", ")
    )]
    TagMismatch {
        unit_id: String,
        missing: Vec<String>,
        extra: Vec<String>,
        unpaired: Vec<String>,
    },

    #[error("trans-unit '{unit_id}' is locked")]
    LockedUnit { unit_id: String },

    #[error("trans-unit '{unit_id}' cannot move from {from} to {to}")]
    InvalidTransition {
        unit_id: String,
        from: UnitState,
        to: UnitState,
    },

    #[error("the source segment of trans-unit '{unit_id}' is read-only")]
    ReadOnlyViolation { unit_id: String },

    #[error("no trans-unit '{unit_id}' in file {file}")]
    UnknownUnit { file: usize, unit_id: String },

    #[error("character U+{:04X} cannot appear in XML text (trans-unit '{unit_id}')", u32::from(*.character))]
    InvalidCharacter { unit_id: String, character: char },

    /// An inline tag that would not serialize as well-formed XML
    #[error("inline tag <{tag}> in trans-unit '{unit_id}' cannot be written: {reason}")]
    MalformedTag {
        unit_id: String,
        tag: String,
        reason: String,
    },

    #[error("trans-unit '{unit_id}' has no previous revision")]
    NoRevision { unit_id: String },
}

/// One differing byte range found by the round-trip validator
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diff {
    /// Range in the original input
    pub expected_range: Range<usize>,
    /// Range in the serialized output
    pub actual_range: Range<usize>,
    pub expected: Vec<u8>,
    pub actual: Vec<u8>,
}

impl fmt::Display for Diff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "bytes {}..{}: expected {:?}, got {:?}",
            self.expected_range.start,
            self.expected_range.end,
            String::from_utf8_lossy(&self.expected),
            String::from_utf8_lossy(&self.actual)
        )
    }
}

/// Failure of a zero-edit parse/serialize cycle
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RoundTripError {
    #[error("document does not load: {0}")]
    Parse(#[from] ParseError),

    #[error("serialized output diverges from input in {} place(s)", .0.len())]
    Diverged(Vec<Diff>),
}

impl RoundTripError {
    /// The differing ranges, empty when the input failed to parse
    pub fn diffs(&self) -> &[Diff] {
        match self {
            RoundTripError::Parse(_) => &[],
            RoundTripError::Diverged(diffs) => diffs,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_locate_first_line() {
        let pos = Position::locate(b"<a>hello</a>", 3);
        assert_eq!(pos, Position { offset: 3, line: 1, column: 4 });
    }

    #[test]
    fn test_locate_after_newlines() {
        let pos = Position::locate(b"<a>\n  <b/>\n</a>", 6);
        assert_eq!(pos.line, 2);
        assert_eq!(pos.column, 3);
    }

    #[test]
    fn test_locate_clamps_offset() {
        let pos = Position::locate(b"abc", 99);
        assert_eq!(pos.offset, 3);
    }

    #[test]
    fn test_tag_mismatch_message() {
        let err = EditError::TagMismatch {
            unit_id: "u1".into(),
            missing: vec!["1".into()],
            extra: vec![],
            unpaired: vec![],
        };
        assert!(err.to_string().contains("missing: [1]"));
    }
}
