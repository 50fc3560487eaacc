//! Element and attribute vocabulary
//!
//! XLIFF 1.2 elements may be written in the 1.2 or 1.1 namespace or in no
//! namespace at all. Memsource hints live in their own namespace.

use crate::reader::events::StartElement;

pub const XLIFF_1_2: &str = "urn:oasis:names:tc:xliff:document:1.2";
pub const XLIFF_1_1: &str = "urn:oasis:names:tc:xliff:document:1.1";
pub const MEMSOURCE: &str = "http://www.memsource.com/mxlf/2.0";

pub const ROOT: &str = "xliff";
pub const FILE: &str = "file";
pub const HEADER: &str = "header";
pub const BODY: &str = "body";
pub const GROUP: &str = "group";
pub const TRANS_UNIT: &str = "trans-unit";
pub const SOURCE: &str = "source";
pub const TARGET: &str = "target";
pub const NOTE: &str = "note";
pub const CONTEXT_GROUP: &str = "context-group";
pub const CONTEXT: &str = "context";

/// `context-type` values carrying the unit key and its note
pub const CONTEXT_KEY: &str = "x-key";
pub const CONTEXT_KEY_NOTE: &str = "x-key-note";

/// Whether a namespace URI counts as XLIFF
pub fn is_xliff_namespace(namespace: Option<&str>) -> bool {
    matches!(namespace, None | Some(XLIFF_1_2) | Some(XLIFF_1_1))
}

/// Whether `element` is the XLIFF element `local`
pub fn is_xliff(element: &StartElement<'_>, local: &str) -> bool {
    element.local_name == local && is_xliff_namespace(element.namespace.as_deref())
}

/// Inline element classes of XLIFF 1.2
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InlineClass {
    /// `g`, `mrk` and unknown elements: written as start and end tags
    Structural,
    /// `bx`
    BeginEmpty,
    /// `ex`
    EndEmpty,
    /// `bpt`
    BeginNative,
    /// `ept`
    EndNative,
    /// `ph`, `it`
    NativePlaceholder,
    /// `x`
    Placeholder,
}

impl InlineClass {
    pub fn of(element: &StartElement<'_>) -> Self {
        if !is_xliff_namespace(element.namespace.as_deref()) {
            return InlineClass::Structural;
        }
        match element.local_name {
            "bx" => InlineClass::BeginEmpty,
            "ex" => InlineClass::EndEmpty,
            "bpt" => InlineClass::BeginNative,
            "ept" => InlineClass::EndNative,
            "ph" | "it" => InlineClass::NativePlaceholder,
            "x" => InlineClass::Placeholder,
            _ => InlineClass::Structural,
        }
    }
}

/// Attribute holding the tag identifier
pub fn id_attribute(local_name: &str) -> &'static str {
    if local_name == "mrk" {
        "mid"
    } else {
        "id"
    }
}
