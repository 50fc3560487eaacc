//! XML Attribute Parsing
//!
//! Parses XML attributes from tag content. Every attribute keeps its raw
//! value and exact spans so an edited start tag can be patched in place.

use super::entities::{check_references, decode_text};
use super::scanner::{is_name_char, is_name_start_char};
use super::span::{is_xml_whitespace, Span};
use memchr::memchr;
use std::borrow::Cow;

/// A parsed XML attribute
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute<'a> {
    /// Attribute name (may include namespace prefix)
    pub name: &'a str,
    /// Value as written, entities not decoded
    pub raw_value: &'a str,
    /// `name="value"` in the document text
    pub span: Span,
    /// The value between the quotes
    pub value_span: Span,
    /// Quote character used
    pub quote: char,
}

impl<'a> Attribute<'a> {
    /// Decoded value
    pub fn value(&self) -> Cow<'a, str> {
        decode_text(self.raw_value)
    }

    /// Namespace prefix (before colon), if any
    pub fn prefix(&self) -> Option<&'a str> {
        split_name(self.name).0
    }

    /// Local name (after colon)
    pub fn local_name(&self) -> &'a str {
        split_name(self.name).1
    }

    /// Namespace declarations: `Some("")` for `xmlns`, `Some(p)` for `xmlns:p`
    pub fn declared_prefix(&self) -> Option<&'a str> {
        if self.name == "xmlns" {
            Some("")
        } else {
            self.name.strip_prefix("xmlns:")
        }
    }
}

/// Split a name into prefix and local name at the colon
pub fn split_name(name: &str) -> (Option<&str>, &str) {
    if let Some(colon_pos) = memchr(b':', name.as_bytes()) {
        (Some(&name[..colon_pos]), &name[colon_pos + 1..])
    } else {
        (None, name)
    }
}

/// Parse attributes from raw tag content.
///
/// `input` is the text between the element name and `>` (or `/>`), and `base`
/// its offset in the document. Errors carry the absolute offset of the
/// problem. `allow_declared` accepts entity names a DOCTYPE may declare.
pub fn parse_attributes(
    input: &str,
    base: usize,
    allow_declared: bool,
) -> Result<Vec<Attribute<'_>>, (usize, &'static str)> {
    let bytes = input.as_bytes();
    let mut attrs: Vec<Attribute<'_>> = Vec::new();
    let mut pos = 0;

    loop {
        let ws_start = pos;
        while pos < bytes.len() && is_xml_whitespace(bytes[pos]) {
            pos += 1;
        }

        if pos >= bytes.len() {
            break;
        }

        if pos == ws_start {
            return Err((base + pos, "attributes must be separated by whitespace"));
        }

        // Parse attribute name
        let name_start = pos;
        if !is_name_start_char(bytes[pos]) {
            return Err((base + pos, "attribute name must start with letter, underscore, or colon"));
        }
        while pos < bytes.len() && is_name_char(bytes[pos]) {
            pos += 1;
        }
        let name = &input[name_start..pos];

        // Skip whitespace around '='
        while pos < bytes.len() && is_xml_whitespace(bytes[pos]) {
            pos += 1;
        }
        if pos >= bytes.len() || bytes[pos] != b'=' {
            return Err((base + pos, "attribute without value"));
        }
        pos += 1;
        while pos < bytes.len() && is_xml_whitespace(bytes[pos]) {
            pos += 1;
        }

        // Parse quoted value
        let quote = match bytes.get(pos) {
            Some(&q @ (b'"' | b'\'')) => q,
            _ => return Err((base + pos, "attribute value must be quoted")),
        };
        pos += 1;
        let value_start = pos;
        let Some(len) = memchr(quote, &bytes[pos..]) else {
            return Err((base + pos, "unterminated attribute value"));
        };
        pos += len;
        let raw_value = &input[value_start..pos];
        pos += 1;

        if let Some(lt) = memchr(b'<', raw_value.as_bytes()) {
            return Err((base + value_start + lt, "'<' not allowed in attribute value"));
        }
        check_references(raw_value, allow_declared)
            .map_err(|(offset, reason)| (base + value_start + offset, reason))?;

        if attrs.iter().any(|a| a.name == name) {
            return Err((base + name_start, "duplicate attribute"));
        }

        attrs.push(Attribute {
            name,
            raw_value,
            span: Span::between(base + name_start, base + pos),
            value_span: Span::between(base + value_start, base + value_start + raw_value.len()),
            quote: quote as char,
        });
    }

    Ok(attrs)
}

/// Find an attribute by its full name
pub fn find<'s, 'a>(attrs: &'s [Attribute<'a>], name: &str) -> Option<&'s Attribute<'a>> {
    attrs.iter().find(|a| a.name == name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_attributes() {
        let attrs = parse_attributes(r#" id="1" state='new'"#, 10, false).unwrap();
        assert_eq!(attrs.len(), 2);
        assert_eq!(attrs[0].name, "id");
        assert_eq!(attrs[0].raw_value, "1");
        assert_eq!(attrs[0].span, Span::between(11, 17));
        assert_eq!(attrs[0].value_span, Span::between(15, 16));
        assert_eq!(attrs[1].quote, '\'');
    }

    #[test]
    fn test_entity_in_value() {
        let attrs = parse_attributes(r#" title="a &amp; b""#, 0, false).unwrap();
        assert_eq!(attrs[0].raw_value, "a &amp; b");
        assert_eq!(attrs[0].value(), "a & b");
    }

    #[test]
    fn test_namespaced_attribute() {
        let attrs = parse_attributes(r#" m:locked="true" xmlns:m="urn:x""#, 0, false).unwrap();
        assert_eq!(attrs[0].prefix(), Some("m"));
        assert_eq!(attrs[0].local_name(), "locked");
        assert_eq!(attrs[1].declared_prefix(), Some("m"));
    }

    #[test]
    fn test_whitespace_around_equals() {
        let attrs = parse_attributes(" id = \"x\"\n", 0, false).unwrap();
        assert_eq!(attrs[0].raw_value, "x");
    }

    #[test]
    fn test_rejects_unquoted() {
        assert_eq!(parse_attributes(" id=1", 0, false).unwrap_err().1, "attribute value must be quoted");
    }

    #[test]
    fn test_rejects_duplicate() {
        let err = parse_attributes(r#" id="1" id="2""#, 0, false).unwrap_err();
        assert_eq!(err, (8, "duplicate attribute"));
    }

    #[test]
    fn test_rejects_lt_in_value() {
        assert!(parse_attributes(r#" a="x<y""#, 0, false).is_err());
    }

    #[test]
    fn test_rejects_missing_separator() {
        assert!(parse_attributes(r#" a="1"b="2""#, 0, false).is_err());
    }

    #[test]
    fn test_rejects_bad_reference() {
        assert!(parse_attributes(r#" a="&#0;""#, 0, false).is_err());
    }
}
