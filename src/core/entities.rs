//! XML Entity Decoding and Escaping
//!
//! Handles decoding of XML entities:
//! - Built-in entities: &lt; &gt; &amp; &quot; &apos;
//! - Numeric character references: &#123; &#x7B;
//!
//! Uses Cow for zero-copy when no entities are present. Escaping follows an
//! [`EscapeStyle`] inferred from the loaded document.

use memchr::memchr;
use serde::Serialize;
use std::borrow::Cow;

/// Decode text content, handling entity references
///
/// Returns Borrowed if no entities present (zero-copy), Owned otherwise.
/// Unknown named entities are kept verbatim.
#[inline]
pub fn decode_text(input: &str) -> Cow<'_, str> {
    // Fast path: check if there are any entities using SIMD
    if memchr(b'&', input.as_bytes()).is_none() {
        return Cow::Borrowed(input);
    }
    Cow::Owned(decode_entities(input))
}

/// Decode all entity references in the input
fn decode_entities(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(amp) = memchr(b'&', rest.as_bytes()) {
        result.push_str(&rest[..amp]);
        rest = &rest[amp..];

        match memchr(b';', rest.as_bytes()) {
            Some(semi) => match decode_entity(&rest[1..semi]) {
                Some(c) => {
                    result.push(c);
                    rest = &rest[semi + 1..];
                }
                None => {
                    result.push('&');
                    rest = &rest[1..];
                }
            },
            None => {
                result.push('&');
                rest = &rest[1..];
            }
        }
    }

    result.push_str(rest);
    result
}

/// Decode a single entity (without & and ;)
fn decode_entity(entity: &str) -> Option<char> {
    if let Some(numeric) = entity.strip_prefix('#') {
        return decode_numeric_entity(numeric);
    }

    match entity {
        "lt" => Some('<'),
        "gt" => Some('>'),
        "amp" => Some('&'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => None,
    }
}

/// Decode a numeric character reference, rejecting non-XML characters
fn decode_numeric_entity(entity: &str) -> Option<char> {
    let codepoint = if let Some(hex) = entity.strip_prefix('x') {
        if hex.is_empty() || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        u32::from_str_radix(hex, 16).ok()?
    } else {
        if entity.is_empty() || !entity.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        entity.parse::<u32>().ok()?
    };

    if !is_valid_xml_char(codepoint) {
        return None;
    }
    char::from_u32(codepoint)
}

/// Validate every `&...;` reference in raw text.
///
/// Returns the byte offset of the first bad reference and a reason.
/// Named references other than the five predefined ones are accepted only
/// when `allow_declared` is set (the document has a DOCTYPE that may declare
/// them).
pub fn check_references(input: &str, allow_declared: bool) -> Result<(), (usize, &'static str)> {
    let bytes = input.as_bytes();
    let mut pos = 0;

    while let Some(amp) = memchr(b'&', &bytes[pos..]) {
        let start = pos + amp;
        let Some(semi) = memchr(b';', &bytes[start..]) else {
            return Err((start, "unterminated entity reference"));
        };
        let entity = &input[start + 1..start + semi];

        if let Some(numeric) = entity.strip_prefix('#') {
            if decode_numeric_entity(numeric).is_none() {
                return Err((start, "invalid character reference"));
            }
        } else if entity.is_empty() || !is_reference_name(entity) {
            return Err((start, "malformed entity reference"));
        } else if decode_entity(entity).is_none() && !allow_declared {
            return Err((start, "reference to undeclared entity"));
        }

        pos = start + semi + 1;
    }
    Ok(())
}

fn is_reference_name(name: &str) -> bool {
    let bytes = name.as_bytes();
    super::scanner::is_name_start_char(bytes[0])
        && bytes[1..].iter().all(|b| super::scanner::is_name_char(*b))
}

/// Check if a code point is a valid XML 1.0 Char
/// Char ::= #x9 | #xA | #xD | [#x20-#xD7FF] | [#xE000-#xFFFD] | [#x10000-#x10FFFF]
#[inline]
pub fn is_valid_xml_char(codepoint: u32) -> bool {
    matches!(codepoint,
        0x9 | 0xA | 0xD |
        0x20..=0xD7FF |
        0xE000..=0xFFFD |
        0x10000..=0x10FFFF
    )
}

/// Find the first character of `content` outside the XML 1.0 Char production
pub fn find_invalid_char(content: &str) -> Option<(usize, char)> {
    // Fast path: only control bytes and the U+FFFE/U+FFFF encodings can be invalid
    if content.bytes().all(|b| b >= 0x20 || matches!(b, 0x9 | 0xA | 0xD)) && !content.contains(['\u{FFFE}', '\u{FFFF}']) {
        return None;
    }
    content
        .char_indices()
        .find(|(_, c)| !is_valid_xml_char(*c as u32))
}

/// How an apostrophe is written in text content
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Apostrophe {
    #[default]
    Literal,
    Named,
    Decimal,
}

/// Escaping conventions of a document, reused when re-serializing edits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct EscapeStyle {
    /// Write `>` as `&gt;`
    pub escape_gt: bool,
    /// Write `"` as `&quot;`
    pub escape_quot: bool,
    pub apostrophe: Apostrophe,
}

/// Counts of literal vs escaped forms seen in a document's text content
#[derive(Debug, Clone, Copy, Default)]
pub struct EscapeTally {
    apos_literal: usize,
    apos_named: usize,
    apos_decimal: usize,
    quot_literal: usize,
    quot_named: usize,
    gt_literal: usize,
    gt_named: usize,
}

impl EscapeTally {
    /// Record the forms used in a raw (undecoded) text run
    pub fn record(&mut self, raw: &str) {
        let bytes = raw.as_bytes();
        self.apos_literal += bytes.iter().filter(|b| **b == b'\'').count();
        self.quot_literal += bytes.iter().filter(|b| **b == b'"').count();
        self.gt_literal += bytes.iter().filter(|b| **b == b'>').count();

        if memchr(b'&', bytes).is_some() {
            self.apos_named += raw.matches("&apos;").count();
            self.apos_decimal += raw.matches("&#39;").count() + raw.matches("&#x27;").count();
            self.quot_named += raw.matches("&quot;").count();
            self.gt_named += raw.matches("&gt;").count();
        }
    }

    /// Majority form per character; literal when there is no evidence
    pub fn infer(&self) -> EscapeStyle {
        let apostrophe = if self.apos_named > self.apos_literal && self.apos_named >= self.apos_decimal {
            Apostrophe::Named
        } else if self.apos_decimal > self.apos_literal {
            Apostrophe::Decimal
        } else {
            Apostrophe::Literal
        };

        EscapeStyle {
            escape_gt: self.gt_named > self.gt_literal,
            escape_quot: self.quot_named > self.quot_literal,
            apostrophe,
        }
    }
}

/// Escape text content following a document's style
pub fn escape_text<'a>(input: &'a str, style: &EscapeStyle) -> Cow<'a, str> {
    // Fast path: check if any escaping needed
    if !input.bytes().any(|b| matches!(b, b'<' | b'>' | b'&' | b'"' | b'\'' | b'\r')) {
        return Cow::Borrowed(input);
    }

    let mut result = String::with_capacity(input.len() + 16);
    for c in input.chars() {
        match c {
            '<' => result.push_str("&lt;"),
            '&' => result.push_str("&amp;"),
            // Line-end normalization would turn a literal CR into LF
            '\r' => result.push_str("&#13;"),
            // "]]>" is never allowed literally in content
            '>' if style.escape_gt || result.ends_with("]]") => result.push_str("&gt;"),
            '"' if style.escape_quot => result.push_str("&quot;"),
            '\'' => match style.apostrophe {
                Apostrophe::Literal => result.push('\''),
                Apostrophe::Named => result.push_str("&apos;"),
                Apostrophe::Decimal => result.push_str("&#39;"),
            },
            _ => result.push(c),
        }
    }
    Cow::Owned(result)
}

/// Encode text for use in an attribute value delimited by `quote`
pub fn escape_attribute(input: &str, quote: char) -> Cow<'_, str> {
    if !input.bytes().any(|b| matches!(b, b'<' | b'&' | b'"' | b'\'' | b'\t' | b'\n' | b'\r')) {
        return Cow::Borrowed(input);
    }

    let mut result = String::with_capacity(input.len() + 16);
    for c in input.chars() {
        match c {
            '<' => result.push_str("&lt;"),
            '&' => result.push_str("&amp;"),
            '"' if quote == '"' => result.push_str("&quot;"),
            '\'' if quote == '\'' => result.push_str("&apos;"),
            // Attribute value normalization would turn these into spaces
            '\t' => result.push_str("&#9;"),
            '\n' => result.push_str("&#10;"),
            '\r' => result.push_str("&#13;"),
            _ => result.push(c),
        }
    }
    Cow::Owned(result)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_entities() {
        let result = decode_text("Hello, World!");
        assert!(matches!(result, Cow::Borrowed(_)));
        assert_eq!(result, "Hello, World!");
    }

    #[test]
    fn test_basic_entities() {
        let result = decode_text("&lt;hello&gt; &amp; &quot;world&quot;");
        assert_eq!(result, "<hello> & \"world\"");
    }

    #[test]
    fn test_numeric_references() {
        assert_eq!(decode_text("&#65;&#x42;&#x1F600;"), "AB😀");
    }

    #[test]
    fn test_unknown_entity_kept() {
        assert_eq!(decode_text("&unknown;"), "&unknown;");
    }

    #[test]
    fn test_check_references() {
        assert!(check_references("a &amp; b &#x41;", false).is_ok());
        assert_eq!(check_references("a & b", false), Err((2, "unterminated entity reference")));
        assert_eq!(check_references("&#0;", false), Err((0, "invalid character reference")));
        assert_eq!(check_references("x&#xD800;", false), Err((1, "invalid character reference")));
        assert_eq!(check_references("&nbsp;", false), Err((0, "reference to undeclared entity")));
        assert!(check_references("&nbsp;", true).is_ok());
        assert_eq!(check_references("& ;", false), Err((0, "malformed entity reference")));
    }

    #[test]
    fn test_find_invalid_char() {
        assert_eq!(find_invalid_char("fine\ttext"), None);
        assert_eq!(find_invalid_char("bad\u{1}"), Some((3, '\u{1}')));
    }

    #[test]
    fn test_infer_style_from_tally() {
        let mut tally = EscapeTally::default();
        tally.record("it&apos;s &gt; that&apos;s");
        tally.record("plain \"quoted\"");
        let style = tally.infer();
        assert_eq!(style.apostrophe, Apostrophe::Named);
        assert!(style.escape_gt);
        assert!(!style.escape_quot);
    }

    #[test]
    fn test_infer_defaults_to_literal() {
        let style = EscapeTally::default().infer();
        assert_eq!(style, EscapeStyle::default());
    }

    #[test]
    fn test_escape_text_with_style() {
        let style = EscapeStyle {
            escape_gt: false,
            escape_quot: false,
            apostrophe: Apostrophe::Decimal,
        };
        assert_eq!(escape_text("a < b > c & 'd'", &style), "a &lt; b > c &amp; &#39;d&#39;");
        assert_eq!(escape_text("x]]>y", &style), "x]]&gt;y");
    }

    #[test]
    fn test_escape_text_keeps_carriage_return() {
        assert_eq!(escape_text("a\r\nb", &EscapeStyle::default()), "a&#13;\nb");
    }

    #[test]
    fn test_escape_attribute() {
        assert_eq!(escape_attribute("say \"hi\"", '"'), "say &quot;hi&quot;");
        assert_eq!(escape_attribute("say \"hi\"", '\''), "say \"hi\"");
    }
}
