//! Segments and inline tags
//!
//! A segment is an ordered list of runs, each either plain text or an inline
//! tag. Tags are tracked by shape and identifier only; their rendering
//! semantics are never interpreted.

use crate::core::entities::is_valid_xml_char;
use crate::core::scanner::Scanner;
use crate::core::tokenizer::{TokenKind, Tokenizer};
use serde::Serialize;
use std::collections::{HashMap, HashSet};
use std::fmt;

/// Pairing role of an inline tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TagKind {
    /// Opens a span (`<g>`, `<bx/>`, `<bpt>`)
    Open,
    /// Closes a span (`</g>`, `<ex/>`, `<ept>`)
    Close,
    /// Stands alone (`<x/>`, `<ph>`, `<it>`)
    Placeholder,
}

/// How an inline tag is written
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TagForm {
    /// `<name ...>`, closed later by an [`TagForm::End`] run
    Start,
    /// `</name>`
    End,
    /// `<name .../>`
    Empty,
    /// `<name ...>raw</name>` where the raw inner markup is kept verbatim
    Native(String),
}

/// An inline tag inside a segment
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct InlineTag {
    /// Element name as written, including any prefix
    pub name: String,
    pub kind: TagKind,
    pub form: TagForm,
    /// Tag identifier (`id`, or `mid` for `mrk`)
    pub id: Option<String>,
    /// Original attributes in order, values decoded
    pub attributes: Vec<(String, String)>,
}

impl InlineTag {
    /// Create a tag with no attributes
    pub fn new(name: impl Into<String>, kind: TagKind, form: TagForm) -> Self {
        InlineTag {
            name: name.into(),
            kind,
            form,
            id: None,
            attributes: Vec::new(),
        }
    }

    /// Set the identifier, also writing it as the `id` attribute
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        let id = id.into();
        if self.form != TagForm::End {
            let attr = if self.local_name() == "mrk" { "mid" } else { "id" };
            self.set_attribute(attr, &id);
        }
        self.id = Some(id);
        self
    }

    /// Add or replace an attribute
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_attribute(&name.into(), &value.into());
        self
    }

    fn set_attribute(&mut self, name: &str, value: &str) {
        match self.attributes.iter_mut().find(|(n, _)| n == name) {
            Some((_, v)) => *v = value.to_string(),
            None => self.attributes.push((name.to_string(), value.to_string())),
        }
    }

    /// `<x id=".."/>` style placeholder
    pub fn placeholder(name: impl Into<String>, id: impl Into<String>) -> Self {
        InlineTag::new(name, TagKind::Placeholder, TagForm::Empty).with_id(id)
    }

    /// Opening half of a structural pair such as `<g id="..">`
    pub fn start(name: impl Into<String>, id: impl Into<String>) -> Self {
        InlineTag::new(name, TagKind::Open, TagForm::Start).with_id(id)
    }

    /// Closing half of a structural pair such as `</g>`
    pub fn end(name: impl Into<String>, id: impl Into<String>) -> Self {
        InlineTag::new(name, TagKind::Close, TagForm::End).with_id(id)
    }

    /// Native-code tag (`bpt`, `ept`, `ph`, `it`) carrying raw inner markup
    pub fn native(
        name: impl Into<String>,
        kind: TagKind,
        id: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        InlineTag::new(name, kind, TagForm::Native(content.into())).with_id(id)
    }

    /// Name without prefix
    pub fn local_name(&self) -> &str {
        self.name.rsplit(':').next().unwrap_or(&self.name)
    }

    /// Value of an attribute
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    /// Identifier used when comparing tag sets. Falls back to the element
    /// name for tags written without one.
    pub fn identifier(&self) -> &str {
        self.id.as_deref().unwrap_or(&self.name)
    }

    /// Key matching begin/end halves written as separate elements
    fn pair_key(&self) -> &str {
        self.attribute("rid").unwrap_or_else(|| self.identifier())
    }

    /// Why this tag cannot be written as XML, if it cannot. Names must be
    /// XML names and native content must be well-formed element content.
    pub fn markup_error(&self) -> Option<String> {
        if !is_xml_name(&self.name) {
            return Some(format!("'{}' is not an XML name", self.name));
        }

        let mut seen = HashSet::new();
        for (key, _) in &self.attributes {
            if !is_xml_name(key) {
                return Some(format!("attribute '{}' is not an XML name", key));
            }
            if !seen.insert(key.as_str()) {
                return Some(format!("duplicate attribute '{}'", key));
            }
        }

        if let TagForm::Native(raw) = &self.form {
            let wrapped = format!("<native>{}</native>", raw);
            let mut tokenizer = Tokenizer::new(&wrapped);
            loop {
                match tokenizer.next_token() {
                    Ok(token) if token.kind == TokenKind::Eof => break,
                    Ok(_) => {}
                    Err(err) => return Some(format!("content of <{}> is not well-formed: {}", self.name, err.reason)),
                }
            }
        }
        None
    }

    /// Whether this tag takes part in the identifier multiset. Structural
    /// end tags repeat their start tag and are not counted.
    pub fn is_counted(&self) -> bool {
        self.form != TagForm::End
    }
}

fn is_xml_name(name: &str) -> bool {
    let mut scanner = Scanner::new(name);
    scanner.read_name().is_some_and(|read| read.len() == name.len())
}

/// One run of segment content
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Run {
    Text(String),
    Tag(InlineTag),
}

/// Ordered run content of a `source` or `target` element
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(transparent)]
pub struct Segment {
    runs: Vec<Run>,
}

impl Segment {
    /// Build a segment, merging adjacent text runs and dropping empty ones
    pub fn new(runs: impl IntoIterator<Item = Run>) -> Self {
        let mut merged: Vec<Run> = Vec::new();
        for run in runs {
            match run {
                Run::Text(text) if text.is_empty() => {}
                Run::Text(text) => match merged.last_mut() {
                    Some(Run::Text(prev)) => prev.push_str(&text),
                    _ => merged.push(Run::Text(text)),
                },
                tag => merged.push(tag),
            }
        }
        Segment { runs: merged }
    }

    /// A segment of plain text only
    pub fn text(text: impl Into<String>) -> Self {
        Segment::new([Run::Text(text.into())])
    }

    pub fn runs(&self) -> &[Run] {
        &self.runs
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }

    /// Text content with tags removed
    pub fn plain_text(&self) -> String {
        self.runs
            .iter()
            .filter_map(|run| match run {
                Run::Text(text) => Some(text.as_str()),
                Run::Tag(_) => None,
            })
            .collect()
    }

    /// Inline tags in order
    pub fn tags(&self) -> impl Iterator<Item = &InlineTag> {
        self.runs.iter().filter_map(|run| match run {
            Run::Tag(tag) => Some(tag),
            Run::Text(_) => None,
        })
    }

    /// Identifiers of the counted tags, in order
    pub fn tag_ids(&self) -> Vec<String> {
        self.tags()
            .filter(|tag| tag.is_counted())
            .map(|tag| tag.identifier().to_string())
            .collect()
    }

    /// Identifiers of tags that are not correctly paired: structural tags
    /// must nest, and split begin/end tags must match by `rid` or `id`.
    pub fn check_pairing(&self) -> Vec<String> {
        let mut unpaired = Vec::new();
        let mut structural: Vec<&InlineTag> = Vec::new();
        let mut split: Vec<&InlineTag> = Vec::new();

        for tag in self.tags() {
            match (&tag.form, tag.kind) {
                (TagForm::Start, _) => structural.push(tag),
                (TagForm::End, _) => match structural.last() {
                    Some(open) if open.name == tag.name => {
                        structural.pop();
                    }
                    _ => unpaired.push(tag.identifier().to_string()),
                },
                (_, TagKind::Open) => split.push(tag),
                (_, TagKind::Close) => {
                    match split.iter().position(|open| open.pair_key() == tag.pair_key()) {
                        Some(index) => {
                            split.remove(index);
                        }
                        None => unpaired.push(tag.identifier().to_string()),
                    }
                }
                (_, TagKind::Placeholder) => {}
            }
        }

        unpaired.extend(structural.iter().map(|tag| tag.identifier().to_string()));
        unpaired.extend(split.iter().map(|tag| tag.identifier().to_string()));
        unpaired
    }

    /// First character that cannot be written as XML text
    pub fn find_invalid_char(&self) -> Option<char> {
        let invalid = |s: &str| s.chars().find(|c| !is_valid_xml_char(*c as u32));
        self.runs.iter().find_map(|run| match run {
            Run::Text(text) => invalid(text),
            Run::Tag(tag) => tag
                .attributes
                .iter()
                .find_map(|(_, v)| invalid(v))
                .or_else(|| match &tag.form {
                    TagForm::Native(raw) => invalid(raw),
                    _ => None,
                }),
        })
    }

    /// First inline tag that cannot be written as XML, with the reason
    pub fn find_malformed_tag(&self) -> Option<(&InlineTag, String)> {
        self.tags().find_map(|tag| tag.markup_error().map(|reason| (tag, reason)))
    }

    /// Build a segment from text written with `{id}`, `{id>` and `<id}`
    /// markers, copying the matching tags from `source`. Markers that do not
    /// name a source tag stay as text.
    pub fn from_markers(text: &str, source: &Segment) -> Segment {
        let mut by_marker: HashMap<String, &InlineTag> = HashMap::new();
        for tag in source.tags() {
            let marker = match tag.kind {
                TagKind::Open => format!("{{{}>", tag.identifier()),
                TagKind::Close => format!("<{}}}", tag.identifier()),
                TagKind::Placeholder => format!("{{{}}}", tag.identifier()),
            };
            by_marker.entry(marker).or_insert(tag);
        }

        let mut runs = Vec::new();
        let mut rest = text;
        while let Some(open) = rest.find(['{', '<']) {
            let candidate = rest[open..]
                .char_indices()
                .skip(1)
                .find(|(_, c)| matches!(c, '}' | '>' | '{' | '<'))
                .map(|(i, c)| &rest[open..open + i + c.len_utf8()]);

            match candidate.and_then(|marker| by_marker.get(marker).map(|tag| (marker, tag))) {
                Some((marker, tag)) => {
                    runs.push(Run::Text(rest[..open].to_string()));
                    runs.push(Run::Tag((*tag).clone()));
                    rest = &rest[open + marker.len()..];
                }
                None => {
                    let next = open + rest[open..].chars().next().map_or(1, char::len_utf8);
                    runs.push(Run::Text(rest[..next].to_string()));
                    rest = &rest[next..];
                }
            }
        }
        runs.push(Run::Text(rest.to_string()));
        Segment::new(runs)
    }
}

impl From<&str> for Segment {
    fn from(text: &str) -> Self {
        Segment::text(text)
    }
}

/// Writes text with Memsource-style `{1>`, `<1}` and `{1}` tag markers
impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for run in &self.runs {
            match run {
                Run::Text(text) => f.write_str(text)?,
                Run::Tag(tag) => match tag.kind {
                    TagKind::Open => write!(f, "{{{}>", tag.identifier())?,
                    TagKind::Close => write!(f, "<{}}}", tag.identifier())?,
                    TagKind::Placeholder => write!(f, "{{{}}}", tag.identifier())?,
                },
            }
        }
        Ok(())
    }
}

/// Difference between the tag sets of a source and a candidate target
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TagDiff {
    pub missing: Vec<String>,
    pub extra: Vec<String>,
    pub unpaired: Vec<String>,
}

impl TagDiff {
    /// Compare tag identifier multisets; order is ignored
    pub fn between(source: &Segment, candidate: &Segment) -> Self {
        let mut counts: HashMap<String, isize> = HashMap::new();
        for id in source.tag_ids() {
            *counts.entry(id).or_default() += 1;
        }
        for id in candidate.tag_ids() {
            *counts.entry(id).or_default() -= 1;
        }

        let mut missing = Vec::new();
        let mut extra = Vec::new();
        for (id, count) in counts {
            for _ in 0..count.max(0) {
                missing.push(id.clone());
            }
            for _ in 0..(-count).max(0) {
                extra.push(id.clone());
            }
        }
        missing.sort();
        extra.sort();

        TagDiff {
            missing,
            extra,
            unpaired: candidate.check_pairing(),
        }
    }

    pub fn is_clean(&self) -> bool {
        self.missing.is_empty() && self.extra.is_empty() && self.unpaired.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bold(text: &str) -> Segment {
        Segment::new([
            Run::Text("Press ".into()),
            Run::Tag(InlineTag::start("g", "1")),
            Run::Text(text.into()),
            Run::Tag(InlineTag::end("g", "1")),
            Run::Tag(InlineTag::placeholder("x", "2")),
        ])
    }

    #[test]
    fn test_new_merges_text() {
        let seg = Segment::new([
            Run::Text("a".into()),
            Run::Text(String::new()),
            Run::Text("b".into()),
        ]);
        assert_eq!(seg.runs(), &[Run::Text("ab".into())]);
        assert!(Segment::text("").is_empty());
    }

    #[test]
    fn test_plain_text_and_ids() {
        let seg = bold("OK");
        assert_eq!(seg.plain_text(), "Press OK");
        assert_eq!(seg.tag_ids(), vec!["1", "2"]);
        assert!(seg.check_pairing().is_empty());
    }

    #[test]
    fn test_unclosed_structural_tag() {
        let seg = Segment::new([Run::Tag(InlineTag::start("g", "1")), Run::Text("x".into())]);
        assert_eq!(seg.check_pairing(), vec!["1"]);
    }

    #[test]
    fn test_crossed_structural_tags() {
        let seg = Segment::new([
            Run::Tag(InlineTag::start("g", "1")),
            Run::Tag(InlineTag::start("mrk", "2")),
            Run::Tag(InlineTag::end("g", "1")),
            Run::Tag(InlineTag::end("mrk", "2")),
        ]);
        assert_eq!(seg.check_pairing(), vec!["1", "1"]);
    }

    #[test]
    fn test_split_pairs_by_rid() {
        let begin = InlineTag::new("bx", TagKind::Open, TagForm::Empty)
            .with_id("1")
            .with_attribute("rid", "7");
        let end = InlineTag::new("ex", TagKind::Close, TagForm::Empty)
            .with_id("2")
            .with_attribute("rid", "7");
        let seg = Segment::new([Run::Tag(begin.clone()), Run::Tag(end)]);
        assert!(seg.check_pairing().is_empty());

        let lonely = Segment::new([Run::Tag(begin)]);
        assert_eq!(lonely.check_pairing(), vec!["1"]);
    }

    #[test]
    fn test_native_pairs_by_id() {
        let seg = Segment::new([
            Run::Tag(InlineTag::native("bpt", TagKind::Open, "1", "&lt;b&gt;")),
            Run::Text("bold".into()),
            Run::Tag(InlineTag::native("ept", TagKind::Close, "1", "&lt;/b&gt;")),
        ]);
        assert!(seg.check_pairing().is_empty());
        assert_eq!(seg.tag_ids(), vec!["1", "1"]);
    }

    #[test]
    fn test_tag_diff() {
        let source = bold("OK");
        let dropped = Segment::new([Run::Text("Drücken ".into()), Run::Tag(InlineTag::placeholder("x", "2"))]);
        let diff = TagDiff::between(&source, &dropped);
        assert_eq!(diff.missing, vec!["1"]);
        assert!(diff.extra.is_empty());
        assert!(!diff.is_clean());

        let reordered = Segment::new([
            Run::Tag(InlineTag::placeholder("x", "2")),
            Run::Tag(InlineTag::start("g", "1")),
            Run::Text("OK".into()),
            Run::Tag(InlineTag::end("g", "1")),
        ]);
        assert!(TagDiff::between(&source, &reordered).is_clean());
    }

    #[test]
    fn test_display_markers() {
        assert_eq!(bold("OK").to_string(), "Press {1>OK<1}{2}");
    }

    #[test]
    fn test_from_markers() {
        let source = bold("OK");
        let target = Segment::from_markers("Drücke {1>OK<1}{2} {9}", &source);
        assert!(TagDiff::between(&source, &target).is_clean());
        assert_eq!(target.plain_text(), "Drücke OK {9}");
    }

    #[test]
    fn test_invalid_char() {
        assert_eq!(Segment::text("ok\u{0}").find_invalid_char(), Some('\u{0}'));
        assert_eq!(bold("fine").find_invalid_char(), None);
    }

    #[test]
    fn test_markup_errors() {
        assert_eq!(bold("fine").find_malformed_tag(), None);

        let broken_native = InlineTag::native("ph", TagKind::Placeholder, "1", "<br/");
        assert!(broken_native.markup_error().unwrap().contains("not well-formed"));
        let escaped_native = InlineTag::native("ph", TagKind::Placeholder, "1", "&lt;br/&gt;<sub>x</sub>");
        assert_eq!(escaped_native.markup_error(), None);

        let bad_name = InlineTag::placeholder("ph></target", "1");
        assert!(bad_name.markup_error().unwrap().contains("not an XML name"));
        let bad_attribute = InlineTag::placeholder("x", "1").with_attribute("a b", "v");
        assert!(bad_attribute.markup_error().unwrap().contains("attribute 'a b'"));

        let mut duplicated = InlineTag::placeholder("x", "1");
        duplicated.attributes.push(("id".into(), "2".into()));
        assert!(duplicated.markup_error().unwrap().contains("duplicate"));
    }

    #[test]
    fn test_mrk_uses_mid() {
        let tag = InlineTag::start("mrk", "m1");
        assert_eq!(tag.attribute("mid"), Some("m1"));
        assert_eq!(tag.attribute("id"), None);
    }
}
