//! MXLIFF parser
//!
//! A single forward pass over the reader's events with one event of
//! lookahead. Recognised containers (`xliff`, `file`, `body`, `group`,
//! `trans-unit`) become model nodes; anything else inside them is skipped
//! and remembered by span so it is written back untouched.

pub mod inline;
pub mod names;

use crate::config::EngineConfig;
use crate::core::encoding;
use crate::core::entities::{decode_text, EscapeStyle, EscapeTally};
use crate::core::span::{trailing_whitespace, Span};
use crate::dom::document::{Document, FileBlock, FileInfo, Group};
use crate::dom::namespace::Namespace;
use crate::dom::state::{StateHints, UnitState};
use crate::dom::unit::{AttributeRecord, TranslationUnit, UnitContext, UnitPart};
use crate::edit::history::History;
use crate::error::{MalformedXml, ParseError, StructuralError};
use crate::reader::events::{StartElement, XmlEvent};
use crate::reader::slice::SliceReader;
use log::debug;
use names::*;
use std::collections::HashMap;
use std::sync::Arc;

/// Decode and parse a whole document
pub(crate) fn parse_document(bytes: &[u8], config: &EngineConfig) -> Result<Document, ParseError> {
    let (text, source_encoding) = encoding::decode(bytes)?;
    if text.len() > u32::MAX as usize {
        return Err(MalformedXml::at(bytes, u32::MAX as usize, "document larger than 4 GiB").into());
    }

    let parsed = Parser::new(&text, source_encoding, config).parse()?;

    debug!(
        "loaded {} file(s) with {} unit(s), escape style {:?}",
        parsed.files.len(),
        parsed.files.iter().map(|f| f.units.len()).sum::<usize>(),
        parsed.escape
    );

    Ok(Document {
        source: text,
        encoding: source_encoding,
        prolog: parsed.prolog,
        namespaces: parsed.namespaces,
        files: parsed.files,
        escape: parsed.escape,
        history: History::new(config.history_capacity()),
        config: config.clone(),
    })
}

/// Everything the parser extracts from the text
struct Parsed {
    prolog: Span,
    namespaces: Vec<Namespace>,
    files: Vec<FileBlock>,
    escape: EscapeStyle,
}

struct Parser<'a, 'c> {
    input: &'a str,
    reader: SliceReader<'a>,
    config: &'c EngineConfig,
    tally: EscapeTally,
}

/// A `trans-unit` child that has been read
enum Child {
    Source,
    Target,
    Other,
}

impl<'a, 'c> Parser<'a, 'c> {
    fn new(input: &'a str, source_encoding: encoding::SourceEncoding, config: &'c EngineConfig) -> Self {
        Parser {
            input,
            reader: SliceReader::new(input, source_encoding),
            config,
            tally: EscapeTally::default(),
        }
    }

    fn structural(&self, offset: usize, unit_id: Option<&str>, reason: impl Into<String>) -> ParseError {
        StructuralError::at(self.input.as_bytes(), offset, unit_id, reason).into()
    }

    fn parse(mut self) -> Result<Parsed, ParseError> {
        // Prolog up to the root element
        let (root, root_empty) = loop {
            match self.reader.next_event()? {
                XmlEvent::StartElement(e) => break (e, false),
                XmlEvent::EmptyElement(e) => break (e, true),
                XmlEvent::EndDocument(span) => {
                    return Err(self.reader.error(span.start(), "document has no root element").into())
                }
                _ => {}
            }
        };

        if !is_xliff(&root, ROOT) {
            return Err(self.structural(
                root.span.start(),
                None,
                format!("root element is '{}', expected 'xliff'", root.name),
            ));
        }

        let namespaces = root
            .attributes
            .iter()
            .filter_map(|a| {
                a.declared_prefix().map(|prefix| Namespace {
                    prefix: prefix.to_string(),
                    uri: a.value().into_owned(),
                })
            })
            .collect();

        let mut files = Vec::new();
        if !root_empty {
            loop {
                match self.reader.next_event()? {
                    XmlEvent::StartElement(e) if is_xliff(&e, FILE) => {
                        let file = self.parse_file(&e, false)?;
                        files.push(file);
                    }
                    XmlEvent::EmptyElement(e) if is_xliff(&e, FILE) => {
                        let file = self.parse_file(&e, true)?;
                        files.push(file);
                    }
                    XmlEvent::StartElement(e) => {
                        self.reader.skip_element(&e)?;
                    }
                    XmlEvent::EndElement(_) => break,
                    _ => {}
                }
            }
        }

        // Trailing comments and whitespace; the tokenizer rejects anything else
        while !matches!(self.reader.next_event()?, XmlEvent::EndDocument(_)) {}

        Ok(Parsed {
            prolog: Span::between(0, root.span.start()),
            namespaces,
            files,
            escape: self.tally.infer(),
        })
    }

    fn parse_file(&mut self, start: &StartElement<'a>, empty: bool) -> Result<FileBlock, ParseError> {
        let offset = start.span.start();
        let source_language = start
            .get_attribute_value("source-language")
            .ok_or_else(|| self.structural(offset, None, "file is missing the source-language attribute"))?
            .into_owned();
        let target_language = start.get_attribute_value("target-language").map(|v| v.into_owned());
        if target_language.is_none() && self.config.require_target_language {
            return Err(self.structural(offset, None, "file is missing the target-language attribute"));
        }

        let mut block = FileBlock {
            info: FileInfo {
                source_language,
                target_language,
                original: start.get_attribute_value("original").map(|v| v.into_owned()),
                datatype: start.get_attribute_value("datatype").map(|v| v.into_owned()),
                unit_count: 0,
            },
            units: Vec::new(),
            groups: Vec::new(),
            index: HashMap::new(),
            header: None,
            opaque_elements: Vec::new(),
            span: start.span,
        };

        if !empty {
            loop {
                match self.reader.next_event()? {
                    XmlEvent::StartElement(e) if is_xliff(&e, BODY) => {
                        self.parse_container(&mut block, None)?;
                    }
                    XmlEvent::StartElement(e) if is_xliff(&e, HEADER) => {
                        block.header = Some(self.reader.skip_element(&e)?);
                    }
                    XmlEvent::EmptyElement(e) if is_xliff(&e, HEADER) => {
                        block.header = Some(e.span);
                    }
                    XmlEvent::StartElement(e) => {
                        let span = self.reader.skip_element(&e)?;
                        block.opaque_elements.push(span);
                    }
                    XmlEvent::EmptyElement(e) => {
                        if !is_xliff(&e, BODY) {
                            block.opaque_elements.push(e.span);
                        }
                    }
                    XmlEvent::EndElement(end) => {
                        block.span = Span::between(offset, end.span.end());
                        break;
                    }
                    _ => {}
                }
            }
        }

        // Units inherit missing context from their group chain
        for unit in &mut block.units {
            let mut group = unit.group;
            while let Some(index) = group {
                let Some(outer) = block.groups.get(index) else { break };
                unit.context.inherit(&outer.context);
                group = outer.parent;
            }
        }

        block.info.unit_count = block.units.len();
        Ok(block)
    }

    /// Children of `body` or `group`, up to its end tag
    fn parse_container(&mut self, block: &mut FileBlock, group: Option<usize>) -> Result<(), ParseError> {
        loop {
            match self.reader.next_event()? {
                XmlEvent::StartElement(e) if is_xliff(&e, TRANS_UNIT) => {
                    let unit = self.parse_unit(&e, group)?;
                    if block.index.contains_key(&unit.id) {
                        return Err(self.structural(
                            e.span.start(),
                            Some(&unit.id),
                            "duplicate trans-unit id in file",
                        ));
                    }
                    block.index.insert(unit.id.clone(), block.units.len());
                    block.units.push(unit);
                }
                XmlEvent::EmptyElement(e) if is_xliff(&e, TRANS_UNIT) => {
                    let id = e.get_attribute_value("id");
                    return Err(self.structural(e.span.start(), id.as_deref(), "trans-unit has no source"));
                }
                XmlEvent::StartElement(e) if is_xliff(&e, GROUP) => {
                    let index = block.groups.len();
                    block.groups.push(Group {
                        id: e.get_attribute_value("id").map(|v| v.into_owned()),
                        parent: group,
                        context: UnitContext::default(),
                    });
                    self.parse_container(block, Some(index))?;
                }
                XmlEvent::StartElement(e) if is_xliff(&e, CONTEXT_GROUP) && group.is_some() => {
                    let context = self.parse_context_group()?;
                    if let Some(g) = group.and_then(|i| block.groups.get_mut(i)) {
                        let mut merged = context;
                        merged.inherit(&g.context);
                        g.context = merged;
                    }
                }
                XmlEvent::StartElement(e) => {
                    self.reader.skip_element(&e)?;
                }
                XmlEvent::EndElement(_) => return Ok(()),
                _ => {}
            }
        }
    }

    fn parse_unit(&mut self, start: &StartElement<'a>, group: Option<usize>) -> Result<TranslationUnit, ParseError> {
        let offset = start.span.start();
        let id = start
            .get_attribute_value("id")
            .ok_or_else(|| self.structural(offset, None, "trans-unit is missing the id attribute"))?
            .into_owned();

        let explicit_state = match start.get_attribute("state") {
            Some(attr) => Some(attr.value().parse::<UnitState>().map_err(|e| {
                self.structural(attr.value_span.start(), Some(&id), e.to_string())
            })?),
            None => None,
        };

        let record = |attr: &crate::core::attributes::Attribute<'_>| AttributeRecord {
            raw: attr.raw_value.to_string(),
            value_span: attr.value_span,
        };
        let state_attr = start.get_attribute("state").map(record);
        let locked_attr = start.get_attribute_ns(MEMSOURCE, "locked").map(record);
        let confirmed_attr = start.get_attribute_ns(MEMSOURCE, "confirmed").map(record);

        let opaque_attributes = start
            .attributes
            .iter()
            .zip(&start.attribute_namespaces)
            .filter(|(a, ns)| {
                let known = match ns.as_deref() {
                    None => matches!(a.name, "id" | "state"),
                    Some(MEMSOURCE) => matches!(a.local_name(), "locked" | "confirmed"),
                    Some(_) => false,
                };
                !known && a.declared_prefix().is_none()
            })
            .map(|(a, _)| a.span)
            .collect();

        let attribute_insert_at = start.attributes.last().map_or(start.name_end(), |a| a.span.end());
        let quote = start.attributes.first().map_or('"', |a| a.quote);

        let mut parts = Vec::new();
        let mut cursor = start.span.end();
        let mut source = None;
        let mut target = None;
        let mut indent = Span::empty_at(start.span.end() as u32);
        let mut note: Option<String> = None;
        let mut context = UnitContext::default();
        let mut opaque_elements = Vec::new();

        let end_tag = loop {
            let event = self.reader.next_event()?;
            let (element, empty) = match event {
                XmlEvent::StartElement(e) => (e, false),
                XmlEvent::EmptyElement(e) => (e, true),
                XmlEvent::EndElement(end) => break end.span,
                _ => continue,
            };

            let child = if is_xliff(&element, SOURCE) {
                Child::Source
            } else if is_xliff(&element, TARGET) {
                Child::Target
            } else {
                Child::Other
            };

            match child {
                Child::Source | Child::Target => {
                    let is_source = matches!(child, Child::Source);
                    let duplicate = if is_source { source.is_some() } else { target.is_some() };
                    if duplicate {
                        return Err(self.structural(
                            element.span.start(),
                            Some(&id),
                            format!("trans-unit has more than one {}", element.local_name),
                        ));
                    }

                    let before = Span::between(cursor, element.span.start());
                    if !before.is_empty() {
                        parts.push(UnitPart::Verbatim(before));
                    }
                    if is_source {
                        let gap = before.slice(self.input);
                        let ws = trailing_whitespace(gap);
                        indent = Span::between(before.end() - ws, before.end());
                    }

                    let (segment, record) = inline::parse_segment(&mut self.reader, &element, empty, &mut self.tally)?;
                    let unpaired = segment.check_pairing();
                    if !unpaired.is_empty() {
                        return Err(self.structural(
                            element.span.start(),
                            Some(&id),
                            format!("unpaired inline tag(s) in {}: {}", element.local_name, unpaired.join(", ")),
                        ));
                    }

                    cursor = record.span.end();
                    if is_source {
                        parts.push(UnitPart::Source);
                        source = Some((segment, record));
                    } else {
                        parts.push(UnitPart::Target);
                        target = Some((segment, record));
                    }
                }
                Child::Other if is_xliff(&element, NOTE) => {
                    if !empty {
                        let text = self.read_text()?;
                        note = Some(match note {
                            Some(previous) => format!("{}\n{}", previous, text),
                            None => text,
                        });
                    }
                }
                Child::Other if is_xliff(&element, CONTEXT_GROUP) => {
                    if !empty {
                        let found = self.parse_context_group()?;
                        let mut merged = found;
                        merged.inherit(&context);
                        context = merged;
                    }
                }
                Child::Other => {
                    let span = if empty { element.span } else { self.reader.skip_element(&element)? };
                    opaque_elements.push(span);
                }
            }
        };

        let tail = Span::between(cursor, end_tag.start());
        if !tail.is_empty() {
            parts.push(UnitPart::Verbatim(tail));
        }

        let Some((source_segment, source_element)) = source else {
            return Err(self.structural(offset, Some(&id), "trans-unit has no source"));
        };

        let (target_segment, target_element) = match target {
            Some((segment, record)) => (Some(Arc::new(segment)), Some(record)),
            None => {
                // Insertion point for a new target: right after the source
                if let Some(at) = parts.iter().position(|p| *p == UnitPart::Source) {
                    parts.insert(at + 1, UnitPart::Target);
                }
                (None, None)
            }
        };

        let hints = StateHints {
            locked: locked_attr.as_ref().and_then(|a| crate::dom::state::parse_flag(&a.raw)),
            confirmed: confirmed_attr.as_ref().and_then(|a| crate::dom::state::parse_flag(&a.raw)),
        };
        let has_translation = target_segment.as_ref().is_some_and(|t| !t.is_empty());
        let state = explicit_state.unwrap_or_else(|| hints.derive(has_translation));

        Ok(TranslationUnit {
            id,
            state,
            source: Arc::new(source_segment),
            target: target_segment.clone(),
            dirty: false,
            note,
            context,
            group,
            original_state: state,
            original_target: target_segment,
            span: Span::between(offset, end_tag.end()),
            start_tag: start.span,
            end_tag,
            attribute_insert_at,
            quote,
            state_attr,
            locked_attr,
            confirmed_attr,
            parts,
            source_element,
            target_element,
            indent,
            opaque_attributes,
            opaque_elements,
        })
    }

    /// Content of a `context-group` whose start tag was just read
    fn parse_context_group(&mut self) -> Result<UnitContext, ParseError> {
        let mut context = UnitContext::default();
        loop {
            match self.reader.next_event()? {
                XmlEvent::StartElement(e) if is_xliff(&e, CONTEXT) => {
                    let kind = e.get_attribute_value("context-type").map(|v| v.into_owned());
                    let text = self.read_text()?;
                    match kind.as_deref() {
                        Some(CONTEXT_KEY) => context.key = Some(text),
                        Some(CONTEXT_KEY_NOTE) => context.key_note = Some(text),
                        _ => {}
                    }
                }
                XmlEvent::StartElement(e) => {
                    self.reader.skip_element(&e)?;
                }
                XmlEvent::EndElement(_) => return Ok(context),
                _ => {}
            }
        }
    }

    /// Decoded text content of the element just started, up to its end tag
    fn read_text(&mut self) -> Result<String, ParseError> {
        let mut text = String::new();
        let mut depth = 0usize;
        loop {
            match self.reader.next_event()? {
                XmlEvent::Text(t) => {
                    let raw = t.raw(self.input);
                    self.tally.record(raw);
                    text.push_str(&decode_text(raw));
                }
                XmlEvent::CData(span) => {
                    let section = span.slice(self.input);
                    text.push_str(&section[9..section.len() - 3]);
                }
                XmlEvent::StartElement(_) => depth += 1,
                XmlEvent::EndElement(_) if depth == 0 => return Ok(text),
                XmlEvent::EndElement(_) => depth -= 1,
                XmlEvent::EndDocument(span) => {
                    return Err(self.reader.error(span.start(), "unexpected end of document").into())
                }
                _ => {}
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::unit::UnitKey;

    fn wrap(body: &str) -> String {
        format!(
            r#"<xliff version="1.2" xmlns="urn:oasis:names:tc:xliff:document:1.2"><file source-language="en" target-language="fr"><body>{}</body></file></xliff>"#,
            body
        )
    }

    fn load(input: &str) -> Result<Document, ParseError> {
        parse_document(input.as_bytes(), &EngineConfig::default())
    }

    fn structural(input: &str) -> StructuralError {
        match load(input) {
            Err(ParseError::Structural(e)) => e,
            other => panic!("expected structural error, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn test_minimal_document() {
        let doc = load(&wrap(r#"<trans-unit id="1"><source>Hi</source><target>Salut</target></trans-unit>"#)).unwrap();
        assert_eq!(doc.file_count(), 1);
        assert_eq!(doc.state(&UnitKey::new(0, "1")), Some(UnitState::Translated));
    }

    #[test]
    fn test_root_must_be_xliff() {
        let err = structural("<html/>");
        assert!(err.reason.contains("expected 'xliff'"));
    }

    #[test]
    fn test_duplicate_id() {
        let err = structural(&wrap(
            r#"<trans-unit id="7"><source>a</source></trans-unit><trans-unit id="7"><source>b</source></trans-unit>"#,
        ));
        assert_eq!(err.unit_id.as_deref(), Some("7"));
        assert!(err.reason.contains("duplicate"));
    }

    #[test]
    fn test_same_id_in_two_files() {
        let input = r#"<xliff><file source-language="en"><body><trans-unit id="1"><source>a</source></trans-unit></body></file><file source-language="en"><body><trans-unit id="1"><source>b</source></trans-unit></body></file></xliff>"#;
        let doc = load(input).unwrap();
        assert_eq!(doc.file_count(), 2);
        assert_eq!(doc.find_unit("1"), Some(UnitKey::new(0, "1")));
    }

    #[test]
    fn test_missing_source() {
        let err = structural(&wrap(r#"<trans-unit id="x"><target>a</target></trans-unit>"#));
        assert_eq!(err.unit_id.as_deref(), Some("x"));
        assert!(err.reason.contains("no source"));
    }

    #[test]
    fn test_missing_id() {
        assert!(structural(&wrap(r#"<trans-unit><source>a</source></trans-unit>"#)).reason.contains("id"));
    }

    #[test]
    fn test_missing_source_language() {
        let err = structural(r#"<xliff><file><body/></file></xliff>"#);
        assert!(err.reason.contains("source-language"));
    }

    #[test]
    fn test_required_target_language() {
        let input = r#"<xliff><file source-language="en"><body/></file></xliff>"#;
        let config = EngineConfig {
            require_target_language: true,
            ..EngineConfig::default()
        };
        assert!(load(input).is_ok());
        assert!(matches!(
            parse_document(input.as_bytes(), &config),
            Err(ParseError::Structural(_))
        ));
    }

    #[test]
    fn test_unknown_state() {
        let err = structural(&wrap(r#"<trans-unit id="1" state="final"><source>a</source></trans-unit>"#));
        assert!(err.reason.contains("unknown unit state 'final'"));
    }

    #[test]
    fn test_unpaired_source_tag() {
        let err = structural(&wrap(r#"<trans-unit id="1"><source><bx id="3"/>a</source></trans-unit>"#));
        assert!(err.reason.contains("unpaired inline tag(s) in source: 3"));
    }

    #[test]
    fn test_second_target() {
        let err = structural(&wrap(
            r#"<trans-unit id="1"><source>a</source><target>b</target><target>c</target></trans-unit>"#,
        ));
        assert!(err.reason.contains("more than one target"));
    }

    #[test]
    fn test_vendor_state_hints() {
        let input = r#"<xliff xmlns:m="http://www.memsource.com/mxlf/2.0"><file source-language="en"><body>
            <trans-unit id="1" m:locked="true"><source>a</source><target>b</target></trans-unit>
            <trans-unit id="2" m:confirmed="1"><source>a</source><target>b</target></trans-unit>
            <trans-unit id="3" m:confirmed="0"><source>a</source><target></target></trans-unit>
            <trans-unit id="4" state="reviewed" m:confirmed="1"><source>a</source></trans-unit>
        </body></file></xliff>"#;
        let doc = load(input).unwrap();
        let states: Vec<_> = doc.list_units(0).iter().map(|u| u.state).collect();
        assert_eq!(
            states,
            vec![UnitState::Locked, UnitState::Confirmed, UnitState::New, UnitState::Reviewed]
        );
    }

    #[test]
    fn test_group_context_inherited() {
        let input = wrap(
            r#"<group id="g1"><context-group><context context-type="x-key">DLG.Intro</context><context context-type="x-key-note">Speaker: Ann</context></context-group>
            <group id="g2"><trans-unit id="1"><source>a</source></trans-unit></group>
            <trans-unit id="2"><source>b</source><context-group><context context-type="x-key">Own.Key</context></context-group></trans-unit>
            </group>"#,
        );
        let doc = load(&input).unwrap();
        let first = doc.context(&UnitKey::new(0, "1")).unwrap();
        assert_eq!(first.key.as_deref(), Some("DLG.Intro"));
        assert_eq!(first.key_note.as_deref(), Some("Speaker: Ann"));
        let second = doc.context(&UnitKey::new(0, "2")).unwrap();
        assert_eq!(second.key.as_deref(), Some("Own.Key"));
        assert_eq!(second.key_note.as_deref(), Some("Speaker: Ann"));
        assert_eq!(doc.groups(0).len(), 2);
        assert_eq!(doc.groups(0)[1].parent, Some(0));
    }

    #[test]
    fn test_prefixed_xliff_namespace() {
        let input = r#"<x:xliff xmlns:x="urn:oasis:names:tc:xliff:document:1.2"><x:file source-language="en"><x:body><x:trans-unit id="1"><x:source>a</x:source></x:trans-unit></x:body></x:file></x:xliff>"#;
        let doc = load(input).unwrap();
        assert_eq!(doc.list_units(0).len(), 1);
    }

    #[test]
    fn test_escape_style_inferred() {
        let doc = load(&wrap(
            r#"<trans-unit id="1"><source>it&apos;s &gt; that&apos;s</source></trans-unit>"#,
        ))
        .unwrap();
        let style = doc.escape_style();
        assert_eq!(style.apostrophe, crate::core::entities::Apostrophe::Named);
        assert!(style.escape_gt);
    }

    #[test]
    fn test_malformed_input() {
        assert!(matches!(load(r#"<xliff><file source-language="en">"#), Err(ParseError::Malformed(_))));
    }
}
