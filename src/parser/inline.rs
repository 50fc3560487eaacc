//! Segment content parsing
//!
//! Reads the runs of a `source` or `target` element. Comments and
//! processing instructions inside a segment are not part of the model.

use super::names::{id_attribute, InlineClass};
use crate::core::entities::{decode_text, EscapeTally};
use crate::core::span::Span;
use crate::dom::segment::{InlineTag, Run, Segment, TagForm, TagKind};
use crate::dom::unit::ElementRecord;
use crate::error::MalformedXml;
use crate::reader::events::{StartElement, XmlEvent};
use crate::reader::slice::SliceReader;

/// Parse the element started by `start`. `empty` tells whether it was
/// written as `<name/>`.
pub(crate) fn parse_segment<'a>(
    reader: &mut SliceReader<'a>,
    start: &StartElement<'a>,
    empty: bool,
    tally: &mut EscapeTally,
) -> Result<(Segment, ElementRecord), MalformedXml> {
    let record = |span: Span| ElementRecord {
        qname: start.name.to_string(),
        span,
        start_tag: start.span,
        empty,
    };

    if empty {
        return Ok((Segment::default(), record(start.span)));
    }

    let input = reader.input();
    let mut runs = Vec::new();
    // Open structural tags: (name, id)
    let mut open: Vec<(String, Option<String>)> = Vec::new();

    loop {
        match reader.next_event()? {
            XmlEvent::Text(text) => {
                let raw = text.raw(input);
                tally.record(raw);
                runs.push(Run::Text(decode_text(raw).into_owned()));
            }

            XmlEvent::CData(span) => {
                let section = span.slice(input);
                let inner = &section[9..section.len() - 3];
                runs.push(Run::Text(inner.to_string()));
            }

            XmlEvent::StartElement(element) => {
                let tag = inline_tag(reader, &element, false)?;
                if tag.form == TagForm::Start {
                    open.push((tag.name.clone(), tag.id.clone()));
                }
                runs.push(Run::Tag(tag));
            }

            XmlEvent::EmptyElement(element) => {
                runs.push(Run::Tag(inline_tag(reader, &element, true)?));
            }

            XmlEvent::EndElement(end) => match open.pop() {
                Some((name, id)) => {
                    let mut tag = InlineTag::new(name, TagKind::Close, TagForm::End);
                    tag.id = id;
                    runs.push(Run::Tag(tag));
                }
                None => {
                    let span = Span::between(start.span.start(), end.span.end());
                    return Ok((Segment::new(runs), record(span)));
                }
            },

            XmlEvent::EndDocument(span) => {
                return Err(reader.error(span.start(), "unexpected end of document"));
            }

            XmlEvent::Comment(_)
            | XmlEvent::ProcessingInstruction { .. }
            | XmlEvent::XmlDeclaration { .. }
            | XmlEvent::DocType(_) => {}
        }
    }
}

/// Build the tag for an inline element. Native-code elements consume their
/// content and end tag here.
fn inline_tag<'a>(
    reader: &mut SliceReader<'a>,
    element: &StartElement<'a>,
    empty: bool,
) -> Result<InlineTag, MalformedXml> {
    let class = InlineClass::of(element);
    let (kind, form) = match (class, empty) {
        (InlineClass::Structural, false) => (TagKind::Open, TagForm::Start),
        (InlineClass::Structural, true) => (TagKind::Placeholder, TagForm::Empty),
        (InlineClass::Placeholder, _) => (TagKind::Placeholder, TagForm::Empty),
        (InlineClass::BeginEmpty, _) => (TagKind::Open, TagForm::Empty),
        (InlineClass::EndEmpty, _) => (TagKind::Close, TagForm::Empty),
        (InlineClass::BeginNative, true) => (TagKind::Open, TagForm::Empty),
        (InlineClass::EndNative, true) => (TagKind::Close, TagForm::Empty),
        (InlineClass::NativePlaceholder, true) => (TagKind::Placeholder, TagForm::Empty),
        (native, false) => {
            let end = reader.skip_to_end()?;
            let raw = &reader.input()[element.span.end()..end.start()];
            let kind = match native {
                InlineClass::BeginNative => TagKind::Open,
                InlineClass::EndNative => TagKind::Close,
                _ => TagKind::Placeholder,
            };
            (kind, TagForm::Native(raw.to_string()))
        }
    };

    let mut tag = InlineTag::new(element.name, kind, form);
    tag.attributes = element
        .attributes
        .iter()
        .map(|a| (a.name.to_string(), a.value().into_owned()))
        .collect();
    tag.id = element
        .get_attribute_value(id_attribute(element.local_name))
        .map(|v| v.into_owned());
    Ok(tag)
}
