//! Zero-Copy Slice Reader
//!
//! Turns tokens into namespace-resolved events over the decoded document
//! text, with one event of lookahead. Input references are maintained
//! directly in the output.

use super::events::{EndElement, StartElement, TextEvent, XmlEvent};
use crate::core::encoding::SourceEncoding;
use crate::core::span::Span;
use crate::core::tokenizer::{Token, TokenKind, Tokenizer};
use crate::dom::namespace::NamespaceResolver;
use crate::error::MalformedXml;

/// Zero-copy XML reader from decoded text
pub struct SliceReader<'a> {
    input: &'a str,
    tokenizer: Tokenizer<'a>,
    namespaces: NamespaceResolver<'a>,
    encoding: SourceEncoding,
    peeked: Option<XmlEvent<'a>>,
}

impl<'a> SliceReader<'a> {
    /// Create a reader. `encoding` is what the raw bytes were decoded from
    /// and is checked against any encoding declaration.
    pub fn new(input: &'a str, encoding: SourceEncoding) -> Self {
        SliceReader {
            input,
            tokenizer: Tokenizer::new(input),
            namespaces: NamespaceResolver::new(),
            encoding,
            peeked: None,
        }
    }

    /// The decoded input
    pub fn input(&self) -> &'a str {
        self.input
    }

    /// Build an error at an offset of the input
    pub fn error(&self, offset: usize, reason: impl Into<String>) -> MalformedXml {
        MalformedXml::at(self.input.as_bytes(), offset, reason)
    }

    /// Look at the next event without consuming it
    pub fn peek(&mut self) -> Result<&XmlEvent<'a>, MalformedXml> {
        let event = match self.peeked.take() {
            Some(event) => event,
            None => self.read_event()?,
        };
        Ok(self.peeked.insert(event))
    }

    /// Get the next XML event
    pub fn next_event(&mut self) -> Result<XmlEvent<'a>, MalformedXml> {
        match self.peeked.take() {
            Some(event) => Ok(event),
            None => self.read_event(),
        }
    }

    /// Consume everything up to and including the end tag matching `start`,
    /// returning the span of the whole element.
    pub fn skip_element(&mut self, start: &StartElement<'a>) -> Result<Span, MalformedXml> {
        let end = self.skip_to_end()?;
        Ok(Span::between(start.span.start(), end.end()))
    }

    /// Consume the content of the element just started and its end tag,
    /// returning the end tag span.
    pub fn skip_to_end(&mut self) -> Result<Span, MalformedXml> {
        let mut depth = 1usize;
        loop {
            match self.next_event()? {
                XmlEvent::StartElement(_) => depth += 1,
                XmlEvent::EndElement(end) => {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(end.span);
                    }
                }
                XmlEvent::EndDocument(span) => {
                    return Err(self.error(span.start(), "unexpected end of document"))
                }
                _ => {}
            }
        }
    }

    fn read_event(&mut self) -> Result<XmlEvent<'a>, MalformedXml> {
        let token = self.tokenizer.next_token()?;

        Ok(match token.kind {
            TokenKind::Eof => XmlEvent::EndDocument(token.span),

            TokenKind::StartTag => {
                self.namespaces.push_scope();
                XmlEvent::StartElement(self.resolve_start(token)?)
            }

            TokenKind::EmptyTag => {
                self.namespaces.push_scope();
                let element = self.resolve_start(token);
                self.namespaces.pop_scope();
                XmlEvent::EmptyElement(element?)
            }

            TokenKind::EndTag => {
                let name = token.name.unwrap_or_default();
                let mut element = EndElement::new(name, token.span);
                element.namespace = self.resolve_element_ns(element.prefix, token.span.start())?;
                self.namespaces.pop_scope();
                XmlEvent::EndElement(element)
            }

            TokenKind::Text => XmlEvent::Text(TextEvent {
                span: token.span,
                leading_ws: token.leading_ws,
                trailing_ws: token.trailing_ws,
            }),

            TokenKind::CData => XmlEvent::CData(token.span),

            TokenKind::Comment => XmlEvent::Comment(token.span),

            TokenKind::ProcessingInstruction => XmlEvent::ProcessingInstruction {
                target: token.name.unwrap_or_default(),
                span: token.span,
            },

            TokenKind::XmlDeclaration => self.declaration(token)?,

            TokenKind::DocType => XmlEvent::DocType(token.span),
        })
    }

    fn declaration(&self, token: Token<'a>) -> Result<XmlEvent<'a>, MalformedXml> {
        let attribute = |name: &str| token.attributes.iter().find(|a| a.name == name);

        let version = attribute("version").map(|a| a.value()).unwrap_or_default();
        let encoding = attribute("encoding").map(|a| a.value());
        if let (Some(label), Some(attr)) = (&encoding, attribute("encoding")) {
            self.encoding
                .check_label(label, self.input.is_ascii())
                .map_err(|reason| self.error(attr.value_span.start(), reason))?;
        }
        let standalone = attribute("standalone").map(|a| a.raw_value == "yes");

        Ok(XmlEvent::XmlDeclaration {
            version,
            encoding,
            standalone,
            span: token.span,
        })
    }

    fn resolve_start(&mut self, token: Token<'a>) -> Result<StartElement<'a>, MalformedXml> {
        let name = token.name.unwrap_or_default();
        let mut element = StartElement::new(name, token.attributes, token.span);

        for attr in &element.attributes {
            if let Some(prefix) = attr.declared_prefix() {
                let uri = attr.value();
                if !prefix.is_empty() && uri.is_empty() {
                    return Err(self.error(attr.span.start(), format!("empty namespace URI for prefix '{}'", prefix)));
                }
                self.namespaces.declare(prefix, &uri);
            }
        }

        element.namespace = self.resolve_element_ns(element.prefix, token.span.start())?;

        let mut attribute_namespaces = Vec::with_capacity(element.attributes.len());
        for attr in &element.attributes {
            let ns = match attr.prefix() {
                Some("xmlns") | None => None,
                Some(prefix) => Some(self.namespaces.resolve(prefix).ok_or_else(|| {
                    self.error(attr.span.start(), format!("unbound namespace prefix '{}'", prefix))
                })?),
            };
            attribute_namespaces.push(ns);
        }
        element.attribute_namespaces = attribute_namespaces;

        Ok(element)
    }

    fn resolve_element_ns(
        &self,
        prefix: Option<&str>,
        offset: usize,
    ) -> Result<Option<std::sync::Arc<str>>, MalformedXml> {
        match prefix {
            None => Ok(self.namespaces.resolve_default()),
            Some(prefix) => self
                .namespaces
                .resolve(prefix)
                .map(Some)
                .ok_or_else(|| self.error(offset, format!("unbound namespace prefix '{}'", prefix))),
        }
    }
}
