//! XML Tokenizer - State machine for XML token extraction
//!
//! Implements a pull-parser style tokenizer that extracts XML tokens:
//! - Element start/end tags
//! - Text content
//! - CDATA sections
//! - Comments
//! - Processing instructions
//!
//! The tokenizer only enforces well-formedness. Every token carries its
//! exact span in the decoded input, and text tokens also carry their
//! leading and trailing whitespace runs.

use super::attributes::{parse_attributes, Attribute};
use super::entities::{check_references, find_invalid_char};
use super::scanner::Scanner;
use super::span::{leading_whitespace, trailing_whitespace, Span};
use crate::error::MalformedXml;

/// Type of XML token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Element start tag: <element>
    StartTag,
    /// Element end tag: </element>
    EndTag,
    /// Empty element: <element/>
    EmptyTag,
    /// Text content
    Text,
    /// CDATA section: <![CDATA[...]]>
    CData,
    /// Comment: <!--...-->
    Comment,
    /// Processing instruction: <?target ...?>
    ProcessingInstruction,
    /// XML declaration: <?xml ...?>
    XmlDeclaration,
    /// DOCTYPE declaration
    DocType,
    /// End of file
    Eof,
}

/// A parsed XML token
#[derive(Debug, Clone)]
pub struct Token<'a> {
    pub kind: TokenKind,
    /// Raw span in input
    pub span: Span,
    /// For tags: the element name. For PIs: the target
    pub name: Option<&'a str>,
    /// For start/empty tags and the XML declaration
    pub attributes: Vec<Attribute<'a>>,
    /// For text: whitespace run at the start
    pub leading_ws: Span,
    /// For text: whitespace run at the end
    pub trailing_ws: Span,
}

impl<'a> Token<'a> {
    fn new(kind: TokenKind, start: usize, end: usize) -> Self {
        Token {
            kind,
            span: Span::between(start, end),
            name: None,
            attributes: Vec::new(),
            leading_ws: Span::empty_at(start as u32),
            trailing_ws: Span::empty_at(end as u32),
        }
    }

    fn with_name(mut self, name: &'a str) -> Self {
        self.name = Some(name);
        self
    }

    /// Get the raw token text
    pub fn text(&self, input: &'a str) -> &'a str {
        self.span.slice(input)
    }

    /// True for text made only of whitespace
    pub fn is_whitespace(&self) -> bool {
        self.kind == TokenKind::Text && self.leading_ws.len == self.span.len
    }
}

/// Saved tokenizer state for restart-by-seek
#[derive(Debug, Clone)]
pub struct Checkpoint<'a> {
    pos: usize,
    open: Vec<(&'a str, usize)>,
    seen_root: bool,
    root_closed: bool,
    has_doctype: bool,
    done: bool,
}

/// XML tokenizer implementing a pull-parser pattern
pub struct Tokenizer<'a> {
    input: &'a str,
    scanner: Scanner<'a>,
    /// Open elements with the offset of their start tag
    open: Vec<(&'a str, usize)>,
    seen_root: bool,
    root_closed: bool,
    has_doctype: bool,
    done: bool,
}

impl<'a> Tokenizer<'a> {
    /// Create a new tokenizer for the given input
    pub fn new(input: &'a str) -> Self {
        Tokenizer {
            input,
            scanner: Scanner::new(input),
            open: Vec::with_capacity(16),
            seen_root: false,
            root_closed: false,
            has_doctype: false,
            done: false,
        }
    }

    /// Get current position
    pub fn position(&self) -> usize {
        self.scanner.position()
    }

    /// Current element depth
    pub fn depth(&self) -> usize {
        self.open.len()
    }

    /// Whether a DOCTYPE was seen (named entities may then be declared)
    pub fn has_doctype(&self) -> bool {
        self.has_doctype
    }

    /// Save the current state
    pub fn checkpoint(&self) -> Checkpoint<'a> {
        Checkpoint {
            pos: self.scanner.position(),
            open: self.open.clone(),
            seen_root: self.seen_root,
            root_closed: self.root_closed,
            has_doctype: self.has_doctype,
            done: self.done,
        }
    }

    /// Seek back to a saved state
    pub fn restore(&mut self, checkpoint: Checkpoint<'a>) {
        self.scanner.set_position(checkpoint.pos);
        self.open = checkpoint.open;
        self.seen_root = checkpoint.seen_root;
        self.root_closed = checkpoint.root_closed;
        self.has_doctype = checkpoint.has_doctype;
        self.done = checkpoint.done;
    }

    fn error(&self, offset: usize, reason: impl Into<String>) -> MalformedXml {
        MalformedXml::at(self.input.as_bytes(), offset, reason)
    }

    /// Get the next token
    pub fn next_token(&mut self) -> Result<Token<'a>, MalformedXml> {
        if self.done {
            let end = self.input.len();
            return Ok(Token::new(TokenKind::Eof, end, end));
        }

        if self.scanner.is_eof() {
            return self.finish();
        }

        let token = if self.scanner.peek() == Some(b'<') {
            self.parse_markup()?
        } else {
            self.parse_text()?
        };

        if let Some((offset, c)) = find_invalid_char(token.text(self.input)) {
            return Err(self.error(
                token.span.start() + offset,
                format!("character U+{:04X} is not allowed in XML", c as u32),
            ));
        }

        Ok(token)
    }

    fn finish(&mut self) -> Result<Token<'a>, MalformedXml> {
        if let Some((name, start)) = self.open.last() {
            return Err(self.error(*start, format!("element '{}' is never closed", name)));
        }
        if !self.seen_root {
            return Err(self.error(self.input.len(), "no root element"));
        }
        self.done = true;
        let end = self.input.len();
        Ok(Token::new(TokenKind::Eof, end, end))
    }

    fn parse_markup(&mut self) -> Result<Token<'a>, MalformedXml> {
        let start = self.scanner.position();

        match self.scanner.peek_at(1) {
            Some(b'?') => self.parse_pi(start),
            Some(b'!') => self.parse_bang_markup(start),
            Some(b'/') => self.parse_end_tag(start),
            _ => self.parse_start_tag(start),
        }
    }

    fn parse_start_tag(&mut self, start: usize) -> Result<Token<'a>, MalformedXml> {
        self.scanner.advance(1);
        let name = self
            .scanner
            .read_name()
            .ok_or_else(|| self.error(start + 1, "invalid element name"))?;
        let name_end = self.scanner.position();

        let end = self
            .scanner
            .find_tag_end_quoted()
            .ok_or_else(|| self.error(start, format!("unterminated start tag '{}'", name)))?;

        let is_empty = end > name_end && self.input.as_bytes()[end - 1] == b'/';
        let attr_end = if is_empty { end - 1 } else { end };
        let attributes = parse_attributes(&self.input[name_end..attr_end], name_end, self.has_doctype)
            .map_err(|(offset, reason)| self.error(offset, reason))?;

        if self.open.is_empty() {
            if self.root_closed {
                return Err(self.error(start, "multiple root elements"));
            }
            self.seen_root = true;
        }

        let kind = if is_empty {
            if self.open.is_empty() {
                self.root_closed = true;
            }
            TokenKind::EmptyTag
        } else {
            self.open.push((name, start));
            TokenKind::StartTag
        };

        self.scanner.set_position(end + 1);
        let mut token = Token::new(kind, start, end + 1).with_name(name);
        token.attributes = attributes;
        Ok(token)
    }

    fn parse_end_tag(&mut self, start: usize) -> Result<Token<'a>, MalformedXml> {
        self.scanner.advance(2);
        let name = self
            .scanner
            .read_name()
            .ok_or_else(|| self.error(start + 2, "invalid end tag name"))?;
        self.scanner.skip_whitespace();
        if self.scanner.peek() != Some(b'>') {
            return Err(self.error(self.scanner.position(), format!("unterminated end tag '{}'", name)));
        }

        match self.open.pop() {
            Some((open, _)) if open == name => {}
            Some((open, _)) => {
                return Err(self.error(
                    start,
                    format!("end tag '{}' does not match start tag '{}'", name, open),
                ))
            }
            None => return Err(self.error(start, format!("unexpected end tag '{}'", name))),
        }
        if self.open.is_empty() {
            self.root_closed = true;
        }

        self.scanner.advance(1);
        Ok(Token::new(TokenKind::EndTag, start, self.scanner.position()).with_name(name))
    }

    fn parse_bang_markup(&mut self, start: usize) -> Result<Token<'a>, MalformedXml> {
        if self.scanner.starts_with(b"<!--") {
            self.parse_comment(start)
        } else if self.scanner.starts_with(b"<![CDATA[") {
            self.parse_cdata(start)
        } else if self.scanner.starts_with(b"<!DOCTYPE") {
            self.parse_doctype(start)
        } else {
            Err(self.error(start, "unrecognized markup declaration"))
        }
    }

    fn parse_comment(&mut self, start: usize) -> Result<Token<'a>, MalformedXml> {
        self.scanner.advance(4);
        let content_start = self.scanner.position();
        let end = self
            .scanner
            .find_seq(b"-->")
            .ok_or_else(|| self.error(start, "unterminated comment"))?;

        let content = &self.input[content_start..end];
        if let Some(dash) = content.find("--") {
            return Err(self.error(content_start + dash, "'--' not allowed inside comment"));
        }
        if content.ends_with('-') {
            return Err(self.error(end - 1, "comment must not end with '-'"));
        }

        self.scanner.set_position(end + 3);
        Ok(Token::new(TokenKind::Comment, start, end + 3))
    }

    fn parse_cdata(&mut self, start: usize) -> Result<Token<'a>, MalformedXml> {
        if self.open.is_empty() {
            return Err(self.error(start, "CDATA section outside the root element"));
        }
        self.scanner.advance(9);
        let end = self
            .scanner
            .find_seq(b"]]>")
            .ok_or_else(|| self.error(start, "unterminated CDATA section"))?;
        self.scanner.set_position(end + 3);
        Ok(Token::new(TokenKind::CData, start, end + 3))
    }

    fn parse_doctype(&mut self, start: usize) -> Result<Token<'a>, MalformedXml> {
        if self.seen_root || self.has_doctype {
            return Err(self.error(start, "misplaced DOCTYPE declaration"));
        }

        // Walk to the closing '>' outside quotes and the internal subset
        let bytes = self.input.as_bytes();
        let mut pos = start + 9;
        let mut quote: Option<u8> = None;
        let mut in_subset = false;
        let end = loop {
            let Some(&b) = bytes.get(pos) else {
                return Err(self.error(start, "unterminated DOCTYPE declaration"));
            };
            match (quote, b) {
                (Some(q), _) if b == q => quote = None,
                (Some(_), _) => {}
                (None, b'"' | b'\'') => quote = Some(b),
                (None, b'[') => in_subset = true,
                (None, b']') => in_subset = false,
                (None, b'>') if !in_subset => break pos,
                _ => {}
            }
            pos += 1;
        };

        self.has_doctype = true;
        self.scanner.set_position(end + 1);
        Ok(Token::new(TokenKind::DocType, start, end + 1))
    }

    fn parse_pi(&mut self, start: usize) -> Result<Token<'a>, MalformedXml> {
        self.scanner.advance(2);
        let target = self
            .scanner
            .read_name()
            .ok_or_else(|| self.error(start + 2, "processing instruction without target"))?;
        let target_end = self.scanner.position();
        let end = self
            .scanner
            .find_seq(b"?>")
            .ok_or_else(|| self.error(start, "unterminated processing instruction"))?;

        let kind = if target.eq_ignore_ascii_case("xml") {
            if start != 0 || target != "xml" {
                return Err(self.error(start, "XML declaration is only allowed at the start of the document"));
            }
            TokenKind::XmlDeclaration
        } else {
            TokenKind::ProcessingInstruction
        };

        let mut token = Token::new(kind, start, end + 2).with_name(target);
        if kind == TokenKind::XmlDeclaration {
            let content = self.input[target_end..end].trim_end();
            token.attributes = parse_attributes(content, target_end, false)
                .map_err(|(offset, reason)| self.error(offset, reason))?;
            if !token.attributes.iter().any(|a| a.name == "version") {
                return Err(self.error(start, "XML declaration without version"));
            }
        } else if end > target_end && !self.input.as_bytes()[target_end].is_ascii_whitespace() {
            return Err(self.error(target_end, "invalid processing instruction target"));
        }

        self.scanner.set_position(end + 2);
        Ok(token)
    }

    fn parse_text(&mut self) -> Result<Token<'a>, MalformedXml> {
        let start = self.scanner.position();
        let end = self.scanner.find_tag_start().unwrap_or(self.scanner.len());
        let text = self.scanner.slice(start, end);

        if self.open.is_empty() {
            let ws = leading_whitespace(text);
            if ws != text.len() {
                return Err(self.error(start + ws, "text outside the root element"));
            }
        } else {
            if let Some(at) = text.find("]]>") {
                return Err(self.error(start + at, "']]>' not allowed in text"));
            }
            check_references(text, self.has_doctype)
                .map_err(|(offset, reason)| self.error(start + offset, reason))?;
        }

        self.scanner.set_position(end);
        let mut token = Token::new(TokenKind::Text, start, end);
        let lead = leading_whitespace(text);
        token.leading_ws = Span::between(start, start + lead);
        let trail = if lead == text.len() { lead } else { trailing_whitespace(text) };
        token.trailing_ws = Span::between(end - trail, end);
        Ok(token)
    }
}

impl<'a> Iterator for Tokenizer<'a> {
    type Item = Result<Token<'a>, MalformedXml>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_token() {
            Ok(token) if token.kind == TokenKind::Eof => None,
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
            other => Some(other),
        }
    }
}
