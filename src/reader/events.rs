//! XML Event Types
//!
//! Event types for pull-parser style XML processing. Events borrow from the
//! decoded input and carry the spans the serializer splices with.

use crate::core::attributes::{split_name, Attribute};
use crate::core::span::Span;
use std::borrow::Cow;
use std::sync::Arc;

/// XML parsing event
#[derive(Debug, Clone)]
pub enum XmlEvent<'a> {
    /// Start of an element: <name attrs...>
    StartElement(StartElement<'a>),
    /// End of an element: </name>
    EndElement(EndElement<'a>),
    /// Empty element: <name attrs.../>
    EmptyElement(StartElement<'a>),
    /// Text content between tags
    Text(TextEvent),
    /// CDATA section, span covers the delimiters
    CData(Span),
    /// Comment, span covers the delimiters
    Comment(Span),
    /// Processing instruction: <?target data?>
    ProcessingInstruction { target: &'a str, span: Span },
    /// XML declaration: <?xml version="1.0"?>
    XmlDeclaration {
        version: Cow<'a, str>,
        encoding: Option<Cow<'a, str>>,
        standalone: Option<bool>,
        span: Span,
    },
    /// DOCTYPE declaration
    DocType(Span),
    /// End of document
    EndDocument(Span),
}

/// Start element event data
#[derive(Debug, Clone)]
pub struct StartElement<'a> {
    /// Full element name (may include prefix)
    pub name: &'a str,
    /// Local name (after colon)
    pub local_name: &'a str,
    /// Namespace prefix (before colon), if any
    pub prefix: Option<&'a str>,
    /// Namespace URI (resolved), if any
    pub namespace: Option<Arc<str>>,
    /// Element attributes in document order
    pub attributes: Vec<Attribute<'a>>,
    /// Resolved namespace of each attribute, parallel to `attributes`
    pub attribute_namespaces: Vec<Option<Arc<str>>>,
    /// The whole tag
    pub span: Span,
}

impl<'a> StartElement<'a> {
    /// Create a new start element
    pub fn new(name: &'a str, attributes: Vec<Attribute<'a>>, span: Span) -> Self {
        let (prefix, local_name) = split_name(name);
        StartElement {
            name,
            local_name,
            prefix,
            namespace: None,
            attribute_namespaces: vec![None; attributes.len()],
            attributes,
            span,
        }
    }

    /// Check the expanded name
    pub fn is(&self, namespace: Option<&str>, local_name: &str) -> bool {
        self.local_name == local_name && self.namespace.as_deref() == namespace
    }

    /// Get an attribute by its full name
    pub fn get_attribute(&self, name: &str) -> Option<&Attribute<'a>> {
        self.attributes.iter().find(|a| a.name == name)
    }

    /// Get a decoded attribute value by its full name
    pub fn get_attribute_value(&self, name: &str) -> Option<Cow<'a, str>> {
        self.get_attribute(name).map(|a| a.value())
    }

    /// Get an attribute by namespace URI and local name
    pub fn get_attribute_ns(&self, namespace: &str, local_name: &str) -> Option<&Attribute<'a>> {
        self.attributes
            .iter()
            .zip(&self.attribute_namespaces)
            .find(|(a, ns)| a.local_name() == local_name && ns.as_deref() == Some(namespace))
            .map(|(a, _)| a)
    }

    /// Offset just past the element name, where new attributes can go
    pub fn name_end(&self) -> usize {
        self.span.start() + 1 + self.name.len()
    }
}

/// End element event data
#[derive(Debug, Clone)]
pub struct EndElement<'a> {
    /// Full element name
    pub name: &'a str,
    /// Local name (after colon)
    pub local_name: &'a str,
    /// Namespace prefix (before colon), if any
    pub prefix: Option<&'a str>,
    /// Namespace URI (resolved), if any
    pub namespace: Option<Arc<str>>,
    pub span: Span,
}

impl<'a> EndElement<'a> {
    /// Create a new end element
    pub fn new(name: &'a str, span: Span) -> Self {
        let (prefix, local_name) = split_name(name);
        EndElement {
            name,
            local_name,
            prefix,
            namespace: None,
            span,
        }
    }
}

/// Text run with its whitespace edges
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextEvent {
    pub span: Span,
    pub leading_ws: Span,
    pub trailing_ws: Span,
}

impl TextEvent {
    /// Raw text, entities not decoded
    pub fn raw<'a>(&self, input: &'a str) -> &'a str {
        self.span.slice(input)
    }

    /// Only whitespace
    pub fn is_whitespace(&self) -> bool {
        self.leading_ws.len == self.span.len
    }
}

impl<'a> XmlEvent<'a> {
    /// Source span of the event
    pub fn span(&self) -> Span {
        match self {
            XmlEvent::StartElement(e) | XmlEvent::EmptyElement(e) => e.span,
            XmlEvent::EndElement(e) => e.span,
            XmlEvent::Text(t) => t.span,
            XmlEvent::CData(span)
            | XmlEvent::Comment(span)
            | XmlEvent::DocType(span)
            | XmlEvent::EndDocument(span) => *span,
            XmlEvent::ProcessingInstruction { span, .. } | XmlEvent::XmlDeclaration { span, .. } => *span,
        }
    }

    /// Check if this is a start element event
    pub fn is_start_element(&self) -> bool {
        matches!(self, XmlEvent::StartElement(_) | XmlEvent::EmptyElement(_))
    }

    /// Check if this is an end element event
    pub fn is_end_element(&self) -> bool {
        matches!(self, XmlEvent::EndElement(_))
    }

    /// Get as start element if applicable
    pub fn as_start_element(&self) -> Option<&StartElement<'a>> {
        match self {
            XmlEvent::StartElement(e) | XmlEvent::EmptyElement(e) => Some(e),
            _ => None,
        }
    }
}
