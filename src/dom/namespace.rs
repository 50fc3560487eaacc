//! Namespace Resolution
//!
//! Stack-based namespace resolver for XML namespace handling.

use std::sync::Arc;

/// Well-known namespace URIs
pub mod ns {
    pub const XML: &str = "http://www.w3.org/XML/1998/namespace";
    pub const XMLNS: &str = "http://www.w3.org/2000/xmlns/";
}

/// A namespace declaration as written on an element
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Namespace {
    /// Empty for the default namespace
    pub prefix: String,
    pub uri: String,
}

/// Namespace binding (prefix -> URI)
#[derive(Debug, Clone)]
struct NsBinding<'a> {
    prefix: &'a str,
    uri: Arc<str>,
    depth: u16,
}

/// Stack-based namespace resolver
#[derive(Debug)]
pub struct NamespaceResolver<'a> {
    /// Stack of namespace bindings
    bindings: Vec<NsBinding<'a>>,
    /// Current element depth
    depth: u16,
}

impl<'a> Default for NamespaceResolver<'a> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> NamespaceResolver<'a> {
    /// Create a new namespace resolver with pre-declared xml and xmlns namespaces
    pub fn new() -> Self {
        let mut resolver = NamespaceResolver {
            bindings: Vec::with_capacity(16),
            depth: 0,
        };

        // Pre-bind xml and xmlns prefixes
        resolver.bindings.push(NsBinding {
            prefix: "xml",
            uri: Arc::from(ns::XML),
            depth: 0,
        });
        resolver.bindings.push(NsBinding {
            prefix: "xmlns",
            uri: Arc::from(ns::XMLNS),
            depth: 0,
        });

        resolver
    }

    /// Enter a new element scope
    pub fn push_scope(&mut self) {
        self.depth += 1;
    }

    /// Leave an element scope, removing any bindings declared in it
    pub fn pop_scope(&mut self) {
        while let Some(binding) = self.bindings.last() {
            if binding.depth < self.depth {
                break;
            }
            self.bindings.pop();
        }
        self.depth = self.depth.saturating_sub(1);
    }

    /// Declare a namespace binding for the current scope. The empty prefix
    /// is the default namespace; an empty URI undeclares it.
    pub fn declare(&mut self, prefix: &'a str, uri: &str) {
        // Don't allow redeclaring xml or xmlns
        if prefix == "xml" || prefix == "xmlns" {
            return;
        }

        self.bindings.push(NsBinding {
            prefix,
            uri: Arc::from(uri),
            depth: self.depth,
        });
    }

    /// Resolve a prefix to a namespace URI
    pub fn resolve(&self, prefix: &str) -> Option<Arc<str>> {
        // Search from most recent to oldest
        self.bindings
            .iter()
            .rev()
            .find(|b| b.prefix == prefix)
            .map(|b| b.uri.clone())
            .filter(|uri| !uri.is_empty())
    }

    /// Resolve the default namespace
    pub fn resolve_default(&self) -> Option<Arc<str>> {
        self.resolve("")
    }

    /// Get current depth
    pub fn depth(&self) -> u16 {
        self.depth
    }
}
