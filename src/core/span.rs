//! Span - offset and length into the decoded document text
//!
//! Every model node remembers the exact bytes it was parsed from, so the
//! serializer can copy untouched regions instead of regenerating them.

/// A span referencing a portion of the document text.
///
/// Documents are limited to 4GB, so offsets and lengths fit in `u32`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    /// Byte offset into the original input
    pub offset: u32,
    /// Length in bytes
    pub len: u32,
}

impl Span {
    /// Create a new span
    #[inline]
    pub const fn new(offset: u32, len: u32) -> Self {
        Self { offset, len }
    }

    /// Create a span covering `start..end`
    #[inline]
    pub fn between(start: usize, end: usize) -> Self {
        debug_assert!(start <= end);
        Self {
            offset: start as u32,
            len: (end - start) as u32,
        }
    }

    /// Create an empty span at a position (used as an insertion point)
    #[inline]
    pub const fn empty_at(offset: u32) -> Self {
        Self { offset, len: 0 }
    }

    /// Check if this span is empty
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Start offset
    #[inline]
    pub const fn start(&self) -> usize {
        self.offset as usize
    }

    /// End offset (exclusive)
    #[inline]
    pub const fn end(&self) -> usize {
        self.offset as usize + self.len as usize
    }

    /// Check if `other` lies entirely inside this span
    #[inline]
    pub fn contains(&self, other: Span) -> bool {
        other.start() >= self.start() && other.end() <= self.end()
    }

    /// Extract the text from input
    #[inline]
    pub fn slice<'a>(&self, input: &'a str) -> &'a str {
        input.get(self.start()..self.end()).unwrap_or("")
    }
}

/// Count the leading XML whitespace bytes of `text`
#[inline]
pub fn leading_whitespace(text: &str) -> usize {
    text.bytes().take_while(|b| is_xml_whitespace(*b)).count()
}

/// Count the trailing XML whitespace bytes of `text`
#[inline]
pub fn trailing_whitespace(text: &str) -> usize {
    text.bytes().rev().take_while(|b| is_xml_whitespace(*b)).count()
}

/// XML `S` production
#[inline]
pub fn is_xml_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r')
}
