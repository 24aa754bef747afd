//! Span - half-open byte range into the source text
//!
//! Nodes never copy their text. A span is resolved against the document's
//! source whenever a fragment is needed.

/// A half-open `[start, end)` byte range into the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Span {
    /// Byte offset of the first byte
    pub start: u32,
    /// Byte offset one past the last byte
    pub end: u32,
}

impl Span {
    /// Create a new span
    #[inline]
    pub const fn new(start: u32, end: u32) -> Self {
        Self { start, end }
    }

    /// Create a span from `usize` offsets
    ///
    /// Callers guarantee the offsets fit in `u32`; the document rejects larger
    /// inputs before any span is built.
    #[inline]
    pub(crate) fn from_range(start: usize, end: usize) -> Self {
        Self::new(start as u32, end as u32)
    }

    /// Create an empty span (used for "no name")
    #[inline]
    pub const fn empty() -> Self {
        Self { start: 0, end: 0 }
    }

    /// Length in bytes
    #[inline]
    pub const fn len(&self) -> usize {
        (self.end - self.start) as usize
    }

    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// True if `other` lies entirely inside this span
    #[inline]
    pub const fn contains(&self, other: Span) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    /// Extract the substring from the source text
    ///
    /// Returns an empty string if the span is out of range or splits a
    /// character.
    #[inline]
    pub fn slice<'a>(&self, text: &'a str) -> &'a str {
        text.get(self.start as usize..self.end as usize).unwrap_or("")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_span_basic() {
        let span = Span::new(5, 15);
        assert_eq!(span.len(), 10);
        assert!(!span.is_empty());
        assert!(Span::empty().is_empty());
    }

    #[test]
    fn test_span_slice() {
        let text = "hello world";
        assert_eq!(Span::new(6, 11).slice(text), "world");
        assert_eq!(Span::new(6, 40).slice(text), "");
    }

    #[test]
    fn test_span_relations() {
        let outer = Span::new(0, 10);
        let inner = Span::new(3, 6);
        let after = Span::new(10, 12);
        assert!(outer.contains(inner));
        assert!(!inner.contains(outer));
        assert!(!outer.contains(after));
        assert!(outer.contains(outer));
    }
}
