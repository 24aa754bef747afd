//! SIMD-accelerated markup scanning using memchr
//!
//! The scanner only ever stops on ASCII delimiters, so every position it hands
//! out is also a valid `str` boundary of the original text.

use memchr::{memchr, memmem};

/// Byte cursor over the markup being tokenized
pub struct Scanner<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Scanner<'a> {
    /// Create a new scanner for the given input
    #[inline]
    pub fn new(input: &'a [u8]) -> Self {
        Scanner { input, pos: 0 }
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn set_position(&mut self, pos: usize) {
        self.pos = pos;
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.input.len()
    }

    #[inline]
    pub fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// Peek at the byte at an absolute offset
    #[inline]
    pub fn byte_at(&self, at: usize) -> Option<u8> {
        self.input.get(at).copied()
    }

    /// Check if input starts with a byte sequence at an absolute offset
    #[inline]
    pub fn starts_with_at(&self, at: usize, needle: &[u8]) -> bool {
        self.input.get(at..).is_some_and(|rest| rest.starts_with(needle))
    }

    /// Find next occurrence of a byte at or after `at`
    #[inline]
    pub fn find_byte_from(&self, at: usize, byte: u8) -> Option<usize> {
        let rest = self.input.get(at..)?;
        memchr(byte, rest).map(|i| at + i)
    }

    /// Find a multi-byte needle at or after `at`, returning its start
    #[inline]
    pub fn find_from(&self, at: usize, needle: &[u8]) -> Option<usize> {
        let rest = self.input.get(at..)?;
        memmem::find(rest, needle).map(|i| at + i)
    }

    /// Return the end of the name starting at `at`, or `None` if no name
    /// character is present there
    #[inline]
    pub fn name_end(&self, at: usize) -> Option<usize> {
        let mut end = at;
        while end < self.input.len() && is_name_char(self.input[end]) {
            end += 1;
        }
        (end > at).then_some(end)
    }
}

/// Check if byte is valid in a tag or attribute name
///
/// The relaxed grammar allows names to start with a digit or hyphen.
#[inline]
pub fn is_name_char(b: u8) -> bool {
    matches!(b, b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'_' | b'-' | b':')
}

/// Check if byte is whitespace
#[inline]
pub fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r' | b'\x0C')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_find_byte_from() {
        let scanner = Scanner::new(b"hello <world>");
        assert_eq!(scanner.find_byte_from(0, b'<'), Some(6));
        assert_eq!(scanner.find_byte_from(7, b'<'), None);
        assert_eq!(scanner.find_byte_from(99, b'<'), None);
    }

    #[test]
    fn test_find_from() {
        let scanner = Scanner::new(b"<!-- a -- b -->tail");
        assert_eq!(scanner.find_from(4, b"-->"), Some(12));
    }

    #[test]
    fn test_name_end() {
        let scanner = Scanner::new(b"<element-name attr>");
        assert_eq!(scanner.name_end(1), Some(13));
        assert_eq!(scanner.name_end(13), None);
    }

    #[test]
    fn test_starts_with_at() {
        let scanner = Scanner::new(b"x<![CDATA[y]]>");
        assert!(scanner.starts_with_at(1, b"<![CDATA["));
        assert!(!scanner.starts_with_at(0, b"<![CDATA["));
    }
}
