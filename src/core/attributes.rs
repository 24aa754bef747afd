//! Attribute tokenization
//!
//! Second-stage tokenizer run over the attribute region of an open tag (the
//! bytes between the tag name and the first `>`). Produces spans only; values
//! are decoded later, on demand.

use super::scanner::{is_name_char, is_whitespace};
use crate::dom::span::Span;

/// A raw attribute found in an open tag
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RawAttribute {
    /// Whole `name="value"` extent
    pub span: Span,
    /// Attribute name
    pub name: Span,
    /// Value without its quotes; `None` for bare attributes like `disabled`
    pub value: Option<Span>,
}

/// Tokenize the attribute region `input`, which starts at absolute offset
/// `base` in the source text
///
/// Lenient: bytes that cannot start a name (stray quotes, the `/` of a
/// self-closing tag, ...) are skipped. A quoted value that never closes runs
/// to the end of the region.
pub fn parse_attributes(input: &[u8], base: usize) -> Vec<RawAttribute> {
    let mut attrs = Vec::new();
    let mut pos = 0;
    let abs = |offset: usize| base + offset;

    while pos < input.len() {
        // Skip whitespace and anything that cannot start a name
        while pos < input.len() && !is_name_char(input[pos]) {
            pos += 1;
        }
        if pos >= input.len() {
            break;
        }

        let name_start = pos;
        while pos < input.len() && is_name_char(input[pos]) {
            pos += 1;
        }
        let name = Span::from_range(abs(name_start), abs(pos));
        let name_end = pos;

        // Skip whitespace around '='
        let mut cursor = pos;
        while cursor < input.len() && is_whitespace(input[cursor]) {
            cursor += 1;
        }
        if cursor >= input.len() || input[cursor] != b'=' {
            // Attribute without value (like HTML boolean attributes)
            attrs.push(RawAttribute {
                span: Span::from_range(abs(name_start), abs(name_end)),
                name,
                value: None,
            });
            continue;
        }
        cursor += 1; // Skip '='
        while cursor < input.len() && is_whitespace(input[cursor]) {
            cursor += 1;
        }
        if cursor >= input.len() {
            attrs.push(RawAttribute {
                span: Span::from_range(abs(name_start), abs(cursor)),
                name,
                value: Some(Span::from_range(abs(cursor), abs(cursor))),
            });
            break;
        }

        let quote = input[cursor];
        let (value, end) = if quote == b'"' || quote == b'\'' {
            let value_start = cursor + 1;
            match memchr::memchr(quote, &input[value_start..]) {
                Some(len) => (
                    Span::from_range(abs(value_start), abs(value_start + len)),
                    value_start + len + 1,
                ),
                None => (
                    Span::from_range(abs(value_start), abs(input.len())),
                    input.len(),
                ),
            }
        } else {
            // Unquoted value (non-standard but handle it)
            let value_start = cursor;
            let mut value_end = cursor;
            while value_end < input.len()
                && !is_whitespace(input[value_end])
                && !matches!(input[value_end], b'"' | b'\'' | b'>')
            {
                value_end += 1;
            }
            // the '/' of "<a b=c/>" belongs to the tag, not the value
            if value_end == input.len() && value_end > value_start + 1 && input[value_end - 1] == b'/' {
                value_end -= 1;
            }
            (Span::from_range(abs(value_start), abs(value_end)), value_end)
        };

        attrs.push(RawAttribute {
            span: Span::from_range(abs(name_start), abs(end)),
            name,
            value: Some(value),
        });
        pos = end;
    }

    attrs
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pairs(input: &str) -> Vec<(&str, Option<&str>)> {
        parse_attributes(input.as_bytes(), 0)
            .into_iter()
            .map(|a| (a.name.slice(input), a.value.map(|v| v.slice(input))))
            .collect()
    }

    #[test]
    fn test_simple_attributes() {
        assert_eq!(
            pairs(" id=\"test\" class=\"foo\""),
            vec![("id", Some("test")), ("class", Some("foo"))]
        );
    }

    #[test]
    fn test_single_quoted_and_bare() {
        assert_eq!(
            pairs("a='x y' b=plain c"),
            vec![("a", Some("x y")), ("b", Some("plain")), ("c", None)]
        );
    }

    #[test]
    fn test_whitespace_handling() {
        assert_eq!(pairs("  id  =  \"test\"  "), vec![("id", Some("test"))]);
    }

    #[test]
    fn test_self_closing_slash() {
        assert_eq!(pairs(" a=\"1\" /"), vec![("a", Some("1"))]);
        assert_eq!(pairs(" b=c/"), vec![("b", Some("c"))]);
    }

    #[test]
    fn test_unterminated_quote() {
        assert_eq!(pairs(" a=\"open"), vec![("a", Some("open"))]);
    }

    #[test]
    fn test_base_offset() {
        let attrs = parse_attributes(b"x=\"1\"", 10);
        assert_eq!(attrs[0].span, Span::new(10, 15));
        assert_eq!(attrs[0].value, Some(Span::new(13, 14)));
    }

    #[test]
    fn test_empty_attributes() {
        assert!(pairs("").is_empty());
        assert!(pairs("   ").is_empty());
    }
}
