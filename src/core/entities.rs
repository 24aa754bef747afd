//! Text and entity decoding
//!
//! Handles:
//! - CDATA sections: `<![CDATA[...]]>` is replaced by its inner text, verbatim
//! - Built-in entities: &lt; &gt; &amp; &quot; &apos;
//! - Numeric character references: &#123; &#x7B;
//! - Named HTML entities (HTML mode only, see `html_entities`)
//!
//! Uses Cow for zero-copy when nothing needs decoding.

use super::html_entities::resolve_html_entity;
use memchr::{memchr2, memmem};
use std::borrow::Cow;

const CDATA_OPEN: &str = "<![CDATA[";
const CDATA_CLOSE: &str = "]]>";

/// Longest entity body we try to resolve (the longest HTML name is 31 bytes)
const MAX_ENTITY_LEN: usize = 32;

/// Decode a raw fragment into its text content
///
/// Returns Borrowed if nothing needs decoding, Owned otherwise. Unknown or
/// malformed references are kept as written.
#[inline]
pub fn decode_text(input: &str, html: bool) -> Cow<'_, str> {
    let bytes = input.as_bytes();
    // Fast path: no '&' and no CDATA opener
    if memchr::memchr(b'&', bytes).is_none() && memmem::find(bytes, b"<![").is_none() {
        return Cow::Borrowed(input);
    }
    Cow::Owned(decode_slow(input, html))
}

fn decode_slow(input: &str, html: bool) -> String {
    let bytes = input.as_bytes();
    let mut result = String::with_capacity(input.len());
    let mut pos = 0;

    while pos < input.len() {
        let Some(offset) = memchr2(b'&', b'<', &bytes[pos..]) else {
            result.push_str(&input[pos..]);
            break;
        };
        let at = pos + offset;
        result.push_str(&input[pos..at]);

        if bytes[at] == b'<' {
            let rest = &input[at..];
            if rest.starts_with(CDATA_OPEN) {
                if let Some(close) = rest[CDATA_OPEN.len()..].find(CDATA_CLOSE) {
                    let inner_start = at + CDATA_OPEN.len();
                    result.push_str(&input[inner_start..inner_start + close]);
                    pos = inner_start + close + CDATA_CLOSE.len();
                    continue;
                }
            }
            result.push('<');
            pos = at + 1;
            continue;
        }

        match entity_at(input, at) {
            Some((body, end)) => match decode_entity(body, html) {
                Some(decoded) => {
                    result.push_str(&decoded);
                    pos = end;
                }
                None => {
                    // Unknown entity, keep as-is
                    result.push_str(&input[at..end]);
                    pos = end;
                }
            },
            None => {
                // No terminating semicolon, keep the ampersand
                result.push('&');
                pos = at + 1;
            }
        }
    }

    result
}

/// Locate the entity body starting at `amp` (which points at '&')
///
/// Returns the text between '&' and ';' and the offset after ';'.
fn entity_at(input: &str, amp: usize) -> Option<(&str, usize)> {
    let window_end = input.len().min(amp + 1 + MAX_ENTITY_LEN + 1);
    let window = input.as_bytes().get(amp + 1..window_end)?;
    let semi = window
        .iter()
        .position(|&b| b == b';' || b == b'&' || b == b'<' || b.is_ascii_whitespace())?;
    if window[semi] != b';' || semi == 0 {
        return None;
    }
    let body = input.get(amp + 1..amp + 1 + semi)?;
    Some((body, amp + 1 + semi + 1))
}

/// Decode a single entity body (without & and ;)
fn decode_entity(entity: &str, html: bool) -> Option<Cow<'static, str>> {
    if let Some(numeric) = entity.strip_prefix('#') {
        return decode_numeric_entity(numeric).map(|c| Cow::Owned(c.to_string()));
    }

    let builtin = match entity {
        "lt" => "<",
        "gt" => ">",
        "amp" => "&",
        "quot" => "\"",
        "apos" => "'",
        _ if html => return resolve_html_entity(entity).map(Cow::Borrowed),
        _ => return None,
    };
    Some(Cow::Borrowed(builtin))
}

/// Decode a numeric character reference body (after '#')
///
/// The codepoint must lie in `[0, 0x10FFFF]` and be a Unicode scalar value;
/// anything else is left unresolved.
fn decode_numeric_entity(entity: &str) -> Option<char> {
    let codepoint = match entity.strip_prefix(['x', 'X']) {
        Some(hex) => {
            if hex.is_empty() || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
                return None;
            }
            u32::from_str_radix(hex, 16).ok()?
        }
        None => {
            if entity.is_empty() || !entity.bytes().all(|b| b.is_ascii_digit()) {
                return None;
            }
            entity.parse::<u32>().ok()?
        }
    };

    if codepoint > 0x10FFFF {
        return None;
    }
    char::from_u32(codepoint)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_entities() {
        let result = decode_text("Hello, World!", false);
        assert!(matches!(result, Cow::Borrowed(_)));
        assert_eq!(result, "Hello, World!");
    }

    #[test]
    fn test_basic_entities() {
        let result = decode_text("&lt;hello&gt; &amp; &quot;world&quot; &apos;", false);
        assert_eq!(result, "<hello> & \"world\" '");
    }

    #[test]
    fn test_numeric_decimal() {
        assert_eq!(decode_text("&#65;&#66;&#67;", false), "ABC");
    }

    #[test]
    fn test_numeric_hex() {
        assert_eq!(decode_text("&#x41;&#X42;&#x1F600;", false), "AB😀");
    }

    #[test]
    fn test_numeric_out_of_range() {
        assert_eq!(decode_text("&#x110000;", false), "&#x110000;");
        assert_eq!(decode_text("&#xD800;", false), "&#xD800;");
        assert_eq!(decode_text("&#12a;", false), "&#12a;");
    }

    #[test]
    fn test_unknown_entity() {
        assert_eq!(decode_text("&unknown;", false), "&unknown;");
        assert_eq!(decode_text("fish & chips", false), "fish & chips");
        assert_eq!(decode_text("&amp", false), "&amp");
    }

    #[test]
    fn test_cdata() {
        assert_eq!(decode_text("a<![CDATA[<b>&amp;</b>]]>c", false), "a<b>&amp;</b>c");
        assert_eq!(decode_text("<![CDATA[open", false), "<![CDATA[open");
    }

    #[test]
    fn test_html_named_entities() {
        assert_eq!(decode_text("&copy;&nbsp;&eacute;", true), "\u{A9}\u{A0}\u{E9}");
        assert_eq!(decode_text("&copy;", false), "&copy;");
    }
}
