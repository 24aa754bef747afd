//! MIME-type dispatch
//!
//! `DomParser` mirrors the browser `DOMParser` surface: a text plus a MIME
//! type selects the parse mode.

use crate::dom::{Document, ParseOptions};
use crate::error::{DomError, Result};

/// Markup dialect selected by a MIME type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    Html,
    Xml,
}

impl Dialect {
    /// Classify a MIME type; `None` when it is not supported
    ///
    /// Matching is exact and case-sensitive, like the browser's.
    pub fn from_mime(mime: &str) -> Option<Dialect> {
        match mime {
            "text/html" => Some(Dialect::Html),
            "application/xml" | "application/xhtml+xml" | "text/xml" | "image/svg+xml" => {
                Some(Dialect::Xml)
            }
            _ if is_xml_suffix_type(mime) => Some(Dialect::Xml),
            _ => None,
        }
    }
}

/// `(application|text|image)/<subtype>+xml` where the subtype stem is made of
/// lowercase letters, `-` and `+`
fn is_xml_suffix_type(mime: &str) -> bool {
    let Some((top, subtype)) = mime.split_once('/') else {
        return false;
    };
    if !matches!(top, "application" | "text" | "image") {
        return false;
    }
    let Some(stem) = subtype.strip_suffix("+xml") else {
        return false;
    };
    !stem.is_empty()
        && stem
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b == b'-' || b == b'+')
}

/// Parser front end carrying base options
#[derive(Debug, Clone, Copy, Default)]
pub struct DomParser {
    options: ParseOptions,
}

impl DomParser {
    pub fn new(options: ParseOptions) -> Self {
        Self { options }
    }

    #[inline]
    pub fn options(&self) -> ParseOptions {
        self.options
    }

    /// Options a parse with `mime` would use
    pub fn options_for(&self, mime: &str) -> Result<ParseOptions> {
        let dialect = Dialect::from_mime(mime)
            .ok_or_else(|| DomError::UnsupportedMimeType(mime.to_string()))?;
        let mut options = self.options;
        options.is_html = dialect == Dialect::Html;
        Ok(options)
    }

    /// Parse `text` in the mode selected by `mime`
    ///
    /// # Errors
    /// `DomError::UnsupportedMimeType` for MIME types outside the HTML and
    /// XML families. Malformed markup is never an error.
    #[tracing::instrument(level = "debug", skip(self, text), fields(len = text.len()))]
    pub fn parse_from_string(&self, text: &str, mime: &str) -> Result<Document> {
        let options = self.options_for(mime)?;
        Document::parse(text, options)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_types() {
        assert_eq!(Dialect::from_mime("text/html"), Some(Dialect::Html));
        for mime in ["application/xml", "application/xhtml+xml", "text/xml", "image/svg+xml"] {
            assert_eq!(Dialect::from_mime(mime), Some(Dialect::Xml), "{mime}");
        }
    }

    #[test]
    fn test_xml_suffix_pattern() {
        assert_eq!(Dialect::from_mime("application/atom+xml"), Some(Dialect::Xml));
        assert_eq!(Dialect::from_mime("text/x-custom+xml"), Some(Dialect::Xml));
        assert_eq!(Dialect::from_mime("image/a+b+xml"), Some(Dialect::Xml));
        assert_eq!(Dialect::from_mime("application/+xml"), None);
        assert_eq!(Dialect::from_mime("application/Atom+xml"), None);
        assert_eq!(Dialect::from_mime("audio/foo+xml"), None);
        assert_eq!(Dialect::from_mime("application/foo+xml; charset=utf-8"), None);
    }

    #[test]
    fn test_unsupported() {
        let parser = DomParser::default();
        for mime in ["text/plain", "application/json", "TEXT/HTML", ""] {
            let err = parser.parse_from_string("<a/>", mime).unwrap_err();
            assert!(matches!(err, DomError::UnsupportedMimeType(ref m) if m == mime));
        }
    }

    #[test]
    fn test_mode_selection() {
        let parser = DomParser::new(ParseOptions::HTML);
        let html = parser.parse_from_string("<p>&nbsp;</p>", "text/html").unwrap();
        assert!(html.options().is_html);
        assert_eq!(html.text_content(), "\u{a0}");

        let xml = parser.parse_from_string("<p>&nbsp;</p>", "application/xml").unwrap();
        assert!(!xml.options().is_html);
        assert_eq!(xml.text_content(), "&nbsp;");
    }
}
