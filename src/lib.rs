//! immudom - Lazy, immutable markup documents
//!
//! Layers:
//! A: Tokenizer (core::tokenizer) - ordered rules, total coverage of the input
//! B: Tag-stack resolver (dom::builder) - flat node array, implicit closure
//! C: Implicit-tree accessors (dom::navigate) - relationships from spans
//! D: Lazy child lists (dom::lazy) - memoizing generator-backed views
//! E: MIME dispatch, binary codec and batch parsing
//!
//! ```
//! use immudom::{DomParser, ParseOptions};
//!
//! let doc = DomParser::new(ParseOptions::default())
//!     .parse_from_string("<a><b>x &amp; y</b></a>", "application/xml")
//!     .unwrap();
//! let root = doc.document_element().unwrap();
//! assert_eq!(root.tag_name(), "a");
//! assert_eq!(root.text_content(), "x & y");
//! assert_eq!(doc.to_string(), "<a><b>x &amp; y</b></a>");
//! ```

pub mod codec;
pub mod core;
pub mod dom;
pub mod error;
#[cfg(feature = "parallel")]
pub mod parallel;
pub mod parser;

pub use codec::{DomCodec, DEFAULT_BASE_TAG};
pub use dom::{
    AttributeRef, Attributes, Document, ElementRef, NodeId, NodeKind, NodeList, NodeRef,
    ParseOptions, Span,
};
pub use error::{DomError, Result};
pub use parser::{Dialect, DomParser};

#[cfg(feature = "parallel")]
pub use parallel::parse_batch;

// ============================================================================
// Convenience entry points
// ============================================================================

/// Parse a text as XML
pub fn parse_xml(text: &str) -> Result<Document> {
    Document::parse(text, ParseOptions::XML)
}

/// Parse a text as HTML (named HTML entities are decoded)
pub fn parse_html(text: &str) -> Result<Document> {
    Document::parse(text, ParseOptions::HTML)
}
