//! Document - flat node array over an owned source text
//!
//! The document is the arena: nodes are records in one vector ordered by
//! start offset, and a node's index is its identity. Parent, sibling and
//! child relationships are not stored; they are derived from span
//! containment on first use and memoized in a parallel table of
//! compute-once cells (see `navigate`).
//!
//! Once `parse` returns nothing observable changes: the memo cells only ever
//! go from empty to a value that any reader would have computed identically.

use super::attribute::AttributeTable;
use super::builder::build_nodes;
use super::lazy::LazyList;
use super::navigate::{ChildCursor, ElementRef, NodeList, NodeRef};
use super::node::{NodeId, NodeKind, NodeRecord};
use crate::core::entities::decode_text;
use crate::error::{DomError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::{Arc, OnceLock};

/// Options controlling how a text is parsed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParseOptions {
    /// Treat the markup as HTML: named HTML entities are decoded
    pub is_html: bool,
}

impl ParseOptions {
    pub const XML: ParseOptions = ParseOptions { is_html: false };
    pub const HTML: ParseOptions = ParseOptions { is_html: true };
}

/// Memo cells kept for every node
#[derive(Default)]
pub(crate) struct NodeMemo {
    pub parent: OnceLock<Option<NodeId>>,
    pub next_sibling: OnceLock<Option<NodeId>>,
    pub previous_sibling: OnceLock<Option<NodeId>>,
    /// Decoded text; `None` means the raw slice needed no decoding
    pub text: OnceLock<Option<Box<str>>>,
    /// Element-only cells, allocated on first use
    pub element: OnceLock<Box<ElementMemo>>,
}

/// Memo cells only elements need
#[derive(Default)]
pub(crate) struct ElementMemo {
    pub next_element_sibling: OnceLock<Option<NodeId>>,
    pub previous_element_sibling: OnceLock<Option<NodeId>>,
    pub last_child: OnceLock<Option<NodeId>>,
    pub child_nodes: OnceLock<LazyList<ChildCursor>>,
    pub children: OnceLock<LazyList<ChildCursor>>,
    pub attributes: OnceLock<AttributeTable>,
}

/// Memo cells for the document level ("no parent")
struct RootMemo {
    document_element: OnceLock<Option<NodeId>>,
    child_nodes: LazyList<ChildCursor>,
    children: LazyList<ChildCursor>,
    last_child: OnceLock<Option<NodeId>>,
    node_value: OnceLock<String>,
    text_content: OnceLock<String>,
}

/// An immutable, lazily navigated markup document
pub struct Document {
    source: Arc<str>,
    nodes: Vec<NodeRecord>,
    options: ParseOptions,
    memo: Vec<NodeMemo>,
    root: RootMemo,
}

impl Document {
    /// Parse a text into a document
    ///
    /// Never fails on malformed markup; errors are limited to inputs larger
    /// than 4 GiB and internal defects.
    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(len = tracing::field::Empty, html = options.is_html)
    )]
    pub fn parse(text: impl Into<Arc<str>>, options: ParseOptions) -> Result<Document> {
        let source: Arc<str> = text.into();
        tracing::Span::current().record("len", source.len());
        let nodes = build_nodes(&source)?;
        tracing::debug!(nodes = nodes.len(), "parsed document");
        Ok(Self::assemble(source, nodes, options))
    }

    /// Build a document from records produced elsewhere (the codec)
    ///
    /// Checks every invariant the accessors rely on: ordering, nesting,
    /// top-level tiling and in-range spans.
    pub(crate) fn from_parts(
        source: Arc<str>,
        nodes: Vec<NodeRecord>,
        options: ParseOptions,
    ) -> Result<Document> {
        validate_records(&source, &nodes)?;
        Ok(Self::assemble(source, nodes, options))
    }

    fn assemble(source: Arc<str>, nodes: Vec<NodeRecord>, options: ParseOptions) -> Document {
        let mut memo = Vec::with_capacity(nodes.len());
        memo.resize_with(nodes.len(), NodeMemo::default);
        let end = source.len() as u32;
        Document {
            root: RootMemo {
                document_element: OnceLock::new(),
                child_nodes: LazyList::new(ChildCursor::new(0, end, None, false)),
                children: LazyList::new(ChildCursor::new(0, end, None, true)),
                last_child: OnceLock::new(),
                node_value: OnceLock::new(),
                text_content: OnceLock::new(),
            },
            source,
            nodes,
            options,
            memo,
        }
    }

    /// The complete source text
    #[inline]
    pub fn source(&self) -> &str {
        &self.source
    }

    #[inline]
    pub fn options(&self) -> ParseOptions {
        self.options
    }

    /// Number of nodes in the flat array
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The flat node records, ordered by start offset
    #[inline]
    pub fn records(&self) -> &[NodeRecord] {
        &self.nodes
    }

    /// Node at `index` in the flat array
    #[inline]
    pub fn node(&self, index: NodeId) -> Option<NodeRef<'_>> {
        ((index as usize) < self.nodes.len()).then(|| NodeRef::new(self, index))
    }

    /// All nodes in document order
    pub fn nodes(&self) -> impl ExactSizeIterator<Item = NodeRef<'_>> + '_ {
        (0..self.nodes.len() as NodeId).map(move |id| NodeRef::new(self, id))
    }

    /// The first element in the document
    pub fn document_element(&self) -> Option<ElementRef<'_>> {
        let id = *self
            .root
            .document_element
            .get_or_init(|| self.nodes.iter().position(NodeRecord::is_element).map(|i| i as NodeId));
        id.map(|id| ElementRef::new(self, id))
    }

    /// Top-level nodes
    pub fn child_nodes(&self) -> NodeList<'_> {
        NodeList::new(self, &self.root.child_nodes)
    }

    /// Top-level elements
    pub fn children(&self) -> NodeList<'_> {
        NodeList::new(self, &self.root.children)
    }

    pub fn first_child(&self) -> Option<NodeRef<'_>> {
        self.child_nodes().first()
    }

    pub fn last_child(&self) -> Option<NodeRef<'_>> {
        let id = *self
            .root
            .last_child
            .get_or_init(|| self.last_child_id(None));
        id.map(|id| NodeRef::new(self, id))
    }

    /// Concatenated `node_value` of the top-level nodes
    pub fn node_value(&self) -> &str {
        self.root.node_value.get_or_init(|| {
            self.child_nodes()
                .iter()
                .filter_map(|node| node.node_value())
                .collect()
        })
    }

    /// Concatenated decoded text of every Text node in the document
    pub fn text_content(&self) -> &str {
        self.root
            .text_content
            .get_or_init(|| self.descendant_text(0, self.nodes.len()))
    }

    /// Record for a node id; callers only hold ids handed out by this document
    #[inline]
    pub(crate) fn record(&self, id: NodeId) -> &NodeRecord {
        &self.nodes[id as usize]
    }

    #[inline]
    pub(crate) fn memo(&self, id: NodeId) -> &NodeMemo {
        &self.memo[id as usize]
    }

    #[inline]
    pub(crate) fn element_memo(&self, id: NodeId) -> &ElementMemo {
        self.memo(id).element.get_or_init(Box::default)
    }

    /// Concatenate the decoded text of the Text nodes in `[from, to)`
    pub(crate) fn descendant_text(&self, from: usize, to: usize) -> String {
        let mut out = String::new();
        for id in from..to {
            if self.nodes[id].kind == NodeKind::Text {
                out.push_str(NodeRef::new(self, id as NodeId).text_content());
            }
        }
        out
    }

    /// Raw source slice of a node
    #[inline]
    pub(crate) fn fragment_of(&self, id: NodeId) -> &str {
        self.record(id).span.slice(&self.source)
    }

    /// Decode `raw` (a slice of this document's source) with the document's
    /// options, caching the result in `cell`
    pub(crate) fn cached_decode<'a>(
        &'a self,
        cell: &'a OnceLock<Option<Box<str>>>,
        raw: &'a str,
    ) -> &'a str {
        let cached = cell.get_or_init(|| match decode_text(raw, self.options.is_html) {
            std::borrow::Cow::Borrowed(_) => None,
            std::borrow::Cow::Owned(owned) => Some(owned.into_boxed_str()),
        });
        cached.as_deref().unwrap_or(raw)
    }
}

impl fmt::Display for Document {
    /// Concatenation of the top-level fragments
    ///
    /// Reproduces the source exactly whenever the top-level nodes tile it,
    /// which the parser guarantees.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for node in self.child_nodes().iter() {
            f.write_str(node.fragment())?;
        }
        Ok(())
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let root = self.document_element().map(|e| e.tag_name());
        f.debug_struct("Document")
            .field("document_element", &root)
            .field("nodes", &self.nodes.len())
            .field("options", &self.options)
            .finish()
    }
}

/// Check the invariants the accessors rely on
fn validate_records(source: &str, nodes: &[NodeRecord]) -> Result<()> {
    let len = source.len();
    if len > u32::MAX as usize {
        return Err(DomError::InputTooLarge(len));
    }
    let mut open: Vec<u32> = Vec::new(); // ends of enclosing elements
    let mut covered = 0u32;
    let mut previous_start: Option<u32> = None;

    for (index, record) in nodes.iter().enumerate() {
        let span = record.span;
        if span.is_empty() || span.end as usize > len {
            return Err(DomError::InvalidSnapshot(format!(
                "node {index} has invalid range {}..{}",
                span.start, span.end
            )));
        }
        if source.get(span.start as usize..span.end as usize).is_none() {
            return Err(DomError::InvalidSnapshot(format!(
                "node {index} does not fall on character boundaries"
            )));
        }
        if previous_start.is_some_and(|prev| span.start <= prev) {
            return Err(DomError::InvalidSnapshot(format!(
                "node {index} is out of order"
            )));
        }
        previous_start = Some(span.start);

        while open.last().is_some_and(|&end| end <= span.start) {
            open.pop();
        }
        match open.last() {
            Some(&end) if span.end > end => {
                return Err(DomError::InvalidSnapshot(format!(
                    "node {index} partially overlaps its parent"
                )));
            }
            Some(_) => {}
            None => {
                if span.start != covered {
                    return Err(DomError::InvalidSnapshot(format!(
                        "top-level node {index} starts at {} instead of {covered}",
                        span.start
                    )));
                }
                covered = span.end;
            }
        }
        if record.is_element() {
            if record.name.is_empty() || !span.contains(record.name) {
                return Err(DomError::InvalidSnapshot(format!(
                    "element {index} has no tag name"
                )));
            }
            open.push(span.end);
        }
    }

    if covered as usize != len {
        return Err(DomError::InvalidSnapshot(format!(
            "top-level nodes cover {covered} of {len} bytes"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::span::Span;

    #[test]
    fn test_parse_and_display() {
        let text = "<?xml version=\"1.0\"?>\n<root a=\"1\"><child>text</child></root>\n";
        let doc = Document::parse(text, ParseOptions::XML).unwrap();
        assert_eq!(doc.to_string(), text);
        assert_eq!(doc.document_element().unwrap().tag_name(), "root");
        assert_eq!(doc.child_nodes().len(), 4);
        assert_eq!(doc.children().len(), 1);
    }

    #[test]
    fn test_plain_text() {
        let doc = Document::parse("plain text, no tags", ParseOptions::XML).unwrap();
        assert_eq!(doc.len(), 1);
        let only = doc.first_child().unwrap();
        assert_eq!(only.kind(), NodeKind::Text);
        assert_eq!(only.text_content(), "plain text, no tags");
        assert!(doc.document_element().is_none());
        assert_eq!(doc.last_child().unwrap().index(), 0);
    }

    #[test]
    fn test_empty_document() {
        let doc = Document::parse("", ParseOptions::XML).unwrap();
        assert!(doc.is_empty());
        assert!(doc.first_child().is_none());
        assert!(doc.last_child().is_none());
        assert_eq!(doc.to_string(), "");
        assert_eq!(doc.text_content(), "");
    }

    #[test]
    fn test_document_text_and_value() {
        let doc = Document::parse("a&amp;<!--c--><x>b</x>", ParseOptions::XML).unwrap();
        assert_eq!(doc.text_content(), "a&b");
        assert_eq!(doc.node_value(), "a&amp;c");
    }

    #[test]
    fn test_from_parts_validation() {
        let source: Arc<str> = Arc::from("<a>x</a>");
        let good = vec![
            NodeRecord::element(Span::new(0, 8), Span::new(1, 2)),
            NodeRecord::leaf(NodeKind::Text, Span::new(3, 4)),
        ];
        assert!(Document::from_parts(source.clone(), good, ParseOptions::XML).is_ok());

        let gap = vec![NodeRecord::element(Span::new(0, 4), Span::new(1, 2))];
        assert!(matches!(
            Document::from_parts(source.clone(), gap, ParseOptions::XML),
            Err(DomError::InvalidSnapshot(_))
        ));

        let overlap = vec![
            NodeRecord::element(Span::new(0, 4), Span::new(1, 2)),
            NodeRecord::leaf(NodeKind::Text, Span::new(3, 8)),
        ];
        assert!(Document::from_parts(source.clone(), overlap, ParseOptions::XML).is_err());

        let nameless = vec![NodeRecord::element(Span::new(0, 8), Span::empty())];
        assert!(Document::from_parts(source, nameless, ParseOptions::XML).is_err());
    }

    #[test]
    fn test_document_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Document>();
    }
}
