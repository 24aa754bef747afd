//! Implicit-tree accessors
//!
//! The tree is never stored. Given the flat array ordered by start offset,
//! where every pair of ranges is either disjoint or nested:
//!
//! - the parent of `n` is the nearest preceding element whose range still
//!   covers `n.start`
//! - the subtree of `n` is the contiguous run of records after `n` that start
//!   before `n.end`
//! - the next sibling of `n` is the record right after its subtree, provided
//!   it still lies inside the parent
//!
//! Every derived relationship is memoized in the document's cells.

use super::attribute::{AttributeRef, Attributes};
use super::document::Document;
use super::lazy::{Generator, LazyList};
use super::node::{NodeId, NodeKind, NodeRecord};
use super::span::Span;
use crate::core::scanner::{is_name_char, is_whitespace};
use std::fmt;
use std::ops::{Deref, Range};

// ============================================================================
// Relationship computations
// ============================================================================

impl Document {
    pub(crate) fn parent_id(&self, id: NodeId) -> Option<NodeId> {
        *self.memo(id).parent.get_or_init(|| self.find_parent(id))
    }

    fn find_parent(&self, id: NodeId) -> Option<NodeId> {
        let start = self.record(id).start();
        let mut candidate = id;
        while candidate > 0 {
            candidate -= 1;
            let record = self.record(candidate);
            if record.is_element() && record.end() > start {
                return Some(candidate);
            }
            // Anything between the candidate and its parent lies in the
            // parent's subtree before the candidate and cannot cover `id`.
            match self.memo(candidate).parent.get() {
                Some(Some(parent)) => candidate = parent + 1,
                Some(None) => return None,
                None => {}
            }
        }
        None
    }

    /// Index one past the last descendant of `id`
    pub(crate) fn subtree_end(&self, id: NodeId) -> NodeId {
        let next = id + 1;
        let record = self.record(id);
        if !record.is_element() {
            return next;
        }
        let end = record.end();
        let after = &self.records()[next as usize..];
        next + after.partition_point(|n| n.start() < end) as NodeId
    }

    fn next_sibling_id(&self, id: NodeId) -> Option<NodeId> {
        *self.memo(id).next_sibling.get_or_init(|| {
            let candidate = self.subtree_end(id);
            let record = self.records().get(candidate as usize)?;
            let limit = self
                .parent_id(id)
                .map_or(u32::MAX, |parent| self.record(parent).end());
            (record.start() < limit).then_some(candidate)
        })
    }

    fn previous_sibling_id(&self, id: NodeId) -> Option<NodeId> {
        *self.memo(id).previous_sibling.get_or_init(|| {
            let parent = self.parent_id(id);
            let mut candidate = id.checked_sub(1)?;
            if Some(candidate) == parent {
                return None;
            }
            loop {
                let up = self.parent_id(candidate);
                if up == parent {
                    return Some(candidate);
                }
                candidate = up?;
            }
        })
    }

    /// Last child of `parent` (`None` is the document level)
    pub(crate) fn last_child_id(&self, parent: Option<NodeId>) -> Option<NodeId> {
        let (first, end) = match parent {
            Some(p) => (p + 1, self.subtree_end(p)),
            None => (0, self.len() as NodeId),
        };
        if end <= first {
            return None;
        }
        let mut candidate = end - 1;
        loop {
            let up = self.parent_id(candidate);
            if up == parent {
                return Some(candidate);
            }
            candidate = up?;
        }
    }

    fn next_element_sibling_id(&self, id: NodeId) -> Option<NodeId> {
        *self
            .element_memo(id)
            .next_element_sibling
            .get_or_init(|| {
                let mut current = self.next_sibling_id(id);
                while let Some(sibling) = current {
                    if self.record(sibling).is_element() {
                        return Some(sibling);
                    }
                    current = self.next_sibling_id(sibling);
                }
                None
            })
    }

    fn previous_element_sibling_id(&self, id: NodeId) -> Option<NodeId> {
        *self
            .element_memo(id)
            .previous_element_sibling
            .get_or_init(|| {
                let mut current = self.previous_sibling_id(id);
                while let Some(sibling) = current {
                    if self.record(sibling).is_element() {
                        return Some(sibling);
                    }
                    current = self.previous_sibling_id(sibling);
                }
                None
            })
    }
}

// ============================================================================
// Child generator
// ============================================================================

/// Walks the direct children of one parent by skipping whole subtrees
#[derive(Debug, Clone)]
pub struct ChildCursor {
    next: NodeId,
    /// End offset of the parent range
    end: u32,
    parent: Option<NodeId>,
    elements_only: bool,
}

impl ChildCursor {
    pub(crate) fn new(next: NodeId, end: u32, parent: Option<NodeId>, elements_only: bool) -> Self {
        Self {
            next,
            end,
            parent,
            elements_only,
        }
    }

    fn for_element(doc: &Document, id: NodeId, elements_only: bool) -> Self {
        Self::new(id + 1, doc.record(id).end(), Some(id), elements_only)
    }
}

impl Generator for ChildCursor {
    type Context = Document;
    type Item = NodeId;

    fn next(&mut self, doc: &Document) -> Option<NodeId> {
        loop {
            let record = doc.records().get(self.next as usize)?;
            if record.start() >= self.end {
                return None;
            }
            let id = self.next;
            self.next = doc.subtree_end(id);
            debug_assert_eq!(doc.parent_id(id), self.parent);
            if !self.elements_only || record.is_element() {
                return Some(id);
            }
        }
    }
}

// ============================================================================
// NodeRef
// ============================================================================

/// Handle to one node of a document
#[derive(Clone, Copy)]
pub struct NodeRef<'a> {
    doc: &'a Document,
    id: NodeId,
}

impl<'a> NodeRef<'a> {
    #[inline]
    pub(crate) fn new(doc: &'a Document, id: NodeId) -> Self {
        Self { doc, id }
    }

    #[inline]
    fn record(&self) -> &'a NodeRecord {
        self.doc.record(self.id)
    }

    #[inline]
    fn wrap(&self, id: Option<NodeId>) -> Option<NodeRef<'a>> {
        id.map(|id| NodeRef::new(self.doc, id))
    }

    /// Owning document
    #[inline]
    pub fn document(&self) -> &'a Document {
        self.doc
    }

    /// Position in the document's flat array
    #[inline]
    pub fn index(&self) -> NodeId {
        self.id
    }

    #[inline]
    pub fn kind(&self) -> NodeKind {
        self.record().kind
    }

    /// DOM `nodeType` code
    #[inline]
    pub fn node_type(&self) -> u16 {
        self.kind().node_type()
    }

    #[inline]
    pub fn is_element(&self) -> bool {
        self.record().is_element()
    }

    pub fn as_element(&self) -> Option<ElementRef<'a>> {
        self.is_element().then(|| ElementRef::new(self.doc, self.id))
    }

    #[inline]
    pub fn span(&self) -> Span {
        self.record().span
    }

    #[inline]
    pub fn start_offset(&self) -> usize {
        self.record().start() as usize
    }

    #[inline]
    pub fn end_offset(&self) -> usize {
        self.record().end() as usize
    }

    /// Exact source text of this node
    #[inline]
    pub fn fragment(&self) -> &'a str {
        self.doc.fragment_of(self.id)
    }

    /// DOM `nodeName`
    pub fn node_name(&self) -> &'a str {
        match self.kind() {
            NodeKind::Element => self.record().name.slice(self.doc.source()),
            NodeKind::Text => "#text",
            NodeKind::Comment => "#comment",
            NodeKind::ProcessingInstruction => self.target().unwrap_or_default(),
            NodeKind::DocumentType => self.doctype_name().unwrap_or_default(),
        }
    }

    /// Nearest enclosing element; `None` at the document level
    pub fn parent_element(&self) -> Option<ElementRef<'a>> {
        self.doc
            .parent_id(self.id)
            .map(|id| ElementRef::new(self.doc, id))
    }

    /// Alias of `parent_element`: parents are always elements
    pub fn parent_node(&self) -> Option<ElementRef<'a>> {
        self.parent_element()
    }

    pub fn next_sibling(&self) -> Option<NodeRef<'a>> {
        self.wrap(self.doc.next_sibling_id(self.id))
    }

    pub fn previous_sibling(&self) -> Option<NodeRef<'a>> {
        self.wrap(self.doc.previous_sibling_id(self.id))
    }

    /// All enclosing elements, nearest first
    pub fn ancestors(&self) -> impl Iterator<Item = ElementRef<'a>> + 'a {
        std::iter::successors(self.parent_element(), |e| e.parent_element())
    }

    /// Nodes nested inside this one, in document order
    pub fn descendants(&self) -> impl ExactSizeIterator<Item = NodeRef<'a>> + 'a {
        let doc = self.doc;
        (self.id + 1..doc.subtree_end(self.id)).map(move |id| NodeRef::new(doc, id))
    }

    /// DOM `nodeValue`: raw text, comment body or PI data
    pub fn node_value(&self) -> Option<&'a str> {
        match self.kind() {
            NodeKind::Text => Some(self.fragment()),
            NodeKind::Comment => self.comment_body(),
            NodeKind::ProcessingInstruction => self.data(),
            NodeKind::Element | NodeKind::DocumentType => None,
        }
    }

    /// Decoded text; for elements, the concatenation of descendant Text nodes
    pub fn text_content(&self) -> &'a str {
        let doc = self.doc;
        let cell = &doc.memo(self.id).text;
        match self.kind() {
            NodeKind::Text => doc.cached_decode(cell, self.fragment()),
            NodeKind::Comment => doc.cached_decode(cell, self.comment_body().unwrap_or_default()),
            NodeKind::Element => {
                let text = cell.get_or_init(|| {
                    let from = self.id as usize + 1;
                    let to = doc.subtree_end(self.id) as usize;
                    Some(doc.descendant_text(from, to).into_boxed_str())
                });
                text.as_deref().unwrap_or_default()
            }
            NodeKind::ProcessingInstruction | NodeKind::DocumentType => "",
        }
    }

    /// Comment body without `<!--` and `-->`
    pub fn comment_body(&self) -> Option<&'a str> {
        if self.kind() != NodeKind::Comment {
            return None;
        }
        let fragment = self.fragment();
        fragment.get(4..fragment.len().saturating_sub(3))
    }

    /// Processing instruction target (`xml` in `<?xml version="1.0"?>`)
    pub fn target(&self) -> Option<&'a str> {
        let inner = self.pi_inner()?;
        let end = inner
            .bytes()
            .position(is_whitespace)
            .unwrap_or(inner.len());
        Some(&inner[..end])
    }

    /// Processing instruction data, trimmed
    pub fn data(&self) -> Option<&'a str> {
        let inner = self.pi_inner()?;
        let target = self.target()?;
        Some(inner[target.len()..].trim_matches(|c: char| c.is_ascii() && is_whitespace(c as u8)))
    }

    fn pi_inner(&self) -> Option<&'a str> {
        if self.kind() != NodeKind::ProcessingInstruction {
            return None;
        }
        self.fragment().strip_prefix("<?")?.strip_suffix("?>")
    }

    /// Declaration keyword: `DOCTYPE` for `<!DOCTYPE html>`, `ENTITY` for
    /// `<!ENTITY foo "bar">`
    pub fn declaration_keyword(&self) -> Option<&'a str> {
        if self.kind() != NodeKind::DocumentType {
            return None;
        }
        let body = self.fragment().strip_prefix("<!")?;
        let end = body
            .bytes()
            .position(|b| b == b'>' || is_whitespace(b))
            .unwrap_or(body.len());
        Some(&body[..end])
    }

    /// Document type name: the first token after the declaration keyword
    pub fn doctype_name(&self) -> Option<&'a str> {
        if self.kind() != NodeKind::DocumentType {
            return None;
        }
        let body = self.fragment().strip_prefix("<!")?;
        let bytes = body.as_bytes();
        let keyword_end = bytes
            .iter()
            .position(|&b| !b.is_ascii_alphabetic())
            .unwrap_or(bytes.len());
        let name_start = keyword_end
            + bytes[keyword_end..]
                .iter()
                .position(|&b| !is_whitespace(b))
                .unwrap_or(bytes.len() - keyword_end);
        let name_len = bytes[name_start..]
            .iter()
            .position(|&b| !is_name_char(b))
            .unwrap_or(bytes.len() - name_start);
        Some(&body[name_start..name_start + name_len])
    }
}

impl PartialEq for NodeRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.doc, other.doc) && self.id == other.id
    }
}

impl Eq for NodeRef<'_> {}

impl fmt::Debug for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct(self.kind().name())
            .field("index", &self.id)
            .field("span", &self.span())
            .finish()
    }
}

impl fmt::Display for NodeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.fragment())
    }
}

// ============================================================================
// ElementRef
// ============================================================================

/// Handle to an element node
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct ElementRef<'a>(NodeRef<'a>);

impl<'a> ElementRef<'a> {
    #[inline]
    pub(crate) fn new(doc: &'a Document, id: NodeId) -> Self {
        debug_assert!(doc.record(id).is_element());
        ElementRef(NodeRef::new(doc, id))
    }

    #[inline]
    pub fn as_node(&self) -> NodeRef<'a> {
        self.0
    }

    pub fn tag_name(&self) -> &'a str {
        self.0.record().name.slice(self.0.doc.source())
    }

    /// Attributes in source order
    pub fn attributes(&self) -> Attributes<'a> {
        Attributes::new(self.0.doc, self.0.id)
    }

    /// Attribute by name; the last occurrence wins on duplicates
    pub fn attribute(&self, name: &str) -> Option<AttributeRef<'a>> {
        self.attributes().get(name)
    }

    /// Decoded value of the named attribute
    pub fn get_attribute(&self, name: &str) -> Option<&'a str> {
        self.attribute(name).map(|attr| attr.value())
    }

    pub fn has_attribute(&self, name: &str) -> bool {
        self.attribute(name).is_some()
    }

    /// All child nodes (lazy)
    pub fn child_nodes(&self) -> NodeList<'a> {
        let doc = self.0.doc;
        let id = self.0.id;
        let list = doc
            .element_memo(id)
            .child_nodes
            .get_or_init(|| LazyList::new(ChildCursor::for_element(doc, id, false)));
        NodeList::new(doc, list)
    }

    /// Element children only (lazy)
    pub fn children(&self) -> NodeList<'a> {
        let doc = self.0.doc;
        let id = self.0.id;
        let list = doc
            .element_memo(id)
            .children
            .get_or_init(|| LazyList::new(ChildCursor::for_element(doc, id, true)));
        NodeList::new(doc, list)
    }

    pub fn first_child(&self) -> Option<NodeRef<'a>> {
        let doc = self.0.doc;
        let first = self.0.id + 1;
        let record = doc.records().get(first as usize)?;
        (record.start() < self.0.record().end()).then(|| NodeRef::new(doc, first))
    }

    pub fn last_child(&self) -> Option<NodeRef<'a>> {
        let doc = self.0.doc;
        let id = self.0.id;
        let last = *doc
            .element_memo(id)
            .last_child
            .get_or_init(|| doc.last_child_id(Some(id)));
        self.0.wrap(last)
    }

    pub fn first_element_child(&self) -> Option<ElementRef<'a>> {
        self.children().first().and_then(|n| n.as_element())
    }

    pub fn last_element_child(&self) -> Option<ElementRef<'a>> {
        let mut current = self.last_child();
        while let Some(node) = current {
            if let Some(element) = node.as_element() {
                return Some(element);
            }
            current = node.previous_sibling();
        }
        None
    }

    /// Number of element children; forces the `children` list
    pub fn child_element_count(&self) -> usize {
        self.children().len()
    }

    pub fn next_element_sibling(&self) -> Option<ElementRef<'a>> {
        let doc = self.0.doc;
        doc.next_element_sibling_id(self.0.id)
            .map(|id| ElementRef::new(doc, id))
    }

    pub fn previous_element_sibling(&self) -> Option<ElementRef<'a>> {
        let doc = self.0.doc;
        doc.previous_element_sibling_id(self.0.id)
            .map(|id| ElementRef::new(doc, id))
    }
}

impl<'a> Deref for ElementRef<'a> {
    type Target = NodeRef<'a>;

    fn deref(&self) -> &NodeRef<'a> {
        &self.0
    }
}

impl<'a> From<ElementRef<'a>> for NodeRef<'a> {
    fn from(element: ElementRef<'a>) -> Self {
        element.0
    }
}

impl fmt::Debug for ElementRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Element")
            .field("index", &self.0.id)
            .field("tag_name", &self.tag_name())
            .field("span", &self.span())
            .finish()
    }
}

impl fmt::Display for ElementRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.fragment())
    }
}

// ============================================================================
// NodeList
// ============================================================================

/// Lazy view over a list of child nodes
///
/// `item`, `first`, `is_empty` and iteration pull only what they need.
/// `len`, `last`, `to_vec`, `reversed`, `last_index_of` and `find_last` force
/// the whole list.
#[derive(Clone, Copy)]
pub struct NodeList<'a> {
    doc: &'a Document,
    list: &'a LazyList<ChildCursor>,
}

impl<'a> NodeList<'a> {
    pub(crate) fn new(doc: &'a Document, list: &'a LazyList<ChildCursor>) -> Self {
        Self { doc, list }
    }

    pub fn item(&self, index: usize) -> Option<NodeRef<'a>> {
        self.list
            .get(self.doc, index)
            .map(|id| NodeRef::new(self.doc, id))
    }

    pub fn len(&self) -> usize {
        self.list.len(self.doc)
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty(self.doc)
    }

    pub fn first(&self) -> Option<NodeRef<'a>> {
        self.item(0)
    }

    pub fn last(&self) -> Option<NodeRef<'a>> {
        let last = match self.list.last_if_populated() {
            Some(last) => last,
            None => self.list.to_vec(self.doc).last().copied(),
        };
        last.map(|id| NodeRef::new(self.doc, id))
    }

    pub fn iter(&self) -> NodeListIter<'a> {
        NodeListIter {
            list: *self,
            next: 0,
        }
    }

    /// True if `node` is in this list; stops at the first match
    pub fn contains(&self, node: NodeRef<'_>) -> bool {
        self.index_of(node).is_some()
    }

    pub fn index_of(&self, node: NodeRef<'_>) -> Option<usize> {
        if !std::ptr::eq(self.doc, node.doc) {
            return None;
        }
        self.iter().position(|n| n.id == node.id)
    }

    pub fn last_index_of(&self, node: NodeRef<'_>) -> Option<usize> {
        if !std::ptr::eq(self.doc, node.doc) {
            return None;
        }
        let ids = self.list.to_vec(self.doc);
        ids.iter().rposition(|&id| id == node.id)
    }

    pub fn find_last(&self, mut predicate: impl FnMut(&NodeRef<'a>) -> bool) -> Option<NodeRef<'a>> {
        self.list
            .to_vec(self.doc)
            .into_iter()
            .rev()
            .map(|id| NodeRef::new(self.doc, id))
            .find(|node| predicate(node))
    }

    /// Nodes in `range`; pulls only up to `range.end`
    pub fn slice(&self, range: Range<usize>) -> Vec<NodeRef<'a>> {
        self.iter()
            .skip(range.start)
            .take(range.end.saturating_sub(range.start))
            .collect()
    }

    pub fn to_vec(&self) -> Vec<NodeRef<'a>> {
        self.list
            .to_vec(self.doc)
            .into_iter()
            .map(|id| NodeRef::new(self.doc, id))
            .collect()
    }

    pub fn reversed(&self) -> Vec<NodeRef<'a>> {
        let mut nodes = self.to_vec();
        nodes.reverse();
        nodes
    }

    /// Pre-order expansion: each node followed by its child nodes, down to
    /// `depth` levels below this list
    pub fn flatten(&self, depth: usize) -> Vec<NodeRef<'a>> {
        let mut out = Vec::new();
        let mut stack: Vec<(NodeListIter<'a>, usize)> = vec![(self.iter(), depth)];
        while let Some((iter, remaining)) = stack.last_mut() {
            let remaining = *remaining;
            let Some(node) = iter.next() else {
                stack.pop();
                continue;
            };
            out.push(node);
            if remaining > 0 {
                if let Some(element) = node.as_element() {
                    stack.push((element.child_nodes().iter(), remaining - 1));
                }
            }
        }
        out
    }

    #[inline]
    pub fn is_fully_populated(&self) -> bool {
        self.list.is_fully_populated()
    }

    pub fn materialized_len(&self) -> usize {
        self.list.materialized_len()
    }
}

impl<'a> IntoIterator for NodeList<'a> {
    type Item = NodeRef<'a>;
    type IntoIter = NodeListIter<'a>;

    fn into_iter(self) -> NodeListIter<'a> {
        self.iter()
    }
}

impl<'a> IntoIterator for &NodeList<'a> {
    type Item = NodeRef<'a>;
    type IntoIter = NodeListIter<'a>;

    fn into_iter(self) -> NodeListIter<'a> {
        self.iter()
    }
}

impl fmt::Debug for NodeList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NodeList")
            .field("materialized", &self.materialized_len())
            .field("complete", &self.is_fully_populated())
            .finish()
    }
}

/// Iterator over a `NodeList`, pulling one item at a time
#[derive(Clone)]
pub struct NodeListIter<'a> {
    list: NodeList<'a>,
    next: usize,
}

impl<'a> Iterator for NodeListIter<'a> {
    type Item = NodeRef<'a>;

    fn next(&mut self) -> Option<NodeRef<'a>> {
        let node = self.list.item(self.next)?;
        self.next += 1;
        Some(node)
    }
}

impl std::iter::FusedIterator for NodeListIter<'_> {}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::document::ParseOptions;

    fn parse(text: &str) -> Document {
        Document::parse(text, ParseOptions::XML).unwrap()
    }

    fn names<'a>(nodes: impl IntoIterator<Item = NodeRef<'a>>) -> Vec<&'a str> {
        nodes.into_iter().map(|n| n.node_name()).collect()
    }

    #[test]
    fn test_parent_and_children() {
        let doc = parse("<r><a>1</a><b><c/></b>t</r>");
        let root = doc.document_element().unwrap();
        assert_eq!(names(root.child_nodes()), vec!["a", "b", "#text"]);
        assert_eq!(names(root.children()), vec!["a", "b"]);

        let c = doc.node(4).unwrap();
        assert_eq!(c.node_name(), "c");
        assert_eq!(c.parent_element().unwrap().tag_name(), "b");
        assert_eq!(names(c.ancestors().map(NodeRef::from)), vec!["b", "r"]);
        assert!(root.parent_element().is_none());
    }

    #[test]
    fn test_siblings() {
        let doc = parse("<r>x<a/>y<b>z</b></r>");
        let root = doc.document_element().unwrap();
        let kids = root.child_nodes().to_vec();
        assert_eq!(kids.len(), 4);

        assert_eq!(kids[0].next_sibling(), Some(kids[1]));
        assert_eq!(kids[2].next_sibling(), Some(kids[3]));
        assert_eq!(kids[3].next_sibling(), None);
        assert_eq!(kids[3].previous_sibling(), Some(kids[2]));
        assert_eq!(kids[0].previous_sibling(), None);

        let a = kids[1].as_element().unwrap();
        let b = kids[3].as_element().unwrap();
        assert_eq!(a.next_element_sibling(), Some(b));
        assert_eq!(b.previous_element_sibling(), Some(a));
        assert_eq!(a.previous_element_sibling(), None);
    }

    #[test]
    fn test_previous_sibling_skips_subtree() {
        let doc = parse("<r><a><b><c/></b></a><d/></r>");
        let d = doc.node(4).unwrap();
        assert_eq!(d.node_name(), "d");
        assert_eq!(d.previous_sibling().unwrap().node_name(), "a");
    }

    #[test]
    fn test_first_and_last_child() {
        let doc = parse("<r><a><b/></a>tail</r><empty></empty>");
        let root = doc.document_element().unwrap();
        assert_eq!(root.first_child().unwrap().node_name(), "a");
        assert_eq!(root.last_child().unwrap().fragment(), "tail");
        assert_eq!(root.first_element_child().unwrap().tag_name(), "a");
        assert_eq!(root.last_element_child().unwrap().tag_name(), "a");

        let empty = root.next_element_sibling().unwrap();
        assert!(empty.first_child().is_none());
        assert!(empty.last_child().is_none());
        assert!(empty.child_nodes().is_empty());
        assert_eq!(doc.last_child().unwrap().node_name(), "empty");
    }

    #[test]
    fn test_lazy_child_access() {
        let doc = parse("<r><a/><b/><c/><d/></r>");
        let root = doc.document_element().unwrap();
        let children = root.children();
        assert_eq!(children.item(0).unwrap().node_name(), "a");
        assert_eq!(children.materialized_len(), 1);
        assert!(!children.is_fully_populated());
        assert_eq!(children.slice(1..3).len(), 2);
        assert_eq!(children.materialized_len(), 3);
        assert_eq!(children.last().unwrap().node_name(), "d");
        assert!(children.is_fully_populated());
        assert_eq!(children.item(4), None);
    }

    #[test]
    fn test_list_searches() {
        let doc = parse("<r><a/>t<b/></r>");
        let root = doc.document_element().unwrap();
        let nodes = root.child_nodes();
        let b = doc.node(3).unwrap();
        assert!(nodes.contains(b));
        assert_eq!(nodes.index_of(b), Some(2));
        assert_eq!(nodes.last_index_of(b), Some(2));
        assert!(!nodes.contains(root.as_node()));
        assert_eq!(
            nodes.find_last(|n| n.is_element()).map(|n| n.node_name()),
            Some("b")
        );
        assert_eq!(names(nodes.reversed()), vec!["b", "#text", "a"]);

        let other = parse("<r><a/>t<b/></r>");
        assert!(!nodes.contains(other.node(3).unwrap()));
    }

    #[test]
    fn test_flatten() {
        let doc = parse("<a><b><c/></b>x</a><d/>");
        assert_eq!(names(doc.child_nodes().flatten(0)), vec!["a", "d"]);
        assert_eq!(names(doc.child_nodes().flatten(1)), vec!["a", "b", "#text", "d"]);
        assert_eq!(
            names(doc.child_nodes().flatten(5)),
            vec!["a", "b", "c", "#text", "d"]
        );
    }

    #[test]
    fn test_text_content() {
        let doc = parse("<p>a<!--c-->b<i>&lt;c&gt;</i><?pi x?></p>");
        let p = doc.document_element().unwrap();
        assert_eq!(p.text_content(), "ab<c>");
        let comment = p.child_nodes().item(1).unwrap();
        assert_eq!(comment.kind(), NodeKind::Comment);
        assert_eq!(comment.text_content(), "c");
        assert_eq!(comment.node_value(), Some("c"));
    }

    #[test]
    fn test_processing_instruction_parts() {
        let doc = parse("<?xml version=\"1.0\"  ?>");
        let pi = doc.first_child().unwrap();
        assert_eq!(pi.kind(), NodeKind::ProcessingInstruction);
        assert_eq!(pi.target(), Some("xml"));
        assert_eq!(pi.data(), Some("version=\"1.0\""));
        assert_eq!(pi.node_name(), "xml");
        assert_eq!(pi.node_type(), 7);
        assert_eq!(pi.text_content(), "");
    }

    #[test]
    fn test_doctype_name() {
        let doc = parse("<!DOCTYPE html><html></html>");
        let doctype = doc.first_child().unwrap();
        assert_eq!(doctype.kind(), NodeKind::DocumentType);
        assert_eq!(doctype.doctype_name(), Some("html"));
        assert_eq!(doctype.node_value(), None);
        assert_eq!(doctype.node_type(), 10);
    }

    #[test]
    fn test_declaration_keyword() {
        let doc = parse("<!DOCTYPE html><!ENTITY foo \"bar\"><!EMPTY><r/>");
        let decls: Vec<_> = doc
            .nodes()
            .filter(|n| n.kind() == NodeKind::DocumentType)
            .collect();
        assert_eq!(decls.len(), 3);

        let keywords: Vec<_> = decls.iter().map(|n| n.declaration_keyword()).collect();
        assert_eq!(keywords, vec![Some("DOCTYPE"), Some("ENTITY"), Some("EMPTY")]);
        let names: Vec<_> = decls.iter().map(|n| n.doctype_name()).collect();
        assert_eq!(names, vec![Some("html"), Some("foo"), Some("")]);

        let r = doc.document_element().unwrap();
        assert_eq!(r.declaration_keyword(), None);
    }

    #[test]
    fn test_parent_memo_jump_matches_scan() {
        let doc = parse("<r><a><b/><c/></a><d><e/></d>text</r>");
        // memoize in document order so later scans can jump
        let jumped: Vec<_> = doc.nodes().map(|n| doc.parent_id(n.index())).collect();
        let fresh = parse("<r><a><b/><c/></a><d><e/></d>text</r>");
        // and in reverse order so every lookup is a plain scan
        let mut scanned: Vec<_> = (0..fresh.len() as NodeId)
            .rev()
            .map(|id| fresh.parent_id(id))
            .collect();
        scanned.reverse();
        assert_eq!(jumped, scanned);
        assert_eq!(jumped, vec![None, Some(0), Some(1), Some(1), Some(0), Some(4), Some(0)]);
    }
}
