//! Node records
//!
//! Every node is a compact record in the document's flat array. The position
//! in that array is the node's identity; relationships are derived from spans.

use super::span::Span;

/// Compact node identifier (index into the document's node array)
pub type NodeId = u32;

/// The closed set of node variants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    Element,
    Text,
    Comment,
    ProcessingInstruction,
    DocumentType,
}

impl NodeKind {
    /// DOM `nodeType` code
    pub const fn node_type(self) -> u16 {
        match self {
            NodeKind::Element => 1,
            NodeKind::Text => 3,
            NodeKind::ProcessingInstruction => 7,
            NodeKind::Comment => 8,
            NodeKind::DocumentType => 10,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            NodeKind::Element => "Element",
            NodeKind::Text => "Text",
            NodeKind::Comment => "Comment",
            NodeKind::ProcessingInstruction => "ProcessingInstruction",
            NodeKind::DocumentType => "DocumentType",
        }
    }
}

/// A node in the flat array
///
/// Size: 20 bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NodeRecord {
    /// Variant of this node
    pub kind: NodeKind,
    /// Range of the node in the source text
    pub span: Span,
    /// Tag name (elements only, empty otherwise)
    pub name: Span,
}

impl NodeRecord {
    /// Create an element record; its span is extended when it is finalized
    pub fn element(span: Span, name: Span) -> Self {
        NodeRecord {
            kind: NodeKind::Element,
            span,
            name,
        }
    }

    /// Create a record for any non-element variant
    pub fn leaf(kind: NodeKind, span: Span) -> Self {
        debug_assert!(kind != NodeKind::Element);
        NodeRecord {
            kind,
            span,
            name: Span::empty(),
        }
    }

    #[inline]
    pub fn is_element(&self) -> bool {
        self.kind == NodeKind::Element
    }

    #[inline]
    pub fn start(&self) -> u32 {
        self.span.start
    }

    #[inline]
    pub fn end(&self) -> u32 {
        self.span.end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_types() {
        assert_eq!(NodeKind::Element.node_type(), 1);
        assert_eq!(NodeKind::Text.node_type(), 3);
        assert_eq!(NodeKind::ProcessingInstruction.node_type(), 7);
        assert_eq!(NodeKind::Comment.node_type(), 8);
        assert_eq!(NodeKind::DocumentType.node_type(), 10);
    }

    #[test]
    fn test_record_creation() {
        let elem = NodeRecord::element(Span::new(0, 3), Span::new(1, 2));
        assert!(elem.is_element());
        assert_eq!(elem.start(), 0);
        assert_eq!(elem.end(), 3);

        let text = NodeRecord::leaf(NodeKind::Text, Span::new(3, 5));
        assert!(!text.is_element());
        assert!(text.name.is_empty());
    }
}
