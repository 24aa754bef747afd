//! Binary serialization adapter
//!
//! A document travels as a tagged envelope holding its options and one tagged
//! snapshot `{index, start_offset, fragment}` per node. Tags are allocated
//! sequentially from a configurable base so they can sit alongside other
//! extension types in the same registry:
//!
//! | offset | kind                  |
//! |--------|-----------------------|
//! | +0     | Document              |
//! | +1     | Comment               |
//! | +2     | DocumentType          |
//! | +3     | Element               |
//! | +4     | ProcessingInstruction |
//! | +5     | Text                  |
//!
//! Decoding rebuilds the source text from the top-level fragments and checks
//! every other fragment against it. Memo cells are never serialized; a decoded
//! document starts cold.

use crate::core::scanner::is_name_char;
use crate::dom::{Document, NodeKind, NodeRecord, ParseOptions, Span};
use crate::error::{DomError, Result};
use serde::{Deserialize, Serialize};

/// Default first tag of the block
pub const DEFAULT_BASE_TAG: u64 = 40501;

/// Kinds that own a wire tag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WireKind {
    Document,
    Comment,
    DocumentType,
    Element,
    ProcessingInstruction,
    Text,
}

impl WireKind {
    pub const ALL: [WireKind; 6] = [
        WireKind::Document,
        WireKind::Comment,
        WireKind::DocumentType,
        WireKind::Element,
        WireKind::ProcessingInstruction,
        WireKind::Text,
    ];

    /// Offset of this kind's tag from the base tag
    pub const fn offset(self) -> u64 {
        match self {
            WireKind::Document => 0,
            WireKind::Comment => 1,
            WireKind::DocumentType => 2,
            WireKind::Element => 3,
            WireKind::ProcessingInstruction => 4,
            WireKind::Text => 5,
        }
    }

    fn from_node_kind(kind: NodeKind) -> Self {
        match kind {
            NodeKind::Element => WireKind::Element,
            NodeKind::Text => WireKind::Text,
            NodeKind::Comment => WireKind::Comment,
            NodeKind::ProcessingInstruction => WireKind::ProcessingInstruction,
            NodeKind::DocumentType => WireKind::DocumentType,
        }
    }
}

/// A value paired with its extension tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tagged<T> {
    pub tag: u64,
    pub value: T,
}

/// Wire form of one node
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeSnapshot {
    pub index: u32,
    pub start_offset: u32,
    pub fragment: String,
}

/// Wire form of a document
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSnapshot {
    pub options: ParseOptions,
    pub nodes: Vec<Tagged<NodeSnapshot>>,
}

/// Encoder/decoder for documents, bound to one block of tags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DomCodec {
    base_tag: u64,
}

impl Default for DomCodec {
    fn default() -> Self {
        Self::with_base_tag(DEFAULT_BASE_TAG)
    }
}

impl DomCodec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_base_tag(base_tag: u64) -> Self {
        Self { base_tag }
    }

    #[inline]
    pub fn base_tag(&self) -> u64 {
        self.base_tag
    }

    #[inline]
    pub fn tag_for(&self, kind: WireKind) -> u64 {
        self.base_tag.wrapping_add(kind.offset())
    }

    /// Kind registered under `tag`
    ///
    /// # Errors
    /// `DomError::UnknownTag` when `tag` is outside this codec's block.
    pub fn kind_for(&self, tag: u64) -> Result<WireKind> {
        let offset = tag.wrapping_sub(self.base_tag);
        WireKind::ALL
            .into_iter()
            .find(|kind| kind.offset() == offset)
            .ok_or(DomError::UnknownTag(tag))
    }

    /// Every registered `(kind, tag)` pair, in tag order
    pub fn tags(&self) -> impl Iterator<Item = (WireKind, u64)> + '_ {
        WireKind::ALL
            .into_iter()
            .map(move |kind| (kind, self.tag_for(kind)))
    }

    /// Wire form of `doc`
    pub fn snapshot(&self, doc: &Document) -> Tagged<DocumentSnapshot> {
        let nodes = doc
            .nodes()
            .map(|node| Tagged {
                tag: self.tag_for(WireKind::from_node_kind(node.kind())),
                value: NodeSnapshot {
                    index: node.index(),
                    start_offset: node.start_offset() as u32,
                    fragment: node.fragment().to_owned(),
                },
            })
            .collect();
        Tagged {
            tag: self.tag_for(WireKind::Document),
            value: DocumentSnapshot {
                options: doc.options(),
                nodes,
            },
        }
    }

    /// Rebuild a document from its wire form
    pub fn restore(&self, snapshot: Tagged<DocumentSnapshot>) -> Result<Document> {
        if self.kind_for(snapshot.tag)? != WireKind::Document {
            return Err(DomError::InvalidSnapshot(format!(
                "tag {} is not a document",
                snapshot.tag
            )));
        }
        let DocumentSnapshot { options, nodes } = snapshot.value;

        let mut records = Vec::with_capacity(nodes.len());
        for (position, node) in nodes.iter().enumerate() {
            if node.value.index as usize != position {
                return Err(DomError::InvalidSnapshot(format!(
                    "node at position {position} claims index {}",
                    node.value.index
                )));
            }
            let record = match self.kind_for(node.tag)? {
                WireKind::Document => {
                    return Err(DomError::InvalidSnapshot(format!(
                        "document nested at position {position}"
                    )))
                }
                WireKind::Element => restore_element(&node.value)?,
                WireKind::Text => restore_leaf(NodeKind::Text, &node.value)?,
                WireKind::Comment => restore_leaf(NodeKind::Comment, &node.value)?,
                WireKind::ProcessingInstruction => {
                    restore_leaf(NodeKind::ProcessingInstruction, &node.value)?
                }
                WireKind::DocumentType => restore_leaf(NodeKind::DocumentType, &node.value)?,
            };
            records.push(record);
        }

        let text = rebuild_source(&nodes)?;
        for (position, node) in nodes.iter().enumerate() {
            let span = records[position].span;
            if text.get(span.start as usize..span.end as usize) != Some(node.value.fragment.as_str()) {
                return Err(DomError::InvalidSnapshot(format!(
                    "fragment of node {position} does not match the document text"
                )));
            }
        }
        tracing::debug!(nodes = records.len(), len = text.len(), "restored document");
        Document::from_parts(text.into(), records, options)
    }

    pub fn encode_document(&self, doc: &Document) -> Result<Vec<u8>> {
        Ok(bincode::serialize(&self.snapshot(doc))?)
    }

    pub fn decode_document(&self, bytes: &[u8]) -> Result<Document> {
        let snapshot: Tagged<DocumentSnapshot> = bincode::deserialize(bytes)?;
        self.restore(snapshot)
    }
}

fn node_span(node: &NodeSnapshot) -> Result<Span> {
    let end = (node.start_offset as usize)
        .checked_add(node.fragment.len())
        .filter(|&end| end <= u32::MAX as usize)
        .ok_or_else(|| {
            DomError::InvalidSnapshot(format!("node {} range overflows u32 offsets", node.index))
        })?;
    Ok(Span::from_range(node.start_offset as usize, end))
}

fn restore_leaf(kind: NodeKind, node: &NodeSnapshot) -> Result<NodeRecord> {
    Ok(NodeRecord::leaf(kind, node_span(node)?))
}

/// Elements carry their tag name span, recomputed from the open tag
fn restore_element(node: &NodeSnapshot) -> Result<NodeRecord> {
    let span = node_span(node)?;
    let bytes = node.fragment.as_bytes();
    if bytes.first() != Some(&b'<') {
        return Err(DomError::InvalidSnapshot(format!(
            "element {} does not start with '<'",
            node.index
        )));
    }
    let name_len = bytes[1..].iter().take_while(|&&b| is_name_char(b)).count();
    if name_len == 0 {
        return Err(DomError::InvalidSnapshot(format!(
            "element {} has no tag name",
            node.index
        )));
    }
    let name_start = span.start as usize + 1;
    Ok(NodeRecord::element(
        span,
        Span::from_range(name_start, name_start + name_len),
    ))
}

/// Concatenate the top-level fragments, which tile the source
fn rebuild_source(nodes: &[Tagged<NodeSnapshot>]) -> Result<String> {
    let mut text = String::new();
    for node in nodes {
        let start = node.value.start_offset as usize;
        if start == text.len() {
            text.push_str(&node.value.fragment);
        } else if start > text.len() {
            return Err(DomError::InvalidSnapshot(format!(
                "gap before node {} at offset {start}",
                node.value.index
            )));
        }
    }
    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(text: &str) -> Document {
        Document::parse(text, ParseOptions::XML).unwrap()
    }

    #[test]
    fn test_tag_block() {
        let codec = DomCodec::default();
        let tags: Vec<_> = codec.tags().collect();
        assert_eq!(tags[0], (WireKind::Document, 40501));
        assert_eq!(tags[3], (WireKind::Element, 40504));
        assert_eq!(tags[5], (WireKind::Text, 40506));
        assert_eq!(codec.kind_for(40502).unwrap(), WireKind::Comment);
        assert!(matches!(codec.kind_for(40507), Err(DomError::UnknownTag(40507))));
        assert!(matches!(codec.kind_for(40500), Err(DomError::UnknownTag(40500))));
    }

    #[test]
    fn test_round_trip() {
        let text = "<!DOCTYPE x><?pi d?><r a=\"1\"><!--c--><b>t&amp;</b></r>tail";
        let doc = Document::parse(text, ParseOptions::HTML).unwrap();
        let codec = DomCodec::new();
        let bytes = codec.encode_document(&doc).unwrap();
        let back = codec.decode_document(&bytes).unwrap();
        assert_eq!(back.source(), text);
        assert_eq!(back.records(), doc.records());
        assert_eq!(back.options(), doc.options());
        assert_eq!(back.document_element().unwrap().get_attribute("a"), Some("1"));
        assert_eq!(back.to_string(), doc.to_string());
    }

    #[test]
    fn test_custom_base_tag() {
        let doc = parse("<a/>");
        let codec = DomCodec::with_base_tag(7);
        let snapshot = codec.snapshot(&doc);
        assert_eq!(snapshot.tag, 7);
        assert_eq!(snapshot.value.nodes[0].tag, 10);

        let bytes = codec.encode_document(&doc).unwrap();
        assert!(matches!(
            DomCodec::default().decode_document(&bytes),
            Err(DomError::UnknownTag(7))
        ));
    }

    #[test]
    fn test_fragment_mismatch_rejected() {
        let codec = DomCodec::default();
        let mut snapshot = codec.snapshot(&parse("<a>x</a>"));
        snapshot.value.nodes[1].value.fragment = "y".to_string();
        assert!(matches!(
            codec.restore(snapshot),
            Err(DomError::InvalidSnapshot(_))
        ));
    }

    #[test]
    fn test_offset_overflow_rejected() {
        let codec = DomCodec::default();
        let mut snapshot = codec.snapshot(&parse("<a>x</a>"));
        snapshot.value.nodes[1].value.start_offset = u32::MAX;
        match codec.restore(snapshot) {
            Err(DomError::InvalidSnapshot(message)) => assert!(message.contains("node 1")),
            other => panic!("expected InvalidSnapshot, got {other:?}"),
        }
    }

    #[test]
    fn test_unknown_node_tag_rejected() {
        let codec = DomCodec::default();
        let mut snapshot = codec.snapshot(&parse("<a>x</a>"));
        snapshot.value.nodes[1].tag = 99;
        assert!(matches!(codec.restore(snapshot), Err(DomError::UnknownTag(99))));
    }

    #[test]
    fn test_gap_rejected() {
        let codec = DomCodec::default();
        let mut snapshot = codec.snapshot(&parse("x<a/>"));
        snapshot.value.nodes.remove(0);
        snapshot.value.nodes[0].value.index = 0;
        assert!(matches!(
            codec.restore(snapshot),
            Err(DomError::InvalidSnapshot(_))
        ));
    }

    #[test]
    fn test_truncated_bytes() {
        let codec = DomCodec::default();
        let bytes = codec.encode_document(&parse("<a>x</a>")).unwrap();
        assert!(matches!(
            codec.decode_document(&bytes[..bytes.len() / 2]),
            Err(DomError::Codec(_))
        ));
    }

    #[test]
    fn test_empty_document() {
        let codec = DomCodec::default();
        let bytes = codec.encode_document(&parse("")).unwrap();
        let back = codec.decode_document(&bytes).unwrap();
        assert!(back.is_empty());
        assert_eq!(back.source(), "");
    }
}
