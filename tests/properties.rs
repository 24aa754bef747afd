//! Property-based tests for the document model.
//!
//! Generates markup-like texts (well-formed pieces mixed with stray angle
//! brackets, entities, unterminated constructs and non-ASCII text) and checks
//! the structural guarantees every parse must uphold:
//! 1. Round trip: the document prints back to its input
//! 2. Tiling: top-level fragments cover the input without gaps or overlap
//! 3. Nesting: ranges are ordered and either disjoint or nested
//! 4. Containment parent: a node's parent is its nearest enclosing element
//! 5. Codec round trip: encode then decode yields the same records

use immudom::{Document, DomCodec, NodeKind, ParseOptions};
use proptest::prelude::*;

// -- Input Strategies --

/// Pieces that exercise every tokenizer rule and its fallbacks
fn piece_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("<a>".to_string()),
        Just("</a>".to_string()),
        Just("<b x=\"1\" y='2'>".to_string()),
        Just("</b>".to_string()),
        Just("<c/>".to_string()),
        Just("<br>".to_string()),
        Just("</zz>".to_string()),
        Just("<!--note-->".to_string()),
        Just("<?pi data?>".to_string()),
        Just("<!DOCTYPE html>".to_string()),
        Just("<![CDATA[a<b]]>".to_string()),
        Just("&amp;&lt;&#65;&nbsp;".to_string()),
        Just("<".to_string()),
        Just(">".to_string()),
        Just("<!--".to_string()),
        Just("é ü".to_string()),
        prop::string::string_regex("[a-z <>/!?&;=\"-]{0,6}").expect("valid regex"),
    ]
}

fn markup_strategy() -> impl Strategy<Value = String> {
    prop::collection::vec(piece_strategy(), 0..32).prop_map(|pieces| pieces.concat())
}

fn parse(text: &str) -> Document {
    Document::parse(text, ParseOptions::XML).unwrap()
}

// -- Properties --

proptest! {
    #![proptest_config(ProptestConfig { cases: 256, ..ProptestConfig::default() })]

    #[test]
    fn round_trip_markup(text in markup_strategy()) {
        prop_assert_eq!(parse(&text).to_string(), text);
    }

    #[test]
    fn round_trip_arbitrary(text in any::<String>()) {
        prop_assert_eq!(parse(&text).to_string(), text);
    }

    #[test]
    fn top_level_tiles_input(text in markup_strategy()) {
        let doc = parse(&text);
        let mut covered = 0;
        for node in doc.child_nodes() {
            prop_assert_eq!(node.start_offset(), covered);
            prop_assert!(node.end_offset() > node.start_offset());
            covered = node.end_offset();
        }
        prop_assert_eq!(covered, text.len());
    }

    #[test]
    fn ranges_ordered_and_nested(text in markup_strategy()) {
        let doc = parse(&text);
        let records = doc.records();
        for pair in records.windows(2) {
            prop_assert!(pair[0].start() < pair[1].start());
        }
        for (i, a) in records.iter().enumerate() {
            for b in &records[i + 1..] {
                let disjoint = b.start() >= a.end();
                let nested = b.end() <= a.end();
                prop_assert!(disjoint || nested, "{:?} overlaps {:?}", a.span, b.span);
                // only elements can contain other nodes
                prop_assert!(disjoint || a.kind == NodeKind::Element);
            }
        }
    }

    #[test]
    fn siblings_are_disjoint(text in markup_strategy()) {
        let doc = parse(&text);
        for node in doc.nodes() {
            let Some(element) = node.as_element() else { continue };
            let children = element.child_nodes().to_vec();
            for pair in children.windows(2) {
                prop_assert!(pair[0].end_offset() <= pair[1].start_offset());
                prop_assert_eq!(pair[0].next_sibling(), Some(pair[1]));
                prop_assert_eq!(pair[1].previous_sibling(), Some(pair[0]));
            }
            for child in &children {
                prop_assert!(child.start_offset() >= element.start_offset());
                prop_assert!(child.end_offset() <= element.end_offset());
            }
            prop_assert_eq!(element.last_child(), children.last().copied());
        }
    }

    #[test]
    fn parent_is_nearest_enclosing_element(text in markup_strategy()) {
        let doc = parse(&text);
        let records = doc.records();
        for node in doc.nodes() {
            let index = node.index() as usize;
            let expected = records[..index]
                .iter()
                .rposition(|r| r.kind == NodeKind::Element && r.end() > records[index].start());
            let actual = node.parent_element().map(|e| e.index() as usize);
            prop_assert_eq!(actual, expected);
        }
    }

    #[test]
    fn codec_round_trip(text in markup_strategy(), html in any::<bool>()) {
        let doc = Document::parse(text.as_str(), ParseOptions { is_html: html }).unwrap();
        let codec = DomCodec::default();
        let bytes = codec.encode_document(&doc).unwrap();
        let back = codec.decode_document(&bytes).unwrap();
        prop_assert_eq!(back.source(), doc.source());
        prop_assert_eq!(back.records(), doc.records());
        prop_assert_eq!(back.options(), doc.options());
    }
}
