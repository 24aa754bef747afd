//! Scenario tests for parsing and navigating documents.

use immudom::{
    parse_html, parse_xml, Dialect, Document, DomCodec, DomError, DomParser, NodeKind,
    ParseOptions,
};
use pretty_assertions::assert_eq;

fn kinds(doc: &Document) -> Vec<(NodeKind, &str)> {
    doc.nodes().map(|n| (n.kind(), n.fragment())).collect()
}

#[test]
fn implicit_closure_of_inner_element() {
    let doc = parse_xml("<a><b></a>").unwrap();
    assert_eq!(
        kinds(&doc),
        vec![(NodeKind::Element, "<a><b></a>"), (NodeKind::Element, "<b>")]
    );
    let a = doc.document_element().unwrap();
    let b = a.first_element_child().unwrap();
    assert_eq!(b.tag_name(), "b");
    assert_eq!(b.parent_element(), Some(a));
    assert!(b.child_nodes().is_empty());
}

#[test]
fn entity_decoding_in_text() {
    let doc = parse_xml("<a>&amp;&lt;</a>").unwrap();
    let a = doc.document_element().unwrap();
    assert_eq!(a.text_content(), "&<");
    let text = a.first_child().unwrap();
    assert_eq!(text.kind(), NodeKind::Text);
    assert_eq!(text.node_value(), Some("&amp;&lt;"));
    assert_eq!(text.text_content(), "&<");
}

#[test]
fn plain_text_document() {
    let doc = parse_xml("just some words").unwrap();
    assert_eq!(kinds(&doc), vec![(NodeKind::Text, "just some words")]);
    assert!(doc.document_element().is_none());
    assert!(doc.children().is_empty());
}

#[test]
fn children_item_is_lazy() {
    let doc = parse_xml("<r><a/><b/><c/><d/><e/></r>").unwrap();
    let root = doc.document_element().unwrap();
    let children = root.children();
    assert_eq!(children.item(0).unwrap().node_name(), "a");
    assert_eq!(children.materialized_len(), 1);
    assert!(!children.is_fully_populated());

    // the memoized list is shared by later calls
    assert_eq!(root.children().materialized_len(), 1);
    assert_eq!(root.child_element_count(), 5);
    assert!(root.children().is_fully_populated());
}

#[test]
fn self_closing_element() {
    let doc = parse_xml("<a/>").unwrap();
    assert_eq!(kinds(&doc), vec![(NodeKind::Element, "<a/>")]);
    let a = doc.document_element().unwrap();
    assert_eq!(a.tag_name(), "a");
    assert!(a.first_child().is_none());
    assert_eq!(a.text_content(), "");
}

#[test]
fn mixed_document_navigation() {
    let text = "<!DOCTYPE note>\n<note id=\"n1\">\n  <to>Tove</to>\n  <!-- sender -->\n  <from>Jani</from>\n</note>\n";
    let doc = parse_xml(text).unwrap();
    assert_eq!(doc.to_string(), text);

    let doctype = doc.first_child().unwrap();
    assert_eq!(doctype.doctype_name(), Some("note"));

    let note = doc.document_element().unwrap();
    assert_eq!(note.get_attribute("id"), Some("n1"));
    let tags: Vec<_> = note.children().iter().map(|n| n.node_name()).collect();
    assert_eq!(tags, vec!["to", "from"]);

    let to = note.first_element_child().unwrap();
    let from = to.next_element_sibling().unwrap();
    assert_eq!(from.text_content(), "Jani");
    assert_eq!(from.previous_element_sibling(), Some(to));

    let comment = to.next_sibling().and_then(|ws| ws.next_sibling()).unwrap();
    assert_eq!(comment.kind(), NodeKind::Comment);
    assert_eq!(comment.comment_body(), Some(" sender "));
    assert_eq!(note.text_content(), "\n  Tove\n  \n  Jani\n");
}

#[test]
fn stray_and_unclosed_tags() {
    let doc = parse_xml("<p>one</q>two<i>three").unwrap();
    assert_eq!(
        kinds(&doc),
        vec![
            (NodeKind::Element, "<p>one</q>two<i>three"),
            (NodeKind::Text, "one"),
            (NodeKind::Text, "</q>"),
            (NodeKind::Text, "two"),
            (NodeKind::Element, "<i>three"),
            (NodeKind::Text, "three"),
        ]
    );
    let p = doc.document_element().unwrap();
    assert_eq!(p.text_content(), "one</q>twothree");
}

#[test]
fn unmatched_markup_becomes_text() {
    let doc = parse_xml("a < b <c").unwrap();
    assert_eq!(
        kinds(&doc),
        vec![(NodeKind::Text, "a < b "), (NodeKind::Text, "<c")]
    );
    assert_eq!(doc.text_content(), "a < b <c");

    // a gap inside an element is a separate child
    let doc = parse_xml("<p>x<y<z/></p>").unwrap();
    let p = doc.document_element().unwrap();
    let fragments: Vec<_> = p.child_nodes().iter().map(|n| n.fragment()).collect();
    assert_eq!(fragments, vec!["x", "<y", "<z/>"]);
}

#[test]
fn cdata_is_text() {
    let doc = parse_xml("<x><![CDATA[<not> &amp; markup]]></x>").unwrap();
    let x = doc.document_element().unwrap();
    assert_eq!(x.child_nodes().len(), 1);
    assert_eq!(x.text_content(), "<not> &amp; markup");
}

#[test]
fn html_entities_only_in_html_mode() {
    let text = "<p>&copy;&nbsp;&hellip;&bogus;</p>";
    let html = parse_html(text).unwrap();
    assert_eq!(html.text_content(), "\u{a9}\u{a0}\u{2026}&bogus;");
    let xml = parse_xml(text).unwrap();
    assert_eq!(xml.text_content(), "&copy;&nbsp;&hellip;&bogus;");
}

#[test]
fn numeric_references() {
    let doc = parse_xml("<n>&#72;&#x69;&#X21;&#1114112;&#xD800;</n>").unwrap();
    assert_eq!(doc.text_content(), "Hi!&#1114112;&#xD800;");
}

#[test]
fn mime_dispatch_table() {
    let parser = DomParser::default();
    let cases = [
        ("text/html", Some(true)),
        ("application/xml", Some(false)),
        ("text/xml", Some(false)),
        ("application/xhtml+xml", Some(false)),
        ("image/svg+xml", Some(false)),
        ("application/rss+xml", Some(false)),
        ("text/plain", None),
        ("application/json", None),
    ];
    for (mime, expected) in cases {
        let actual = parser
            .parse_from_string("<a/>", mime)
            .ok()
            .map(|doc| doc.options().is_html);
        assert_eq!(actual, expected, "{mime}");
    }
    assert_eq!(Dialect::from_mime("text/html"), Some(Dialect::Html));
    assert!(matches!(
        parser.parse_from_string("", "text/csv"),
        Err(DomError::UnsupportedMimeType(m)) if m == "text/csv"
    ));
}

#[test]
fn serialization_round_trip() {
    let text = "<?xml version=\"1.0\"?><r><a k='v'>x&amp;y</a><!--c--><b/></r>";
    let doc = parse_xml(text).unwrap();
    // warm some memo cells; they must not leak into the wire form
    let _ = doc.document_element().unwrap().children().len();

    let codec = DomCodec::default();
    let back = codec.decode_document(&codec.encode_document(&doc).unwrap()).unwrap();
    assert!(!back.child_nodes().is_fully_populated());
    assert_eq!(back.to_string(), text);
    assert_eq!(back.records(), doc.records());
    let a = back.document_element().unwrap().first_element_child().unwrap();
    assert_eq!(a.get_attribute("k"), Some("v"));
    assert_eq!(a.text_content(), "x&y");
}

#[test]
fn concurrent_readers_agree() {
    let mut text = String::from("<root>");
    for i in 0..200 {
        text.push_str(&format!("<item n=\"{i}\">value {i}<sub/></item>"));
    }
    text.push_str("</root>");
    let doc = Document::parse(text, ParseOptions::XML).unwrap();

    let results: Vec<Vec<(String, usize, Option<String>)>> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| {
                scope.spawn(|| {
                    let root = doc.document_element().unwrap();
                    root.children()
                        .iter()
                        .map(|item| {
                            let element = item.as_element().unwrap();
                            (
                                element.text_content().to_string(),
                                element.child_nodes().len(),
                                element.get_attribute("n").map(str::to_string),
                            )
                        })
                        .collect::<Vec<_>>()
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert_eq!(results[0].len(), 200);
    assert_eq!(results[0][7], ("value 7".to_string(), 2, Some("7".to_string())));
    for other in &results[1..] {
        assert_eq!(other, &results[0]);
    }
}
