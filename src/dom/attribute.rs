//! Attribute model
//!
//! Attributes are not nodes. They are derived once per element by running the
//! attribute tokenizer over the open tag; the resulting spans are kept in a
//! table inside the element's memo cells together with a name index and a
//! decoded-value cache per attribute.

use super::document::Document;
use super::navigate::ElementRef;
use super::node::NodeId;
use super::span::Span;
use crate::core::attributes::{parse_attributes, RawAttribute};
use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::OnceLock;

/// DOM `nodeType` code of attributes
pub const ATTRIBUTE_NODE_TYPE: u16 = 2;

pub(crate) struct AttributeEntry {
    raw: RawAttribute,
    value: OnceLock<Option<Box<str>>>,
}

/// Parsed attributes of one element
pub(crate) struct AttributeTable {
    entries: Box<[AttributeEntry]>,
    /// Name to index of its last occurrence
    by_name: OnceLock<FxHashMap<Box<str>, u32>>,
}

impl AttributeTable {
    fn build(doc: &Document, element: NodeId) -> Self {
        let record = doc.record(element);
        let bytes = doc.source().as_bytes();
        let from = record.name.end as usize;
        let tag_end = record.end() as usize;
        // the open tag ends at the first '>' after its name
        let to = memchr::memchr(b'>', &bytes[from..tag_end]).map_or(tag_end, |gt| from + gt);
        let entries = parse_attributes(&bytes[from..to], from)
            .into_iter()
            .map(|raw| AttributeEntry {
                raw,
                value: OnceLock::new(),
            })
            .collect();
        AttributeTable {
            entries,
            by_name: OnceLock::new(),
        }
    }

    fn index_of(&self, source: &str, name: &str) -> Option<u32> {
        // short lists are faster to scan than to hash
        if self.entries.len() <= 4 {
            return self
                .entries
                .iter()
                .rposition(|entry| entry.raw.name.slice(source) == name)
                .map(|i| i as u32);
        }
        let map = self.by_name.get_or_init(|| {
            let mut map = FxHashMap::default();
            map.reserve(self.entries.len());
            for (i, entry) in self.entries.iter().enumerate() {
                map.insert(entry.raw.name.slice(source).into(), i as u32);
            }
            map
        });
        map.get(name).copied()
    }
}

impl Document {
    pub(crate) fn attribute_table(&self, element: NodeId) -> &AttributeTable {
        self.element_memo(element)
            .attributes
            .get_or_init(|| AttributeTable::build(self, element))
    }
}

/// The attributes of one element, in source order
#[derive(Clone, Copy)]
pub struct Attributes<'a> {
    doc: &'a Document,
    element: NodeId,
    table: &'a AttributeTable,
}

impl<'a> Attributes<'a> {
    pub(crate) fn new(doc: &'a Document, element: NodeId) -> Self {
        Self {
            doc,
            element,
            table: doc.attribute_table(element),
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.table.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.table.entries.is_empty()
    }

    /// Attribute at `index` in source order
    pub fn item(&self, index: usize) -> Option<AttributeRef<'a>> {
        (index < self.len()).then(|| AttributeRef {
            attrs: *self,
            index: index as u32,
        })
    }

    /// Attribute by name; the last occurrence wins on duplicates
    pub fn get(&self, name: &str) -> Option<AttributeRef<'a>> {
        let index = self.table.index_of(self.doc.source(), name)?;
        self.item(index as usize)
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = AttributeRef<'a>> + 'a {
        let attrs = *self;
        (0..self.len() as u32).map(move |index| AttributeRef { attrs, index })
    }
}

impl fmt::Debug for Attributes<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(self.iter().map(|attr| (attr.name(), attr.value())))
            .finish()
    }
}

/// Handle to one attribute
#[derive(Clone, Copy)]
pub struct AttributeRef<'a> {
    attrs: Attributes<'a>,
    index: u32,
}

impl<'a> AttributeRef<'a> {
    #[inline]
    fn entry(&self) -> &'a AttributeEntry {
        &self.attrs.table.entries[self.index as usize]
    }

    #[inline]
    fn source(&self) -> &'a str {
        self.attrs.doc.source()
    }

    pub fn name(&self) -> &'a str {
        self.entry().raw.name.slice(self.source())
    }

    /// Decoded value; empty for bare attributes like `disabled`
    pub fn value(&self) -> &'a str {
        let entry = self.entry();
        match entry.raw.value {
            Some(span) => self
                .attrs
                .doc
                .cached_decode(&entry.value, span.slice(self.source())),
            None => "",
        }
    }

    /// DOM `nodeValue`; always the decoded value
    #[inline]
    pub fn node_value(&self) -> Option<&'a str> {
        Some(self.value())
    }

    /// DOM `textContent`; same as [`value`](Self::value)
    #[inline]
    pub fn text_content(&self) -> &'a str {
        self.value()
    }

    /// Value exactly as written, without quotes; `None` for bare attributes
    pub fn raw_value(&self) -> Option<&'a str> {
        self.entry().raw.value.map(|span| span.slice(self.source()))
    }

    /// Extent of `name="value"` in the source
    #[inline]
    pub fn span(&self) -> Span {
        self.entry().raw.span
    }

    pub fn fragment(&self) -> &'a str {
        self.span().slice(self.source())
    }

    pub fn owner_element(&self) -> ElementRef<'a> {
        ElementRef::new(self.attrs.doc, self.attrs.element)
    }

    /// Position among the owner's attributes
    #[inline]
    pub fn attribute_index(&self) -> usize {
        self.index as usize
    }

    pub fn next_attribute(&self) -> Option<AttributeRef<'a>> {
        self.attrs.item(self.index as usize + 1)
    }

    pub fn previous_attribute(&self) -> Option<AttributeRef<'a>> {
        let index = (self.index as usize).checked_sub(1)?;
        self.attrs.item(index)
    }

    #[inline]
    pub fn node_type(&self) -> u16 {
        ATTRIBUTE_NODE_TYPE
    }
}

impl PartialEq for AttributeRef<'_> {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::eq(self.attrs.doc, other.attrs.doc)
            && self.attrs.element == other.attrs.element
            && self.index == other.index
    }
}

impl Eq for AttributeRef<'_> {}

impl fmt::Debug for AttributeRef<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Attribute")
            .field("name", &self.name())
            .field("value", &self.value())
            .field("span", &self.span())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::document::ParseOptions;

    fn root(text: &str, options: ParseOptions) -> Document {
        Document::parse(text, options).unwrap()
    }

    #[test]
    fn test_all_attributes_parsed() {
        let doc = root("<a x=\"1\" y='2' z=3 flag/>", ParseOptions::XML);
        let a = doc.document_element().unwrap();
        let attrs = a.attributes();
        assert_eq!(attrs.len(), 4);
        let pairs: Vec<_> = attrs.iter().map(|at| (at.name(), at.value())).collect();
        assert_eq!(pairs, vec![("x", "1"), ("y", "2"), ("z", "3"), ("flag", "")]);
        assert_eq!(a.get_attribute("z"), Some("3"));
        assert_eq!(a.get_attribute("missing"), None);
        assert!(a.has_attribute("flag"));
        assert_eq!(attrs.item(3).unwrap().raw_value(), None);
    }

    #[test]
    fn test_node_value_and_text_content() {
        let doc = root("<a t=\"x &amp; y\" flag></a>", ParseOptions::XML);
        let a = doc.document_element().unwrap();
        let t = a.attribute("t").unwrap();
        assert_eq!(t.node_value(), Some("x & y"));
        assert_eq!(t.text_content(), "x & y");
        assert_eq!(t.text_content(), t.value());

        let flag = a.attribute("flag").unwrap();
        assert_eq!(flag.node_value(), Some(""));
        assert_eq!(flag.text_content(), "");
    }

    #[test]
    fn test_value_decoding() {
        let doc = root("<a t=\"&lt;b&gt; &amp; &#65;&#x42;\" u=\"plain\"></a>", ParseOptions::XML);
        let a = doc.document_element().unwrap();
        assert_eq!(a.get_attribute("t"), Some("<b> & AB"));
        assert_eq!(a.attribute("t").unwrap().raw_value(), Some("&lt;b&gt; &amp; &#65;&#x42;"));
        assert_eq!(a.get_attribute("u"), Some("plain"));
    }

    #[test]
    fn test_duplicate_names_last_wins() {
        let doc = root("<a k=\"1\" k=\"2\"/>", ParseOptions::XML);
        let a = doc.document_element().unwrap();
        assert_eq!(a.get_attribute("k"), Some("2"));
        assert_eq!(a.attribute("k").unwrap().attribute_index(), 1);

        let many = root("<a a=1 b=2 c=3 d=4 e=5 a=6/>", ParseOptions::XML);
        let a = many.document_element().unwrap();
        assert_eq!(a.get_attribute("a"), Some("6"));
        assert_eq!(a.get_attribute("e"), Some("5"));
        assert_eq!(a.get_attribute("f"), None);
    }

    #[test]
    fn test_navigation_and_spans() {
        let text = "<el one=\"1\" two=\"2\">body</el>";
        let doc = root(text, ParseOptions::XML);
        let el = doc.document_element().unwrap();
        let one = el.attributes().item(0).unwrap();
        let two = one.next_attribute().unwrap();
        assert_eq!(two.name(), "two");
        assert_eq!(two.previous_attribute(), Some(one));
        assert!(one.previous_attribute().is_none());
        assert!(two.next_attribute().is_none());
        assert_eq!(one.fragment(), "one=\"1\"");
        assert_eq!(one.span(), Span::new(4, 11));
        assert_eq!(one.owner_element(), el);
        assert_eq!(one.node_type(), 2);
    }

    #[test]
    fn test_no_attributes_and_body_ignored() {
        let doc = root("<p>x=\"1\"</p>", ParseOptions::XML);
        let p = doc.document_element().unwrap();
        assert!(p.attributes().is_empty());
    }

    #[test]
    fn test_html_entities_in_values() {
        let text = "<a title=\"&copy; 2024\"/>";
        let html = root(text, ParseOptions::HTML);
        assert_eq!(html.document_element().unwrap().get_attribute("title"), Some("\u{a9} 2024"));
        let xml = root(text, ParseOptions::XML);
        assert_eq!(xml.document_element().unwrap().get_attribute("title"), Some("&copy; 2024"));
    }
}
