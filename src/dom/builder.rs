//! Tag-stack resolver
//!
//! Consumes tokens in order and appends node records to the flat array,
//! keeping a stack of open elements. Elements are the only records that
//! change after being pushed: their span grows when they are finalized.
//!
//! Recovery policy for a close tag:
//! - it matches an element somewhere on the stack: that element ends after
//!   the close tag, every element above it ends where the close tag starts,
//!   and all of them are popped
//! - it matches nothing: it becomes a Text node and the stack is untouched

use super::node::{NodeId, NodeKind, NodeRecord};
use super::span::Span;
use crate::core::tokenizer::{Token, TokenKind, Tokenizer};
use crate::error::Result;

/// Builder state for the flat node array
pub struct TreeBuilder<'a> {
    text: &'a str,
    nodes: Vec<NodeRecord>,
    /// Stack of open element indices
    stack: Vec<NodeId>,
}

impl<'a> TreeBuilder<'a> {
    /// Create a new builder for the given input
    pub fn new(text: &'a str) -> Self {
        // Roughly one node per 24 bytes of markup
        let estimated_nodes = (text.len() / 24).max(4);
        Self {
            text,
            nodes: Vec::with_capacity(estimated_nodes),
            stack: Vec::with_capacity(32),
        }
    }

    /// Feed one token
    pub fn push_token(&mut self, token: Token) {
        match token.kind {
            TokenKind::OpenTag { self_closing } => self.open_element(token, self_closing),
            TokenKind::CloseTag => self.close_element(token),
            TokenKind::Comment => self.push_leaf(NodeKind::Comment, token.span),
            TokenKind::ProcessingInstruction => {
                self.push_leaf(NodeKind::ProcessingInstruction, token.span)
            }
            TokenKind::Doctype => self.push_leaf(NodeKind::DocumentType, token.span),
            TokenKind::Text => self.push_leaf(NodeKind::Text, token.span),
        }
    }

    fn next_id(&self) -> NodeId {
        self.nodes.len() as NodeId
    }

    fn push_leaf(&mut self, kind: NodeKind, span: Span) {
        self.nodes.push(NodeRecord::leaf(kind, span));
    }

    fn open_element(&mut self, token: Token, self_closing: bool) {
        let id = self.next_id();
        self.nodes.push(NodeRecord::element(token.span, token.name));
        if !self_closing {
            self.stack.push(id);
        }
    }

    fn close_element(&mut self, token: Token) {
        let closing_name = token.name.slice(self.text);
        let matched = self
            .stack
            .iter()
            .rposition(|&id| self.nodes[id as usize].name.slice(self.text) == closing_name);

        let Some(depth) = matched else {
            tracing::trace!(
                offset = token.span.start,
                name = closing_name,
                "stray close tag degraded to text"
            );
            self.push_leaf(NodeKind::Text, token.span);
            return;
        };

        // close all unclosed elements between the top and the matched element
        for &open in &self.stack[depth + 1..] {
            let record = &mut self.nodes[open as usize];
            tracing::trace!(
                offset = record.span.start,
                closed_by = token.span.start,
                "element closed implicitly"
            );
            record.span.end = token.span.start;
        }
        let matched_id = self.stack[depth];
        self.nodes[matched_id as usize].span.end = token.span.end;
        self.stack.truncate(depth);
    }

    /// Finalize elements still open at end of input and return the records
    pub fn finish(mut self) -> Vec<NodeRecord> {
        if !self.stack.is_empty() {
            tracing::debug!(count = self.stack.len(), "elements left open at end of input");
            let end = self.text.len() as u32;
            for &open in &self.stack {
                self.nodes[open as usize].span.end = end;
            }
            self.stack.clear();
        }
        self.nodes.shrink_to_fit();
        self.nodes
    }
}

/// Tokenize and resolve a whole text into node records
pub fn build_nodes(text: &str) -> Result<Vec<NodeRecord>> {
    let mut tokenizer = Tokenizer::new(text)?;
    let mut builder = TreeBuilder::new(text);
    while let Some(token) = tokenizer.next_token()? {
        builder.push_token(token);
    }
    Ok(builder.finish())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spans(text: &str) -> Vec<(NodeKind, &str)> {
        build_nodes(text)
            .unwrap()
            .into_iter()
            .map(|n| (n.kind, n.span.slice(text)))
            .collect()
    }

    #[test]
    fn test_build_simple() {
        assert_eq!(
            spans("<root><child>text</child></root>"),
            vec![
                (NodeKind::Element, "<root><child>text</child></root>"),
                (NodeKind::Element, "<child>text</child>"),
                (NodeKind::Text, "text"),
            ]
        );
    }

    #[test]
    fn test_self_closing_not_pushed() {
        assert_eq!(spans("<a/>"), vec![(NodeKind::Element, "<a/>")]);
        // nothing is open, so the close tag has no element to match
        assert_eq!(
            spans("<a/></a>"),
            vec![(NodeKind::Element, "<a/>"), (NodeKind::Text, "</a>")]
        );
        assert_eq!(
            spans("<r><a/>x</r>"),
            vec![
                (NodeKind::Element, "<r><a/>x</r>"),
                (NodeKind::Element, "<a/>"),
                (NodeKind::Text, "x"),
            ]
        );
    }

    #[test]
    fn test_implicit_closure() {
        assert_eq!(
            spans("<a><b></a>"),
            vec![(NodeKind::Element, "<a><b></a>"), (NodeKind::Element, "<b>")]
        );
        assert_eq!(
            spans("<a><b><c>x</a>y"),
            vec![
                (NodeKind::Element, "<a><b><c>x</a>"),
                (NodeKind::Element, "<b><c>x"),
                (NodeKind::Element, "<c>x"),
                (NodeKind::Text, "x"),
                (NodeKind::Text, "y"),
            ]
        );
    }

    #[test]
    fn test_stray_close_tag() {
        assert_eq!(
            spans("<a></b></a>"),
            vec![(NodeKind::Element, "<a></b></a>"), (NodeKind::Text, "</b>")]
        );
    }

    #[test]
    fn test_unclosed_at_eof() {
        assert_eq!(
            spans("<a><b>tail"),
            vec![
                (NodeKind::Element, "<a><b>tail"),
                (NodeKind::Element, "<b>tail"),
                (NodeKind::Text, "tail"),
            ]
        );
    }

    #[test]
    fn test_close_matches_nearest_open() {
        assert_eq!(
            spans("<a><a></a></a>"),
            vec![(NodeKind::Element, "<a><a></a></a>"), (NodeKind::Element, "<a></a>")]
        );
    }
}
