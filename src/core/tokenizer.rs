//! Single-pass markup tokenizer
//!
//! Classifies the input into open tags, close tags, comments, processing
//! instructions, declarations and text runs. Scanning is sticky: every token
//! starts exactly where the previous one ended. Positions where no rule applies
//! are gaps. A gap runs up to the next `<` and becomes a `Text` token of its
//! own, so the emitted spans tile `[0, len)` with nothing left over.
//!
//! Rule priority at each position:
//!
//! ```text
//! <name ...>  <name/>      open tag
//! </name>                  close tag
//! <!-- ... -->             comment
//! <?target ...?>           processing instruction
//! <!...>                   doctype / declaration
//! everything else          text (absorbs CDATA sections and entity refs)
//! ```

use super::scanner::{is_name_char, is_whitespace, Scanner};
use crate::dom::span::Span;
use crate::error::{DomError, Result};

const CDATA_OPEN: &[u8] = b"<![CDATA[";
const CDATA_CLOSE: &[u8] = b"]]>";

/// Classification of a token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// `<name ...>`; `self_closing` when the tag ends in `/>`
    OpenTag { self_closing: bool },
    /// `</name>`
    CloseTag,
    Comment,
    ProcessingInstruction,
    Doctype,
    /// Text run, or a gap of unrecognized markup
    Text,
}

/// A classified run of input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// Full extent of the token
    pub span: Span,
    /// Tag name for open and close tags, empty otherwise
    pub name: Span,
}

impl Token {
    fn text(start: usize, end: usize) -> Self {
        Token {
            kind: TokenKind::Text,
            span: Span::from_range(start, end),
            name: Span::empty(),
        }
    }

    fn markup(kind: TokenKind, start: usize, end: usize) -> Self {
        Token {
            kind,
            span: Span::from_range(start, end),
            name: Span::empty(),
        }
    }
}

/// Sticky tokenizer over a complete, in-memory text
pub struct Tokenizer<'a> {
    scanner: Scanner<'a>,
    /// Markup token found right after a text run, returned on the next call
    pending: Option<Token>,
}

impl<'a> Tokenizer<'a> {
    /// Create a tokenizer, rejecting inputs whose offsets do not fit in `u32`
    pub fn new(text: &'a str) -> Result<Self> {
        if text.len() > u32::MAX as usize {
            return Err(DomError::InputTooLarge(text.len()));
        }
        Ok(Self {
            scanner: Scanner::new(text.as_bytes()),
            pending: None,
        })
    }

    /// Produce the next token, or `None` once the input is fully covered
    pub fn next_token(&mut self) -> Result<Option<Token>> {
        if let Some(token) = self.pending.take() {
            return Ok(Some(token));
        }

        let mut text_start: Option<usize> = None;
        loop {
            let pos = self.scanner.position();
            if self.scanner.is_eof() {
                return Ok(text_start.map(|start| Token::text(start, pos)));
            }

            if let Some(token) = self.match_markup(pos) {
                let end = token.span.end as usize;
                if end <= pos {
                    return Err(DomError::Unreachable {
                        offset: pos,
                        reason: "markup rule matched without advancing",
                    });
                }
                self.scanner.set_position(end);
                return Ok(Some(match text_start {
                    Some(start) => {
                        self.pending = Some(token);
                        Token::text(start, pos)
                    }
                    None => token,
                }));
            }

            let run_end = self.text_run_end(pos);
            if run_end > pos {
                text_start.get_or_insert(pos);
                self.scanner.set_position(run_end);
                continue;
            }

            // nothing matches here: flush the text run, then emit the gap on its own
            if let Some(start) = text_start {
                return Ok(Some(Token::text(start, pos)));
            }
            let gap_end = self
                .scanner
                .find_byte_from(pos + 1, b'<')
                .unwrap_or(self.scanner.len());
            if gap_end <= pos {
                return Err(DomError::Unreachable {
                    offset: pos,
                    reason: "gap matched without advancing",
                });
            }
            tracing::trace!(offset = pos, end = gap_end, "unmatched markup emitted as text");
            self.scanner.set_position(gap_end);
            return Ok(Some(Token::text(pos, gap_end)));
        }
    }

    /// Try the markup rules at `pos`; text runs are handled separately
    fn match_markup(&self, pos: usize) -> Option<Token> {
        if self.scanner.byte_at(pos) != Some(b'<') {
            return None;
        }
        match self.scanner.byte_at(pos + 1)? {
            b'/' => self.match_close_tag(pos),
            b'!' => self
                .match_comment(pos)
                .or_else(|| self.match_declaration(pos)),
            b'?' => self.match_processing_instruction(pos),
            b if is_name_char(b) => self.match_open_tag(pos),
            _ => None,
        }
    }

    fn match_open_tag(&self, pos: usize) -> Option<Token> {
        let name_start = pos + 1;
        let name_end = self.scanner.name_end(name_start)?;
        let end = match self.scanner.byte_at(name_end)? {
            b'>' => name_end + 1,
            b'/' if self.scanner.byte_at(name_end + 1) == Some(b'>') => name_end + 2,
            b if is_whitespace(b) => self.scanner.find_byte_from(name_end, b'>')? + 1,
            _ => return None,
        };
        let self_closing = self.scanner.byte_at(end - 2) == Some(b'/');
        Some(Token {
            kind: TokenKind::OpenTag { self_closing },
            span: Span::from_range(pos, end),
            name: Span::from_range(name_start, name_end),
        })
    }

    fn match_close_tag(&self, pos: usize) -> Option<Token> {
        let name_start = pos + 2;
        let name_end = self.scanner.name_end(name_start)?;
        if self.scanner.byte_at(name_end) != Some(b'>') {
            return None;
        }
        Some(Token {
            kind: TokenKind::CloseTag,
            span: Span::from_range(pos, name_end + 1),
            name: Span::from_range(name_start, name_end),
        })
    }

    fn match_comment(&self, pos: usize) -> Option<Token> {
        if !self.scanner.starts_with_at(pos, b"<!--") {
            return None;
        }
        let close = self.scanner.find_from(pos + 4, b"-->")?;
        Some(Token::markup(TokenKind::Comment, pos, close + 3))
    }

    fn match_processing_instruction(&self, pos: usize) -> Option<Token> {
        // at least one byte before the first '?', which must close the PI
        let question = self.scanner.find_byte_from(pos + 2, b'?')?;
        if question == pos + 2 || self.scanner.byte_at(question + 1) != Some(b'>') {
            return None;
        }
        Some(Token::markup(
            TokenKind::ProcessingInstruction,
            pos,
            question + 2,
        ))
    }

    fn match_declaration(&self, pos: usize) -> Option<Token> {
        // terminated CDATA sections belong to text runs
        if self.scanner.starts_with_at(pos, CDATA_OPEN)
            && self
                .scanner
                .find_from(pos + CDATA_OPEN.len(), CDATA_CLOSE)
                .is_some()
        {
            return None;
        }
        let close = self.scanner.find_byte_from(pos + 2, b'>')?;
        if close == pos + 2 {
            return None;
        }
        Some(Token::markup(TokenKind::Doctype, pos, close + 1))
    }

    /// End of the text run starting at `pos` (equal to `pos` if none)
    fn text_run_end(&self, pos: usize) -> usize {
        let mut at = pos;
        loop {
            let lt = match self.scanner.find_byte_from(at, b'<') {
                Some(lt) => lt,
                None => return self.scanner.len(),
            };
            if self.scanner.starts_with_at(lt, CDATA_OPEN) {
                if let Some(close) = self
                    .scanner
                    .find_from(lt + CDATA_OPEN.len(), CDATA_CLOSE)
                {
                    at = close + CDATA_CLOSE.len();
                    continue;
                }
            }
            match self.scanner.byte_at(lt + 1) {
                Some(b) if !matches!(b, b'?' | b'/' | b'!') && !is_name_char(b) => at = lt + 1,
                _ => return lt,
            }
        }
    }
}

/// Tokenize a whole text into a vector
pub fn tokenize(text: &str) -> Result<Vec<Token>> {
    let mut tokenizer = Tokenizer::new(text)?;
    let mut tokens = Vec::with_capacity((text.len() / 16).max(4));
    while let Some(token) = tokenizer.next_token()? {
        tokens.push(token);
    }
    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(text: &str) -> Vec<(TokenKind, &str)> {
        tokenize(text)
            .unwrap()
            .into_iter()
            .map(|t| (t.kind, t.span.slice(text)))
            .collect()
    }

    #[test]
    fn test_basic_tokens() {
        let toks = kinds("<a x=\"1\">hi</a>");
        assert_eq!(
            toks,
            vec![
                (TokenKind::OpenTag { self_closing: false }, "<a x=\"1\">"),
                (TokenKind::Text, "hi"),
                (TokenKind::CloseTag, "</a>"),
            ]
        );
    }

    #[test]
    fn test_self_closing() {
        let toks = kinds("<a/><b c='d' />");
        assert_eq!(toks[0].0, TokenKind::OpenTag { self_closing: true });
        assert_eq!(toks[1], (TokenKind::OpenTag { self_closing: true }, "<b c='d' />"));
    }

    #[test]
    fn test_comment_pi_doctype() {
        let toks = kinds("<?xml version=\"1.0\"?><!DOCTYPE html><!-- c --><r/>");
        assert_eq!(toks[0].0, TokenKind::ProcessingInstruction);
        assert_eq!(toks[1], (TokenKind::Doctype, "<!DOCTYPE html>"));
        assert_eq!(toks[2], (TokenKind::Comment, "<!-- c -->"));
        assert_eq!(toks[3].0, TokenKind::OpenTag { self_closing: true });
    }

    #[test]
    fn test_cdata_is_text() {
        let toks = kinds("<a><![CDATA[<b>]]>x</a>");
        assert_eq!(toks[1], (TokenKind::Text, "<![CDATA[<b>]]>x"));
        assert_eq!(toks[2].0, TokenKind::CloseTag);
    }

    #[test]
    fn test_lone_angle_is_text() {
        let toks = kinds("1 < 2 <a>");
        assert_eq!(toks[0], (TokenKind::Text, "1 < 2 "));
    }

    #[test]
    fn test_gap_is_its_own_text_token() {
        // "<b" is followed by '<', so it cannot be a tag
        let toks = kinds("x<b<c>");
        assert_eq!(
            toks,
            vec![
                (TokenKind::Text, "x"),
                (TokenKind::Text, "<b"),
                (TokenKind::OpenTag { self_closing: false }, "<c>"),
            ]
        );

        // an open tag without any '>' ahead degrades as well
        let toks = kinds("x<b y");
        assert_eq!(toks, vec![(TokenKind::Text, "x"), (TokenKind::Text, "<b y")]);

        // a gap at the start is not merged with the text that follows it
        let toks = kinds("<b<c");
        assert_eq!(toks, vec![(TokenKind::Text, "<b"), (TokenKind::Text, "<c")]);

        let toks = kinds("trailing <");
        assert_eq!(toks, vec![(TokenKind::Text, "trailing "), (TokenKind::Text, "<")]);
    }

    #[test]
    fn test_close_tag_requires_exact_form() {
        let toks = kinds("</a >");
        assert_eq!(toks, vec![(TokenKind::Text, "</a >")]);
    }

    #[test]
    fn test_unterminated_comment_falls_back_to_declaration() {
        let toks = kinds("<!-- open > rest");
        assert_eq!(toks[0], (TokenKind::Doctype, "<!-- open >"));
        assert_eq!(toks[1], (TokenKind::Text, " rest"));
    }

    #[test]
    fn test_coverage_is_total() {
        let text = "a<<b>>&amp;</c><?x?><!>< !--";
        let toks = tokenize(text).unwrap();
        let mut expected = 0u32;
        for t in &toks {
            assert_eq!(t.span.start, expected);
            assert!(t.span.end > t.span.start);
            expected = t.span.end;
        }
        assert_eq!(expected as usize, text.len());
    }

    #[test]
    fn test_tag_names() {
        let text = "<ns:item-1 a=b></ns:item-1>";
        let toks = tokenize(text).unwrap();
        assert_eq!(toks[0].name.slice(text), "ns:item-1");
        assert_eq!(toks[1].name.slice(text), "ns:item-1");
    }

    #[test]
    fn test_empty_input() {
        assert!(tokenize("").unwrap().is_empty());
    }
}
