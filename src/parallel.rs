//! Batch parsing
//!
//! Uses Rayon to parse independent texts in parallel. Each parse is still
//! single-threaded; only whole documents are spread across the pool.

use crate::dom::{Document, ParseOptions};
use crate::error::Result;
use crate::parser::DomParser;
use rayon::prelude::*;

/// Parse every text with the same options, preserving input order
pub fn parse_batch<S>(texts: &[S], options: ParseOptions) -> Vec<Result<Document>>
where
    S: AsRef<str> + Sync,
{
    tracing::debug!(count = texts.len(), "parsing batch");
    texts
        .par_iter()
        .map(|text| Document::parse(text.as_ref(), options))
        .collect()
}

/// Parse `(text, mime)` pairs, dispatching each on its MIME type
pub fn parse_batch_from_strings<S, M>(
    parser: &DomParser,
    inputs: &[(S, M)],
) -> Vec<Result<Document>>
where
    S: AsRef<str> + Sync,
    M: AsRef<str> + Sync,
{
    inputs
        .par_iter()
        .map(|(text, mime)| parser.parse_from_string(text.as_ref(), mime.as_ref()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DomError;

    #[test]
    fn test_parse_batch() {
        let texts = ["<a/>", "<b>x</b>", "plain"];
        let docs = parse_batch(&texts, ParseOptions::XML);
        assert_eq!(docs.len(), 3);
        let roots: Vec<_> = docs
            .iter()
            .map(|doc| {
                let doc = doc.as_ref().unwrap();
                doc.document_element().map(|e| e.tag_name().to_string())
            })
            .collect();
        assert_eq!(roots, vec![Some("a".to_string()), Some("b".to_string()), None]);
    }

    #[test]
    fn test_parse_batch_from_strings() {
        let parser = DomParser::default();
        let inputs = [
            ("<p>&nbsp;</p>", "text/html"),
            ("<p>&nbsp;</p>", "text/xml"),
            ("{}", "application/json"),
        ];
        let results = parse_batch_from_strings(&parser, &inputs);
        assert_eq!(results[0].as_ref().unwrap().text_content(), "\u{a0}");
        assert_eq!(results[1].as_ref().unwrap().text_content(), "&nbsp;");
        assert!(matches!(results[2], Err(DomError::UnsupportedMimeType(_))));
    }
}
