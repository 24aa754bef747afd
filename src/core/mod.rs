//! Core markup scanning primitives
//!
//! This module contains the fundamental building blocks for parsing:
//! - Scanner: delimiter detection using memchr
//! - Tokenizer: ordered-rule token extraction; gaps become their own text tokens
//! - Entities: entity decoding with Cow (zero-copy when possible)
//! - HtmlEntities: the named HTML entity table, built on first use
//! - Attributes: attribute tokenization over an open tag

pub mod attributes;
pub mod entities;
pub mod html_entities;
pub mod scanner;
pub mod tokenizer;
