//! Error types
//!
//! Malformed markup is never an error: the tokenizer degrades anything it does
//! not recognize to text. The variants here cover caller mistakes, corrupt
//! serialized input, and internal defects.

use thiserror::Error;

/// Errors produced by parsing, MIME dispatch and the binary codec
#[derive(Debug, Error)]
pub enum DomError {
    /// `parse_from_string` was given a MIME type it does not know
    #[error("Unsupported MIME type: {0}")]
    UnsupportedMimeType(String),

    /// An internal exhaustiveness invariant was violated
    #[error("Unreachable code reached at offset {offset}: {reason}")]
    Unreachable { offset: usize, reason: &'static str },

    /// Offsets are stored as `u32`
    #[error("Input of {0} bytes exceeds the 4 GiB offset limit")]
    InputTooLarge(usize),

    /// Node records handed to the document are missing or inconsistent
    #[error("Invalid document snapshot: {0}")]
    InvalidSnapshot(String),

    /// A codec tag outside the registered range
    #[error("Unknown extension tag: {0}")]
    UnknownTag(u64),

    /// Wire-level encode/decode failure
    #[error("Codec error: {0}")]
    Codec(#[from] bincode::Error),
}

pub type Result<T, E = DomError> = std::result::Result<T, E>;
