//! DOM Module - Flat-array markup document
//!
//! Implements a lazy, immutable document representation using:
//! - One flat vector of node records ordered by start offset
//! - NodeId (u32) indices as node identity
//! - Parent/child/sibling relationships derived from span containment
//! - Compute-once memo cells and lazy child lists

pub mod attribute;
pub mod builder;
pub mod document;
pub mod lazy;
pub mod navigate;
pub mod node;
pub mod span;

pub use attribute::{AttributeRef, Attributes};
pub use document::{Document, ParseOptions};
pub use lazy::{Generator, LazyList};
pub use navigate::{ChildCursor, ElementRef, NodeList, NodeListIter, NodeRef};
pub use node::{NodeId, NodeKind, NodeRecord};
pub use span::Span;
