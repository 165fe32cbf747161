//! Tag processors
//!
//! Two processors walk a document one token at a time and queue in-place
//! edits:
//!
//! - [`XmlTagProcessor`] is purely lexical. It checks each token's own
//!   grammar and nothing about how tokens nest.
//! - [`XmlProcessor`] wraps it with an open-element stack, document stages
//!   and breadcrumb queries.

mod bookmarks;
pub mod breadcrumbs;
pub mod query;
pub mod tag_processor;
mod updates;
pub mod xml_processor;

pub use query::{TagClosers, TagQuery};
pub use tag_processor::{ParserState, TokenType, XmlTagProcessor};
pub use xml_processor::{DocumentStage, XmlProcessor};

/// Bookmarks a processor keeps at once
pub const MAX_BOOKMARKS: usize = 10;

/// Seeks allowed over a processor's lifetime
pub const MAX_SEEK_OPS: usize = 1000;

/// Queued edits that trigger a flush when the processor moves on
pub const MAX_LEXICAL_UPDATES: usize = 1000;
