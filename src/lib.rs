//! xml-tag-processor - streaming, in-place XML rewriting
//!
//! Layers:
//! core: spans, scanner, tokenizer, attribute parsing, entities, errors
//! processor::XmlTagProcessor: lexical walk + queued edits + bookmarks
//! processor::XmlProcessor: element stack, document stages, breadcrumbs
//!
//! Edits never touch the buffer until `get_updated_text()` applies them in
//! one pass, so a document is walked once and copied once.

pub mod core;
pub mod processor;

pub use crate::core::error::{ErrorKind, ParseError};
pub use crate::processor::{
    DocumentStage, ParserState, TagClosers, TagQuery, TokenType, XmlProcessor, XmlTagProcessor,
    MAX_BOOKMARKS, MAX_LEXICAL_UPDATES, MAX_SEEK_OPS,
};
