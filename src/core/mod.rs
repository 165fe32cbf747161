//! Core lexical primitives
//!
//! This module contains the building blocks the processors sit on:
//! - Span: offset/length references into the document buffer
//! - Scanner: delimiter search using memchr
//! - Tokenizer: one token at a given offset, or why there is none
//! - Attributes: attribute list parsing and validation
//! - Entities: reference decoding with Cow (zero-copy when possible)
//! - Error: the syntax error taxonomy

pub mod attributes;
pub mod entities;
pub mod error;
pub mod scanner;
pub mod span;
pub mod tokenizer;
