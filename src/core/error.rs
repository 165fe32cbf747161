//! Error taxonomy
//!
//! Every grammar violation the tokenizer or the structural layer can detect
//! has its own [`ErrorKind`]. A [`ParseError`] pairs the kind with the byte
//! offset where it was found. [`ScanError`] is what the tokenizer
//! propagates internally: either a syntax error or a missing terminator.

use thiserror::Error;

/// Kind of syntax error that stopped a processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum ErrorKind {
    #[error("invalid tag name")]
    InvalidTagName,

    #[error("invalid attribute name")]
    InvalidAttributeName,

    #[error("attribute requires a value")]
    MissingAttributeValue,

    #[error("attribute value must be quoted")]
    UnquotedAttributeValue,

    #[error("attributes must be separated by whitespace")]
    MissingAttributeWhitespace,

    #[error("attribute value cannot contain '<'")]
    InvalidAttributeValue,

    /// A `&` that does not start a complete, known reference.
    #[error("invalid character or entity reference")]
    InvalidReference,

    #[error("duplicate attribute")]
    DuplicateAttribute,

    #[error("comments cannot contain '--'")]
    DoubleHyphenInComment,

    #[error("closing tags cannot carry attributes")]
    ClosingTagWithAttributes,

    #[error("closing tags cannot be self-closing")]
    SelfClosingClosingTag,

    /// `<!` followed by something other than a comment or CDATA section.
    #[error("unsupported declaration")]
    UnsupportedDeclaration,

    #[error("invalid processing instruction")]
    InvalidProcessingInstruction,

    #[error("XML declaration must be the first token of the document")]
    MisplacedXmlDeclaration,

    #[error("invalid XML declaration")]
    InvalidXmlDeclaration,

    #[error("element found after the root element")]
    ElementAfterRoot,

    #[error("text found outside the root element")]
    TextOutsideRoot,

    #[error("CDATA section found outside the root element")]
    CdataOutsideRoot,

    #[error("closing tag does not match the open element")]
    MismatchedClosingTag,

    #[error("closing tag without an open element")]
    UnexpectedClosingTag,
}

/// A syntax error and the byte offset where it was detected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} at byte {position}")]
pub struct ParseError {
    pub kind: ErrorKind,
    pub position: usize,
}

impl ParseError {
    pub fn new(kind: ErrorKind, position: usize) -> Self {
        ParseError { kind, position }
    }
}

/// Why the tokenizer stopped without producing a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanError {
    /// The token's terminator is missing; more input could complete it.
    Incomplete,
    /// The input can never form a valid token here.
    Syntax(ParseError),
}

impl ScanError {
    #[inline]
    pub fn syntax(kind: ErrorKind, position: usize) -> Self {
        ScanError::Syntax(ParseError::new(kind, position))
    }
}
