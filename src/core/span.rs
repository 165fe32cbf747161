//! Span - offset and length into the processor's buffer
//!
//! Zero-copy reference to a portion of the input document.
//! Used for tokens, tag names, attribute names/values and text content.

/// A span referencing a portion of the input document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    /// Byte offset into the buffer
    pub start: usize,
    /// Length in bytes
    pub length: usize,
}

impl Span {
    /// Create a new span
    #[inline]
    pub const fn new(start: usize, length: usize) -> Self {
        Self { start, length }
    }

    /// Create a span from a start and an exclusive end offset
    #[inline]
    pub const fn from_bounds(start: usize, end: usize) -> Self {
        Self {
            start,
            length: end.saturating_sub(start),
        }
    }

    /// Check if this span is empty
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Get the end offset (exclusive)
    #[inline]
    pub const fn end(&self) -> usize {
        self.start.saturating_add(self.length)
    }

    /// Extract the byte slice from input
    #[inline]
    pub fn slice<'a>(&self, input: &'a [u8]) -> &'a [u8] {
        input.get(self.start..self.end()).unwrap_or(&[])
    }

    /// Extract as a string slice from input
    ///
    /// Spans produced by the tokenizer always sit on ASCII delimiters,
    /// so they fall on character boundaries.
    #[inline]
    pub fn as_str<'a>(&self, input: &'a str) -> &'a str {
        input.get(self.start..self.end()).unwrap_or("")
    }
}

/// A queued byte-range replacement: `length` bytes at `start` become `text`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextReplacement {
    pub start: usize,
    pub length: usize,
    pub text: String,
}

impl TextReplacement {
    pub fn new(start: usize, length: usize, text: impl Into<String>) -> Self {
        Self {
            start,
            length,
            text: text.into(),
        }
    }

    /// Exclusive end of the replaced range in the original buffer
    #[inline]
    pub fn end(&self) -> usize {
        self.start + self.length
    }

    /// How many bytes this replacement adds (negative when it shrinks the buffer)
    #[inline]
    pub fn delta(&self) -> isize {
        self.text.len() as isize - self.length as isize
    }
}
