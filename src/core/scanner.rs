//! Byte cursor for the tokenizer
//!
//! Delimiter searches go through memchr, which picks SSE2/AVX2/NEON at
//! runtime. Everything else is plain byte peeking. Positions are absolute
//! offsets into the buffer, never relative to the cursor.

use memchr::{memchr, memmem};

/// Byte cursor over the processor's buffer
pub struct Scanner<'a> {
    input: &'a [u8],
    pos: usize,
}

impl<'a> Scanner<'a> {
    #[inline]
    pub fn new(input: &'a [u8]) -> Self {
        Scanner { input, pos: 0 }
    }

    /// The whole buffer, independent of the cursor
    #[inline]
    pub fn input(&self) -> &'a [u8] {
        self.input
    }

    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    pub fn set_position(&mut self, pos: usize) {
        self.pos = pos;
    }

    #[inline]
    pub fn advance(&mut self, n: usize) {
        self.pos += n;
    }

    #[inline]
    pub fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }

    /// Bytes from the cursor to the end of input
    #[inline]
    pub fn remaining(&self) -> &'a [u8] {
        self.input.get(self.pos..).unwrap_or(&[])
    }

    /// Bytes in `start..end`, empty if the range is out of bounds
    #[inline]
    pub fn slice(&self, start: usize, end: usize) -> &'a [u8] {
        self.input.get(start..end).unwrap_or(&[])
    }

    #[inline]
    pub fn peek(&self) -> Option<u8> {
        self.peek_at(0)
    }

    #[inline]
    pub fn peek_at(&self, offset: usize) -> Option<u8> {
        self.input.get(self.pos + offset).copied()
    }

    /// Move past whitespace; true if the cursor moved
    pub fn skip_whitespace(&mut self) -> bool {
        let skipped = self
            .remaining()
            .iter()
            .take_while(|&&b| is_whitespace(b))
            .count();
        self.pos += skipped;
        skipped > 0
    }

    /// Offset of the next `<` at or after the cursor
    #[inline]
    pub fn find_tag_start(&self) -> Option<usize> {
        self.find_byte(b'<')
    }

    /// Offset of the next `byte` at or after the cursor
    #[inline]
    pub fn find_byte(&self, byte: u8) -> Option<usize> {
        memchr(byte, self.remaining()).map(|i| self.pos + i)
    }

    /// Offset of the next `needle` at or after the cursor
    #[inline]
    pub fn find_sequence(&self, needle: &[u8]) -> Option<usize> {
        memmem::find(self.remaining(), needle).map(|i| self.pos + i)
    }

    /// Consume a name at the cursor
    ///
    /// Leaves the cursor untouched and returns None when the first byte
    /// cannot start a name.
    pub fn read_name(&mut self) -> Option<&'a [u8]> {
        let rest = self.remaining();
        let (&first, tail) = rest.split_first()?;
        if !is_name_start_char(first) {
            return None;
        }

        let len = 1 + tail.iter().take_while(|&&b| is_name_char(b)).count();
        self.pos += len;
        Some(&rest[..len])
    }
}

/// XML whitespace: space, tab, line feed, carriage return
#[inline]
pub fn is_whitespace(b: u8) -> bool {
    matches!(b, b' ' | b'\t' | b'\n' | b'\r')
}

/// ASCII letters, `_` and `:`; any byte of a multi-byte UTF-8 character
/// is accepted so non-ASCII names pass through whole
#[inline]
pub fn is_name_start_char(b: u8) -> bool {
    b.is_ascii_alphabetic() || b == b'_' || b == b':' || !b.is_ascii()
}

/// Name start characters plus digits, `-` and `.`
#[inline]
pub fn is_name_char(b: u8) -> bool {
    is_name_start_char(b) || b.is_ascii_digit() || b == b'-' || b == b'.'
}

/// Whether `name` can be written as an element or attribute name
pub fn is_valid_name(name: &str) -> bool {
    match name.as_bytes() {
        [first, rest @ ..] => is_name_start_char(*first) && rest.iter().copied().all(is_name_char),
        [] => false,
    }
}
