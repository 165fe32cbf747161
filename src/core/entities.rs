//! XML Entity Decoding
//!
//! Handles decoding of XML references:
//! - Built-in entities: &lt; &gt; &amp; &quot; &apos;
//! - Numeric character references: &#123; &#x7B;
//!
//! Text nodes decode leniently (unknown references are kept verbatim).
//! Attribute values decode strictly: any `&` that does not start a complete
//! reference makes the whole value invalid.
//!
//! Uses Cow for zero-copy when nothing needs rewriting.

use memchr::memchr;
use std::borrow::Cow;

/// Decode text content, keeping unrecognized references as-is
///
/// Returns Borrowed if no references present (zero-copy).
pub fn decode_text(input: &str) -> Cow<'_, str> {
    if memchr(b'&', input.as_bytes()).is_none() {
        return Cow::Borrowed(input);
    }

    let mut result = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(amp) = memchr(b'&', rest.as_bytes()) {
        result.push_str(&rest[..amp]);
        match parse_reference(&rest.as_bytes()[amp..]) {
            Some((decoded, consumed)) => {
                result.push(decoded);
                rest = &rest[amp + consumed..];
            }
            None => {
                result.push('&');
                rest = &rest[amp + 1..];
            }
        }
    }
    result.push_str(rest);
    Cow::Owned(result)
}

/// Decode an attribute value
///
/// Returns None if the value holds a bare `&` or an incomplete reference
/// (such as `&#65` without its `;`), never a partially decoded string.
pub fn decode_attribute_value(input: &str) -> Option<Cow<'_, str>> {
    if memchr(b'&', input.as_bytes()).is_none() {
        return Some(Cow::Borrowed(input));
    }

    let mut result = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(amp) = memchr(b'&', rest.as_bytes()) {
        result.push_str(&rest[..amp]);
        let (decoded, consumed) = parse_reference(&rest.as_bytes()[amp..])?;
        result.push(decoded);
        rest = &rest[amp + consumed..];
    }
    result.push_str(rest);
    Some(Cow::Owned(result))
}

/// Find the offset of the first `&` that does not start a valid reference
pub fn find_invalid_reference(input: &[u8]) -> Option<usize> {
    let mut pos = 0;
    while let Some(amp) = memchr(b'&', &input[pos..]) {
        let at = pos + amp;
        match parse_reference(&input[at..]) {
            Some((_, consumed)) => pos = at + consumed,
            None => return Some(at),
        }
    }
    None
}

/// Parse a reference at the start of `input` (which begins with `&`)
///
/// Returns the decoded character and the number of bytes consumed,
/// including the leading `&` and the trailing `;`.
fn parse_reference(input: &[u8]) -> Option<(char, usize)> {
    let semi = memchr(b';', input)?;
    let entity = &input[1..semi];

    let decoded = match entity {
        b"lt" => '<',
        b"gt" => '>',
        b"amp" => '&',
        b"quot" => '"',
        b"apos" => '\'',
        [b'#', digits @ ..] => decode_numeric_entity(digits)?,
        _ => return None,
    };

    Some((decoded, semi + 1))
}

/// Decode a numeric character reference (without `&#` and `;`)
fn decode_numeric_entity(entity: &[u8]) -> Option<char> {
    let (digits, radix) = match entity {
        [b'x', hex @ ..] => (hex, 16),
        _ => (entity, 10),
    };

    if digits.is_empty() || !digits.iter().all(|b| (*b as char).is_digit(radix)) {
        return None;
    }

    let text = std::str::from_utf8(digits).ok()?;
    let codepoint = u32::from_str_radix(text, radix).ok()?;

    if !is_valid_xml_char(codepoint) {
        return None;
    }

    char::from_u32(codepoint)
}

/// Check if a code point is a valid XML 1.0 Char
/// Char ::= #x9 | #xA | #xD | [#x20-#xD7FF] | [#xE000-#xFFFD] | [#x10000-#x10FFFF]
#[inline]
pub fn is_valid_xml_char(codepoint: u32) -> bool {
    matches!(codepoint,
        0x9 | 0xA | 0xD |
        0x20..=0xD7FF |
        0xE000..=0xFFFD |
        0x10000..=0x10FFFF
    )
}

/// Normalize line endings: `\r\n` and lone `\r` become `\n`
pub fn normalize_newlines(input: &str) -> Cow<'_, str> {
    if memchr(b'\r', input.as_bytes()).is_none() {
        return Cow::Borrowed(input);
    }
    Cow::Owned(input.replace("\r\n", "\n").replace('\r', "\n"))
}

/// Encode text for XML output (escape special characters)
pub fn encode_text(input: &str) -> Cow<'_, str> {
    // Fast path: check if any escaping needed
    if !input.bytes().any(|b| matches!(b, b'<' | b'>' | b'&' | b'"' | b'\'')) {
        return Cow::Borrowed(input);
    }

    // Slow path: escape
    let mut result = String::with_capacity(input.len() + 16);
    for c in input.chars() {
        match c {
            '<' => result.push_str("&lt;"),
            '>' => result.push_str("&gt;"),
            '&' => result.push_str("&amp;"),
            '"' => result.push_str("&quot;"),
            '\'' => result.push_str("&apos;"),
            _ => result.push(c),
        }
    }
    Cow::Owned(result)
}

/// Encode text for use in XML attributes
pub fn encode_attribute(input: &str) -> Cow<'_, str> {
    encode_text(input)
}
