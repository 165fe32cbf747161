//! XML Attribute Parsing
//!
//! Parses the attribute list of a tag (or the pseudo-attributes of the XML
//! declaration) into spans over the input. Values are validated here but
//! decoded only when a caller asks for them.

use super::entities::find_invalid_reference;
use super::error::{ErrorKind, ScanError};
use super::scanner::{is_name_start_char, is_whitespace, Scanner};
use super::span::Span;
use memchr::memchr;

/// A parsed attribute, as spans into the input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeToken {
    /// The whole `name="value"` range, quotes included
    pub span: Span,
    /// Attribute name (may include namespace prefix)
    pub name: Span,
    /// Raw value between the quotes, entities not decoded
    pub value: Span,
}

impl AttributeToken {
    /// Get the name bytes
    #[inline]
    pub fn name_bytes<'a>(&self, input: &'a [u8]) -> &'a [u8] {
        self.name.slice(input)
    }
}

/// What closes an attribute list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListEnd {
    /// `>` or `/>` of an element tag
    Tag,
    /// `?>` of the XML declaration
    Declaration,
}

/// Parse attributes until the end of the tag
///
/// The scanner must sit right after the tag name. Attributes are appended to
/// `attrs` in source order. Returns the exclusive end offset of the tag and
/// whether it was closed by `/>`.
pub fn parse_attribute_list(
    scanner: &mut Scanner<'_>,
    end: ListEnd,
    attrs: &mut Vec<AttributeToken>,
) -> Result<(usize, bool), ScanError> {
    loop {
        let separated = scanner.skip_whitespace();
        let at = scanner.position();
        let Some(b) = scanner.peek() else {
            return Err(ScanError::Incomplete);
        };

        match (end, b) {
            (ListEnd::Tag, b'>') => {
                scanner.advance(1);
                return Ok((scanner.position(), false));
            }
            (ListEnd::Tag, b'/') => {
                return match scanner.peek_at(1) {
                    None => Err(ScanError::Incomplete),
                    Some(b'>') => {
                        scanner.advance(2);
                        Ok((scanner.position(), true))
                    }
                    Some(_) => Err(ScanError::syntax(ErrorKind::InvalidAttributeName, at)),
                };
            }
            (ListEnd::Declaration, b'?') => {
                return match scanner.peek_at(1) {
                    None => Err(ScanError::Incomplete),
                    Some(b'>') => {
                        scanner.advance(2);
                        Ok((scanner.position(), false))
                    }
                    Some(_) => Err(ScanError::syntax(ErrorKind::InvalidXmlDeclaration, at)),
                };
            }
            _ => {}
        }

        if !separated {
            return Err(ScanError::syntax(ErrorKind::MissingAttributeWhitespace, at));
        }

        let attr = parse_attribute(scanner)?;
        let input = scanner.input();
        if attrs
            .iter()
            .any(|seen| seen.name_bytes(input) == attr.name_bytes(input))
        {
            return Err(ScanError::syntax(ErrorKind::DuplicateAttribute, attr.span.start));
        }
        attrs.push(attr);
    }
}

/// Parse a single `name="value"` pair at the scanner position
fn parse_attribute(scanner: &mut Scanner<'_>) -> Result<AttributeToken, ScanError> {
    let start = scanner.position();
    if !scanner.peek().is_some_and(is_name_start_char) {
        return Err(ScanError::syntax(ErrorKind::InvalidAttributeName, start));
    }

    while let Some(b) = scanner.peek() {
        if is_name_delimiter(b) {
            break;
        }
        scanner.advance(1);
    }
    let name = Span::from_bounds(start, scanner.position());

    scanner.skip_whitespace();
    match scanner.peek() {
        None => return Err(ScanError::Incomplete),
        Some(b'=') => scanner.advance(1),
        // `foo/bar="x"`
        Some(b'/') => {
            return Err(ScanError::syntax(ErrorKind::InvalidAttributeName, scanner.position()))
        }
        Some(_) => {
            return Err(ScanError::syntax(ErrorKind::MissingAttributeValue, scanner.position()))
        }
    }

    scanner.skip_whitespace();
    let quote = match scanner.peek() {
        None => return Err(ScanError::Incomplete),
        Some(q @ (b'"' | b'\'')) => q,
        Some(_) => {
            return Err(ScanError::syntax(ErrorKind::UnquotedAttributeValue, scanner.position()))
        }
    };

    let value_start = scanner.position() + 1;
    scanner.set_position(value_start);
    let value_end = scanner.find_byte(quote).ok_or(ScanError::Incomplete)?;
    let value = scanner.slice(value_start, value_end);

    if let Some(lt) = memchr(b'<', value) {
        return Err(ScanError::syntax(ErrorKind::InvalidAttributeValue, value_start + lt));
    }
    if let Some(amp) = find_invalid_reference(value) {
        return Err(ScanError::syntax(ErrorKind::InvalidReference, value_start + amp));
    }

    scanner.set_position(value_end + 1);

    Ok(AttributeToken {
        span: Span::from_bounds(start, value_end + 1),
        name,
        value: Span::from_bounds(value_start, value_end),
    })
}

/// Bytes that end an attribute name
#[inline]
fn is_name_delimiter(b: u8) -> bool {
    is_whitespace(b) || matches!(b, b'=' | b'/' | b'<' | b'>' | b'"' | b'\'')
}
