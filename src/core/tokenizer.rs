//! XML Tokenizer - finds and classifies the token at a given offset
//!
//! Recognized tokens:
//! - Element start/end/empty tags
//! - Text content
//! - CDATA sections
//! - Comments
//! - Processing instructions
//! - The XML declaration
//!
//! The tokenizer holds no state between calls: the processor owns the cursor
//! and asks for one token at a time. A construct whose terminator is missing
//! yields [`ScanError::Incomplete`]; a construct that can never become valid
//! yields [`ScanError::Syntax`].

use super::attributes::{parse_attribute_list, AttributeToken, ListEnd};
use super::error::{ErrorKind, ScanError};
use super::scanner::{is_whitespace, Scanner};
use super::span::Span;

const COMMENT_OPEN: &[u8] = b"<!--";
const CDATA_OPEN: &[u8] = b"<![CDATA[";

/// Type of XML token
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    /// Element start tag: <element>
    StartTag,
    /// Element end tag: </element>
    EndTag,
    /// Empty element: <element/>
    EmptyTag,
    /// Text content
    Text,
    /// CDATA section: <![CDATA[...]]>
    CData,
    /// Comment: <!--...-->
    Comment,
    /// Processing instruction: <?target ...?>
    ProcessingInstruction,
    /// XML declaration: <?xml ...?>
    XmlDeclaration,
}

/// A scanned token, as spans into the input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    /// Whole token, delimiters included
    pub span: Span,
    /// For tags: the element name. For PIs and the declaration: the target
    pub name: Option<Span>,
    /// Text node content, CDATA/comment body, or PI data
    pub text: Option<Span>,
    /// Text taken verbatim from an element declared as PCDATA
    pub raw: bool,
}

impl Token {
    fn new(kind: TokenKind, span: Span) -> Self {
        Token {
            kind,
            span,
            name: None,
            text: None,
            raw: false,
        }
    }

    fn with_name(mut self, name: Span) -> Self {
        self.name = Some(name);
        self
    }

    fn with_text(mut self, text: Span) -> Self {
        self.text = Some(text);
        self
    }
}

/// XML tokenizer over a borrowed buffer
pub struct Tokenizer<'a> {
    scanner: Scanner<'a>,
}

impl<'a> Tokenizer<'a> {
    /// Create a new tokenizer for the given input
    pub fn new(input: &'a [u8]) -> Self {
        Tokenizer {
            scanner: Scanner::new(input),
        }
    }

    /// Scan the token starting at `at`
    ///
    /// Returns `Ok(None)` when `at` is the end of input. Attributes of a
    /// matched tag (or pseudo-attributes of the declaration) are written to
    /// `attrs`, which is cleared first. When `raw_text_closer` is set, content
    /// up to `</closer` is returned as a single raw text token.
    pub fn next_token_at(
        &mut self,
        at: usize,
        raw_text_closer: Option<&[u8]>,
        attrs: &mut Vec<AttributeToken>,
    ) -> Result<Option<Token>, ScanError> {
        attrs.clear();
        self.scanner.set_position(at);
        if self.scanner.is_eof() {
            return Ok(None);
        }

        let raw_text = match raw_text_closer {
            Some(closer) => self.scan_raw_text(at, closer)?,
            None => None,
        };

        let token = match raw_text {
            Some(token) => token,
            None => {
                self.scanner.set_position(at);
                match self.scanner.peek() {
                    Some(b'<') => self.scan_markup(at, attrs)?,
                    _ => self.scan_text(at),
                }
            }
        };

        log::trace!(
            target: "xml_tag_processor::tokenizer",
            "token {:?} at {}..{}",
            token.kind,
            token.span.start,
            token.span.end()
        );
        Ok(Some(token))
    }

    /// Text up to the next '<' or the end of input
    fn scan_text(&mut self, start: usize) -> Token {
        let end = self
            .scanner
            .find_tag_start()
            .unwrap_or(self.scanner.input().len());
        self.scanner.set_position(end);
        let span = Span::from_bounds(start, end);
        Token::new(TokenKind::Text, span).with_text(span)
    }

    /// Content of a PCDATA element, up to its closing tag
    ///
    /// Returns None when the closing tag starts right at `start`.
    fn scan_raw_text(&mut self, start: usize, closer: &[u8]) -> Result<Option<Token>, ScanError> {
        let input = self.scanner.input();
        loop {
            let lt = self.scanner.find_sequence(b"</").ok_or(ScanError::Incomplete)?;
            let name_end = lt + 2 + closer.len();
            if input.len() < name_end {
                return Err(ScanError::Incomplete);
            }
            if &input[lt + 2..name_end] == closer {
                match input.get(name_end) {
                    None => return Err(ScanError::Incomplete),
                    Some(&b) if is_whitespace(b) || b == b'>' || b == b'/' => {
                        if lt == start {
                            return Ok(None);
                        }
                        self.scanner.set_position(lt);
                        let span = Span::from_bounds(start, lt);
                        let mut token = Token::new(TokenKind::Text, span).with_text(span);
                        token.raw = true;
                        return Ok(Some(token));
                    }
                    Some(_) => {}
                }
            }
            self.scanner.set_position(lt + 1);
        }
    }

    /// Parse markup starting with '<'
    fn scan_markup(&mut self, start: usize, attrs: &mut Vec<AttributeToken>) -> Result<Token, ScanError> {
        match self.scanner.peek_at(1) {
            None => Err(ScanError::Incomplete),
            Some(b'!') => self.scan_bang_markup(start),
            Some(b'?') => self.scan_pi(start, attrs),
            Some(b'/') => self.scan_end_tag(start),
            Some(_) => self.scan_start_tag(start, attrs),
        }
    }

    /// Parse a start tag or empty element tag
    fn scan_start_tag(&mut self, start: usize, attrs: &mut Vec<AttributeToken>) -> Result<Token, ScanError> {
        let name_start = start + 1;
        self.scanner.set_position(name_start);

        if self.scanner.read_name().is_none() {
            return Err(ScanError::syntax(ErrorKind::InvalidTagName, name_start));
        }
        let name = Span::from_bounds(name_start, self.scanner.position());

        match self.scanner.peek() {
            None => return Err(ScanError::Incomplete),
            Some(b) if is_whitespace(b) || b == b'>' || b == b'/' => {}
            Some(_) => {
                return Err(ScanError::syntax(ErrorKind::InvalidTagName, self.scanner.position()))
            }
        }

        let (end, is_empty) = parse_attribute_list(&mut self.scanner, ListEnd::Tag, attrs)?;

        let kind = if is_empty { TokenKind::EmptyTag } else { TokenKind::StartTag };
        Ok(Token::new(kind, Span::from_bounds(start, end)).with_name(name))
    }

    /// Parse an end tag
    fn scan_end_tag(&mut self, start: usize) -> Result<Token, ScanError> {
        let name_start = start + 2;
        self.scanner.set_position(name_start);

        if self.scanner.read_name().is_none() {
            if self.scanner.is_eof() {
                return Err(ScanError::Incomplete);
            }
            return Err(ScanError::syntax(ErrorKind::InvalidTagName, name_start));
        }
        let name = Span::from_bounds(name_start, self.scanner.position());

        self.scanner.skip_whitespace();
        match self.scanner.peek() {
            None => Err(ScanError::Incomplete),
            Some(b'>') => {
                self.scanner.advance(1);
                let span = Span::from_bounds(start, self.scanner.position());
                Ok(Token::new(TokenKind::EndTag, span).with_name(name))
            }
            Some(b'/') => Err(ScanError::syntax(ErrorKind::SelfClosingClosingTag, self.scanner.position())),
            Some(_) => Err(ScanError::syntax(ErrorKind::ClosingTagWithAttributes, self.scanner.position())),
        }
    }

    /// Parse markup starting with '<!' (comment or CDATA)
    fn scan_bang_markup(&mut self, start: usize) -> Result<Token, ScanError> {
        let rest = self.scanner.remaining();

        if rest.starts_with(COMMENT_OPEN) {
            self.scan_comment(start)
        } else if rest.starts_with(CDATA_OPEN) {
            self.scan_cdata(start)
        } else if COMMENT_OPEN.starts_with(rest) || CDATA_OPEN.starts_with(rest) {
            Err(ScanError::Incomplete)
        } else {
            Err(ScanError::syntax(ErrorKind::UnsupportedDeclaration, start))
        }
    }

    /// Parse a comment <!--...-->
    fn scan_comment(&mut self, start: usize) -> Result<Token, ScanError> {
        let content_start = start + COMMENT_OPEN.len();
        self.scanner.set_position(content_start);

        // The first "--" must be the one closing the comment
        let dashes = self.scanner.find_sequence(b"--").ok_or(ScanError::Incomplete)?;
        self.scanner.set_position(dashes);

        match self.scanner.peek_at(2) {
            None => Err(ScanError::Incomplete),
            Some(b'>') => {
                let end = dashes + 3;
                self.scanner.set_position(end);
                Ok(Token::new(TokenKind::Comment, Span::from_bounds(start, end))
                    .with_text(Span::from_bounds(content_start, dashes)))
            }
            Some(_) => Err(ScanError::syntax(ErrorKind::DoubleHyphenInComment, dashes)),
        }
    }

    /// Parse a CDATA section <![CDATA[...]]>
    fn scan_cdata(&mut self, start: usize) -> Result<Token, ScanError> {
        let content_start = start + CDATA_OPEN.len();
        self.scanner.set_position(content_start);

        let close = self.scanner.find_sequence(b"]]>").ok_or(ScanError::Incomplete)?;
        let end = close + 3;
        self.scanner.set_position(end);

        Ok(Token::new(TokenKind::CData, Span::from_bounds(start, end))
            .with_text(Span::from_bounds(content_start, close)))
    }

    /// Parse a processing instruction or the XML declaration
    fn scan_pi(&mut self, start: usize, attrs: &mut Vec<AttributeToken>) -> Result<Token, ScanError> {
        let target_start = start + 2;
        self.scanner.set_position(target_start);

        let target = match self.scanner.read_name() {
            Some(target) => target,
            None if self.scanner.is_eof() => return Err(ScanError::Incomplete),
            None => return Err(ScanError::syntax(ErrorKind::InvalidProcessingInstruction, target_start)),
        };
        // The target may continue in bytes we have not seen yet
        if self.scanner.is_eof() {
            return Err(ScanError::Incomplete);
        }
        let target_span = Span::from_bounds(target_start, self.scanner.position());

        if target.eq_ignore_ascii_case(b"xml") {
            if start != 0 || target != b"xml" {
                return Err(ScanError::syntax(ErrorKind::MisplacedXmlDeclaration, start));
            }
            return self.scan_xml_declaration(start, target_span, attrs);
        }

        match self.scanner.peek() {
            Some(b) if is_whitespace(b) || b == b'?' => {}
            _ => {
                return Err(ScanError::syntax(
                    ErrorKind::InvalidProcessingInstruction,
                    self.scanner.position(),
                ))
            }
        }

        let data_start = self.scanner.position();
        let close = self.scanner.find_sequence(b"?>").ok_or(ScanError::Incomplete)?;
        let end = close + 2;
        self.scanner.set_position(end);

        Ok(Token::new(TokenKind::ProcessingInstruction, Span::from_bounds(start, end))
            .with_name(target_span)
            .with_text(Span::from_bounds(data_start, close)))
    }

    /// Parse the pseudo-attributes of <?xml ...?>
    fn scan_xml_declaration(
        &mut self,
        start: usize,
        target: Span,
        attrs: &mut Vec<AttributeToken>,
    ) -> Result<Token, ScanError> {
        let (end, _) = parse_attribute_list(&mut self.scanner, ListEnd::Declaration, attrs)?;

        let input = self.scanner.input();
        let mut has_version = false;
        for attr in attrs.iter() {
            match attr.name_bytes(input) {
                b"version" => has_version = true,
                b"encoding" | b"standalone" => {}
                _ => return Err(ScanError::syntax(ErrorKind::InvalidXmlDeclaration, attr.span.start)),
            }
        }
        if !has_version {
            return Err(ScanError::syntax(ErrorKind::InvalidXmlDeclaration, start));
        }

        Ok(Token::new(TokenKind::XmlDeclaration, Span::from_bounds(start, end)).with_name(target))
    }
}
