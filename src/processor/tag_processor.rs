//! Lexical tag processor
//!
//! Walks a document token by token, exposes the current token's name,
//! attributes and text, and queues edits against it. Edits are applied in
//! one pass by [`XmlTagProcessor::get_updated_text`].
//!
//! This layer knows nothing about nesting: `<a></b>` is two valid tags here.
//! See [`XmlProcessor`](super::XmlProcessor) for the structural checks.

use crate::core::attributes::AttributeToken;
use crate::core::entities::{decode_attribute_value, decode_text, encode_attribute, encode_text, normalize_newlines};
use crate::core::error::{ErrorKind, ParseError, ScanError};
use crate::core::scanner::{is_valid_name, is_whitespace};
use crate::core::span::{Span, TextReplacement};
use crate::core::tokenizer::{Token, TokenKind, Tokenizer};
use std::borrow::Cow;
use std::collections::HashSet;
use std::fmt;

use super::bookmarks::{Bookmark, BookmarkTable};
use super::query::TagQuery;
use super::updates::{materialize, shift_offset, shift_start, UpdateQueue, UpdateTarget};
use super::{MAX_LEXICAL_UPDATES, MAX_SEEK_OPS};

/// Where the processor stands after the last advance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParserState {
    /// Nothing scanned yet, or a seek is about to re-scan
    Ready,
    MatchedTag,
    TextNode,
    CdataNode,
    Comment,
    ProcessingInstruction,
    XmlDeclaration,
    /// The next token has no terminator yet
    IncompleteInput,
    /// End of input
    Complete,
    SyntaxError,
}

impl ParserState {
    fn for_token(kind: TokenKind) -> Self {
        match kind {
            TokenKind::StartTag | TokenKind::EndTag | TokenKind::EmptyTag => ParserState::MatchedTag,
            TokenKind::Text => ParserState::TextNode,
            TokenKind::CData => ParserState::CdataNode,
            TokenKind::Comment => ParserState::Comment,
            TokenKind::ProcessingInstruction => ParserState::ProcessingInstruction,
            TokenKind::XmlDeclaration => ParserState::XmlDeclaration,
        }
    }

    /// States no further advance can leave
    #[inline]
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            ParserState::IncompleteInput | ParserState::Complete | ParserState::SyntaxError
        )
    }
}

/// Type of the token the processor is on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenType {
    Tag,
    Text,
    CdataSection,
    Comment,
    ProcessingInstruction,
    XmlDeclaration,
}

impl TokenType {
    /// Token name reported for non-tag tokens; tags report `#tag`
    pub fn as_str(self) -> &'static str {
        match self {
            TokenType::Tag => "#tag",
            TokenType::Text => "#text",
            TokenType::CdataSection => "#cdata-section",
            TokenType::Comment => "#comment",
            TokenType::ProcessingInstruction => "#processing-instructions",
            TokenType::XmlDeclaration => "#xml-declaration",
        }
    }
}

impl fmt::Display for TokenType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Streaming, in-place editing processor over a single document.
///
/// ```
/// use xml_tag_processor::XmlTagProcessor;
///
/// let mut processor = XmlTagProcessor::new(r#"<item id="1">x</item>"#);
/// assert!(processor.next_tag());
/// processor.set_attribute("id", "2 & 3");
/// assert_eq!(processor.get_attribute("id").as_deref(), Some("2 & 3"));
/// assert_eq!(processor.get_updated_text(), r#"<item id="2 &amp; 3">x</item>"#);
/// ```
#[derive(Debug)]
pub struct XmlTagProcessor {
    xml: String,
    /// Offset just past the current token, or where the next scan starts
    bytes_already_parsed: usize,
    state: ParserState,
    token: Option<Token>,
    attributes: Vec<AttributeToken>,
    updates: UpdateQueue,
    bookmarks: BookmarkTable,
    seek_count: usize,
    last_error: Option<ParseError>,
    pcdata_elements: HashSet<String>,
    /// Set while inside an element declared as PCDATA
    raw_text_closer: Option<String>,
    /// `raw_text_closer` as it was when the current token was scanned
    token_raw_text_closer: Option<String>,
}

impl XmlTagProcessor {
    pub fn new(xml: impl Into<String>) -> Self {
        XmlTagProcessor {
            xml: xml.into(),
            bytes_already_parsed: 0,
            state: ParserState::Ready,
            token: None,
            attributes: Vec::new(),
            updates: UpdateQueue::new(),
            bookmarks: BookmarkTable::new(),
            seek_count: 0,
            last_error: None,
            pcdata_elements: HashSet::new(),
            raw_text_closer: None,
            token_raw_text_closer: None,
        }
    }

    /// Treat the content of `name` elements as opaque text up to `</name`
    pub fn declare_element_as_pcdata(&mut self, name: &str) {
        self.pcdata_elements.insert(name.to_owned());

        if let Some(token) = self.token {
            if token.kind == TokenKind::StartTag && self.get_tag() == Some(name) {
                self.raw_text_closer = Some(name.to_owned());
            }
        }
    }

    // ========== Advancing ==========

    /// Move to the next token of any kind
    ///
    /// Returns false at the end of input, on incomplete input and after a
    /// syntax error. None of those states can be left by advancing again.
    pub fn next_token(&mut self) -> bool {
        if self.state.is_terminal() {
            return false;
        }
        self.after_token();
        self.parse_next_token()
    }

    /// Move to the next opening tag
    pub fn next_tag(&mut self) -> bool {
        self.next_tag_with(&TagQuery::default())
    }

    /// Move to the next tag matching `query`
    ///
    /// Breadcrumbs need an element stack, so queries carrying them are
    /// refused here.
    pub fn next_tag_with(&mut self, query: &TagQuery<'_>) -> bool {
        if query.breadcrumbs.is_some() {
            log::warn!(
                target: "xml_tag_processor::processor",
                "breadcrumb queries need the structural processor"
            );
            return false;
        }

        let mut remaining = query.match_offset.max(1);
        while self.next_token() {
            if self.matches_tag_query(query) {
                remaining -= 1;
                if remaining == 0 {
                    return true;
                }
            }
        }
        false
    }

    /// Whether the current token passes the name and closer filters of `query`
    pub(crate) fn matches_tag_query(&self, query: &TagQuery<'_>) -> bool {
        match self.get_tag() {
            Some(name) => query.matches_tag(name, self.is_tag_closer()),
            None => false,
        }
    }

    /// Leave the current token
    fn after_token(&mut self) {
        if self.token.is_none() {
            return;
        }

        if self.updates.any_at_or_after(self.bytes_already_parsed) || self.updates.len() > MAX_LEXICAL_UPDATES {
            self.flush_updates();
        }
        self.updates.detach_targets();

        self.token = None;
        self.attributes.clear();
    }

    /// Scan the token at the cursor and make it current
    fn parse_next_token(&mut self) -> bool {
        let at = self.bytes_already_parsed;
        let mode_before = self.raw_text_closer.clone();

        let result = Tokenizer::new(self.xml.as_bytes()).next_token_at(
            at,
            self.raw_text_closer.as_deref().map(str::as_bytes),
            &mut self.attributes,
        );

        match result {
            Ok(Some(token)) => {
                self.bytes_already_parsed = token.span.end();
                self.state = ParserState::for_token(token.kind);
                self.token_raw_text_closer = mode_before;

                if let Some(name) = token.name.map(|span| span.as_str(&self.xml)) {
                    match token.kind {
                        TokenKind::StartTag if self.pcdata_elements.contains(name) => {
                            self.raw_text_closer = Some(name.to_owned());
                        }
                        TokenKind::EndTag if self.raw_text_closer.as_deref() == Some(name) => {
                            self.raw_text_closer = None;
                        }
                        _ => {}
                    }
                }

                self.token = Some(token);
                true
            }
            Ok(None) => {
                self.state = ParserState::Complete;
                self.token = None;
                false
            }
            Err(ScanError::Incomplete) => {
                log::debug!(
                    target: "xml_tag_processor::processor",
                    "incomplete token at byte {at}"
                );
                self.state = ParserState::IncompleteInput;
                self.token = None;
                self.attributes.clear();
                false
            }
            Err(ScanError::Syntax(error)) => {
                self.fail(error);
                false
            }
        }
    }

    fn fail(&mut self, error: ParseError) {
        log::debug!(target: "xml_tag_processor::processor", "syntax error: {error}");
        self.state = ParserState::SyntaxError;
        self.last_error = Some(error);
        self.token = None;
        self.attributes.clear();
    }

    /// Stop with a grammar error found above the lexical level
    pub(crate) fn fail_at_token(&mut self, kind: ErrorKind) {
        let position = self.token.map_or(self.bytes_already_parsed, |token| token.span.start);
        self.fail(ParseError::new(kind, position));
    }

    /// Report the document as unfinished although the input is exhausted
    pub(crate) fn pause_incomplete(&mut self) {
        log::debug!(
            target: "xml_tag_processor::processor",
            "document ends before its root element closes"
        );
        self.state = ParserState::IncompleteInput;
    }

    // ========== Token access ==========

    pub fn state(&self) -> ParserState {
        self.state
    }

    pub(crate) fn current_kind(&self) -> Option<TokenKind> {
        self.token.map(|token| token.kind)
    }

    /// Whether the current token is text made only of whitespace
    pub(crate) fn is_whitespace_text(&self) -> bool {
        match self.token {
            Some(Token {
                kind: TokenKind::Text,
                text: Some(text),
                ..
            }) => text.slice(self.xml.as_bytes()).iter().all(|&b| is_whitespace(b)),
            _ => false,
        }
    }

    pub fn get_token_type(&self) -> Option<TokenType> {
        match self.state {
            ParserState::MatchedTag => Some(TokenType::Tag),
            ParserState::TextNode => Some(TokenType::Text),
            ParserState::CdataNode => Some(TokenType::CdataSection),
            ParserState::Comment => Some(TokenType::Comment),
            ParserState::ProcessingInstruction => Some(TokenType::ProcessingInstruction),
            ParserState::XmlDeclaration => Some(TokenType::XmlDeclaration),
            _ => None,
        }
    }

    /// Tag name for tags, `#text`-style names for everything else
    pub fn get_token_name(&self) -> Option<&str> {
        match self.get_token_type()? {
            TokenType::Tag => self.get_tag(),
            other => Some(other.as_str()),
        }
    }

    /// Name of the current tag, opener or closer
    pub fn get_tag(&self) -> Option<&str> {
        match self.token? {
            Token {
                kind: TokenKind::StartTag | TokenKind::EndTag | TokenKind::EmptyTag,
                name: Some(name),
                ..
            } => Some(name.as_str(&self.xml)),
            _ => None,
        }
    }

    pub fn get_pi_target(&self) -> Option<&str> {
        match self.token? {
            Token {
                kind: TokenKind::ProcessingInstruction,
                name: Some(name),
                ..
            } => Some(name.as_str(&self.xml)),
            _ => None,
        }
    }

    pub fn is_tag_closer(&self) -> bool {
        self.current_kind() == Some(TokenKind::EndTag)
    }

    pub fn is_empty_element(&self) -> bool {
        self.current_kind() == Some(TokenKind::EmptyTag)
    }

    pub fn paused_at_incomplete_token(&self) -> bool {
        self.state == ParserState::IncompleteInput
    }

    pub fn get_last_error(&self) -> Option<ErrorKind> {
        self.last_error.as_ref().map(|error| error.kind)
    }

    pub fn get_last_error_details(&self) -> Option<&ParseError> {
        self.last_error.as_ref()
    }

    /// Opening tag the processor is on, if any
    fn current_opener(&self) -> Option<Token> {
        self.token
            .filter(|token| matches!(token.kind, TokenKind::StartTag | TokenKind::EmptyTag))
    }

    fn find_attribute(&self, name: &str) -> Option<AttributeToken> {
        self.attributes
            .iter()
            .find(|attr| attr.name.as_str(&self.xml) == name)
            .copied()
    }

    // ========== Attributes ==========

    /// Decoded value of an attribute on the current opening tag
    ///
    /// Pending edits are visible before they are applied. The XML
    /// declaration answers for its pseudo-attributes.
    pub fn get_attribute(&self, name: &str) -> Option<String> {
        let token = self.token?;
        match token.kind {
            TokenKind::StartTag | TokenKind::EmptyTag => {
                if let Some(pending) = self.updates.pending_attribute(name) {
                    return pending.map(str::to_owned);
                }
            }
            TokenKind::XmlDeclaration => {}
            _ => return None,
        }

        let attr = self.find_attribute(name)?;
        decode_attribute_value(attr.value.as_str(&self.xml)).map(Cow::into_owned)
    }

    /// Attribute names on the current opening tag starting with `prefix`
    ///
    /// Source order first, pending insertions after them in the order they
    /// were queued. Attributes pending removal are left out. Like
    /// [`get_attribute`](Self::get_attribute), the XML declaration lists its
    /// pseudo-attributes.
    pub fn get_attribute_names_with_prefix(&self, prefix: &str) -> Option<Vec<String>> {
        match self.current_kind()? {
            TokenKind::StartTag | TokenKind::EmptyTag | TokenKind::XmlDeclaration => {}
            _ => return None,
        }

        let mut names: Vec<String> = self
            .attributes
            .iter()
            .map(|attr| attr.name.as_str(&self.xml))
            .filter(|name| name.starts_with(prefix))
            .filter(|name| self.updates.pending_attribute(name) != Some(None))
            .map(str::to_owned)
            .collect();

        for name in self.updates.set_attribute_names() {
            if name.starts_with(prefix) && self.find_attribute(name).is_none() {
                names.push(name.to_owned());
            }
        }
        Some(names)
    }

    /// Queue setting an attribute on the current opening tag
    ///
    /// An existing attribute is rewritten where it stands, a new one is
    /// inserted right after the tag name.
    pub fn set_attribute(&mut self, name: &str, value: &str) -> bool {
        let Some(Token {
            name: Some(tag_name), ..
        }) = self.current_opener()
        else {
            return false;
        };

        if !is_valid_name(name) {
            log::warn!(
                target: "xml_tag_processor::processor",
                "refusing to set invalid attribute name {name:?}"
            );
            return false;
        }

        let serialized = format!("{name}=\"{}\"", encode_attribute(value));
        let replacement = match self.find_attribute(name) {
            Some(attr) => TextReplacement::new(attr.span.start, attr.span.length, serialized),
            None => TextReplacement::new(tag_name.end(), 0, format!(" {serialized}")),
        };

        self.updates.enqueue(
            UpdateTarget::Attribute(name.to_owned()),
            Some(value.to_owned()),
            replacement,
        );
        true
    }

    /// Queue removing an attribute from the current opening tag
    ///
    /// Returns whether the attribute existed, in the source or as a pending
    /// insertion.
    pub fn remove_attribute(&mut self, name: &str) -> bool {
        if self.current_opener().is_none() {
            return false;
        }

        let target = UpdateTarget::Attribute(name.to_owned());
        let Some(attr) = self.find_attribute(name) else {
            return self.updates.cancel(&target);
        };

        // `<a id="x"/>` keeps a space so the result still reads as a tag
        let filler = match self.xml.as_bytes().get(attr.span.end()) {
            Some(b'/') => " ",
            _ => "",
        };
        self.updates.enqueue(
            target,
            None,
            TextReplacement::new(attr.span.start, attr.span.length, filler),
        );
        true
    }

    // ========== Modifiable text ==========

    /// Text content of the current token
    ///
    /// Text nodes are entity-decoded. Raw text, CDATA, comments and PI data
    /// come back verbatim. All of them have line endings normalized. Tags
    /// and the XML declaration have no modifiable text.
    pub fn get_modifiable_text(&self) -> String {
        let Some(token) = self.token else {
            return String::new();
        };
        if let Some(Some(pending)) = self.updates.pending(&UpdateTarget::ModifiableText) {
            return pending.to_owned();
        }
        let Some(text) = token.text else {
            return String::new();
        };

        let raw = text.as_str(&self.xml);
        match token.kind {
            TokenKind::Text if !token.raw => decode_text(&normalize_newlines(raw)).into_owned(),
            _ => normalize_newlines(raw).into_owned(),
        }
    }

    /// Queue replacing the content of the current text-like token
    ///
    /// Returns false when the token has no modifiable text or when `text`
    /// would end the construct early.
    pub fn set_modifiable_text(&mut self, text: &str) -> bool {
        let Some(token) = self.token else {
            return false;
        };
        let Some(span) = token.text else {
            return false;
        };

        let serialized = match token.kind {
            TokenKind::Text if token.raw => {
                let closer = format!("</{}", self.raw_text_closer.as_deref().unwrap_or_default());
                if text.contains(&closer) {
                    return false;
                }
                Cow::Borrowed(text)
            }
            TokenKind::Text => encode_text(text),
            TokenKind::CData if !text.contains("]]>") => Cow::Borrowed(text),
            TokenKind::Comment if !text.contains("--") && !text.ends_with('-') => Cow::Borrowed(text),
            _ => return false,
        };

        self.updates.enqueue(
            UpdateTarget::ModifiableText,
            Some(text.to_owned()),
            TextReplacement::new(span.start, span.length, serialized.into_owned()),
        );
        true
    }

    // ========== Updates ==========

    /// Apply all queued edits and return the resulting document
    ///
    /// The processor stays on the same token, re-scanned in the new text.
    pub fn get_updated_text(&mut self) -> String {
        self.flush_updates();
        self.xml.clone()
    }

    fn flush_updates(&mut self) {
        if self.updates.is_empty() {
            return;
        }

        let replacements = self.updates.take_sorted();
        let current = self
            .token
            .map(|token| (token, shift_start(token.span, &replacements)));
        let cursor = shift_offset(self.bytes_already_parsed, &replacements);

        self.xml = materialize(&self.xml, &replacements);
        self.bookmarks.rebase(&replacements);

        match current {
            Some((token, start)) => self.rescan_current(token, start),
            None => self.bytes_already_parsed = cursor,
        }
    }

    /// Scan the current token again at its shifted `start`
    fn rescan_current(&mut self, previous: Token, start: usize) {
        self.bytes_already_parsed = start;
        self.raw_text_closer = self.token_raw_text_closer.clone();
        let last_error = self.last_error.clone();

        let same_token = self.parse_next_token()
            && self
                .token
                .is_some_and(|token| token.kind == previous.kind && token.span.start == start);
        if same_token || previous.kind != TokenKind::Text {
            return;
        }

        // Text emptied by an edit has nothing left to scan
        self.last_error = last_error;
        self.stay_on_empty_text(start, previous.raw);
    }

    /// Make a zero-length text node at `start` the current token
    fn stay_on_empty_text(&mut self, start: usize, raw: bool) {
        let span = Span::new(start, 0);
        self.token = Some(Token {
            kind: TokenKind::Text,
            span,
            name: None,
            text: Some(span),
            raw,
        });
        self.attributes.clear();
        self.state = ParserState::TextNode;
        self.bytes_already_parsed = start;
        self.raw_text_closer = self.token_raw_text_closer.clone();
    }

    // ========== Bookmarks ==========

    /// Remember the current token under `name`
    pub fn set_bookmark(&mut self, name: &str) -> bool {
        let Some(token) = self.token else {
            return false;
        };
        self.bookmarks.insert(
            name,
            Bookmark {
                span: token.span,
                raw_text_closer: self.token_raw_text_closer.clone(),
            },
        )
    }

    pub fn release_bookmark(&mut self, name: &str) -> bool {
        self.bookmarks.remove(name)
    }

    pub fn has_bookmark(&self, name: &str) -> bool {
        self.bookmarks.contains(name)
    }

    /// Jump back (or forward) to a bookmarked token
    ///
    /// Pending edits are applied first. A seek also clears a previous
    /// syntax error, since the bookmarked token scanned cleanly.
    pub fn seek(&mut self, name: &str) -> bool {
        if !self.bookmarks.contains(name) {
            return false;
        }
        if self.seek_count >= MAX_SEEK_OPS {
            log::warn!(
                target: "xml_tag_processor::processor",
                "too many seeks, refusing to seek to {name:?}"
            );
            return false;
        }
        self.seek_count += 1;

        self.flush_updates();
        let Some(bookmark) = self.bookmarks.get(name).cloned() else {
            return false;
        };

        self.state = ParserState::Ready;
        self.last_error = None;
        self.token = None;
        self.attributes.clear();

        // Only a text node emptied after it was bookmarked has no length
        if bookmark.span.is_empty() {
            self.token_raw_text_closer = bookmark.raw_text_closer.clone();
            self.stay_on_empty_text(bookmark.span.start, bookmark.raw_text_closer.is_some());
            return true;
        }

        self.bytes_already_parsed = bookmark.span.start;
        self.raw_text_closer = bookmark.raw_text_closer;
        self.parse_next_token()
    }

    #[cfg(test)]
    pub(crate) fn bookmark_span(&self, name: &str) -> Option<Span> {
        self.bookmarks.get(name).map(|bookmark| bookmark.span)
    }

    #[cfg(test)]
    pub(crate) fn queued_update_count(&self) -> usize {
        self.updates.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::processor::TagClosers;
    use pretty_assertions::assert_eq;

    fn token_names(xml: &str) -> Vec<String> {
        let mut processor = XmlTagProcessor::new(xml);
        let mut names = Vec::new();
        while processor.next_token() {
            names.push(processor.get_token_name().unwrap_or_default().to_string());
        }
        names
    }

    #[test]
    fn test_round_trip_without_edits() {
        let xml = "<?xml version=\"1.0\"?>\r\n<r a='1'>x &amp; y<!-- c --></r>";
        let mut processor = XmlTagProcessor::new(xml);
        while processor.next_token() {}
        assert_eq!(processor.get_updated_text(), xml);
    }

    #[test]
    fn test_flush_is_idempotent() {
        let mut processor = XmlTagProcessor::new("<a x=\"1\" y=\"2\"><b/></a>");
        assert!(processor.next_tag());
        processor.set_attribute("x", "one");
        processor.remove_attribute("y");
        processor.set_attribute("z", "3");
        let first = processor.get_updated_text();
        let second = processor.get_updated_text();
        assert_eq!(first, "<a z=\"3\" x=\"one\" ><b/></a>");
        assert_eq!(first, second);
        assert_eq!(processor.queued_update_count(), 0);
    }

    #[test]
    fn test_set_attribute_coalesces() {
        let mut processor = XmlTagProcessor::new("<a id=\"0\" class=\"c\">");
        assert!(processor.next_tag());
        for value in ["v1", "v2", "v3"] {
            assert!(processor.set_attribute("id", value));
            assert!(processor.set_attribute("new", value));
        }
        assert_eq!(processor.queued_update_count(), 2);
        assert_eq!(
            processor.get_updated_text(),
            "<a new=\"v3\" id=\"v3\" class=\"c\">"
        );
    }

    #[test]
    fn test_bookmark_survives_prior_edits() {
        let mut processor = XmlTagProcessor::new("<a id=\"remove\"/><b enabled=\"yes\">Test</b><c id=\"keep\">");
        assert!(processor.next_tag());
        assert!(processor.remove_attribute("id"));
        assert!(processor.next_tag());
        assert_eq!(processor.get_tag(), Some("b"));
        assert!(processor.set_bookmark("b"));
        assert!(processor.set_attribute("id", "b-1"));
        assert_eq!(
            processor.get_updated_text(),
            "<a  /><b id=\"b-1\" enabled=\"yes\">Test</b><c id=\"keep\">"
        );
        assert_eq!(processor.bookmark_span("b"), Some(Span::new(6, 26)));

        assert!(processor.set_attribute("id", "b-2"));
        assert_eq!(
            processor.get_updated_text(),
            "<a  /><b id=\"b-2\" enabled=\"yes\">Test</b><c id=\"keep\">"
        );
        assert_eq!(processor.get_tag(), Some("b"));
        assert_eq!(processor.get_attribute("enabled").as_deref(), Some("yes"));
    }

    #[test]
    fn test_seek_back_and_forth_with_edits() {
        let mut processor = XmlTagProcessor::new("<a id=\"remove\"/><b enabled=\"yes\">Test</b><c id=\"c\">");
        assert!(processor.next_tag());
        assert!(processor.remove_attribute("id"));
        assert!(processor.next_tag());
        assert!(processor.set_bookmark("b"));
        assert!(processor.set_attribute("id", "b-1"));
        assert!(processor.next_tag());
        assert!(processor.set_bookmark("c"));
        assert!(processor.set_attribute("id", "c-1"));

        assert!(processor.seek("b"));
        assert_eq!(processor.get_attribute("id").as_deref(), Some("b-1"));
        assert!(processor.set_attribute("id", "b-2"));

        assert!(processor.seek("c"));
        assert_eq!(processor.get_tag(), Some("c"));
        assert_eq!(processor.get_attribute("id").as_deref(), Some("c-1"));
        assert!(processor.set_attribute("x", "y"));
        assert_eq!(
            processor.get_updated_text(),
            "<a  /><b id=\"b-2\" enabled=\"yes\">Test</b><c x=\"y\" id=\"c-1\">"
        );
    }

    #[test]
    fn test_emptied_text_stays_current() {
        let mut processor = XmlTagProcessor::new("<r>text<a/></r>");
        processor.next_token();
        processor.next_token();
        assert!(processor.set_modifiable_text(""));
        assert_eq!(processor.get_updated_text(), "<r><a/></r>");
        assert_eq!(processor.get_token_type(), Some(TokenType::Text));
        assert_eq!(processor.get_tag(), None);
        assert_eq!(processor.get_modifiable_text(), "");

        assert!(processor.next_token());
        assert_eq!(processor.get_tag(), Some("a"));
        assert!(processor.next_token());
        assert!(processor.is_tag_closer());
        assert!(!processor.next_token());
        assert_eq!(processor.state(), ParserState::Complete);
    }

    #[test]
    fn test_emptied_text_at_end_of_input() {
        let mut processor = XmlTagProcessor::new("<r/>tail");
        processor.next_token();
        processor.next_token();
        assert!(processor.set_modifiable_text(""));
        assert_eq!(processor.get_updated_text(), "<r/>");
        assert_eq!(processor.state(), ParserState::TextNode);
        assert!(processor.set_modifiable_text("new"));
        assert_eq!(processor.get_updated_text(), "<r/>new");
        assert_eq!(processor.get_modifiable_text(), "new");
        assert!(!processor.next_token());
        assert_eq!(processor.state(), ParserState::Complete);
    }

    #[test]
    fn test_emptied_pcdata_text_stays_current() {
        let mut processor = XmlTagProcessor::new("<root><script>x</script></root>");
        processor.declare_element_as_pcdata("script");
        processor.next_token();
        processor.next_token();
        processor.next_token();
        assert!(processor.set_modifiable_text(""));
        assert_eq!(processor.get_updated_text(), "<root><script></script></root>");
        assert_eq!(processor.get_token_type(), Some(TokenType::Text));

        assert!(processor.next_token());
        assert_eq!(processor.get_tag(), Some("script"));
        assert!(processor.is_tag_closer());
        assert!(processor.next_token());
        assert_eq!(processor.get_tag(), Some("root"));
        assert!(!processor.next_token());
        assert_eq!(processor.get_last_error(), None);
    }

    #[test]
    fn test_seek_to_emptied_text() {
        let mut processor = XmlTagProcessor::new("<r>text<a/></r>");
        processor.next_token();
        processor.next_token();
        assert!(processor.set_bookmark("text"));
        assert!(processor.set_modifiable_text(""));
        assert!(processor.next_tag());
        assert!(processor.seek("text"));
        assert_eq!(processor.get_token_type(), Some(TokenType::Text));
        assert_eq!(processor.bookmark_span("text"), Some(Span::new(3, 0)));
        assert!(processor.next_token());
        assert_eq!(processor.get_tag(), Some("a"));
        assert_eq!(processor.get_updated_text(), "<r><a/></r>");
    }

    #[test]
    fn test_updates_detach_when_leaving_token() {
        let mut processor = XmlTagProcessor::new("<a/><b/>");
        assert!(processor.next_tag());
        processor.set_attribute("id", "1");
        assert!(processor.next_tag());
        assert_eq!(processor.get_attribute("id"), None);
        processor.set_attribute("id", "2");
        assert_eq!(processor.get_updated_text(), "<a id=\"1\"/><b id=\"2\"/>");
    }

    #[test]
    fn test_get_attribute() {
        let mut processor = XmlTagProcessor::new("<a one=\"&#65;&amp;B\" two='x'>text</a>");
        assert!(processor.next_tag());
        assert_eq!(processor.get_attribute("one").as_deref(), Some("A&B"));
        assert_eq!(processor.get_attribute("two").as_deref(), Some("x"));
        assert_eq!(processor.get_attribute("three"), None);
        assert!(processor.next_token());
        assert_eq!(processor.get_attribute("one"), None);
        assert!(processor.next_token());
        assert!(processor.is_tag_closer());
        assert_eq!(processor.get_attribute("one"), None);
    }

    #[test]
    fn test_read_your_writes() {
        let mut processor = XmlTagProcessor::new("<a keep=\"1\" drop=\"2\">");
        assert!(processor.next_tag());
        processor.set_attribute("keep", "<new>");
        processor.remove_attribute("drop");
        processor.set_attribute("data-x", "y");
        assert_eq!(processor.get_attribute("keep").as_deref(), Some("<new>"));
        assert_eq!(processor.get_attribute("drop"), None);
        assert_eq!(
            processor.get_attribute_names_with_prefix(""),
            Some(vec!["keep".to_string(), "data-x".to_string()])
        );
        assert_eq!(
            processor.get_attribute_names_with_prefix("data-"),
            Some(vec!["data-x".to_string()])
        );
        assert_eq!(
            processor.get_updated_text(),
            "<a data-x=\"y\" keep=\"&lt;new&gt;\" >"
        );
    }

    #[test]
    fn test_remove_pending_insertion() {
        let mut processor = XmlTagProcessor::new("<a>");
        assert!(processor.next_tag());
        assert!(!processor.remove_attribute("id"));
        processor.set_attribute("id", "1");
        assert!(processor.remove_attribute("id"));
        assert_eq!(processor.get_attribute("id"), None);
        assert_eq!(processor.get_updated_text(), "<a>");
    }

    #[test]
    fn test_edits_need_an_opener() {
        let mut processor = XmlTagProcessor::new("<a>t</a>");
        assert!(!processor.set_attribute("id", "1"));
        assert!(processor.next_tag());
        assert!(!processor.set_attribute("1bad", "1"));
        assert!(!processor.set_attribute("a b", "1"));
        assert!(processor.next_token());
        assert!(!processor.set_attribute("id", "1"));
        assert_eq!(processor.get_attribute_names_with_prefix(""), None);
        assert!(processor.next_token());
        assert!(!processor.set_attribute("id", "1"));
        assert!(!processor.remove_attribute("id"));
        assert_eq!(processor.get_updated_text(), "<a>t</a>");
    }

    #[test]
    fn test_token_names() {
        let names = token_names("<?xml version=\"1.0\"?><!--c--><?pi d?><r>t<![CDATA[x]]><e/></r>");
        assert_eq!(
            names,
            vec![
                "#xml-declaration",
                "#comment",
                "#processing-instructions",
                "r",
                "#text",
                "#cdata-section",
                "e",
                "r"
            ]
        );
    }

    #[test]
    fn test_declaration_and_pi_access() {
        let mut processor = XmlTagProcessor::new("<?xml version=\"1.0\" encoding='UTF-8'?><?style href=\"a\"?>");
        assert!(processor.next_token());
        assert_eq!(processor.get_token_type(), Some(TokenType::XmlDeclaration));
        assert_eq!(processor.get_attribute("encoding").as_deref(), Some("UTF-8"));
        assert!(!processor.set_attribute("standalone", "yes"));
        assert_eq!(
            processor.get_attribute_names_with_prefix(""),
            Some(vec!["version".to_string(), "encoding".to_string()])
        );
        assert_eq!(processor.get_modifiable_text(), "");
        assert!(processor.next_token());
        assert_eq!(processor.get_pi_target(), Some("style"));
        assert_eq!(processor.get_modifiable_text(), " href=\"a\"");
        assert_eq!(processor.get_attribute("href"), None);
        assert_eq!(processor.get_attribute_names_with_prefix(""), None);
    }

    #[test]
    fn test_cdata_isolation() {
        let mut processor = XmlTagProcessor::new("a<![CDATA[ b ]]>c");
        let mut texts = Vec::new();
        while processor.next_token() {
            texts.push((processor.get_token_type(), processor.get_modifiable_text()));
        }
        assert_eq!(
            texts,
            vec![
                (Some(TokenType::Text), "a".to_string()),
                (Some(TokenType::CdataSection), " b ".to_string()),
                (Some(TokenType::Text), "c".to_string()),
            ]
        );
        assert_eq!(processor.state(), ParserState::Complete);
    }

    #[test]
    fn test_modifiable_text_decoding() {
        let mut processor = XmlTagProcessor::new("<r>a &amp; &unknown;\r\nb<![CDATA[&amp;\r]]></r>");
        processor.next_token();
        processor.next_token();
        assert_eq!(processor.get_modifiable_text(), "a & &unknown;\nb");
        processor.next_token();
        assert_eq!(processor.get_modifiable_text(), "&amp;\n");
    }

    #[test]
    fn test_set_modifiable_text() {
        let mut processor = XmlTagProcessor::new("<p>old</p><!--c--><![CDATA[d]]>");
        processor.next_token();
        assert!(!processor.set_modifiable_text("tag"));
        processor.next_token();
        assert!(processor.set_modifiable_text("x < y"));
        assert_eq!(processor.get_modifiable_text(), "x < y");
        processor.next_token();
        processor.next_token();
        assert!(!processor.set_modifiable_text("a--b"));
        assert!(!processor.set_modifiable_text("a-"));
        assert!(processor.set_modifiable_text(" ok "));
        processor.next_token();
        assert!(!processor.set_modifiable_text("]]>"));
        assert!(processor.set_modifiable_text("<raw>"));
        assert_eq!(
            processor.get_updated_text(),
            "<p>x &lt; y</p><!-- ok --><![CDATA[<raw>]]>"
        );
    }

    #[test]
    fn test_pcdata_element() {
        let mut processor = XmlTagProcessor::new("<root><script><b>&</script></root>");
        processor.declare_element_as_pcdata("script");
        assert!(processor.next_tag());
        assert!(processor.next_tag());
        assert_eq!(processor.get_tag(), Some("script"));
        assert!(processor.next_token());
        assert_eq!(processor.get_token_type(), Some(TokenType::Text));
        assert_eq!(processor.get_modifiable_text(), "<b>&");
        assert!(!processor.set_modifiable_text("x</script>"));
        assert!(processor.set_modifiable_text("1 < 2"));
        assert!(processor.next_token());
        assert!(processor.is_tag_closer());
        assert_eq!(processor.get_tag(), Some("script"));
        assert_eq!(
            processor.get_updated_text(),
            "<root><script>1 < 2</script></root>"
        );
    }

    #[test]
    fn test_pcdata_declared_on_current_opener() {
        let mut processor = XmlTagProcessor::new("<style>a<b</style>");
        assert!(processor.next_tag());
        processor.declare_element_as_pcdata("style");
        assert!(processor.next_token());
        assert_eq!(processor.get_modifiable_text(), "a<b");
    }

    #[test]
    fn test_seek() {
        let mut processor = XmlTagProcessor::new("<a/><b/><c/>");
        assert!(processor.next_tag());
        assert!(processor.set_bookmark("first"));
        assert!(processor.next_tag());
        assert!(processor.next_tag());
        assert!(!processor.next_tag());
        assert!(processor.seek("first"));
        assert_eq!(processor.get_tag(), Some("a"));
        assert!(processor.next_tag());
        assert_eq!(processor.get_tag(), Some("b"));
        assert!(!processor.seek("missing"));
    }

    #[test]
    fn test_seek_flushes_and_restores_pcdata_mode() {
        let mut processor = XmlTagProcessor::new("<s><x/></s><t/>");
        processor.declare_element_as_pcdata("s");
        processor.next_token();
        processor.next_token();
        assert_eq!(processor.get_modifiable_text(), "<x/>");
        assert!(processor.set_bookmark("raw"));
        processor.next_token();
        processor.next_token();
        assert_eq!(processor.get_tag(), Some("t"));
        processor.set_attribute("k", "v");
        assert!(processor.seek("raw"));
        assert_eq!(processor.get_token_type(), Some(TokenType::Text));
        assert_eq!(processor.get_modifiable_text(), "<x/>");
        assert_eq!(processor.get_updated_text(), "<s><x/></s><t k=\"v\"/>");
    }

    #[test]
    fn test_seek_limit() {
        let mut processor = XmlTagProcessor::new("<a/>");
        processor.next_tag();
        processor.set_bookmark("a");
        for _ in 0..MAX_SEEK_OPS {
            assert!(processor.seek("a"));
        }
        assert!(!processor.seek("a"));
    }

    #[test]
    fn test_bookmark_lifecycle() {
        let mut processor = XmlTagProcessor::new("<a/>");
        assert!(!processor.set_bookmark("early"));
        processor.next_tag();
        assert!(processor.set_bookmark("a"));
        assert!(processor.has_bookmark("a"));
        assert!(processor.release_bookmark("a"));
        assert!(!processor.has_bookmark("a"));
        assert!(!processor.release_bookmark("a"));
    }

    #[test]
    fn test_incomplete_vs_error() {
        let mut processor = XmlTagProcessor::new("<!--");
        assert!(!processor.next_token());
        assert!(processor.paused_at_incomplete_token());
        assert_eq!(processor.get_last_error(), None);

        let mut processor = XmlTagProcessor::new("<!-- a -- b -->");
        assert!(!processor.next_token());
        assert!(!processor.paused_at_incomplete_token());
        assert_eq!(processor.get_last_error(), Some(ErrorKind::DoubleHyphenInComment));
    }

    #[test]
    fn test_duplicate_attribute() {
        let mut processor = XmlTagProcessor::new("<a id=\"x\" id=\"y\">");
        assert!(!processor.next_tag());
        assert_eq!(processor.state(), ParserState::SyntaxError);
        assert_eq!(
            processor.get_last_error_details(),
            Some(&ParseError::new(ErrorKind::DuplicateAttribute, 10))
        );
        assert!(!processor.next_token());
        assert_eq!(processor.get_tag(), None);
    }

    #[test]
    fn test_next_tag_with_query() {
        let xml = "<a><b/><b>x</b><c/></a>";

        let mut processor = XmlTagProcessor::new(xml);
        assert!(processor.next_tag_with(&TagQuery::new().tag_name("b").match_offset(2)));
        assert!(!processor.is_empty_element());
        assert!(processor.next_tag_with(&TagQuery::new().tag_name("c")));
        assert!(processor.is_empty_element());

        let mut processor = XmlTagProcessor::new(xml);
        let query = TagQuery {
            tag_closers: TagClosers::Visit,
            ..TagQuery::new().tag_name("b")
        };
        let mut seen = Vec::new();
        while processor.next_tag_with(&query) {
            seen.push(processor.is_tag_closer());
        }
        assert_eq!(seen, vec![false, false, true]);
    }

    #[test]
    fn test_breadcrumb_query_refused() {
        let mut processor = XmlTagProcessor::new("<a/>");
        assert!(!processor.next_tag_with(&TagQuery::new().breadcrumbs(&["a"])));
        assert_eq!(processor.state(), ParserState::Ready);
    }

    #[test]
    fn test_many_updates_flush_automatically() {
        let count = MAX_LEXICAL_UPDATES + 2;
        let mut processor = XmlTagProcessor::new("<a/>".repeat(count));
        while processor.next_tag() {
            processor.set_attribute("n", "1");
        }
        assert!(processor.queued_update_count() <= MAX_LEXICAL_UPDATES);
        assert_eq!(processor.get_updated_text(), "<a n=\"1\"/>".repeat(count));
    }

    #[test]
    fn test_edits_while_paused_at_incomplete_input() {
        let mut processor = XmlTagProcessor::new("<a><b");
        assert!(processor.next_tag());
        processor.set_attribute("id", "1");
        assert!(!processor.next_tag());
        assert!(processor.paused_at_incomplete_token());
        assert_eq!(processor.get_updated_text(), "<a id=\"1\"><b");
    }
}
