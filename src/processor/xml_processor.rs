//! Structural processor
//!
//! Adds document grammar on top of [`XmlTagProcessor`]: one root element,
//! properly nested closers, and nothing but whitespace, comments and
//! processing instructions around the root. The open-element stack is what
//! breadcrumbs and depth are read from.

use crate::core::error::{ErrorKind, ParseError};
use crate::core::scanner::is_whitespace;
use crate::core::tokenizer::TokenKind;
use std::collections::HashMap;

use super::breadcrumbs::matches_suffix;
use super::query::TagQuery;
use super::tag_processor::{ParserState, TokenType, XmlTagProcessor};

/// Part of the document the processor is in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DocumentStage {
    /// Before the root element opens
    #[default]
    Prolog,
    /// Inside the root element
    Element,
    /// After the root element closed
    Misc,
}

/// Structural state captured alongside a bookmark
#[derive(Debug, Clone)]
struct StructuralSnapshot {
    stack: Vec<String>,
    stage: DocumentStage,
    pop_on_next_step: bool,
}

/// Tag processor that tracks nesting and enforces the document grammar.
///
/// ```
/// use xml_tag_processor::{TagQuery, XmlProcessor};
///
/// let mut processor = XmlProcessor::new("<wp:post><content><image src=\"a.png\"/></content></wp:post>");
/// let query = TagQuery::new().breadcrumbs(&["content", "image"]);
/// assert!(processor.next_tag_with(&query));
/// assert_eq!(processor.get_current_depth(), 3);
/// assert_eq!(processor.get_attribute("src").as_deref(), Some("a.png"));
/// ```
#[derive(Debug)]
pub struct XmlProcessor {
    tags: XmlTagProcessor,
    stack: Vec<String>,
    stage: DocumentStage,
    /// The current token is a self-closing element, popped on the next step
    pop_on_next_step: bool,
    snapshots: HashMap<String, StructuralSnapshot>,
}

impl XmlProcessor {
    pub fn new(xml: impl Into<String>) -> Self {
        XmlProcessor {
            tags: XmlTagProcessor::new(xml),
            stack: Vec::new(),
            stage: DocumentStage::Prolog,
            pop_on_next_step: false,
            snapshots: HashMap::new(),
        }
    }

    pub fn declare_element_as_pcdata(&mut self, name: &str) {
        self.tags.declare_element_as_pcdata(name);
    }

    // ========== Advancing ==========

    /// Move to the next token, checking it against the document grammar
    pub fn next_token(&mut self) -> bool {
        self.step()
    }

    pub fn next_tag(&mut self) -> bool {
        self.next_tag_with(&TagQuery::default())
    }

    /// Move to the next tag matching `query`, breadcrumbs included
    ///
    /// Breadcrumb patterns only ever match opening tags.
    pub fn next_tag_with(&mut self, query: &TagQuery<'_>) -> bool {
        let mut remaining = query.match_offset.max(1);
        while self.step() {
            if !self.tags.matches_tag_query(query) {
                continue;
            }
            let crumbs_match = match query.breadcrumbs {
                Some(pattern) => !self.tags.is_tag_closer() && self.matches_breadcrumbs(pattern),
                None => true,
            };
            if crumbs_match {
                remaining -= 1;
                if remaining == 0 {
                    return true;
                }
            }
        }
        false
    }

    fn step(&mut self) -> bool {
        if self.tags.state().is_terminal() {
            return false;
        }

        if self.pop_on_next_step {
            self.pop_on_next_step = false;
            self.pop_element();
        }

        if !self.tags.next_token() {
            if self.tags.state() == ParserState::Complete && self.stage != DocumentStage::Misc {
                self.tags.pause_incomplete();
            }
            return false;
        }

        let Some(kind) = self.tags.current_kind() else {
            return false;
        };

        match kind {
            TokenKind::StartTag | TokenKind::EmptyTag => {
                if self.stage == DocumentStage::Misc {
                    return self.reject(ErrorKind::ElementAfterRoot);
                }
                let name = self.tags.get_tag().unwrap_or_default().to_owned();
                self.stage = DocumentStage::Element;
                self.stack.push(name);
                self.pop_on_next_step = kind == TokenKind::EmptyTag;
            }
            TokenKind::EndTag => {
                let closes_innermost = self
                    .stack
                    .last()
                    .map(|open| self.tags.get_tag() == Some(open.as_str()));
                match closes_innermost {
                    None => return self.reject(ErrorKind::UnexpectedClosingTag),
                    Some(false) => return self.reject(ErrorKind::MismatchedClosingTag),
                    Some(true) => self.pop_element(),
                }
            }
            TokenKind::Text => {
                if self.stage != DocumentStage::Element && !self.tags.is_whitespace_text() {
                    return self.reject(ErrorKind::TextOutsideRoot);
                }
            }
            TokenKind::CData => {
                if self.stage != DocumentStage::Element {
                    return self.reject(ErrorKind::CdataOutsideRoot);
                }
            }
            TokenKind::Comment | TokenKind::ProcessingInstruction | TokenKind::XmlDeclaration => {}
        }
        true
    }

    fn pop_element(&mut self) {
        self.stack.pop();
        if self.stack.is_empty() && self.stage == DocumentStage::Element {
            self.stage = DocumentStage::Misc;
        }
    }

    fn reject(&mut self, kind: ErrorKind) -> bool {
        self.tags.fail_at_token(kind);
        false
    }

    // ========== Structure ==========

    /// Names of the open elements, outermost first
    ///
    /// A self-closing element is included for the step it is matched on.
    pub fn get_breadcrumbs(&self) -> Vec<&str> {
        self.stack.iter().map(String::as_str).collect()
    }

    /// Whether `pattern` matches the end of the breadcrumbs; `*` matches any one element
    pub fn matches_breadcrumbs(&self, pattern: &[&str]) -> bool {
        matches_suffix(self.stack.as_slice(), pattern)
    }

    pub fn get_current_depth(&self) -> usize {
        self.stack.len()
    }

    pub fn stage(&self) -> DocumentStage {
        self.stage
    }

    // ========== Token access ==========

    pub fn state(&self) -> ParserState {
        self.tags.state()
    }

    pub fn get_token_type(&self) -> Option<TokenType> {
        self.tags.get_token_type()
    }

    pub fn get_token_name(&self) -> Option<&str> {
        self.tags.get_token_name()
    }

    pub fn get_tag(&self) -> Option<&str> {
        self.tags.get_tag()
    }

    pub fn get_pi_target(&self) -> Option<&str> {
        self.tags.get_pi_target()
    }

    pub fn is_tag_closer(&self) -> bool {
        self.tags.is_tag_closer()
    }

    pub fn is_empty_element(&self) -> bool {
        self.tags.is_empty_element()
    }

    pub fn paused_at_incomplete_token(&self) -> bool {
        self.tags.paused_at_incomplete_token()
    }

    pub fn get_last_error(&self) -> Option<ErrorKind> {
        self.tags.get_last_error()
    }

    pub fn get_last_error_details(&self) -> Option<&ParseError> {
        self.tags.get_last_error_details()
    }

    // ========== Editing ==========

    pub fn get_attribute(&self, name: &str) -> Option<String> {
        self.tags.get_attribute(name)
    }

    pub fn get_attribute_names_with_prefix(&self, prefix: &str) -> Option<Vec<String>> {
        self.tags.get_attribute_names_with_prefix(prefix)
    }

    pub fn set_attribute(&mut self, name: &str, value: &str) -> bool {
        self.tags.set_attribute(name, value)
    }

    pub fn remove_attribute(&mut self, name: &str) -> bool {
        self.tags.remove_attribute(name)
    }

    pub fn get_modifiable_text(&self) -> String {
        self.tags.get_modifiable_text()
    }

    /// Like [`XmlTagProcessor::set_modifiable_text`], but text outside the
    /// root element may only be replaced by whitespace
    pub fn set_modifiable_text(&mut self, text: &str) -> bool {
        let outside_root = self.stage != DocumentStage::Element;
        if outside_root
            && self.tags.current_kind() == Some(TokenKind::Text)
            && !text.bytes().all(is_whitespace)
        {
            log::warn!(
                target: "xml_tag_processor::processor",
                "refusing non-whitespace text outside the root element"
            );
            return false;
        }
        self.tags.set_modifiable_text(text)
    }

    pub fn get_updated_text(&mut self) -> String {
        self.tags.get_updated_text()
    }

    // ========== Bookmarks ==========

    /// Remember the current token together with the open-element stack
    pub fn set_bookmark(&mut self, name: &str) -> bool {
        if !self.tags.set_bookmark(name) {
            return false;
        }
        self.snapshots.insert(
            name.to_owned(),
            StructuralSnapshot {
                stack: self.stack.clone(),
                stage: self.stage,
                pop_on_next_step: self.pop_on_next_step,
            },
        );
        true
    }

    pub fn release_bookmark(&mut self, name: &str) -> bool {
        self.snapshots.remove(name);
        self.tags.release_bookmark(name)
    }

    pub fn has_bookmark(&self, name: &str) -> bool {
        self.tags.has_bookmark(name)
    }

    /// Jump to a bookmark, restoring the breadcrumbs it was set with
    pub fn seek(&mut self, name: &str) -> bool {
        let Some(snapshot) = self.snapshots.get(name).cloned() else {
            return false;
        };
        if !self.tags.seek(name) {
            return false;
        }
        self.stack = snapshot.stack;
        self.stage = snapshot.stage;
        self.pop_on_next_step = snapshot.pop_on_next_step;
        true
    }
}
