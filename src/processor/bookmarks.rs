//! Named bookmarks over token spans
//!
//! A bookmark remembers where a token sits in the buffer. Applying lexical
//! updates moves bookmarks so they keep pointing at the same token.

use crate::core::span::{Span, TextReplacement};
use std::collections::HashMap;

use super::MAX_BOOKMARKS;

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Bookmark {
    pub span: Span,
    /// PCDATA element the token was scanned inside of, if any
    pub raw_text_closer: Option<String>,
}

#[derive(Debug, Default)]
pub(crate) struct BookmarkTable {
    marks: HashMap<String, Bookmark>,
}

impl BookmarkTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Bookmark> {
        self.marks.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.marks.contains_key(name)
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.marks.len()
    }

    /// Store a bookmark, overwriting one of the same name
    ///
    /// Fails when a new name would exceed [`MAX_BOOKMARKS`].
    pub fn insert(&mut self, name: &str, bookmark: Bookmark) -> bool {
        if let Some(existing) = self.marks.get_mut(name) {
            *existing = bookmark;
            return true;
        }
        if self.marks.len() >= MAX_BOOKMARKS {
            log::warn!(
                target: "xml_tag_processor::processor",
                "too many bookmarks, cannot set {name:?}"
            );
            return false;
        }
        self.marks.insert(name.to_owned(), bookmark);
        true
    }

    pub fn remove(&mut self, name: &str) -> bool {
        self.marks.remove(name).is_some()
    }

    /// Move every bookmark across the applied `replacements` (sorted by start)
    ///
    /// Edits that end at or before a bookmark shift it. Edits inside it only
    /// change its length.
    pub fn rebase(&mut self, replacements: &[TextReplacement]) {
        for bookmark in self.marks.values_mut() {
            let start = bookmark.span.start;
            let end = bookmark.span.end();
            let empty = bookmark.span.is_empty();
            let mut head: isize = 0;
            let mut tail: isize = 0;

            for replacement in replacements {
                // An emptied text node is refilled by an insertion at its offset
                let fills = empty && replacement.start == start;
                if replacement.start >= end && !fills {
                    break;
                }
                let delta = replacement.delta();
                if replacement.end() <= start && !fills {
                    head += delta;
                }
                tail += delta;
            }

            let new_start = start.saturating_add_signed(head);
            let new_end = end.saturating_add_signed(tail).max(new_start);
            bookmark.span = Span::from_bounds(new_start, new_end);
        }
    }
}
