//! Lexical update queue
//!
//! Pending edits are byte-range replacements against the processor's
//! current buffer. Nothing is copied until the queue is materialized.

use crate::core::span::{Span, TextReplacement};

/// What a queued update edits, while the processor is still on its token
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum UpdateTarget {
    Attribute(String),
    ModifiableText,
}

#[derive(Debug, Clone)]
pub(crate) struct LexicalUpdate {
    /// None once the processor has moved past the token the edit belongs to
    target: Option<UpdateTarget>,
    /// What reads report before the edit is applied; None for removals
    pending: Option<String>,
    replacement: TextReplacement,
}

#[derive(Debug, Default)]
pub(crate) struct UpdateQueue {
    updates: Vec<LexicalUpdate>,
}

impl UpdateQueue {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.updates.len()
    }

    /// Queue an edit, replacing an earlier one with the same target
    pub fn enqueue(&mut self, target: UpdateTarget, pending: Option<String>, replacement: TextReplacement) {
        match self
            .updates
            .iter_mut()
            .find(|update| update.target.as_ref() == Some(&target))
        {
            Some(existing) => {
                existing.pending = pending;
                existing.replacement = replacement;
            }
            None => self.updates.push(LexicalUpdate {
                target: Some(target),
                pending,
                replacement,
            }),
        }
    }

    /// Drop the queued edit for `target`, returning whether there was one
    pub fn cancel(&mut self, target: &UpdateTarget) -> bool {
        let before = self.updates.len();
        self.updates.retain(|update| update.target.as_ref() != Some(target));
        self.updates.len() != before
    }

    /// Pending state of `target`: None if untouched, Some(None) if removed
    pub fn pending(&self, target: &UpdateTarget) -> Option<Option<&str>> {
        self.updates
            .iter()
            .find(|update| update.target.as_ref() == Some(target))
            .map(|update| update.pending.as_deref())
    }

    /// Pending state of the attribute `name`, without allocating a target
    pub fn pending_attribute(&self, name: &str) -> Option<Option<&str>> {
        self.updates
            .iter()
            .find(|update| matches!(&update.target, Some(UpdateTarget::Attribute(n)) if n == name))
            .map(|update| update.pending.as_deref())
    }

    /// Names of attributes given a value by a pending edit, in queue order
    pub fn set_attribute_names(&self) -> impl Iterator<Item = &str> {
        self.updates.iter().filter_map(|update| match (&update.target, &update.pending) {
            (Some(UpdateTarget::Attribute(name)), Some(_)) => Some(name.as_str()),
            _ => None,
        })
    }

    /// Forget which token the queued edits belong to
    pub fn detach_targets(&mut self) {
        for update in &mut self.updates {
            update.target = None;
        }
    }

    /// Whether an edit touches bytes at or after `pos`
    pub fn any_at_or_after(&self, pos: usize) -> bool {
        self.updates.iter().any(|update| update.replacement.start >= pos)
    }

    /// Empty the queue, returning the replacements in ascending start order
    ///
    /// The sort is stable so several insertions at one offset keep the
    /// order they were queued in.
    pub fn take_sorted(&mut self) -> Vec<TextReplacement> {
        let mut replacements: Vec<TextReplacement> = self
            .updates
            .drain(..)
            .map(|update| update.replacement)
            .collect();
        replacements.sort_by_key(|replacement| replacement.start);
        replacements
    }
}

/// Build the updated text from `source` and sorted, non-overlapping replacements
pub(crate) fn materialize(source: &str, replacements: &[TextReplacement]) -> String {
    let growth: isize = replacements.iter().map(TextReplacement::delta).sum();
    let mut output = String::with_capacity(source.len().saturating_add_signed(growth));
    let mut copied = 0;

    for replacement in replacements {
        let Some(unchanged) = source.get(copied..replacement.start) else {
            log::warn!(
                target: "xml_tag_processor::processor",
                "skipping overlapping update at byte {}",
                replacement.start
            );
            continue;
        };
        output.push_str(unchanged);
        output.push_str(&replacement.text);
        copied = replacement.end();
    }

    output.push_str(source.get(copied..).unwrap_or(""));
    output
}

/// Where `offset` lands once `replacements` are applied
///
/// Only edits that end at or before the offset move it.
pub(crate) fn shift_offset(offset: usize, replacements: &[TextReplacement]) -> usize {
    let delta: isize = replacements
        .iter()
        .take_while(|replacement| replacement.start <= offset)
        .filter(|replacement| replacement.end() <= offset)
        .map(TextReplacement::delta)
        .sum();
    offset.saturating_add_signed(delta)
}

/// Where a token at `span` starts once `replacements` are applied
///
/// An empty span owns insertions at its own offset, so they fill it
/// instead of pushing it back.
pub(crate) fn shift_start(span: Span, replacements: &[TextReplacement]) -> usize {
    if !span.is_empty() {
        return shift_offset(span.start, replacements);
    }
    let delta: isize = replacements
        .iter()
        .take_while(|replacement| replacement.start < span.start)
        .filter(|replacement| replacement.end() <= span.start)
        .map(TextReplacement::delta)
        .sum();
    span.start.saturating_add_signed(delta)
}
