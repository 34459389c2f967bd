//! Source edits produced by fixers and their batch application.

use std::sync::atomic::{AtomicBool, Ordering};

use serde::Serialize;

use crate::syntax::TextSpan;

/// Replace the bytes covered by `span` with `new_text`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextEdit {
    pub span: TextSpan,
    pub new_text: String,
}

impl TextEdit {
    pub fn new(span: TextSpan, new_text: impl Into<String>) -> Self {
        Self {
            span,
            new_text: new_text.into(),
        }
    }

    /// Apply this edit alone to `source`.
    pub fn apply(&self, source: &str) -> String {
        let mut out = String::with_capacity(source.len() + self.new_text.len());
        out.push_str(&source[..self.span.start]);
        out.push_str(&self.new_text);
        out.push_str(&source[self.span.end..]);
        out
    }
}

/// Result of applying a batch of edits to one document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FixOutcome {
    pub text: String,
    pub applied: usize,
    /// Edits dropped because they overlapped an earlier one or fell outside
    /// the document.
    pub skipped: usize,
    pub cancelled: bool,
}

/// Sort `edits` and keep those that fit `source` without overlapping an
/// earlier one. Returns the accepted edits and the number dropped.
pub fn non_overlapping(source: &str, mut edits: Vec<TextEdit>) -> (Vec<TextEdit>, usize) {
    edits.sort_by_key(|e| (e.span.start, e.span.end));

    let mut accepted: Vec<TextEdit> = Vec::with_capacity(edits.len());
    let mut skipped = 0;
    for edit in edits {
        let in_bounds = edit.span.end <= source.len()
            && source.is_char_boundary(edit.span.start)
            && source.is_char_boundary(edit.span.end);
        let overlaps = accepted
            .last()
            .is_some_and(|prev| edit.span.start < prev.span.end || prev.span == edit.span);
        if !in_bounds || overlaps {
            skipped += 1;
            continue;
        }
        accepted.push(edit);
    }
    (accepted, skipped)
}

/// Apply non-overlapping edits to `source`.
///
/// Edits are taken in source order; one that overlaps an already accepted
/// edit is skipped and left for a later pass. `cancel` is checked before
/// each edit, and a cancelled batch returns the edits applied so far.
pub fn apply_edits(source: &str, edits: Vec<TextEdit>, cancel: &AtomicBool) -> FixOutcome {
    let (accepted, skipped) = non_overlapping(source, edits);

    let mut text = source.to_string();
    let mut applied = 0;
    let mut cancelled = false;
    // Back to front so earlier spans stay valid.
    for edit in accepted.iter().rev() {
        if cancel.load(Ordering::Relaxed) {
            cancelled = true;
            break;
        }
        text.replace_range(edit.span.start..edit.span.end, &edit.new_text);
        applied += 1;
    }

    FixOutcome {
        text,
        applied,
        skipped,
        cancelled,
    }
}
