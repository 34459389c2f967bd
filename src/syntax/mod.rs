//! Typed syntax tree for the C# the rules inspect.
//!
//! Parsing is done by `tree-sitter-c-sharp`; [`parser`] lowers its concrete
//! tree into [`ast`], keeping declarations, method bodies and every
//! invocation. Syntax errors are recovered by the grammar and reported next
//! to the tree instead of failing the file.

pub mod ast;
pub mod parser;
pub mod visit;

use std::fmt;

use serde::Serialize;
use thiserror::Error;

pub use ast::{CompilationUnit, Expr, ExprId, ExprKind};
pub use parser::{parse, parse_expression, ParseOutput};

/// Half-open byte range into a source document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord, Serialize)]
pub struct TextSpan {
    pub start: usize,
    pub end: usize,
}

impl TextSpan {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Smallest span covering both `self` and `other`.
    pub fn cover(self, other: TextSpan) -> TextSpan {
        TextSpan::new(self.start.min(other.start), self.end.max(other.end))
    }

    pub fn contains(&self, other: TextSpan) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    pub fn overlaps(&self, other: TextSpan) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Slice the text this span covers out of `source`.
    pub fn text<'s>(&self, source: &'s str) -> &'s str {
        &source[self.start..self.end]
    }
}

impl fmt::Display for TextSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// A syntax error, or a parser that could not run.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message} at {span}")]
pub struct SyntaxError {
    pub message: String,
    pub span: TextSpan,
}

impl SyntaxError {
    pub fn new(message: impl Into<String>, span: TextSpan) -> Self {
        Self {
            message: message.into(),
            span,
        }
    }
}

/// Maps byte offsets to zero-based line/column pairs and back.
#[derive(Debug, Clone)]
pub struct LineIndex {
    line_starts: Vec<usize>,
    len: usize,
}

impl LineIndex {
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(
            text.bytes()
                .enumerate()
                .filter(|(_, b)| *b == b'\n')
                .map(|(i, _)| i + 1),
        );
        Self {
            line_starts,
            len: text.len(),
        }
    }

    /// Zero-based `(line, column)` of a byte offset; columns count bytes.
    pub fn line_col(&self, offset: usize) -> (usize, usize) {
        let offset = offset.min(self.len);
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(next) => next - 1,
        };
        (line, offset - self.line_starts[line])
    }

    /// Byte offset of a zero-based `(line, column)`, clamped to the document.
    pub fn offset(&self, line: usize, column: usize) -> usize {
        match self.line_starts.get(line) {
            Some(start) => {
                let line_end = self
                    .line_starts
                    .get(line + 1)
                    .map_or(self.len, |next| next.saturating_sub(1));
                (start + column).min(line_end)
            }
            None => self.len,
        }
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_index_round_trip() {
        let text = "ab\ncde\n\nf";
        let index = LineIndex::new(text);
        assert_eq!(index.line_col(0), (0, 0));
        assert_eq!(index.line_col(4), (1, 1));
        assert_eq!(index.line_col(7), (2, 0));
        assert_eq!(index.line_col(8), (3, 0));
        assert_eq!(index.offset(1, 1), 4);
        assert_eq!(index.offset(1, 99), 6);
        assert_eq!(index.offset(9, 0), text.len());
        assert_eq!(index.line_count(), 4);
    }

    #[test]
    fn test_span_helpers() {
        let a = TextSpan::new(2, 5);
        let b = TextSpan::new(4, 9);
        assert_eq!(a.cover(b), TextSpan::new(2, 9));
        assert!(a.overlaps(b));
        assert!(!a.overlaps(TextSpan::new(5, 6)));
        assert!(TextSpan::new(0, 10).contains(a));
        assert_eq!(a.text("0123456"), "234");
    }
}
