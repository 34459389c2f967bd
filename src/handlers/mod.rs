//! LSP request handlers and the conversions between flowlint and protocol
//! types.
//!
//! Spans are byte offsets; LSP positions count UTF-16 code units, so every
//! conversion goes through the line text.

mod code_action;

pub use code_action::CodeActionHandler;

use tower_lsp::lsp_types::{self as lsp, NumberOrString, Position, Range};

use crate::diagnostics::Diagnostic;
use crate::rules::RuleSeverity;
use crate::syntax::{LineIndex, TextSpan};

/// `source` field of every published diagnostic.
pub const DIAGNOSTIC_SOURCE: &str = "flowlint";

pub fn position(content: &str, index: &LineIndex, offset: usize) -> Position {
    let (line, column) = index.line_col(offset);
    let line_start = offset.min(content.len()) - column;
    let prefix = content.get(line_start..line_start + column).unwrap_or("");
    Position::new(line as u32, prefix.encode_utf16().count() as u32)
}

pub fn offset(content: &str, index: &LineIndex, position: Position) -> usize {
    let line_start = index.offset(position.line as usize, 0);
    let mut units = 0u32;
    for (i, ch) in content[line_start..].char_indices() {
        if ch == '\n' || units >= position.character {
            return line_start + i;
        }
        units += ch.len_utf16() as u32;
    }
    content.len()
}

pub fn range(content: &str, index: &LineIndex, span: TextSpan) -> Range {
    Range::new(
        position(content, index, span.start),
        position(content, index, span.end),
    )
}

pub fn span(content: &str, index: &LineIndex, range: Range) -> TextSpan {
    TextSpan::new(
        offset(content, index, range.start),
        offset(content, index, range.end),
    )
}

fn severity(severity: RuleSeverity) -> lsp::DiagnosticSeverity {
    match severity {
        RuleSeverity::Error => lsp::DiagnosticSeverity::ERROR,
        RuleSeverity::Warning => lsp::DiagnosticSeverity::WARNING,
        RuleSeverity::Info => lsp::DiagnosticSeverity::INFORMATION,
        RuleSeverity::Hint => lsp::DiagnosticSeverity::HINT,
    }
}

/// Convert an engine diagnostic for publishing.
pub fn to_lsp_diagnostic(content: &str, index: &LineIndex, diag: &Diagnostic) -> lsp::Diagnostic {
    lsp::Diagnostic {
        range: range(content, index, diag.span),
        severity: Some(severity(diag.severity)),
        code: Some(NumberOrString::String(diag.rule_id.clone())),
        source: Some(DIAGNOSTIC_SOURCE.to_string()),
        message: diag.message.clone(),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_positions_count_utf16_units() {
        let content = "var s = \"é😀\";\nx.Find(m => m.Id == 1);\n";
        let index = LineIndex::new(content);

        let semicolon = content.find(';').unwrap();
        let pos = position(content, &index, semicolon);
        // `é` is one unit, the emoji two.
        assert_eq!(pos, Position::new(0, 13));
        assert_eq!(offset(content, &index, pos), semicolon);

        let find = content.find("Find").unwrap();
        assert_eq!(position(content, &index, find), Position::new(1, 2));
        assert_eq!(offset(content, &index, Position::new(1, 2)), find);
    }

    #[test]
    fn test_offset_clamps_to_line_end() {
        let content = "ab\ncd";
        let index = LineIndex::new(content);
        assert_eq!(offset(content, &index, Position::new(0, 40)), 2);
        assert_eq!(offset(content, &index, Position::new(7, 0)), content.len());
    }
}
