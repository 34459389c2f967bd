//! Code action provider for the required-field predicate fix.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use tower_lsp::lsp_types::*;

use super::{range, span, DIAGNOSTIC_SOURCE};
use crate::diagnostics::{ParsedFile, Project};
use crate::fix::{self, non_overlapping};
use crate::rules::required_fields::{self, fixer::FIX_TITLE};
use crate::Linter;

const FIX_ALL_TITLE: &str = "Add all missing required properties";

/// Handler for code action requests.
pub struct CodeActionHandler {
    linter: Arc<Linter>,
}

impl CodeActionHandler {
    /// Create a new code action handler.
    pub fn new(linter: Arc<Linter>) -> Self {
        Self { linter }
    }

    /// Provide code actions for `path` given the diagnostics the client sent.
    ///
    /// `only` is the client's kind filter; `None` means every kind.
    pub fn actions(
        &self,
        project: &Project,
        path: &Path,
        uri: &Url,
        diagnostics: &[Diagnostic],
        only: Option<&[CodeActionKind]>,
    ) -> CodeActionResponse {
        let Some(file) = project.file(path) else {
            return Vec::new();
        };
        let mut actions = Vec::new();

        if wants(only, &CodeActionKind::QUICKFIX) {
            for diagnostic in diagnostics {
                if is_required_fields(diagnostic) {
                    if let Some(action) = self.quick_fix(project, file, uri, diagnostic) {
                        actions.push(action);
                    }
                }
            }
        }

        if wants(only, &CodeActionKind::SOURCE_FIX_ALL) {
            actions.extend(self.fix_all(project, file, uri));
        }

        actions
    }

    /// Fix for the single predicate under `diagnostic`.
    fn quick_fix(
        &self,
        project: &Project,
        file: &ParsedFile,
        uri: &Url,
        diagnostic: &Diagnostic,
    ) -> Option<CodeActionOrCommand> {
        let content = &file.content;
        let site = span(content, &file.line_index, diagnostic.range);
        let model = project.model(file);
        let edit = required_fields::fix_at(&file.unit, site, content, &model)?;

        Some(CodeActionOrCommand::CodeAction(CodeAction {
            title: FIX_TITLE.to_string(),
            kind: Some(CodeActionKind::QUICKFIX),
            diagnostics: Some(vec![diagnostic.clone()]),
            edit: Some(workspace_edit(file, uri, vec![edit])),
            is_preferred: Some(true),
            ..Default::default()
        }))
    }

    /// Every non-overlapping predicate fix in the document as one action.
    fn fix_all(
        &self,
        project: &Project,
        file: &ParsedFile,
        uri: &Url,
    ) -> Option<CodeActionOrCommand> {
        let report = self
            .linter
            .lint_project(project)
            .into_iter()
            .find(|report| report.path == file.path)?;
        let edits = self.linter.engine().fix_edits(
            project,
            file,
            &report.diagnostics,
            &AtomicBool::new(false),
        );
        let (edits, _) = non_overlapping(&file.content, edits);
        if edits.is_empty() {
            return None;
        }

        Some(CodeActionOrCommand::CodeAction(CodeAction {
            title: FIX_ALL_TITLE.to_string(),
            kind: Some(CodeActionKind::SOURCE_FIX_ALL),
            edit: Some(workspace_edit(file, uri, edits)),
            ..Default::default()
        }))
    }
}

fn is_required_fields(diagnostic: &Diagnostic) -> bool {
    diagnostic.source.as_deref() == Some(DIAGNOSTIC_SOURCE)
        && matches!(
            &diagnostic.code,
            Some(NumberOrString::String(code)) if code == required_fields::DESCRIPTOR.id
        )
}

/// Kinds are hierarchical: asking for `source` also matches `source.fixAll`.
fn wants(only: Option<&[CodeActionKind]>, kind: &CodeActionKind) -> bool {
    only.map_or(true, |kinds| {
        kinds.iter().any(|k| {
            kind.as_str() == k.as_str() || kind.as_str().starts_with(&format!("{}.", k.as_str()))
        })
    })
}

fn workspace_edit(file: &ParsedFile, uri: &Url, edits: Vec<fix::TextEdit>) -> WorkspaceEdit {
    let edits = edits
        .into_iter()
        .map(|edit| TextEdit {
            range: range(&file.content, &file.line_index, edit.span),
            new_text: edit.new_text,
        })
        .collect();
    WorkspaceEdit {
        changes: Some(HashMap::from([(uri.clone(), edits)])),
        ..Default::default()
    }
}
