//! LSP Server capabilities configuration.

use tower_lsp::lsp_types::*;

/// Returns the server capabilities for flowlint.
pub fn server_capabilities() -> ServerCapabilities {
    ServerCapabilities {
        // Full text document sync
        text_document_sync: Some(TextDocumentSyncCapability::Options(
            TextDocumentSyncOptions {
                open_close: Some(true),
                change: Some(TextDocumentSyncKind::FULL),
                will_save: Some(false),
                will_save_wait_until: Some(false),
                save: Some(TextDocumentSyncSaveOptions::SaveOptions(SaveOptions {
                    include_text: Some(true),
                })),
            },
        )),

        // Predicate fixes, one at a time or for the whole document
        code_action_provider: Some(CodeActionProviderCapability::Options(CodeActionOptions {
            code_action_kinds: Some(vec![
                CodeActionKind::QUICKFIX,
                CodeActionKind::SOURCE_FIX_ALL,
            ]),
            work_done_progress_options: WorkDoneProgressOptions::default(),
            resolve_provider: Some(false),
        })),

        // Diagnostics are pushed after every change; no pull model.
        diagnostic_provider: None,

        ..Default::default()
    }
}
