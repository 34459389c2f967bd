//! LSP Backend implementation for the flowlint language server.
//!
//! The workspace's `*.cs` files are read once at startup and analyzed as one
//! compilation together with the open documents, so entities declared in
//! other files are visible to the rules.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, OnceLock};

use dashmap::DashMap;
use futures::future::join_all;
use tokio::sync::RwLock;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::{Client, LanguageServer};
use tracing::{debug, info, warn};

use crate::capabilities::server_capabilities;
use crate::config::discover_config;
use crate::diagnostics::{Diagnostic as FlowDiagnostic, Project, SourceFile};
use crate::handlers::{to_lsp_diagnostic, CodeActionHandler};
use crate::syntax::LineIndex;
use crate::{collect_sources, read_sources, LintConfig, Linter};

/// Document state stored for each open file.
#[derive(Debug)]
pub struct DocumentState {
    pub path: PathBuf,
    pub content: String,
    pub version: i32,
}

/// The main LSP backend.
pub struct FlowlintBackend {
    /// LSP client for sending notifications/requests back to the editor.
    client: Client,

    /// Open documents tracked by the server.
    documents: DashMap<Url, DocumentState>,

    /// Saved contents of every workspace source file.
    workspace: DashMap<PathBuf, String>,

    root: OnceLock<PathBuf>,

    /// Replaced once the workspace config is known.
    linter: RwLock<Arc<Linter>>,
}

impl FlowlintBackend {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            documents: DashMap::new(),
            workspace: DashMap::new(),
            root: OnceLock::new(),
            linter: RwLock::new(Arc::new(Linter::new(LintConfig::default()))),
        }
    }

    /// Workspace files with open documents laid over them.
    fn snapshot(&self) -> Vec<SourceFile> {
        let mut sources: HashMap<PathBuf, String> = self
            .workspace
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();
        for doc in self.documents.iter() {
            sources.insert(doc.path.clone(), doc.content.clone());
        }
        sources
            .into_iter()
            .map(|(path, content)| SourceFile::new(path, content))
            .collect()
    }

    /// Analyze the workspace and publish diagnostics for every open document.
    async fn publish_all(&self) {
        let linter = Arc::clone(&*self.linter.read().await);
        let sources = self.snapshot();
        let reports =
            match tokio::task::spawn_blocking(move || linter.lint_sources(sources)).await {
                Ok(reports) => reports,
                Err(err) => {
                    warn!(error = %err, "Analysis task failed");
                    return;
                }
            };
        let mut by_path: HashMap<PathBuf, Vec<FlowDiagnostic>> = reports
            .into_iter()
            .map(|report| (report.path, report.diagnostics))
            .collect();

        // Collected first so no map guard is held across an await.
        let open: Vec<(Url, PathBuf, String, i32)> = self
            .documents
            .iter()
            .map(|doc| {
                (
                    doc.key().clone(),
                    doc.path.clone(),
                    doc.content.clone(),
                    doc.version,
                )
            })
            .collect();
        let publishes = open.into_iter().map(|(uri, path, content, version)| {
            let index = LineIndex::new(&content);
            let diagnostics = by_path
                .remove(&path)
                .unwrap_or_default()
                .iter()
                .map(|d| to_lsp_diagnostic(&content, &index, d))
                .collect();
            self.client.publish_diagnostics(uri, diagnostics, Some(version))
        });
        join_all(publishes.collect::<Vec<_>>()).await;
    }
}

fn document_path(uri: &Url) -> PathBuf {
    uri.to_file_path()
        .unwrap_or_else(|_| PathBuf::from(uri.path()))
}

#[tower_lsp::async_trait]
impl LanguageServer for FlowlintBackend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        info!("flowlint server initializing");

        let root_uri = params
            .workspace_folders
            .as_ref()
            .and_then(|folders| folders.first())
            .map(|folder| folder.uri.clone())
            .or(params.root_uri);
        if let Some(root) = root_uri.and_then(|uri| uri.to_file_path().ok()) {
            match discover_config(&root) {
                Ok(overrides) => {
                    let config = LintConfig {
                        overrides,
                        ..LintConfig::default()
                    };
                    *self.linter.write().await = Arc::new(Linter::new(config));
                }
                Err(err) => warn!(error = %err, "Ignoring invalid lint configuration"),
            }
            let _ = self.root.set(root);
        }

        Ok(InitializeResult {
            capabilities: server_capabilities(),
            server_info: Some(ServerInfo {
                name: "flowlint".to_string(),
                version: Some(env!("CARGO_PKG_VERSION").to_string()),
            }),
        })
    }

    async fn initialized(&self, _params: InitializedParams) {
        if let Some(root) = self.root.get().cloned() {
            let loaded = tokio::task::spawn_blocking(move || {
                read_sources(&collect_sources(&[root]))
            })
            .await;
            match loaded {
                Ok(sources) => {
                    info!(files = sources.len(), "Loaded workspace sources");
                    for source in sources {
                        self.workspace.insert(source.path, source.content);
                    }
                }
                Err(err) => warn!(error = %err, "Cannot load workspace sources"),
            }
        }

        self.client
            .log_message(MessageType::INFO, "flowlint server ready")
            .await;
        self.publish_all().await;
    }

    async fn shutdown(&self) -> Result<()> {
        info!("flowlint server shutting down");
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        debug!("Document opened: {}", params.text_document.uri);

        let uri = params.text_document.uri;
        self.documents.insert(
            uri.clone(),
            DocumentState {
                path: document_path(&uri),
                content: params.text_document.text,
                version: params.text_document.version,
            },
        );

        self.publish_all().await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        debug!("Document changed: {}", params.text_document.uri);

        if let Some(mut doc) = self.documents.get_mut(&params.text_document.uri) {
            // Full sync, so the last change holds the whole text.
            if let Some(change) = params.content_changes.into_iter().last() {
                doc.content = change.text;
                doc.version = params.text_document.version;
            }
        }

        self.publish_all().await;
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        debug!("Document closed: {}", params.text_document.uri);

        self.documents.remove(&params.text_document.uri);

        self.client
            .publish_diagnostics(params.text_document.uri, vec![], None)
            .await;
        // Unsaved edits are gone; the others see the file on disk again.
        self.publish_all().await;
    }

    async fn did_save(&self, params: DidSaveTextDocumentParams) {
        debug!("Document saved: {}", params.text_document.uri);

        if let Some(text) = params.text {
            self.workspace
                .insert(document_path(&params.text_document.uri), text);
        }

        self.publish_all().await;
    }

    async fn code_action(&self, params: CodeActionParams) -> Result<Option<CodeActionResponse>> {
        let uri = params.text_document.uri;
        let Some(path) = self.documents.get(&uri).map(|doc| doc.path.clone()) else {
            return Ok(None);
        };

        let linter = Arc::clone(&*self.linter.read().await);
        let sources = self.snapshot();
        let diagnostics = params.context.diagnostics;
        let only = params.context.only;
        let actions = tokio::task::spawn_blocking(move || {
            let project = Project::new(sources);
            CodeActionHandler::new(linter).actions(
                &project,
                &path,
                &uri,
                &diagnostics,
                only.as_deref(),
            )
        })
        .await;

        match actions {
            Ok(actions) if !actions.is_empty() => Ok(Some(actions)),
            Ok(_) => Ok(None),
            Err(err) => {
                warn!(error = %err, "Code action task failed");
                Ok(None)
            }
        }
    }
}
