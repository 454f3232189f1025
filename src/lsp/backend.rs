//! The tower-lsp backend: wires document sync, workspace indexing, and the
//! trigger completion engine to the protocol.

use std::path::PathBuf;
use std::sync::Arc;

use dashmap::DashMap;
use parking_lot::RwLock;
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::{
    CompletionOptions, CompletionParams, CompletionResponse, DidChangeTextDocumentParams,
    DidChangeWatchedFilesParams, DidCloseTextDocumentParams, DidOpenTextDocumentParams,
    DidSaveTextDocumentParams, FileChangeType, InitializeParams, InitializeResult,
    InitializedParams, MessageType, ServerCapabilities, TextDocumentSyncCapability,
    TextDocumentSyncKind, Url,
};
use tower_lsp::{Client, LanguageServer};
use tracing::{debug, info, warn};

use crate::config::ServerConfig;
use crate::ctags::CtagsProvider;
use crate::fuzzy::WeightedRatio;
use crate::indexer::WorkspaceIndexer;
use crate::lsp::completion::{CompletionEngine, default_bindings};
use crate::lsp::models::Document;
use crate::lsp::symbol_index::SymbolStore;

pub struct Backend {
    client: Client,
    documents: DashMap<Url, Document>,
    store: Arc<RwLock<SymbolStore>>,
    indexer: WorkspaceIndexer,
    engine: CompletionEngine,
    workspace_root: RwLock<Option<PathBuf>>,
}

impl Backend {
    pub fn new(client: Client, config: ServerConfig) -> Self {
        let config = Arc::new(config);
        let store = Arc::new(RwLock::new(SymbolStore::new()));
        let provider = Arc::new(CtagsProvider::new(
            config.ctags_bin.clone(),
            config.ctags_timeout,
        ));
        let indexer = WorkspaceIndexer::new(store.clone(), provider, config.clone());
        let engine = CompletionEngine::new(
            store.clone(),
            Arc::new(WeightedRatio),
            default_bindings(),
            config.min_fuzzy_score,
            config.max_completion_items,
        );

        Self {
            client,
            documents: DashMap::new(),
            store,
            indexer,
            engine,
            workspace_root: RwLock::new(None),
        }
    }

    fn workspace_root(&self) -> PathBuf {
        self.workspace_root
            .read()
            .clone()
            .unwrap_or_else(|| PathBuf::from("."))
    }

    async fn reindex(&self, uri: &Url) {
        let Ok(path) = uri.to_file_path() else {
            warn!("ignoring non-file uri {}", uri);
            return;
        };
        let root = self.workspace_root();
        self.indexer.reindex_file(&root, &path).await;
    }
}

#[tower_lsp::async_trait]
impl LanguageServer for Backend {
    async fn initialize(&self, params: InitializeParams) -> Result<InitializeResult> {
        #[allow(deprecated)]
        let fallback_root = params
            .root_uri
            .as_ref()
            .and_then(|uri| uri.to_file_path().ok());
        let root = params
            .workspace_folders
            .as_ref()
            .and_then(|folders| folders.first())
            .and_then(|folder| folder.uri.to_file_path().ok())
            .or(fallback_root);

        // The scan runs to completion before the handshake result goes out;
        // completion requests racing it see an empty store and get empty
        // results rather than blocking.
        match root {
            Some(root) => {
                info!("indexing workspace at {}", root.display());
                *self.workspace_root.write() = Some(root.clone());
                self.indexer.full_scan(&root).await;
            }
            None => warn!("no workspace root provided; starting with an empty index"),
        }

        Ok(InitializeResult {
            capabilities: ServerCapabilities {
                text_document_sync: Some(TextDocumentSyncCapability::Kind(
                    TextDocumentSyncKind::INCREMENTAL,
                )),
                completion_provider: Some(CompletionOptions {
                    trigger_characters: Some(self.engine.trigger_characters()),
                    ..Default::default()
                }),
                ..Default::default()
            },
            ..Default::default()
        })
    }

    async fn initialized(&self, _: InitializedParams) {
        info!("triggerfish language server initialized");
        self.client
            .log_message(MessageType::INFO, "triggerfish language server initialized")
            .await;
    }

    async fn shutdown(&self) -> Result<()> {
        Ok(())
    }

    async fn did_open(&self, params: DidOpenTextDocumentParams) {
        let uri = params.text_document.uri;
        debug!("opened {}", uri);
        self.documents.insert(
            uri.clone(),
            Document::new(params.text_document.text, params.text_document.version),
        );
        self.reindex(&uri).await;
    }

    async fn did_change(&self, params: DidChangeTextDocumentParams) {
        let uri = params.text_document.uri;
        match self.documents.get_mut(&uri) {
            Some(mut doc) => {
                doc.apply_changes(params.content_changes, params.text_document.version);
            }
            None => {
                warn!("change for untracked document {}", uri);
            }
        }
        self.reindex(&uri).await;
    }

    async fn did_save(&self, params: DidSaveTextDocumentParams) {
        self.reindex(&params.text_document.uri).await;
    }

    async fn did_close(&self, params: DidCloseTextDocumentParams) {
        debug!("closed {}", params.text_document.uri);
        self.documents.remove(&params.text_document.uri);
    }

    async fn did_change_watched_files(&self, params: DidChangeWatchedFilesParams) {
        for event in params.changes {
            if event.typ == FileChangeType::DELETED {
                if let Ok(path) = event.uri.to_file_path() {
                    self.indexer.remove_file(&path);
                }
            } else {
                self.reindex(&event.uri).await;
            }
        }
    }

    async fn completion(&self, params: CompletionParams) -> Result<Option<CompletionResponse>> {
        let uri = params.text_document_position.text_document.uri;

        // Only plain-text documents participate; the engine itself is
        // filetype-agnostic.
        if !uri.path().ends_with(".txt") {
            return Ok(Some(CompletionResponse::Array(Vec::new())));
        }

        let position = params.text_document_position.position;
        let line = self
            .documents
            .get(&uri)
            .and_then(|doc| doc.line(position.line).map(str::to_string))
            .unwrap_or_default();

        let items = self.engine.complete(&line, position.character as usize);
        debug!(
            "completion at {}:{}:{} -> {} items ({} symbols indexed)",
            uri,
            position.line,
            position.character,
            items.len(),
            self.store.read().len()
        );

        Ok(Some(CompletionResponse::Array(items)))
    }
}
