//! Workspace indexing: the startup full scan and incremental re-indexing of
//! single files.
//!
//! The scan is sequential, one file at a time. That bounds peak resource
//! usage but is the dominant latency source on large trees; per-file
//! ingestion could be dispatched across a worker pool merging into the store
//! under its single write lock without changing any contract here.

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::RwLock;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::ServerConfig;
use crate::ctags::{IngestError, SymbolProvider};
use crate::lsp::symbol_index::{Symbol, SymbolKind, SymbolStore};

/// Drives full and incremental indexing into the shared symbol store.
pub struct WorkspaceIndexer {
    store: Arc<RwLock<SymbolStore>>,
    provider: Arc<dyn SymbolProvider>,
    config: Arc<ServerConfig>,
    /// Set after the first `ToolUnavailable`: tag extraction stays off for
    /// the rest of the session, file symbols keep flowing.
    tags_disabled: AtomicBool,
}

impl WorkspaceIndexer {
    pub fn new(
        store: Arc<RwLock<SymbolStore>>,
        provider: Arc<dyn SymbolProvider>,
        config: Arc<ServerConfig>,
    ) -> Self {
        Self {
            store,
            provider,
            config,
            tags_disabled: AtomicBool::new(false),
        }
    }

    /// Walks the tree under `root` and indexes every regular file. Ignored
    /// directories (path-segment equality against the configured denylist)
    /// are pruned before descent, so excluded subtrees are never traversed.
    /// No per-file failure aborts the pass.
    pub async fn full_scan(&self, root: &Path) {
        let mut file_count = 0usize;
        let walker = WalkDir::new(root)
            .follow_links(false)
            .into_iter()
            .filter_entry(|entry| {
                !(entry.depth() > 0
                    && entry.file_type().is_dir()
                    && entry
                        .file_name()
                        .to_str()
                        .is_some_and(|name| self.config.is_ignored_dir(name)))
            });

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    warn!("skipping unreadable path during scan: {}", err);
                    continue;
                }
            };
            if !entry.file_type().is_file() {
                continue;
            }
            self.index_file(root, entry.path()).await;
            file_count += 1;
        }

        info!(
            "indexed workspace {} ({} files): {}",
            root.display(),
            file_count,
            self.store.read().stats()
        );
    }

    /// Re-extracts symbols for one changed or created file: removal first so
    /// back-to-back re-indexing of an unchanged file is idempotent.
    pub async fn reindex_file(&self, root: &Path, path: &Path) {
        self.store.write().remove_for_file(path);
        self.index_file(root, path).await;
        debug!("reindexed {}", path.display());
    }

    /// Handles a file deletion; removal alone suffices.
    pub fn remove_file(&self, path: &Path) {
        self.store.write().remove_for_file(path);
        debug!("removed symbols for {}", path.display());
    }

    /// Registers the FILE symbol for `path` and whatever tags extraction
    /// yields. The FILE symbol never depends on the tagging tool, so `@`
    /// completion works for files the tool times out or chokes on.
    async fn index_file(&self, root: &Path, path: &Path) {
        let mut symbols = vec![Symbol {
            name: relative_name(root, path),
            kind: SymbolKind::File,
            source_file: path.to_path_buf(),
            line: 0,
        }];
        symbols.extend(self.extract_tags(path).await);
        self.store.write().add_many(symbols);
    }

    async fn extract_tags(&self, path: &Path) -> Vec<Symbol> {
        if self.tags_disabled.load(Ordering::Relaxed) {
            return Vec::new();
        }
        match self.provider.extract(path).await {
            Ok(symbols) => symbols,
            Err(IngestError::ToolUnavailable(tool)) => {
                if !self.tags_disabled.swap(true, Ordering::Relaxed) {
                    warn!(
                        "tagging tool {} unavailable; class/method/function \
                         completion disabled for this session",
                        tool
                    );
                }
                Vec::new()
            }
            // Timeout and ParseFailure skip the file and keep scanning; the
            // error message tells the two apart in the log.
            Err(err) => {
                warn!("skipping tags for {}: {}", path.display(), err);
                Vec::new()
            }
        }
    }
}

/// Workspace-relative display name with `/` separators; falls back to the
/// bare file name for paths outside the root.
fn relative_name(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    let name: Vec<String> = rel
        .components()
        .filter_map(|c| match c {
            std::path::Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();
    if name.is_empty() {
        path.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    } else {
        name.join("/")
    }
}
