//! Workspace symbol store with insertion-ordered primary collection and
//! by-file / by-kind lookup indices.
//!
//! The three structures are a denormalized view of one logical collection.
//! All mutation funnels through `insert` / `remove_id` so they cannot drift
//! out of sync; only the operations on `SymbolStore` are exposed.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use rustc_hash::FxHashMap;

/// Kind of an indexed symbol.
///
/// `Variable` is part of the closed vocabulary but is not bound to any
/// completion trigger by default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SymbolKind {
    File,
    Class,
    Method,
    Function,
    Variable,
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SymbolKind::File => "file",
            SymbolKind::Class => "class",
            SymbolKind::Method => "method",
            SymbolKind::Function => "function",
            SymbolKind::Variable => "variable",
        };
        write!(f, "{}", label)
    }
}

/// One indexed entity: a file, class, method, function, or variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Symbol {
    /// Display name; for `File` symbols the workspace-relative path.
    pub name: String,
    pub kind: SymbolKind,
    /// Path of the file the symbol is defined in. For `File` symbols this is
    /// the resolved path of `name` itself.
    pub source_file: PathBuf,
    /// 1-based definition line; 0 for `File` symbols.
    pub line: u32,
}

/// Per-kind symbol counts, logged after a workspace scan.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct StoreStats {
    pub files: usize,
    pub classes: usize,
    pub methods: usize,
    pub functions: usize,
    pub variables: usize,
}

impl fmt::Display for StoreStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} files, {} classes, {} methods, {} functions, {} variables",
            self.files, self.classes, self.methods, self.functions, self.variables
        )
    }
}

/// In-memory store for all symbols of one workspace session.
///
/// Symbols are kept in insertion order (monotonic sequence ids in a
/// `BTreeMap`), which doubles as the tie-break order for equal fuzzy scores.
/// The by-file index makes `remove_for_file` proportional to the number of
/// symbols in that file; the by-kind index narrows fuzzy search to the
/// relevant candidate pool before any scoring happens.
///
/// No operation performs I/O. Deduplication across re-indexing is the
/// caller's job: `remove_for_file` first, then `add_many`.
#[derive(Debug, Default)]
pub struct SymbolStore {
    next_id: u64,
    symbols: BTreeMap<u64, Arc<Symbol>>,
    by_file: FxHashMap<PathBuf, Vec<u64>>,
    by_kind: FxHashMap<SymbolKind, BTreeSet<u64>>,
}

impl SymbolStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends symbols to the store, updating all indices. Never deduplicates.
    pub fn add_many<I>(&mut self, symbols: I)
    where
        I: IntoIterator<Item = Symbol>,
    {
        for symbol in symbols {
            self.insert(symbol);
        }
    }

    /// Removes every symbol whose `source_file` equals `path` from all three
    /// structures. No-op if the file was never indexed.
    pub fn remove_for_file(&mut self, path: &Path) {
        let Some(ids) = self.by_file.remove(path) else {
            return;
        };
        for id in ids {
            self.remove_id(id);
        }
    }

    /// Returns the concatenation of the by-kind buckets for each kind in
    /// `kinds`, each bucket in original insertion order. Unknown or empty
    /// kinds contribute nothing; this never fails.
    pub fn symbols_of_kind(&self, kinds: &[SymbolKind]) -> Vec<Arc<Symbol>> {
        let mut out = Vec::new();
        for kind in kinds {
            if let Some(ids) = self.by_kind.get(kind) {
                out.extend(ids.iter().filter_map(|id| self.symbols.get(id).cloned()));
            }
        }
        out
    }

    /// Resets the store to its empty state (index-rebuild requests).
    pub fn clear(&mut self) {
        self.symbols.clear();
        self.by_file.clear();
        self.by_kind.clear();
        self.next_id = 0;
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn stats(&self) -> StoreStats {
        let count = |kind| self.by_kind.get(&kind).map_or(0, BTreeSet::len);
        StoreStats {
            files: count(SymbolKind::File),
            classes: count(SymbolKind::Class),
            methods: count(SymbolKind::Method),
            functions: count(SymbolKind::Function),
            variables: count(SymbolKind::Variable),
        }
    }

    fn insert(&mut self, symbol: Symbol) {
        let id = self.next_id;
        self.next_id += 1;

        self.by_file
            .entry(symbol.source_file.clone())
            .or_default()
            .push(id);
        self.by_kind.entry(symbol.kind).or_default().insert(id);
        self.symbols.insert(id, Arc::new(symbol));
    }

    fn remove_id(&mut self, id: u64) {
        if let Some(symbol) = self.symbols.remove(&id) {
            if let Some(ids) = self.by_kind.get_mut(&symbol.kind) {
                ids.remove(&id);
            }
        }
    }
}
