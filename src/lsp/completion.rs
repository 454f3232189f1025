//! Trigger-character completion engine.
//!
//! Each request looks at the text before the cursor, finds the binding whose
//! trigger character claims it, fuzzy-scores the store's candidates of the
//! bound kinds, and projects the ranked survivors to LSP completion items.

use std::sync::Arc;

use parking_lot::RwLock;
use tower_lsp::lsp_types::{CompletionItem, CompletionItemKind};

use crate::fuzzy::FuzzyMatcher;
use crate::lsp::symbol_index::{Symbol, SymbolKind, SymbolStore};

/// Pairing of a trigger character with the symbol kinds it searches and the
/// completion category reported outward. Bindings are data, not code:
/// additional ones can be declared without touching the matching algorithm.
#[derive(Debug, Clone)]
pub struct TriggerBinding {
    pub trigger: char,
    pub kinds: Vec<SymbolKind>,
    pub item_kind: CompletionItemKind,
}

/// The three stock bindings, in priority order: files, then classes, then
/// methods/functions. The first binding whose trigger appears before the
/// cursor claims the request.
pub fn default_bindings() -> Vec<TriggerBinding> {
    vec![
        TriggerBinding {
            trigger: '@',
            kinds: vec![SymbolKind::File],
            item_kind: CompletionItemKind::FILE,
        },
        TriggerBinding {
            trigger: '.',
            kinds: vec![SymbolKind::Class],
            item_kind: CompletionItemKind::CLASS,
        },
        TriggerBinding {
            trigger: '#',
            kinds: vec![SymbolKind::Method, SymbolKind::Function],
            item_kind: CompletionItemKind::METHOD,
        },
    ]
}

/// Stateless-per-request completion engine over the shared symbol store.
pub struct CompletionEngine {
    store: Arc<RwLock<SymbolStore>>,
    matcher: Arc<dyn FuzzyMatcher>,
    bindings: Vec<TriggerBinding>,
    min_score: u8,
    max_items: usize,
}

impl CompletionEngine {
    pub fn new(
        store: Arc<RwLock<SymbolStore>>,
        matcher: Arc<dyn FuzzyMatcher>,
        bindings: Vec<TriggerBinding>,
        min_score: u8,
        max_items: usize,
    ) -> Self {
        Self {
            store,
            matcher,
            bindings,
            min_score,
            max_items,
        }
    }

    /// Trigger characters to advertise in the server capabilities, in
    /// binding priority order.
    pub fn trigger_characters(&self) -> Vec<String> {
        self.bindings.iter().map(|b| b.trigger.to_string()).collect()
    }

    /// Completes for the given line text with the cursor at character offset
    /// `character`. Returns an empty list when no binding's trigger occurs
    /// before the cursor, or when the claimed query contains whitespace.
    pub fn complete(&self, line: &str, character: usize) -> Vec<CompletionItem> {
        let prefix: String = line.chars().take(character).collect();
        for binding in &self.bindings {
            if let Some(idx) = prefix.rfind(binding.trigger) {
                // First binding with its trigger on the line claims the
                // request, even when it ends up producing nothing.
                let query = &prefix[idx + binding.trigger.len_utf8()..];
                return self.complete_binding(binding, query);
            }
        }
        Vec::new()
    }

    fn complete_binding(&self, binding: &TriggerBinding, query: &str) -> Vec<CompletionItem> {
        if query.chars().any(char::is_whitespace) {
            return Vec::new();
        }

        let candidates = self.store.read().symbols_of_kind(&binding.kinds);

        // An empty query matches the whole kind set; scoring is skipped and
        // truncation alone applies.
        let mut scored: Vec<(Arc<Symbol>, u8)> = if query.is_empty() {
            candidates.into_iter().map(|symbol| (symbol, 0)).collect()
        } else {
            candidates
                .into_iter()
                .filter_map(|symbol| {
                    let score = self.matcher.score(query, &symbol.name);
                    (score >= self.min_score).then_some((symbol, score))
                })
                .collect()
        };

        // Stable sort: insertion order breaks score ties, keeping results
        // deterministic for identical index state.
        scored.sort_by(|a, b| b.1.cmp(&a.1));
        scored.truncate(self.max_items);

        scored
            .into_iter()
            .map(|(symbol, score)| to_completion_item(&symbol, score, binding.item_kind))
            .collect()
    }
}

fn to_completion_item(symbol: &Symbol, score: u8, kind: CompletionItemKind) -> CompletionItem {
    CompletionItem {
        label: symbol.name.clone(),
        kind: Some(kind),
        detail: Some(format!(
            "{} at {}:{}",
            symbol.kind,
            symbol.source_file.display(),
            symbol.line
        )),
        // Higher scores sort first lexicographically: 100 -> "000".
        sort_text: Some(format!("{:03}", 100 - score as u16)),
        insert_text: Some(symbol.name.clone()),
        ..Default::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fuzzy::WeightedRatio;
    use std::path::PathBuf;

    fn sym(name: &str, kind: SymbolKind) -> Symbol {
        Symbol {
            name: name.to_string(),
            kind,
            source_file: PathBuf::from(format!("/ws/{}", name)),
            line: if kind == SymbolKind::File { 0 } else { 7 },
        }
    }

    fn engine_with(symbols: Vec<Symbol>, min_score: u8, max_items: usize) -> CompletionEngine {
        let store = Arc::new(RwLock::new(SymbolStore::new()));
        store.write().add_many(symbols);
        CompletionEngine::new(
            store,
            Arc::new(WeightedRatio),
            default_bindings(),
            min_score,
            max_items,
        )
    }

    fn labels(items: &[CompletionItem]) -> Vec<&str> {
        items.iter().map(|i| i.label.as_str()).collect()
    }

    #[test]
    fn no_trigger_yields_no_completions() {
        let engine = engine_with(vec![sym("main.rs", SymbolKind::File)], 60, 50);
        assert!(engine.complete("plain text line", 15).is_empty());
    }

    #[test]
    fn whitespace_between_trigger_and_cursor_is_no_match() {
        let engine = engine_with(vec![sym("foo", SymbolKind::File)], 60, 50);
        let line = "@foo bar";
        assert!(engine.complete(line, line.chars().count()).is_empty());
    }

    #[test]
    fn trigger_after_cursor_is_ignored() {
        let engine = engine_with(vec![sym("foo", SymbolKind::File)], 60, 50);
        // Cursor before the '@': nothing triggers.
        assert!(engine.complete("see @foo", 3).is_empty());
    }

    #[test]
    fn file_binding_outranks_class_binding() {
        let engine = engine_with(
            vec![
                sym("src/main.rs", SymbolKind::File),
                sym("src", SymbolKind::Class),
            ],
            0,
            50,
        );
        // Both '@' and '.' appear; the file binding is declared first and
        // claims the request with query "src.main".
        let line = "@src.main";
        let items = engine.complete(line, line.chars().count());
        assert!(!items.is_empty());
        assert!(items.iter().all(|i| i.kind == Some(CompletionItemKind::FILE)));
    }

    #[test]
    fn empty_query_returns_kind_set_in_insertion_order() {
        let engine = engine_with(
            vec![
                sym("zeta.txt", SymbolKind::File),
                sym("alpha.txt", SymbolKind::File),
                sym("Widget", SymbolKind::Class),
            ],
            60,
            50,
        );
        let items = engine.complete("@", 1);
        assert_eq!(labels(&items), vec!["zeta.txt", "alpha.txt"]);
    }

    #[test]
    fn truncation_law_holds() {
        let symbols: Vec<Symbol> = (0..20)
            .map(|i| sym(&format!("file_{:02}.txt", i), SymbolKind::File))
            .collect();
        let engine = engine_with(symbols, 0, 3);
        assert_eq!(engine.complete("@file", 5).len(), 3);
        assert_eq!(engine.complete("@", 1).len(), 3);
    }

    #[test]
    fn cutoff_law_no_item_below_min_score() {
        let engine = engine_with(
            vec![
                sym("my_file.py", SymbolKind::File),
                sym("unrelated.bin", SymbolKind::File),
            ],
            60,
            50,
        );
        let items = engine.complete("@myfi", 5);
        assert_eq!(labels(&items), vec!["my_file.py"]);
    }

    #[test]
    fn ranking_is_deterministic_and_ties_follow_insertion_order() {
        let engine = engine_with(
            vec![
                sym("my_file.py", SymbolKind::File),
                sym("my_file.md", SymbolKind::File),
            ],
            60,
            50,
        );
        let first = engine.complete("@myfi", 5);
        let second = engine.complete("@myfi", 5);
        assert_eq!(first, second);
        // Equal scores: insertion order decides.
        assert_eq!(labels(&first), vec!["my_file.py", "my_file.md"]);
    }

    #[test]
    fn method_binding_searches_methods_and_functions() {
        let engine = engine_with(
            vec![
                sym("render", SymbolKind::Method),
                sym("rendering_pass", SymbolKind::Function),
                sym("Renderer", SymbolKind::Class),
            ],
            60,
            50,
        );
        let items = engine.complete("#render", 7);
        assert_eq!(labels(&items), vec!["render", "rendering_pass"]);
        assert!(items.iter().all(|i| i.kind == Some(CompletionItemKind::METHOD)));
    }

    #[test]
    fn projection_carries_jump_target_and_sort_text() {
        let engine = engine_with(vec![sym("Widget", SymbolKind::Class)], 60, 50);
        let items = engine.complete(".Widget", 7);
        assert_eq!(items.len(), 1);
        let item = &items[0];
        assert_eq!(item.detail.as_deref(), Some("class at /ws/Widget:7"));
        assert_eq!(item.sort_text.as_deref(), Some("000"));
        assert_eq!(item.insert_text.as_deref(), Some("Widget"));
    }

    #[test]
    fn empty_store_returns_empty_not_error() {
        let engine = engine_with(Vec::new(), 60, 50);
        assert!(engine.complete("@anything", 9).is_empty());
    }
}
