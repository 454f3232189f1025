//! End-to-end completion behavior over a populated symbol store.

use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::RwLock;

use triggerfish_language_server::fuzzy::WeightedRatio;
use triggerfish_language_server::lsp::completion::{CompletionEngine, default_bindings};
use triggerfish_language_server::lsp::symbol_index::{Symbol, SymbolKind, SymbolStore};

fn file_symbol(name: &str) -> Symbol {
    Symbol {
        name: name.to_string(),
        kind: SymbolKind::File,
        source_file: PathBuf::from(format!("/ws/{}", name)),
        line: 0,
    }
}

fn engine(symbols: Vec<Symbol>, min_score: u8, max_items: usize) -> CompletionEngine {
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

fn labels(engine: &CompletionEngine, line: &str) -> Vec<String> {
    engine
        .complete(line, line.chars().count())
        .into_iter()
        .map(|item| item.label)
        .collect()
}

#[test]
fn myfi_query_ranks_near_matches_and_excludes_config() {
    let engine = engine(
        vec![
            file_symbol("my_file.py"),
            file_symbol("my_first.js"),
            file_symbol("my_filter.ts"),
            file_symbol("my_file.md"),
            file_symbol("my_config.json"),
        ],
        60,
        50,
    );

    let results = labels(&engine, "@myfi");
    assert_eq!(results.len(), 4);
    for expected in ["my_file.py", "my_first.js", "my_filter.ts", "my_file.md"] {
        assert!(results.contains(&expected.to_string()), "missing {expected}");
    }
    assert!(!results.contains(&"my_config.json".to_string()));
}

#[test]
fn whitespace_after_trigger_yields_no_match() {
    let engine = engine(vec![file_symbol("foo"), file_symbol("bar")], 60, 50);
    assert!(labels(&engine, "@foo bar").is_empty());
}

#[test]
fn truncation_law() {
    let symbols: Vec<Symbol> = (0..200)
        .map(|i| file_symbol(&format!("report_{:03}.txt", i)))
        .collect();
    let engine = engine(symbols, 60, 50);

    assert_eq!(labels(&engine, "@report").len(), 50);
    assert_eq!(labels(&engine, "@").len(), 50);
}

#[test]
fn cutoff_law() {
    let engine = engine(
        vec![file_symbol("my_file.py"), file_symbol("zebra_stripes.bin")],
        60,
        50,
    );
    let items = engine.complete("@myfi", 5);
    for item in &items {
        // sort_text is 100 - score, so a score below 60 reads above "040".
        let inverted: u16 = item.sort_text.as_deref().unwrap().parse().unwrap();
        assert!(100 - inverted >= 60, "item {} scored below cutoff", item.label);
    }
    assert_eq!(items.len(), 1);
}

#[test]
fn ranking_is_deterministic() {
    let engine = engine(
        vec![
            file_symbol("my_file.py"),
            file_symbol("my_first.js"),
            file_symbol("my_filter.ts"),
            file_symbol("my_file.md"),
        ],
        60,
        50,
    );

    let first = engine.complete("@myfi", 5);
    let second = engine.complete("@myfi", 5);
    assert_eq!(first, second);
}

#[test]
fn empty_store_returns_empty_results() {
    let engine = engine(Vec::new(), 60, 50);
    assert!(labels(&engine, "@anything").is_empty());
    assert!(labels(&engine, ".Anything").is_empty());
    assert!(labels(&engine, "#anything").is_empty());
}
