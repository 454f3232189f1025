pub mod config;
pub mod ctags;
pub mod fuzzy;
pub mod indexer;
pub mod logging;
pub mod lsp;
