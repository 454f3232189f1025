pub mod backend;
pub mod completion;
pub mod models;
pub mod symbol_index;
