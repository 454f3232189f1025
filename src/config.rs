//! Session configuration.
//!
//! Values are read once at startup from `TRIGGERFISH_*` environment
//! variables (with CLI overrides applied in `main`) and treated as immutable
//! for the lifetime of the session.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Directory names pruned from the workspace scan by default: version
/// control metadata, dependency caches, and build output.
const DEFAULT_IGNORED_DIRS: &[&str] = &[
    ".git",
    ".hg",
    ".svn",
    "__pycache__",
    ".mypy_cache",
    ".pytest_cache",
    ".ruff_cache",
    ".tox",
    ".nox",
    ".venv",
    "venv",
    "env",
    "node_modules",
    "dist",
    "build",
    "target",
];

const DEFAULT_CTAGS_TIMEOUT_MS: u64 = 10_000;
const DEFAULT_MIN_FUZZY_SCORE: u8 = 60;
const DEFAULT_MAX_COMPLETION_ITEMS: usize = 50;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Tagging tool executable, resolved through PATH if not absolute.
    pub ctags_bin: PathBuf,
    /// Hard wall-clock budget for one extraction run.
    pub ctags_timeout: Duration,
    /// Directory-name denylist, matched by path-segment equality.
    pub ignore_dirs: Vec<String>,
    /// Candidates scoring below this are discarded.
    pub min_fuzzy_score: u8,
    /// Upper bound on returned completion items.
    pub max_completion_items: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            ctags_bin: PathBuf::from("ctags"),
            ctags_timeout: Duration::from_millis(DEFAULT_CTAGS_TIMEOUT_MS),
            ignore_dirs: DEFAULT_IGNORED_DIRS.iter().map(|s| s.to_string()).collect(),
            min_fuzzy_score: DEFAULT_MIN_FUZZY_SCORE,
            max_completion_items: DEFAULT_MAX_COMPLETION_ITEMS,
        }
    }
}

impl ServerConfig {
    /// Builds the configuration from the process environment, falling back
    /// to defaults for anything unset or unparseable.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(bin) = env::var("TRIGGERFISH_CTAGS_BIN") {
            if !bin.is_empty() {
                config.ctags_bin = PathBuf::from(bin);
            }
        }
        if let Some(ms) = parse_var::<u64>("TRIGGERFISH_CTAGS_TIMEOUT_MS") {
            config.ctags_timeout = Duration::from_millis(ms);
        }
        if let Ok(dirs) = env::var("TRIGGERFISH_IGNORE_DIRS") {
            config.ignore_dirs = dirs
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(score) = parse_var::<u8>("TRIGGERFISH_MIN_FUZZY_SCORE") {
            config.min_fuzzy_score = score.min(100);
        }
        if let Some(items) = parse_var::<usize>("TRIGGERFISH_MAX_COMPLETION_ITEMS") {
            config.max_completion_items = items;
        }

        config
    }

    pub fn is_ignored_dir(&self, name: &str) -> bool {
        self.ignore_dirs.iter().any(|dir| dir == name)
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok()?.trim().parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = ServerConfig::default();
        assert_eq!(config.ctags_bin, PathBuf::from("ctags"));
        assert_eq!(config.ctags_timeout, Duration::from_secs(10));
        assert_eq!(config.min_fuzzy_score, 60);
        assert_eq!(config.max_completion_items, 50);
        assert!(config.is_ignored_dir(".git"));
        assert!(config.is_ignored_dir("node_modules"));
        assert!(!config.is_ignored_dir("src"));
    }

    #[test]
    fn segment_match_is_exact_not_substring() {
        let config = ServerConfig::default();
        // "env" is ignored; "environment" is not.
        assert!(config.is_ignored_dir("env"));
        assert!(!config.is_ignored_dir("environment"));
    }
}
