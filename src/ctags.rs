//! Tag ingestion: turning one file into symbols by invoking an external
//! tagging tool (universal-ctags) and parsing its JSON output.
//!
//! The provider performs no language parsing of its own. Extraction is
//! bounded by a wall-clock timeout and every failure mode is non-fatal to
//! the caller: a file that cannot be tagged simply contributes no symbols.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use rustc_hash::FxHashMap;
use serde::Deserialize;
use thiserror::Error;
use tokio::process::Command;
use tokio::time::timeout;
use tracing::trace;

use crate::lsp::symbol_index::{Symbol, SymbolKind};

/// Per-file ingestion failures. None of these abort a workspace scan.
#[derive(Debug, Error)]
pub enum IngestError {
    /// The tool exceeded its wall-clock budget; the file is skipped.
    #[error("tag extraction timed out after {0:?}")]
    Timeout(Duration),
    /// The executable is missing or not executable; tag ingestion is
    /// disabled for the session while file completions keep working.
    #[error("tagging tool unavailable: {0}")]
    ToolUnavailable(String),
    /// The tool exited abnormally or produced output we cannot read.
    #[error("tag output unusable: {0}")]
    ParseFailure(String),
}

/// A source of symbols for a single file. The default implementation shells
/// out to ctags; alternative tagging tools plug in here.
#[async_trait]
pub trait SymbolProvider: Send + Sync {
    async fn extract(&self, path: &Path) -> Result<Vec<Symbol>, IngestError>;
}

/// Closed mapping from tool-reported kind labels to the internal vocabulary.
/// Labels outside the table are dropped silently: the external tool's
/// vocabulary varies by source language and unknown kinds are expected.
static KIND_MAP: Lazy<FxHashMap<&'static str, SymbolKind>> = Lazy::new(|| {
    FxHashMap::from_iter([
        ("class", SymbolKind::Class),
        ("interface", SymbolKind::Class),
        ("struct", SymbolKind::Class),
        ("method", SymbolKind::Method),
        ("function", SymbolKind::Function),
        ("func", SymbolKind::Function),
    ])
});

pub fn map_kind(label: &str) -> Option<SymbolKind> {
    KIND_MAP.get(label).copied()
}

/// One line of `ctags --output-format=json` output.
#[derive(Debug, Deserialize)]
struct TagRecord {
    #[serde(rename = "_type")]
    record_type: Option<String>,
    name: Option<String>,
    kind: Option<String>,
    line: Option<u32>,
}

/// Invokes universal-ctags with JSON output against single files.
#[derive(Debug, Clone)]
pub struct CtagsProvider {
    executable: PathBuf,
    budget: Duration,
}

impl CtagsProvider {
    pub fn new(executable: impl Into<PathBuf>, budget: Duration) -> Self {
        Self {
            executable: executable.into(),
            budget,
        }
    }

    /// Parses newline-delimited JSON tag records. Non-tag records (`ptag`
    /// headers) and records with unmapped kinds contribute no symbol; a line
    /// that is not JSON at all fails the whole file with `ParseFailure`.
    fn parse_output(output: &str, source_file: &Path) -> Result<Vec<Symbol>, IngestError> {
        let mut symbols = Vec::new();
        for line in output.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let record: TagRecord = serde_json::from_str(line)
                .map_err(|err| IngestError::ParseFailure(format!("bad tag record: {}", err)))?;
            if record.record_type.as_deref().unwrap_or("tag") != "tag" {
                continue;
            }
            let (Some(name), Some(kind_label)) = (record.name, record.kind) else {
                continue;
            };
            let Some(kind) = map_kind(&kind_label) else {
                trace!("dropping tag {} with unmapped kind {}", name, kind_label);
                continue;
            };
            symbols.push(Symbol {
                name,
                kind,
                source_file: source_file.to_path_buf(),
                line: record.line.unwrap_or(1),
            });
        }
        Ok(symbols)
    }
}

#[async_trait]
impl SymbolProvider for CtagsProvider {
    async fn extract(&self, path: &Path) -> Result<Vec<Symbol>, IngestError> {
        let mut command = Command::new(&self.executable);
        command
            .arg("--output-format=json")
            .arg("--fields=*")
            .arg("--excmd=pattern")
            .arg(path)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            // If the timeout drops the in-flight future, the child must not
            // outlive it.
            .kill_on_drop(true);

        let output = match timeout(self.budget, command.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(err)) => {
                return Err(match err.kind() {
                    ErrorKind::NotFound | ErrorKind::PermissionDenied => {
                        IngestError::ToolUnavailable(self.executable.display().to_string())
                    }
                    _ => IngestError::ParseFailure(format!("failed to run tagging tool: {}", err)),
                });
            }
            Err(_) => return Err(IngestError::Timeout(self.budget)),
        };

        if !output.status.success() {
            return Err(IngestError::ParseFailure(format!(
                "tagging tool exited with {}",
                output.status
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        Self::parse_output(&stdout, path)
    }
}
