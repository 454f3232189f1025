use std::path::PathBuf;

use clap::Parser;
use tower_lsp::{LspService, Server};
use tracing::info;

use triggerfish_language_server::config::ServerConfig;
use triggerfish_language_server::logging::init_logger;
use triggerfish_language_server::lsp::backend::Backend;

/// Language server providing trigger-character fuzzy completion from a
/// ctags-backed workspace symbol index.
#[derive(Debug, Parser)]
#[command(name = "triggerfish-language-server", version)]
struct Args {
    /// Override the stderr log level (otherwise RUST_LOG or "info")
    #[arg(long)]
    log_level: Option<String>,

    /// Disable ANSI colors on stderr
    #[arg(long)]
    no_color: bool,

    /// Disable the session log file in the user cache directory
    #[arg(long)]
    no_file_log: bool,

    /// Path to the ctags executable (overrides TRIGGERFISH_CTAGS_BIN)
    #[arg(long)]
    ctags_bin: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let _guard = init_logger(args.no_color, args.log_level.as_deref(), !args.no_file_log)?;

    let mut config = ServerConfig::from_env();
    if let Some(bin) = args.ctags_bin {
        config.ctags_bin = bin;
    }

    info!(
        "starting triggerfish language server (ctags: {}, timeout: {:?})",
        config.ctags_bin.display(),
        config.ctags_timeout
    );

    let stdin = tokio::io::stdin();
    let stdout = tokio::io::stdout();

    let (service, socket) = LspService::new(|client| Backend::new(client, config));
    Server::new(stdin, stdout, socket).serve(service).await;

    Ok(())
}
