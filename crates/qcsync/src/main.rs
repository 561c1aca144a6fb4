mod commands;
mod context;
mod render;

use clap::{Parser, Subcommand};
use qcsync_config::Settings;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "qcsync")]
#[command(version)]
#[command(about = "Sync QUIC.cloud node IPs into Cloudflare IP Access Rules", long_about = None)]
struct Cli {
    /// Settings file (default: QCSYNC_CONFIG, ./qcsync.yaml, ~/.config/qcsync/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Apply every change in one pass (cron mode, the default)
    Run,
    /// Show the changes a run would make without applying them
    Plan,
    /// Serve the interactive batch flow over HTTP
    Serve {
        /// Listen address (default from settings, 127.0.0.1:8787)
        #[arg(short, long, env = "QCSYNC_BIND")]
        bind: Option<String>,
    },
    /// Show version information
    Version,
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load_settings(explicit: Option<&Path>) -> anyhow::Result<Settings> {
    let (settings, source) = Settings::load(explicit)?;
    if let Some(path) = &source {
        tracing::debug!("Using settings from {}", path.display());
    }
    Ok(settings)
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    let config = cli.config.as_deref();
    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => commands::run::handle(&load_settings(config)?).await?,
        Commands::Plan => commands::plan::handle(&load_settings(config)?).await?,
        Commands::Serve { bind } => {
            commands::serve::handle(&load_settings(config)?, bind).await?;
        }
        Commands::Version => {
            println!("qcsync {}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}
