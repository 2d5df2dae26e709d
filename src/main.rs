mod commands;
mod render;

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use calmirror_core::config::SyncConfig;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "calmirror")]
#[command(about = "Mirror matching events from a source calendar into a satellite calendar")]
struct Cli {
    /// Config file (default: ~/.config/calmirror/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Log per-event decisions
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create missing copies, delete stale ones
    Sync,
    /// Show what `sync` would do without writing anything
    Plan,
    /// Sign in to Google and store a session under this account name
    Auth { account: String },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Commands::Auth { account } => {
            commands::auth::run(&account).await?;
            Ok(ExitCode::SUCCESS)
        }
        Commands::Sync => commands::sync::run(&load_config(cli.config)?, true).await,
        Commands::Plan => commands::sync::run(&load_config(cli.config)?, false).await,
    }
}

fn load_config(path: Option<PathBuf>) -> Result<SyncConfig> {
    let path = match path {
        Some(path) => path,
        None => SyncConfig::default_path()?,
    };
    Ok(SyncConfig::load(&path)?)
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "calmirror=debug"
    } else {
        "calmirror=info"
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}
