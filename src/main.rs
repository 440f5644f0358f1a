use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::Level;
use tracing_subscriber::EnvFilter;

use board_sync::config::DEFAULT_CONFIG_PATH;
use board_sync::errors::SyncError;

mod cmd;

#[derive(Parser)]
#[command(name = "board-sync")]
#[command(
    version,
    about = "Publish a kanban board's public lists and cards to a static-site repository"
)]
pub struct Cli {
    /// Verbosity (-v info, -vv debug, -vvv trace). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub json_logs: bool,

    /// Path to the configuration file (.toml, or .json for the flat layout)
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Fetch the board and commit the rendered files to the branch
    Run {
        /// Render and list the files without touching the repository
        #[arg(long)]
        dry_run: bool,

        /// With --dry-run, print file contents too
        #[arg(long, requires = "dry_run")]
        show_content: bool,

        /// Target branch (overrides config and BOARD_SYNC_BRANCH)
        #[arg(long)]
        branch: Option<String>,
    },
    /// View, validate or create the configuration file
    Config {
        #[command(subcommand)]
        command: Option<ConfigCommands>,
    },
}

#[derive(Subcommand, Clone)]
pub enum ConfigCommands {
    /// Show the effective configuration with secrets redacted
    Show,
    /// Validate configuration and show any warnings
    Validate,
    /// Write a starter configuration file
    Init,
}

fn init_tracing(cli: &Cli) -> Result<()> {
    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    let result = if cli.json_logs {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    result
        .map_err(|e| anyhow::anyhow!(e))
        .context("Failed to initialize logging")
}

async fn dispatch(cli: &Cli) -> Result<()> {
    match &cli.command {
        Commands::Run {
            dry_run,
            show_content,
            branch,
        } => cmd::cmd_run(&cli.config, branch.as_deref(), *dry_run, *show_content).await,
        Commands::Config { command } => cmd::cmd_config(&cli.config, command.clone()),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // A missing .env is fine; secrets may come from the real environment.
    let _ = dotenvy::dotenv();

    if let Err(e) = init_tracing(&cli) {
        eprintln!("Error: {:#}", e);
        return ExitCode::FAILURE;
    }

    match dispatch(&cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %format!("{:#}", e), "board-sync failed");
            eprintln!("Error: {:#}", e);
            let code = e
                .downcast_ref::<SyncError>()
                .map(SyncError::exit_code)
                .unwrap_or(1);
            ExitCode::from(code)
        }
    }
}
