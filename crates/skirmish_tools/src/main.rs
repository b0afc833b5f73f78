//! Grid Skirmish - Development Tools

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use skirmish_tools::validate;

#[derive(Parser)]
#[command(name = "skirmish-tools")]
#[command(about = "Development tools for Grid Skirmish")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a RON game config
    ValidateConfig {
        /// Path to the config file
        path: PathBuf,
    },
    /// Validate a JSON snapshot, including its board cross-check
    ValidateSnapshot {
        /// Path to the snapshot file
        path: PathBuf,
    },
    /// Re-run a replay and compare its final state hash
    VerifyReplay {
        /// Path to the replay file
        path: PathBuf,
    },
    /// Validate every config and snapshot in a directory
    ValidateDir {
        /// Directory to scan
        #[arg(default_value = "data")]
        path: PathBuf,
    },
}

fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::ValidateConfig { path } => validate::validate_config(&path).map(|config| {
            tracing::info!(
                "Config OK: {}x{} board, {} resource nodes",
                config.width,
                config.height,
                config.resource_nodes.len()
            );
        }),
        Commands::ValidateSnapshot { path } => validate::validate_snapshot(&path).map(|summary| {
            tracing::info!("Snapshot OK: {summary}");
        }),
        Commands::VerifyReplay { path } => validate::verify_replay(&path).map(|summary| {
            tracing::info!("Replay OK: {summary}");
        }),
        Commands::ValidateDir { path } => validate::validate_directory(&path).map(|checked| {
            tracing::info!("Validated {checked} files in {}", path.display());
        }),
    };

    if let Err(e) = result {
        tracing::error!("Validation failed: {e}");
        std::process::exit(1);
    }
}
