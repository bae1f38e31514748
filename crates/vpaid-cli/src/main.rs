//! VPAID CLI - Headless VPAID Host Simulator
//!
//! Features:
//! - Scripted host sessions against the ad unit
//! - Linear playthroughs with quartile output
//! - Protocol handshake

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod commands;
mod output;

/// VPAID CLI - Ad unit host simulator
#[derive(Parser)]
#[command(name = "vpaid-cli")]
#[command(author = "Purple Squirrel Media")]
#[command(version)]
#[command(about = "Headless VPAID 2.0 host simulator", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    format: String,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a scripted host session
    Run {
        /// Path to the scenario JSON file
        scenario: PathBuf,
    },

    /// Play the creative start to end and show the quartiles
    Playthrough {
        /// Media duration in seconds
        #[arg(short, long, default_value = "30")]
        duration: f64,

        /// Seconds between position updates
        #[arg(short, long, default_value = "0.25")]
        step: f64,
    },

    /// Show the negotiated VPAID version
    Handshake,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize tracing; logs go to stderr so JSON output stays clean
    let level = if cli.verbose { "debug" } else { "info" };
    if cli.log_json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(level)
            .with_writer(std::io::stderr)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(level)
            .with_writer(std::io::stderr)
            .init();
    }

    vpaid_core::init();

    match cli.command {
        Commands::Run { scenario } => {
            commands::run(&scenario, &cli.format).await?;
        }
        Commands::Playthrough { duration, step } => {
            commands::playthrough(duration, step, &cli.format).await?;
        }
        Commands::Handshake => {
            commands::handshake(&cli.format)?;
        }
    }

    Ok(())
}
