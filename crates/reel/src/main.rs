//! Reel CLI - sequential video-to-markdown extraction pipeline.
//!
//! Reel reads a declarative TOML job list, sends each video (local file or
//! remote URL) to a remote extraction service, and writes one markdown file
//! per successful job.
//!
//! # Usage
//!
//! ```bash
//! # Run every job in the config
//! reel run --config reel.toml
//!
//! # Run specific jobs only
//! reel run --config reel.toml intro framework
//!
//! # List configured jobs without touching the network
//! reel jobs --config reel.toml
//! ```

use clap::{Parser, Subcommand};

mod cli;
mod logging;

/// Reel - sequential video-to-markdown extraction pipeline.
#[derive(Parser, Debug)]
#[command(name = "reel")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Enable verbose (debug) logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the configured extraction batch
    Run(cli::run::RunArgs),

    /// List configured jobs
    Jobs(cli::jobs::JobsArgs),
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    logging::init(cli.verbose, cli.json_logs);
    tracing::debug!("Reel v{}", reel_core::VERSION);

    // Dispatch to the appropriate command handler
    match cli.command {
        Commands::Run(args) => cli::run::execute(args).await,
        Commands::Jobs(args) => cli::jobs::execute(args),
    }
}
