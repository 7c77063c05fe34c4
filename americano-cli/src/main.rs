use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

#[derive(Parser)]
#[command(
    name = "americano",
    about = "Adaptive assessment and lecture concept extraction"
)]
#[command(version, propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage configuration
    Config(commands::config::ConfigArgs),
    /// Estimate ability from a file of recorded responses
    Estimate(commands::estimate::EstimateArgs),
    /// Extract concepts from lecture text files
    Extract(commands::extract::ExtractArgs),
    /// Run the americano server
    Serve(commands::serve::ServeArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(log_filter(cli.verbose))
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Config(args) => commands::config::run(args),
        Commands::Estimate(args) => commands::estimate::run(args),
        Commands::Extract(args) => commands::extract::run(args).await,
        Commands::Serve(args) => commands::serve::run(args).await,
    }
}

/// `RUST_LOG` wins; otherwise `--verbose` picks debug over info
fn log_filter(verbose: bool) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if verbose { "debug" } else { "info" }))
}
