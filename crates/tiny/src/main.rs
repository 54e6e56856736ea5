//! Tiny CLI - site server and static generator.
//!
//! Provides commands for:
//! - `serve`: Serve the site described by the config file
//! - `generate`: Write the site as static files
//! - `check`: Validate the config file and compile every page

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{CheckArgs, GenerateArgs, ServeArgs};
use error::CliError;
use output::Output;

/// Tiny - site server and static generator.
#[derive(Parser)]
#[command(name = "tiny", version, about)]
struct Cli {
    /// Enable verbose output (info level logs).
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the site server.
    Serve(ServeArgs),
    /// Generate the static site.
    Generate(GenerateArgs),
    /// Validate the site config.
    Check(CheckArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let result = match cli.command {
        Commands::Serve(args) => block_on(args.execute()),
        Commands::Generate(args) => block_on(args.execute()),
        Commands::Check(args) => args.execute(),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}

fn block_on<F>(future: F) -> Result<(), CliError>
where
    F: Future<Output = Result<(), CliError>>,
{
    tokio::runtime::Runtime::new()?.block_on(future)
}
