//! LM CLI - course content markdown renderer.
//!
//! Provides commands for:
//! - `render`: Render a markdown file (or stdin) to sanitized HTML
//! - `schema`: Print the sanitization allow-list as JSON

mod commands;
mod error;
mod output;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use commands::{RenderArgs, SchemaArgs};
use output::Output;

/// LM - course content markdown renderer.
#[derive(Parser)]
#[command(name = "lm", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render markdown to sanitized HTML.
    Render(RenderArgs),
    /// Print the sanitization allow-list as JSON.
    Schema(SchemaArgs),
}

fn main() {
    let cli = Cli::parse();
    let output = Output::new();

    let verbose = matches!(&cli.command, Commands::Render(args) if args.verbose);

    // Initialize tracing with appropriate log level
    // --verbose enables INFO level, otherwise use RUST_LOG or default to WARN
    let filter = if verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::from_default_env()
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let result = match cli.command {
        Commands::Render(args) => args.execute(),
        Commands::Schema(args) => args.execute(),
    };

    if let Err(err) = result {
        output.error(&format!("Error: {err}"));
        std::process::exit(1);
    }
}
