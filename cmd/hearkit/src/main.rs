//! hearkit CLI - compute framed audio embeddings from WAV files.

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;

use commands::{EmbedCommand, InfoCommand};

/// hearkit CLI - framed audio embeddings.
///
/// Embeddings are computed by a log mel spectrum followed by a seeded random
/// projection. The model configuration can be overridden with a YAML or JSON
/// file.
#[derive(Parser)]
#[command(name = "hearkit")]
#[command(about = "Framed audio embeddings from WAV files")]
#[command(version)]
pub struct Cli {
    /// Model config file (YAML or JSON; default is the reference model)
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Output file (default: stdout)
    #[arg(short = 'o', long, global = true)]
    pub output: Option<String>,

    /// Verbose output
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Embed one or more WAV files
    Embed(EmbedCommand),
    /// Print the effective model configuration
    Info(InfoCommand),
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging
    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match &cli.command {
        Commands::Embed(cmd) => cmd.run(&cli),
        Commands::Info(cmd) => cmd.run(&cli),
    }
}
