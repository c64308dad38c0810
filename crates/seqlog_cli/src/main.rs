//! Seqlog CLI
//!
//! Command-line tools for inspecting seqlog log directories.
//!
//! # Commands
//!
//! - `inspect` - Display the segment layout and offset range
//! - `verify` - Cross-check index entries against store framing
//! - `dump` - Print records starting at an offset
//!
//! All commands read the segment files directly and never take the log's
//! directory lock, so a live log can be inspected while a writer holds it.

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Seqlog command-line log tools.
#[derive(Parser)]
#[command(name = "seqlog")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the log directory
    #[arg(global = true, short, long)]
    dir: Option<PathBuf>,

    /// Enable verbose output
    #[arg(global = true, short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Display the segment layout and offset range
    Inspect {
        /// Output format (text, json)
        #[arg(short, long, default_value = "text")]
        format: String,
    },

    /// Cross-check index entries against store framing
    Verify,

    /// Print records starting at an offset
    Dump {
        /// Offset to start from
        #[arg(short, long, default_value = "0")]
        from: u64,

        /// Maximum number of records to print
        #[arg(short, long)]
        limit: Option<usize>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let dir = cli.dir.ok_or("log directory required (--dir)")?;

    match cli.command {
        Commands::Inspect { format } => commands::inspect::run(&dir, &format)?,
        Commands::Verify => commands::verify::run(&dir)?,
        Commands::Dump { from, limit } => commands::dump::run(&dir, from, limit)?,
    }

    Ok(())
}
