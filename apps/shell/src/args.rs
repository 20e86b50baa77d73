//! # CLI Argument Definitions

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "amodel")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(arg_required_else_help = true)]
#[command(about = "Playground for the active model engine")]
pub struct Cli {
    /// Engine config file (defaults to `amodel.toml` in the working directory, if present)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Log every construction and rejected write
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: ShellCommands,
}

#[derive(Debug, Subcommand)]
pub enum ShellCommands {
    /// Walk through the car fleet scenario
    Demo {},
    /// Create cars from a JSON object or array and print them
    Create {
        /// JSON input, e.g. '{"chassis":"Porsche"}'
        data: String,
        /// Track the created cars and apply these JSON changes afterwards
        #[arg(short, long)]
        update: Option<String>,
    },
    /// Print the effective engine configuration
    Config {},
}
