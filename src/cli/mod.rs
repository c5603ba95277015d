//! Command-line interface for recency-cache.

pub mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::types::config::{OverwritePolicy, DEFAULT_CONFIG_FILE};

/// recency-cache - replay operation scripts against a bounded LRU cache.
#[derive(Parser, Debug)]
#[command(name = "recency-cache")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file.
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Verbose mode.
    #[arg(short, long)]
    pub verbose: bool,

    /// Quiet mode.
    #[arg(short, long)]
    pub quiet: bool,

    /// Command to run.
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Writes a default configuration file.
    Init {
        /// Target directory (default: current directory).
        #[arg(short, long)]
        path: Option<PathBuf>,
    },

    /// Runs an operation script and prints each step's outcome.
    Replay {
        /// Script file.
        script: PathBuf,

        /// Overrides the configured capacity.
        #[arg(long)]
        capacity: Option<usize>,

        /// Overrides the configured overwrite policy (refresh, literal).
        #[arg(long)]
        policy: Option<OverwritePolicy>,

        /// Prints the report as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Prints the effective configuration.
    Config,

    /// Shows version.
    Version,
}
