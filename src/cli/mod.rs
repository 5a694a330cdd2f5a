//! CLI module for PodEcho.

pub mod commands;
mod output;
pub mod preflight;

pub use output::Output;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// PodEcho - Make podcasts echo, not just pass through
///
/// Read a podcast transcript, highlight passages, extract insights, reflect on
/// them with a Socratic coach, and export everything as a learning report.
#[derive(Parser, Debug)]
#[command(name = "podecho")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Increase verbosity (-v for info, -vv for debug, -vvv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    pub config: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start an interactive reading session on a podcast
    Reflect {
        /// Podcast metadata JSON file
        podcast: PathBuf,

        /// Plain-text transcript to use instead of the one in the metadata
        #[arg(short, long)]
        transcript: Option<PathBuf>,

        /// Use built-in offline services instead of the model API
        #[arg(long)]
        offline: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}
