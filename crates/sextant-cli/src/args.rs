//! Command-line argument definitions for the Sextant CLI.
//!
//! This module defines the [`Args`] structure parsed from the command line
//! using [`clap`]. Global arguments select the corpus, the mapping file, the
//! configuration and the output format; the [`Command`] picks what to print.

use chrono::NaiveDate;
use clap::{Parser, Subcommand, ValueEnum};

/// Command-line arguments for the Sextant hierarchy tool
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Directory containing the element catalog files
    #[arg(help = "Path to the corpus directory")]
    pub corpus: String,

    /// Path to the explicit call activity mapping file (JSON)
    #[arg(short, long)]
    pub mapping: Option<String>,

    /// Path to configuration file (TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Root document (file name, process id or name); overrides the config
    #[arg(long)]
    pub root: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    #[command(subcommand)]
    pub command: Command,
}

/// What to print.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Print the process tree
    Tree,

    /// Print the document call graph
    Graph {
        /// Emit Graphviz DOT instead of an edge list
        #[arg(long)]
        dot: bool,
    },

    /// Print every subprocess link with its match status
    Links,

    /// Print the start-to-end paths of one document
    Paths {
        /// File name, process id or name of the document
        document: String,
    },

    /// Print the schedule of the process tree
    Schedule {
        /// Project start date (YYYY-MM-DD)
        #[arg(long)]
        start: NaiveDate,
    },
}

/// Output format of every command.
#[derive(ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}
