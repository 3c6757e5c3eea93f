mod output;

use clap::{Parser, Subcommand};
pub use output::{ColorMode, OutputFormat};
use std::path::PathBuf;

/// Parse, describe and evaluate chat narrow queries
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Organization snapshot (people, streams, realm settings) in TOML
    #[arg(short, long, global = true, env = "NARROW_CONFIG")]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short = 'F', long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Colorize text output
    #[arg(long, global = true, value_enum, default_value_t = ColorMode::Auto)]
    pub color: ColorMode,

    /// Also write the output to this file
    #[arg(short, long, global = true)]
    pub output: Option<PathBuf>,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the canonical terms of a query
    Parse {
        /// Narrow query, e.g. 'stream:Denmark topic:lunch'
        query: String,
    },
    /// Show the human readable description of a query
    Describe {
        /// Narrow query
        query: String,
    },
    /// Evaluate a query against messages loaded from a file
    Match {
        /// Narrow query
        query: String,

        /// Messages as a JSON array or JSON lines
        #[arg(short, long)]
        messages: PathBuf,

        /// Only report the first matching message id
        #[arg(long)]
        first: bool,
    },
}

pub fn cli_parse() -> Cli {
    Cli::parse()
}
