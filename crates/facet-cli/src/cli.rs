//! CLI argument definitions using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Facet: automated profiling for tabular datasets
#[derive(Parser)]
#[command(name = "facet")]
#[command(version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Profile a data file and build an HTML report
    Report {
        /// Path to the data file (CSV/TSV)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output directory for the report (default: console only)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Comma-separated column allow-list
        #[arg(short, long, value_delimiter = ',')]
        columns: Option<Vec<String>>,

        /// Target column used as the grouping/hue dimension
        #[arg(short, long)]
        target: Option<String>,

        /// Desired bucket count for the reduced target column
        #[arg(long, default_value = "3")]
        buckets: usize,

        /// Skip chart generation entirely
        #[arg(long)]
        no_charts: bool,

        /// Abort on the first column or pair failure
        #[arg(long)]
        strict: bool,

        /// Don't open the finalized report in a browser
        #[arg(long)]
        no_open: bool,
    },

    /// Print per-column summary statistics to the console
    Stats {
        /// Path to the data file (CSV/TSV)
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Only show this column
        #[arg(short, long)]
        column: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
