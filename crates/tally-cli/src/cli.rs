//! CLI argument definitions using clap
//!
//! The command implementations live in the `commands` module.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tally_core::Month;

/// Tally - Monthly reports from bank CSV exports
#[derive(Parser)]
#[command(name = "tally")]
#[command(about = "Monthly spending and income reports from bank exports", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Build the monthly report
    Report {
        /// Month in YYYY-MM, e.g. 2025-10
        #[arg(short, long)]
        month: Month,

        /// One or more CSV exports (Revolut, Swedbank)
        #[arg(long = "csv", num_args = 1..)]
        csv: Vec<PathBuf>,

        /// Rules config
        #[arg(short, long, default_value = "config.yaml")]
        config: PathBuf,

        /// Hide numeric values in the report and charts
        #[arg(long, overrides_with = "no_presentation")]
        presentation: bool,

        /// Show numeric values (default)
        #[arg(long, overrides_with = "presentation")]
        no_presentation: bool,

        /// Where the HTML, PDF and charts are written
        #[arg(long, default_value = "reports")]
        reports_dir: PathBuf,

        /// Where the transaction snapshot is written
        #[arg(long, default_value = "output")]
        output_dir: PathBuf,

        /// Skip the PDF
        #[arg(long)]
        no_pdf: bool,

        /// Don't open the report in a browser
        #[arg(long)]
        no_open: bool,
    },

    /// Show which bank each CSV looks like
    Detect {
        /// CSV files to inspect
        #[arg(long = "csv", num_args = 1.., required = true)]
        csv: Vec<PathBuf>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
