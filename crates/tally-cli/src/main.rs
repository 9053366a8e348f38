//! Tally CLI - Monthly bank statement reports
//!
//! Usage:
//!   tally report --month 2025-10 --csv revolut.csv swedbank.csv
//!   tally report --month 2025-10 --csv export.csv --presentation
//!   tally detect --csv export.csv

mod cli;
mod commands;

#[cfg(test)]
mod tests;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::*;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact())
        .init();

    match cli.command {
        Commands::Report {
            month,
            csv,
            config,
            presentation,
            no_presentation: _,
            reports_dir,
            output_dir,
            no_pdf,
            no_open,
        } => {
            let mut request = commands::ReportRequest::new(month, csv, config);
            request.presentation = presentation;
            request.reports_dir = reports_dir;
            request.output_dir = output_dir;
            request.pdf = !no_pdf;
            commands::cmd_report(&request, !no_open)
        }
        Commands::Detect { csv, json } => commands::cmd_detect(&csv, json),
    }
}
