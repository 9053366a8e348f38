//! Monthly report pipeline
//!
//! config → CSV chunks → normalize → month filter → clean → categorize →
//! KPIs/tables → HTML/SVG/PDF → snapshot

use std::path::PathBuf;

use tracing::{debug, info};

use crate::categorize::Categorizer;
use crate::clean::{clean_transactions_with_stats, CleanStats};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::export::{write_snapshot, SnapshotPaths};
use crate::import::CsvSource;
use crate::models::{BankCount, Month, Transaction, UnifiedTransaction};
use crate::normalize::normalize_chunks;
use crate::report::{render_report, RenderOptions, RenderedReport};
use crate::reports::build_monthly_report;

/// Inputs for one run
#[derive(Debug, Clone)]
pub struct ReportRequest {
    pub month: Month,
    pub csv_paths: Vec<PathBuf>,
    pub config_path: PathBuf,
    pub presentation: bool,
    pub reports_dir: PathBuf,
    pub output_dir: PathBuf,
    pub pdf: bool,
}

impl ReportRequest {
    pub fn new(month: Month, csv_paths: Vec<PathBuf>, config_path: impl Into<PathBuf>) -> Self {
        Self {
            month,
            csv_paths,
            config_path: config_path.into(),
            presentation: false,
            reports_dir: PathBuf::from("reports"),
            output_dir: PathBuf::from("output"),
            pdf: true,
        }
    }
}

/// Everything a run produced
#[derive(Debug, Clone)]
pub struct ReportOutcome {
    pub rendered: RenderedReport,
    pub snapshot: SnapshotPaths,
    pub bank_counts: Vec<BankCount>,
    pub transactions: usize,
    pub clean_stats: CleanStats,
}

/// Keep records dated within the month
fn filter_month(records: Vec<UnifiedTransaction>, month: &Month) -> Vec<UnifiedTransaction> {
    records
        .into_iter()
        .filter(|r| r.date.is_some_and(|d| month.contains(d)))
        .collect()
}

/// Categorized transactions for the month, without writing anything
pub fn prepare_transactions(
    csv_paths: &[PathBuf],
    month: &Month,
    config: &Config,
) -> Result<(Vec<Transaction>, CleanStats)> {
    if csv_paths.is_empty() {
        return Err(Error::NoInput);
    }

    let chunks = CsvSource::new(csv_paths.iter().cloned()).fetch()?;
    let records = normalize_chunks(&chunks);
    let total = records.len();
    let in_month = filter_month(records, month);
    debug!(
        "{} of {} normalized records fall in {}",
        in_month.len(),
        total,
        month
    );

    let (mut txns, stats) = clean_transactions_with_stats(in_month);
    Categorizer::new(&config.rules).categorize(&mut txns);
    Ok((txns, stats))
}

/// Run the full monthly report
pub fn run_monthly_report(request: &ReportRequest) -> Result<ReportOutcome> {
    let config = Config::load(&request.config_path)?;

    let (txns, clean_stats) = prepare_transactions(&request.csv_paths, &request.month, &config)?;
    info!(
        "{} transactions for {} from {} file(s)",
        txns.len(),
        request.month,
        request.csv_paths.len()
    );

    let report = build_monthly_report(&txns, request.month, &config);
    let rendered = render_report(
        &report,
        &RenderOptions {
            reports_dir: request.reports_dir.clone(),
            presentation: request.presentation,
            pdf: request.pdf,
        },
    )?;
    let snapshot = write_snapshot(&txns, &request.output_dir, &request.month)?;

    Ok(ReportOutcome {
        rendered,
        snapshot,
        bank_counts: report.bank_counts,
        transactions: txns.len(),
        clean_stats,
    })
}
