//! Tally Core Library
//!
//! Monthly reports from personal bank exports:
//! - CSV ingestion with delimiter and encoding fallbacks
//! - Bank format detection and normalization (Revolut, Swedbank)
//! - Cleaning and deduplication
//! - Rule-based categorization from a YAML config
//! - KPIs and report tables
//! - HTML/SVG/PDF rendering with a presentation (masked) mode
//! - Snapshot export of the categorized month

pub mod categorize;
pub mod clean;
pub mod config;
pub mod error;
pub mod export;
pub mod import;
pub mod models;
pub mod normalize;
pub mod pipeline;
pub mod report;
pub mod reports;

pub use categorize::{compute_income_sources, Categorizer, Rule};
pub use clean::{clean_transactions, clean_transactions_with_stats, CleanStats};
pub use config::{Config, KeywordRule, ReportSettings, RulesConfig};
pub use error::{Error, Result};
pub use export::{write_snapshot, SnapshotPaths};
pub use import::{CsvSource, RawChunk};
pub use models::*;
pub use normalize::{detect_bank, normalize_chunks, score_chunk};
pub use pipeline::{prepare_transactions, run_monthly_report, ReportOutcome, ReportRequest};
pub use report::{mask_numeric_strings, render_report, RenderOptions, RenderedReport};
pub use reports::build_monthly_report;
