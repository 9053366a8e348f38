//! Integration tests for tally-core
//!
//! These tests exercise the full CSV → normalize → clean → categorize → report
//! workflow against files on disk.

use std::fs;
use std::path::{Path, PathBuf};

use tally_core::{
    categorize::{INCOME_EMPLOYER, INCOME_STUDENTS, INCOME_STUDENTS_CASH, INVESTMENT},
    import::CsvSource,
    models::{Bank, Month},
    normalize::{detect_bank, normalize_chunks},
    pipeline::{prepare_transactions, run_monthly_report, ReportRequest},
    Config, Error,
};
use tempfile::TempDir;

/// Revolut app export: one September row, one exact duplicate
fn revolut_csv() -> &'static str {
    r#"Type,Product,Started Date,Completed Date,Description,Amount,Fee,Currency,State,Balance
CARD_PAYMENT,Current,2025-10-03 09:12:44,2025-10-03 10:00:01,Maxima,-15.50,0.00,EUR,COMPLETED,984.50
CARD_PAYMENT,Current,2025-10-05 18:20:00,2025-10-06 08:00:00,Wolt,-23.40,0.00,EUR,COMPLETED,961.10
TRANSFER,Current,2025-10-10 12:00:00,2025-10-10 12:00:05,Trading 212,-200.00,0.00,EUR,COMPLETED,761.10
CARD_PAYMENT,Current,2025-10-12 14:00:00,2025-10-12 15:00:00,Mystery Shop,-7.25,0.00,EUR,COMPLETED,753.85
CARD_PAYMENT,Current,2025-10-12 14:00:00,2025-10-12 15:00:00,Mystery Shop,-7.25,0.00,EUR,COMPLETED,746.60
CARD_PAYMENT,Current,2025-09-28 10:00:00,2025-09-28 11:00:00,Maxima,-9.99,0.00,EUR,COMPLETED,1000.00
"#
}

/// Swedbank export: semicolons, comma decimals, D/K markers
fn swedbank_csv() -> &'static str {
    "Sąskaitos Nr.;Data;Gavėjas;Paaiškinimai;Suma;Valiuta;D/K;Likutis
LT01;2025-10-01;ACME UAB;Atlyginimas;2 513,40;EUR;K;3 013,40
LT02;2025-10-02;UAB Rimi;Pirkinys;32,10;EUR;D;2 981,30
LT03;2025-10-15;Jonas;Pamoka;40,00;EUR;K;3 021,30
LT04;2025-10-20;;Imoka grynais;25,00;EUR;K;3 046,30
"
}

fn rules_yaml() -> &'static str {
    r#"investments:
  keywords: ["TRADING 212"]
income:
  employers:
    - keywords: [ACME]
  students:
    multiples_of: 20
  cash_students:
    keyword: grynais
categories:
  Groceries: [MAXIMA, RIMI]
  Eating Out: [WOLT]
"#
}

struct Fixture {
    dir: TempDir,
    revolut: PathBuf,
    swedbank: PathBuf,
    config: PathBuf,
}

fn fixture() -> Fixture {
    let dir = TempDir::new().expect("Failed to create temp dir");
    let revolut = dir.path().join("revolut.csv");
    let swedbank = dir.path().join("swedbank.csv");
    let config = dir.path().join("config.yaml");
    fs::write(&revolut, revolut_csv()).unwrap();
    fs::write(&swedbank, swedbank_csv()).unwrap();
    fs::write(&config, rules_yaml()).unwrap();
    Fixture {
        dir,
        revolut,
        swedbank,
        config,
    }
}

fn october() -> Month {
    "2025-10".parse().unwrap()
}

fn request(f: &Fixture, presentation: bool) -> ReportRequest {
    let mut req = ReportRequest::new(
        october(),
        vec![f.swedbank.clone(), f.revolut.clone()],
        &f.config,
    );
    req.presentation = presentation;
    req.reports_dir = f.dir.path().join("reports");
    req.output_dir = f.dir.path().join("output");
    req
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap_or_else(|e| panic!("read {}: {}", path.display(), e))
}

// =============================================================================
// Ingestion and Normalization
// =============================================================================

#[test]
fn test_detects_each_file_independently() {
    let f = fixture();
    let chunks = CsvSource::new([&f.swedbank, &f.revolut]).fetch().unwrap();
    assert_eq!(detect_bank(&chunks[0]), Bank::Swedbank);
    assert_eq!(detect_bank(&chunks[1]), Bank::Revolut);

    let records = normalize_chunks(&chunks);
    assert_eq!(records.len(), 10);
    assert_eq!(records[0].amount, Some(2513.40));
    assert_eq!(records[1].amount, Some(-32.10));
    assert_eq!(records[3].merchant, "");
    assert_eq!(records[4].merchant, "Maxima");
}

#[test]
fn test_latin1_swedbank_export() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("legacy.csv");
    fs::write(
        &path,
        b"Data;Gavejas;Paaiskinimai;Suma;Valiuta;D/K\n2025-10-09;Caf\xe9 Vilnius;Kava;3,20;EUR;D\n",
    )
    .unwrap();

    let chunks = CsvSource::new([&path]).fetch().unwrap();
    let records = normalize_chunks(&chunks);
    assert_eq!(records[0].bank, Bank::Swedbank);
    assert_eq!(records[0].merchant, "Café Vilnius");
    assert_eq!(records[0].amount, Some(-3.20));
}

// =============================================================================
// Categorization Workflow
// =============================================================================

#[test]
fn test_prepare_transactions_categorizes_month() {
    let f = fixture();
    let config = Config::load(&f.config).unwrap();
    let (txns, stats) =
        prepare_transactions(&[f.swedbank.clone(), f.revolut.clone()], &october(), &config)
            .unwrap();

    // September row filtered, duplicate dropped
    assert_eq!(txns.len(), 8);
    assert_eq!(stats.duplicates, 1);

    let category = |merchant: &str| {
        txns.iter()
            .find(|t| t.merchant == merchant)
            .map(|t| t.category.clone())
            .unwrap()
    };
    assert_eq!(category("ACME UAB"), INCOME_EMPLOYER);
    assert_eq!(category("UAB Rimi"), "Groceries");
    assert_eq!(category("Jonas"), INCOME_STUDENTS);
    assert_eq!(category(""), INCOME_STUDENTS_CASH);
    assert_eq!(category("Maxima"), "Groceries");
    assert_eq!(category("Wolt"), "Eating Out");
    assert_eq!(category("Trading 212"), INVESTMENT);
    assert_eq!(category("Mystery Shop"), "Miscellaneous");
}

// =============================================================================
// Full Report Runs
// =============================================================================

#[test]
fn test_full_report_run() {
    let f = fixture();
    let outcome = run_monthly_report(&request(&f, false)).expect("report run failed");

    assert_eq!(outcome.transactions, 8);
    let counts: Vec<(Bank, usize)> = outcome
        .bank_counts
        .iter()
        .map(|c| (c.bank, c.count))
        .collect();
    assert_eq!(counts, vec![(Bank::Revolut, 4), (Bank::Swedbank, 4)]);

    let html_path = &outcome.rendered.html;
    assert!(html_path.ends_with("2025-10_report.html"));
    let html = read(html_path);
    assert!(html.contains("2578.40 EUR"));
    assert!(html.contains("-278.25 EUR"));
    assert!(html.contains("Revolut: 4 tx, Swedbank: 4 tx"));
    assert!(html.contains("Mystery Shop"));

    assert_eq!(outcome.rendered.charts.len(), 4);
    for chart in &outcome.rendered.charts {
        assert!(read(chart).starts_with("<svg"));
    }
    assert!(f
        .dir
        .path()
        .join("reports/2025-10_daily_spending.svg")
        .exists());

    if let Some(pdf) = &outcome.rendered.pdf {
        assert!(fs::read(pdf).unwrap().starts_with(b"%PDF"));
    }

    let csv = read(&outcome.snapshot.csv);
    assert_eq!(csv.lines().count(), 9);
    assert!(outcome.snapshot.columns.exists());
}

#[test]
fn test_presentation_mode_masks_amounts() {
    let f = fixture();
    let outcome = run_monthly_report(&request(&f, true)).unwrap();

    let html = read(&outcome.rendered.html);
    assert!(!html.contains("2578.40"));
    assert!(html.contains("XXXX.XX EUR"));
    assert!(!html.contains("278.25"));
    // Structure and counts stay readable
    assert!(html.contains("Revolut: 4 tx"));
    assert!(html.contains("Presentation mode"));

    let expenses_chart = read(&f.dir.path().join("reports/2025-10_expenses_pie.svg"));
    assert!(expenses_chart.contains("Groceries"));
    assert!(!expenses_chart.contains("EUR"));

    // Snapshot keeps real values
    assert!(read(&outcome.snapshot.csv).contains("2513.4"));
}

#[test]
fn test_empty_month_still_renders() {
    let f = fixture();
    let mut req = request(&f, false);
    req.month = "2024-01".parse().unwrap();
    let outcome = run_monthly_report(&req).unwrap();

    assert_eq!(outcome.transactions, 0);
    let html = read(&outcome.rendered.html);
    assert!(html.contains("Sources: n/a"));
    let chart = read(&f.dir.path().join("reports/2024-01_income_pie.svg"));
    assert!(chart.contains("No income"));
}

#[test]
fn test_missing_config_aborts_before_reading_csvs() {
    let f = fixture();
    let mut req = request(&f, false);
    req.config_path = f.dir.path().join("missing.yaml");
    assert!(matches!(run_monthly_report(&req), Err(Error::Config(_))));
    assert!(!f.dir.path().join("reports").exists());
}

#[test]
fn test_no_csv_paths_is_rejected() {
    let f = fixture();
    let mut req = request(&f, false);
    req.csv_paths.clear();
    assert!(matches!(run_monthly_report(&req), Err(Error::NoInput)));
}
