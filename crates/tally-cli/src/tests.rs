//! CLI command tests

use std::fs;
use std::path::PathBuf;

use clap::Parser;
use tally_core::{Bank, Month, ReportRequest};
use tempfile::TempDir;

use crate::cli::{Cli, Commands};
use crate::commands::{self, truncate};

const REVOLUT_CSV: &str = "Type,Product,Started Date,Completed Date,Description,Amount,Fee,Currency,State,Balance
CARD_PAYMENT,Current,2025-10-03 09:12:44,2025-10-03 10:00:01,Maxima,-15.50,0.00,EUR,COMPLETED,984.50
TOPUP,Current,2025-10-04 08:00:00,2025-10-04 08:00:01,Salary ACME,1200.13,0.00,EUR,COMPLETED,2184.63
";

const SWEDBANK_CSV: &str = "Data;Gavėjas;Paaiškinimai;Suma;Valiuta;D/K
2025-10-02;UAB Rimi;Pirkinys;32,10;EUR;D
";

fn write_inputs(dir: &TempDir) -> (PathBuf, PathBuf, PathBuf) {
    let revolut = dir.path().join("revolut.csv");
    let swedbank = dir.path().join("swedbank.csv");
    let config = dir.path().join("config.yaml");
    fs::write(&revolut, REVOLUT_CSV).unwrap();
    fs::write(&swedbank, SWEDBANK_CSV).unwrap();
    fs::write(
        &config,
        "income:\n  employers:\n    - keywords: [ACME]\ncategories:\n  Groceries: [MAXIMA, RIMI]\n",
    )
    .unwrap();
    (revolut, swedbank, config)
}

// ========== Argument Parsing Tests ==========

#[test]
fn test_parse_report_defaults() {
    let cli = Cli::try_parse_from(["tally", "report", "--month", "2025-10", "--csv", "a.csv"])
        .unwrap();
    assert!(!cli.verbose);
    match cli.command {
        Commands::Report {
            month,
            csv,
            config,
            presentation,
            reports_dir,
            output_dir,
            no_pdf,
            no_open,
            ..
        } => {
            assert_eq!(month, Month::new(2025, 10).unwrap());
            assert_eq!(csv, vec![PathBuf::from("a.csv")]);
            assert_eq!(config, PathBuf::from("config.yaml"));
            assert!(!presentation);
            assert_eq!(reports_dir, PathBuf::from("reports"));
            assert_eq!(output_dir, PathBuf::from("output"));
            assert!(!no_pdf);
            assert!(!no_open);
        }
        _ => panic!("expected report command"),
    }
}

#[test]
fn test_parse_multiple_csvs() {
    let cli = Cli::try_parse_from([
        "tally", "report", "-m", "2025-10", "--csv", "a.csv", "b.csv", "--csv", "c.csv",
    ])
    .unwrap();
    match cli.command {
        Commands::Report { csv, .. } => assert_eq!(csv.len(), 3),
        _ => panic!("expected report command"),
    }
}

#[test]
fn test_parse_presentation_flags() {
    let parse = |args: &[&str]| {
        let mut argv = vec!["tally", "report", "--month", "2025-10"];
        argv.extend_from_slice(args);
        match Cli::try_parse_from(argv).unwrap().command {
            Commands::Report { presentation, .. } => presentation,
            _ => panic!("expected report command"),
        }
    };
    assert!(parse(&["--presentation"]));
    assert!(!parse(&["--no-presentation"]));
    assert!(!parse(&["--presentation", "--no-presentation"]));
    assert!(parse(&["--no-presentation", "--presentation"]));
}

#[test]
fn test_parse_rejects_bad_month() {
    assert!(Cli::try_parse_from(["tally", "report", "--month", "2025-13"]).is_err());
    assert!(Cli::try_parse_from(["tally", "report", "--month", "October"]).is_err());
    assert!(Cli::try_parse_from(["tally", "report"]).is_err());
}

#[test]
fn test_parse_detect_requires_csv() {
    assert!(Cli::try_parse_from(["tally", "detect"]).is_err());
    let cli = Cli::try_parse_from(["tally", "-v", "detect", "--csv", "x.csv", "--json"]).unwrap();
    assert!(cli.verbose);
    assert!(matches!(cli.command, Commands::Detect { json: true, .. }));
}

// ========== Command Tests ==========

#[test]
fn test_cmd_detect() {
    let dir = TempDir::new().unwrap();
    let (revolut, swedbank, _) = write_inputs(&dir);
    assert!(commands::cmd_detect(&[revolut.clone(), swedbank.clone()], false).is_ok());
    assert!(commands::cmd_detect(&[revolut], true).is_ok());
}

#[test]
fn test_detect_chunk() {
    let chunk = tally_core::import::read_csv_bytes(SWEDBANK_CSV.as_bytes(), "s.csv");
    let d = commands::detect_chunk(&chunk);
    assert_eq!(d.bank, Bank::Swedbank);
    assert_eq!(d.rows, 1);
    assert_eq!(d.scores.len(), 2);
}

#[test]
fn test_cmd_detect_missing_file() {
    let result = commands::cmd_detect(&[PathBuf::from("/nonexistent/export.csv")], false);
    assert!(result.is_err());
}

#[test]
fn test_cmd_report_without_browser() {
    let dir = TempDir::new().unwrap();
    let (revolut, swedbank, config) = write_inputs(&dir);

    let mut request = ReportRequest::new(Month::new(2025, 10).unwrap(), vec![revolut, swedbank], config);
    request.reports_dir = dir.path().join("reports");
    request.output_dir = dir.path().join("output");
    request.pdf = false;

    commands::cmd_report(&request, false).unwrap();
    assert!(dir.path().join("reports/2025-10_report.html").exists());
    assert!(!dir.path().join("reports/2025-10_report.pdf").exists());
    assert!(dir
        .path()
        .join("output/clean_transactions_2025-10.csv")
        .exists());
}

#[test]
fn test_cmd_report_no_csvs() {
    let dir = TempDir::new().unwrap();
    let (_, _, config) = write_inputs(&dir);
    let request = ReportRequest::new(Month::new(2025, 10).unwrap(), vec![], config);

    let err = commands::cmd_report(&request, false).unwrap_err();
    assert!(format!("{:#}", err).contains("No CSV files provided"));
}

// ========== Helper Tests ==========

#[test]
fn test_truncate() {
    assert_eq!(truncate("short", 10), "short");
    assert_eq!(truncate("2025-10_expenses_pie.svg", 10), "2025-10...");
    assert_eq!(truncate("Gavėjas Gavėjas", 8), "Gavėj...");
}
