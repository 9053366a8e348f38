//! Monthly report command

use std::path::Path;
use std::process::{Command, Stdio};

use anyhow::{bail, Context, Result};
use tally_core::{run_monthly_report, ReportOutcome, ReportRequest};
use tracing::{debug, warn};

use super::truncate;

pub fn cmd_report(request: &ReportRequest, open: bool) -> Result<()> {
    println!("📊 Building report for {}", request.month);
    println!("   Config: {}", request.config_path.display());
    for path in &request.csv_paths {
        println!("   CSV:    {}", path.display());
    }
    if request.presentation {
        println!("   Presentation mode: amounts hidden");
    }

    let outcome = run_monthly_report(request)
        .with_context(|| format!("Failed to build the report for {}", request.month))?;

    print_outcome(&outcome);

    if open {
        if let Err(e) = open_in_browser(&outcome.rendered.html) {
            warn!("Could not open the report in a browser: {:#}", e);
        }
    }

    Ok(())
}

fn print_outcome(outcome: &ReportOutcome) {
    let stats = &outcome.clean_stats;
    println!();
    println!("✅ {} transactions", outcome.transactions);
    for count in &outcome.bank_counts {
        println!("   {:10} {}", count.bank.label(), count.count);
    }
    if stats.duplicates > 0 || stats.missing_date > 0 || stats.missing_amount > 0 {
        println!(
            "   Dropped: {} duplicate(s), {} without date, {} without amount",
            stats.duplicates, stats.missing_date, stats.missing_amount
        );
    }

    println!();
    println!("📄 Report:   {}", outcome.rendered.html.display());
    match &outcome.rendered.pdf {
        Some(pdf) => println!("   PDF:      {}", pdf.display()),
        None => println!("   PDF:      skipped"),
    }
    for chart in &outcome.rendered.charts {
        let name = chart
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        println!("   Chart:    {}", truncate(&name, 48));
    }
    println!("💾 Snapshot: {}", outcome.snapshot.csv.display());
    println!("            {}", outcome.snapshot.columns.display());
}

/// Platform opener command for a file
fn opener(target: &str) -> Command {
    if cfg!(target_os = "macos") {
        let mut cmd = Command::new("open");
        cmd.arg(target);
        cmd
    } else if cfg!(target_os = "windows") {
        let mut cmd = Command::new("cmd");
        cmd.args(["/C", "start", "", target]);
        cmd
    } else {
        let mut cmd = Command::new("xdg-open");
        cmd.arg(target);
        cmd
    }
}

fn open_in_browser(path: &Path) -> Result<()> {
    let path = path
        .canonicalize()
        .with_context(|| format!("Failed to resolve {}", path.display()))?;
    let target = path.to_string_lossy().into_owned();
    debug!("Opening {}", target);

    let status = opener(&target)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .with_context(|| format!("Failed to launch a browser for {}", target))?;

    if !status.success() {
        bail!("opener exited with status: {}", status);
    }
    Ok(())
}
