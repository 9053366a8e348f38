//! Report rendering: HTML page, SVG charts and a best-effort PDF
//!
//! Files are named after the month and written into the reports directory:
//!
//! - `{month}_report.html`
//! - `{month}_expenses_pie.svg`, `{month}_income_pie.svg`,
//!   `{month}_investment_pie.svg`, `{month}_daily_spending.svg`
//! - `{month}_report.pdf` (only if rendering succeeds)
//!
//! In presentation mode charts carry labels only and the HTML is passed
//! through [`mask_numeric_strings`] before it is written.

mod charts;
mod html;
mod mask;
mod pdf;

use std::fs;
use std::path::PathBuf;

use chrono::Local;
use tracing::{debug, info, warn};

use crate::error::Result;
use crate::export::write_atomic;
use crate::models::MonthlyReport;

pub use charts::{build_charts, daily_bar_chart, pie_chart, ChartSet};
pub use html::{escape_html, render_html, ChartFiles};
pub use mask::{mask_numeric_strings, Masker};
pub use pdf::write_pdf;

#[derive(Debug, Clone)]
pub struct RenderOptions {
    pub reports_dir: PathBuf,
    /// Hide amounts in charts and mask them in the HTML and PDF
    pub presentation: bool,
    /// Also try to write a PDF
    pub pdf: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            reports_dir: PathBuf::from("reports"),
            presentation: false,
            pdf: true,
        }
    }
}

/// Paths of everything written
#[derive(Debug, Clone)]
pub struct RenderedReport {
    pub html: PathBuf,
    pub pdf: Option<PathBuf>,
    pub charts: Vec<PathBuf>,
}

/// Write the report page, its charts and (best effort) the PDF
pub fn render_report(report: &MonthlyReport, options: &RenderOptions) -> Result<RenderedReport> {
    let dir = &options.reports_dir;
    fs::create_dir_all(dir)?;

    let month = report.month.to_string();
    let generated_at = Local::now().format("%Y-%m-%d %H:%M").to_string();

    let files = ChartFiles {
        expenses: format!("{}_expenses_pie.svg", month),
        income: format!("{}_income_pie.svg", month),
        investments: format!("{}_investment_pie.svg", month),
        daily: format!("{}_daily_spending.svg", month),
    };
    let set = build_charts(report, options.presentation);
    let mut chart_paths = Vec::with_capacity(4);
    for (name, svg) in [
        (&files.expenses, &set.expenses),
        (&files.income, &set.income),
        (&files.investments, &set.investments),
        (&files.daily, &set.daily),
    ] {
        let path = dir.join(name);
        write_atomic(&path, svg.as_bytes())?;
        chart_paths.push(path);
    }
    debug!("Wrote {} charts to {}", chart_paths.len(), dir.display());

    let masker = if options.presentation {
        Some(Masker::new(&[report.currency.as_str()])?)
    } else {
        None
    };

    let mut page = render_html(report, &files, options.presentation, &generated_at);
    if let Some(masker) = &masker {
        page = masker.mask(&page);
    }
    let html_path = dir.join(format!("{}_report.html", month));
    write_atomic(&html_path, page.as_bytes())?;
    info!("Report written to {}", html_path.display());

    let pdf_path = dir.join(format!("{}_report.pdf", month));
    let pdf = if !options.pdf {
        None
    } else {
        match write_pdf(report, &pdf_path, &generated_at, masker.as_ref()) {
            Ok(()) => {
                info!("PDF written to {}", pdf_path.display());
                Some(pdf_path)
            }
            Err(e) => {
                warn!("Skipping PDF: {}", e);
                let _ = fs::remove_file(&pdf_path);
                None
            }
        }
    };

    Ok(RenderedReport {
        html: html_path,
        pdf,
        charts: chart_paths,
    })
}
