//! Text rendering of the monthly report as PDF

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use printpdf::*;

use super::mask::Masker;
use crate::error::{Error, Result};
use crate::models::MonthlyReport;

const PAGE_W: f32 = 210.0;
const PAGE_H: f32 = 297.0;
const MARGIN_X: f32 = 20.0;
const TOP: f32 = 277.0;
const BOTTOM: f32 = 20.0;
const ROW: f32 = 6.0;

/// Column layouts: x offset in mm and max characters
const CATEGORY_COLUMNS: &[(f32, usize)] = &[(20.0, 40), (110.0, 20), (145.0, 10), (170.0, 8)];
const INCOME_COLUMNS: &[(f32, usize)] = &[(20.0, 40), (110.0, 20), (145.0, 10)];
const MERCHANT_COLUMNS: &[(f32, usize)] = &[(20.0, 50), (130.0, 20), (170.0, 8)];
const MISC_COLUMNS: &[(f32, usize)] = &[(20.0, 10), (45.0, 28), (100.0, 34), (165.0, 16)];

struct PdfWriter<'a> {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    font: IndirectFontRef,
    bold: IndirectFontRef,
    y: f32,
    masker: Option<&'a Masker>,
}

fn pdf_error(e: impl std::fmt::Display) -> Error {
    Error::Report(format!("PDF rendering failed: {}", e))
}

/// Cut to `max` characters
fn clip(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max.saturating_sub(3)).collect();
    out.push_str("...");
    out
}

impl<'a> PdfWriter<'a> {
    fn new(title: &str, masker: Option<&'a Masker>) -> Result<Self> {
        let (doc, page, layer) = PdfDocument::new(title, Mm(PAGE_W), Mm(PAGE_H), "Layer 1");
        let font = doc
            .add_builtin_font(BuiltinFont::Helvetica)
            .map_err(pdf_error)?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(pdf_error)?;
        let layer = doc.get_page(page).get_layer(layer);
        Ok(Self {
            doc,
            layer,
            font,
            bold,
            y: TOP,
            masker,
        })
    }

    /// Start a new page when fewer than `needed` mm remain
    fn reserve(&mut self, needed: f32) {
        if self.y - needed >= BOTTOM {
            return;
        }
        let (page, layer) = self.doc.add_page(Mm(PAGE_W), Mm(PAGE_H), "Layer 1");
        self.layer = self.doc.get_page(page).get_layer(layer);
        self.y = TOP;
    }

    fn text(&self, x: f32, size: f32, bold: bool, text: &str) {
        let text = match self.masker {
            Some(masker) => masker.mask(text),
            None => text.to_string(),
        };
        let font = if bold { &self.bold } else { &self.font };
        self.layer.use_text(text, size, Mm(x), Mm(self.y), font);
    }

    fn rule(&self) {
        let line = Line {
            points: vec![
                (Point::new(Mm(MARGIN_X), Mm(self.y)), false),
                (Point::new(Mm(PAGE_W - MARGIN_X), Mm(self.y)), false),
            ],
            is_closed: false,
        };
        self.layer.add_line(line);
    }

    fn heading(&mut self, text: &str) {
        self.reserve(3.0 * ROW);
        self.y -= 4.0;
        self.text(MARGIN_X, 13.0, true, text);
        self.y -= ROW + 1.0;
    }

    fn table(&mut self, columns: &[(f32, usize)], headers: &[&str], rows: &[Vec<String>]) {
        self.reserve(2.0 * ROW);
        for ((x, max), header) in columns.iter().zip(headers) {
            self.text(*x, 9.0, true, &clip(header, *max));
        }
        self.y -= 2.0;
        self.rule();
        self.y -= ROW - 1.0;

        for row in rows {
            self.reserve(ROW);
            for ((x, max), cell) in columns.iter().zip(row) {
                self.text(*x, 9.0, false, &clip(cell, *max));
            }
            self.y -= ROW;
        }
    }

    fn save(self, path: &Path) -> Result<()> {
        let file = File::create(path)?;
        self.doc
            .save(&mut BufWriter::new(file))
            .map_err(pdf_error)
    }
}

/// Write a PDF with the report's KPIs and tables. `masker` hides amounts.
pub fn write_pdf(
    report: &MonthlyReport,
    path: &Path,
    generated_at: &str,
    masker: Option<&Masker>,
) -> Result<()> {
    let month = report.month.to_string();
    let cur = report.currency.as_str();
    let money = |amount: f64| format!("{:.2} {}", amount, cur);
    let pct = |value: f64| format!("{:.1}%", value);

    let mut pdf = PdfWriter::new(&format!("Monthly report {}", month), masker)?;

    pdf.text(MARGIN_X, 18.0, true, &format!("Monthly report {}", month));
    pdf.y -= 8.0;
    pdf.text(
        MARGIN_X,
        9.0,
        false,
        &format!("Sources: {}  |  Generated {}", report.source_summary(), generated_at),
    );
    pdf.y -= 10.0;

    let kpis = [
        ("Total income", report.kpis.total_income),
        ("Total expenses", report.kpis.total_expenses),
        ("Total invested", report.kpis.total_invested),
        ("Avg daily spend (excl. investments)", report.kpis.avg_daily_spend),
    ];
    for (label, value) in kpis {
        pdf.text(MARGIN_X, 11.0, false, label);
        pdf.text(120.0, 11.0, true, &money(value));
        pdf.y -= ROW + 1.0;
    }

    pdf.heading("Spending by category");
    let rows: Vec<Vec<String>> = report
        .categories
        .iter()
        .map(|c| {
            vec![
                c.category.clone(),
                money(c.amount),
                pct(c.percentage),
                c.transaction_count.to_string(),
            ]
        })
        .collect();
    pdf.table(CATEGORY_COLUMNS, &["Category", "Amount", "Share", "Count"], &rows);

    pdf.heading("Income sources");
    let rows: Vec<Vec<String>> = report
        .income_summary
        .iter()
        .map(|s| vec![s.source.clone(), money(s.amount), pct(s.percentage)])
        .collect();
    pdf.table(INCOME_COLUMNS, &["Source", "Amount", "Share"], &rows);

    pdf.heading("Top merchants");
    let rows: Vec<Vec<String>> = report
        .top_merchants
        .iter()
        .map(|m| {
            vec![
                m.merchant.clone(),
                money(m.total),
                m.transaction_count.to_string(),
            ]
        })
        .collect();
    pdf.table(MERCHANT_COLUMNS, &["Merchant", "Total", "Count"], &rows);

    pdf.heading("Miscellaneous transactions");
    let rows: Vec<Vec<String>> = report
        .misc
        .iter()
        .map(|m| {
            vec![
                m.date.format("%Y-%m-%d").to_string(),
                m.merchant.clone(),
                m.description.clone(),
                money(m.amount),
            ]
        })
        .collect();
    pdf.table(
        MISC_COLUMNS,
        &["Date", "Merchant", "Description", "Amount"],
        &rows,
    );

    pdf.save(path)
}
