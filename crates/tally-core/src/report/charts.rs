//! SVG charts for the monthly report

use std::f64::consts::PI;
use std::fmt::Write as _;

use super::html::escape_html;
use crate::models::{DailySpend, MonthlyReport};

const PALETTE: &[&str] = &[
    "#4e79a7", "#f28e2b", "#e15759", "#76b7b2", "#59a14f", "#edc948", "#b07aa1", "#ff9da7",
    "#9c755f", "#bab0ac",
];

const PIE_WIDTH: f64 = 640.0;
const PIE_RADIUS: f64 = 130.0;
const PIE_CX: f64 = 160.0;
const PIE_CY: f64 = 190.0;
const LEGEND_X: f64 = 320.0;
const LEGEND_ROW: f64 = 22.0;

const BAR_WIDTH: f64 = 960.0;
const BAR_HEIGHT: f64 = 300.0;
const BAR_LEFT: f64 = 70.0;
const BAR_RIGHT: f64 = 20.0;
const BAR_TOP: f64 = 40.0;
const BAR_BOTTOM: f64 = 50.0;

fn color(i: usize) -> &'static str {
    PALETTE[i % PALETTE.len()]
}

fn svg_open(out: &mut String, width: f64, height: f64) {
    let _ = write!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{w:.0}" height="{h:.0}" viewBox="0 0 {w:.0} {h:.0}" font-family="Helvetica, Arial, sans-serif">"#,
        w = width,
        h = height
    );
    let _ = write!(
        out,
        r##"<rect width="{:.0}" height="{:.0}" fill="#ffffff"/>"##,
        width, height
    );
}

fn title(out: &mut String, x: f64, text: &str) {
    let _ = write!(
        out,
        r#"<text x="{:.1}" y="24" font-size="16" font-weight="bold" text-anchor="middle">{}</text>"#,
        x,
        escape_html(text)
    );
}

/// Titled empty chart
fn placeholder(width: f64, height: f64, text: &str) -> String {
    let mut out = String::new();
    svg_open(&mut out, width, height);
    title(&mut out, width / 2.0, text);
    out.push_str("</svg>\n");
    out
}

/// Pie chart with a legend; `hide_values` keeps only the labels
pub fn pie_chart(
    chart_title: &str,
    empty_title: &str,
    slices: &[(String, f64)],
    currency: &str,
    hide_values: bool,
) -> String {
    let slices: Vec<&(String, f64)> = slices
        .iter()
        .filter(|(_, v)| v.is_finite() && *v > 0.0)
        .collect();
    let total: f64 = slices.iter().map(|(_, v)| v).sum();
    let height = (PIE_CY + PIE_RADIUS + 20.0).max(60.0 + slices.len() as f64 * LEGEND_ROW);
    if slices.is_empty() || total <= 0.0 {
        return placeholder(PIE_WIDTH, 120.0, empty_title);
    }

    let mut out = String::new();
    svg_open(&mut out, PIE_WIDTH, height);
    title(&mut out, PIE_WIDTH / 2.0, chart_title);

    if slices.len() == 1 {
        let _ = write!(
            out,
            r#"<circle cx="{:.2}" cy="{:.2}" r="{:.2}" fill="{}"/>"#,
            PIE_CX,
            PIE_CY,
            PIE_RADIUS,
            color(0)
        );
    } else {
        // Start at twelve o'clock, clockwise
        let mut angle = -PI / 2.0;
        for (i, (_, value)) in slices.iter().enumerate() {
            let sweep = value / total * 2.0 * PI;
            let (x0, y0) = (
                PIE_CX + PIE_RADIUS * angle.cos(),
                PIE_CY + PIE_RADIUS * angle.sin(),
            );
            let end = angle + sweep;
            let (x1, y1) = (
                PIE_CX + PIE_RADIUS * end.cos(),
                PIE_CY + PIE_RADIUS * end.sin(),
            );
            let large_arc = if sweep > PI { 1 } else { 0 };
            let _ = write!(
                out,
                r##"<path d="M {cx:.2} {cy:.2} L {x0:.2} {y0:.2} A {r:.2} {r:.2} 0 {large_arc} 1 {x1:.2} {y1:.2} Z" fill="{fill}" stroke="#ffffff" stroke-width="1"/>"##,
                cx = PIE_CX,
                cy = PIE_CY,
                r = PIE_RADIUS,
                fill = color(i),
            );
            angle = end;
        }
    }

    for (i, (label, value)) in slices.iter().enumerate() {
        let y = 60.0 + i as f64 * LEGEND_ROW;
        let text = if hide_values {
            label.clone()
        } else {
            format!(
                "{}: {:.2} {} ({:.1}%)",
                label,
                value,
                currency,
                value / total * 100.0
            )
        };
        let _ = write!(
            out,
            r#"<rect x="{:.1}" y="{:.1}" width="14" height="14" fill="{}"/><text x="{:.1}" y="{:.1}" font-size="13">{}</text>"#,
            LEGEND_X,
            y - 11.0,
            color(i),
            LEGEND_X + 20.0,
            y,
            escape_html(&text)
        );
    }

    out.push_str("</svg>\n");
    out
}

/// Bar per day of the month; `hide_values` drops the y-axis numbers
pub fn daily_bar_chart(chart_title: &str, daily: &[DailySpend], currency: &str, hide_values: bool) -> String {
    let max = daily.iter().map(|d| d.amount).fold(0.0_f64, f64::max);
    if daily.is_empty() || max <= 0.0 {
        return placeholder(
            BAR_WIDTH,
            120.0,
            "No daily spending data (excl. investments)",
        );
    }

    let plot_w = BAR_WIDTH - BAR_LEFT - BAR_RIGHT;
    let plot_h = BAR_HEIGHT - BAR_TOP - BAR_BOTTOM;
    let baseline = BAR_TOP + plot_h;
    let slot = plot_w / daily.len() as f64;
    let bar_w = (slot * 0.7).max(1.0);

    let mut out = String::new();
    svg_open(&mut out, BAR_WIDTH, BAR_HEIGHT);
    title(&mut out, BAR_WIDTH / 2.0, chart_title);

    // Axes
    let _ = write!(
        out,
        r##"<line x1="{l:.1}" y1="{t:.1}" x2="{l:.1}" y2="{b:.1}" stroke="#333333"/><line x1="{l:.1}" y1="{b:.1}" x2="{r:.1}" y2="{b:.1}" stroke="#333333"/>"##,
        l = BAR_LEFT,
        t = BAR_TOP,
        b = baseline,
        r = BAR_WIDTH - BAR_RIGHT,
    );

    if !hide_values {
        for step in 0..=4 {
            let value = max * step as f64 / 4.0;
            let y = baseline - plot_h * step as f64 / 4.0;
            let _ = write!(
                out,
                r##"<line x1="{:.1}" y1="{y:.1}" x2="{:.1}" y2="{y:.1}" stroke="#dddddd"/><text x="{:.1}" y="{:.1}" font-size="11" text-anchor="end">{:.0}</text>"##,
                BAR_LEFT,
                BAR_WIDTH - BAR_RIGHT,
                BAR_LEFT - 6.0,
                y + 4.0,
                value,
                y = y,
            );
        }
        let _ = write!(
            out,
            r#"<text x="16" y="{:.1}" font-size="12" text-anchor="middle" transform="rotate(-90 16 {:.1})">{} spent</text>"#,
            BAR_TOP + plot_h / 2.0,
            BAR_TOP + plot_h / 2.0,
            escape_html(currency)
        );
    }

    for (i, day) in daily.iter().enumerate() {
        let x = BAR_LEFT + slot * i as f64 + (slot - bar_w) / 2.0;
        let h = day.amount / max * plot_h;
        let _ = write!(
            out,
            r#"<rect x="{:.2}" y="{:.2}" width="{:.2}" height="{:.2}" fill="{}"/>"#,
            x,
            baseline - h,
            bar_w,
            h,
            color(0)
        );
        let _ = write!(
            out,
            r#"<text x="{:.2}" y="{:.1}" font-size="10" text-anchor="middle">{}</text>"#,
            x + bar_w / 2.0,
            baseline + 14.0,
            day.date.format("%-d")
        );
    }

    let _ = write!(
        out,
        r#"<text x="{:.1}" y="{:.1}" font-size="12" text-anchor="middle">Day of month</text>"#,
        BAR_LEFT + plot_w / 2.0,
        BAR_HEIGHT - 10.0
    );

    out.push_str("</svg>\n");
    out
}

/// The four report charts, as SVG documents
#[derive(Debug, Clone)]
pub struct ChartSet {
    pub expenses: String,
    pub income: String,
    pub investments: String,
    pub daily: String,
}

pub fn build_charts(report: &MonthlyReport, hide_values: bool) -> ChartSet {
    let month = report.month.to_string();
    let currency = report.currency.as_str();

    let expenses: Vec<(String, f64)> = report
        .categories
        .iter()
        .map(|c| (c.category.clone(), c.amount))
        .collect();
    let income: Vec<(String, f64)> = report
        .income_summary
        .iter()
        .map(|s| (s.source.clone(), s.amount))
        .collect();
    let investments: Vec<(String, f64)> = report
        .investments
        .iter()
        .map(|s| (s.label.clone(), s.amount))
        .collect();

    ChartSet {
        expenses: pie_chart(
            &format!("Expenses by Category ({})", month),
            "No expenses",
            &expenses,
            currency,
            hide_values,
        ),
        income: pie_chart(
            &format!("Income by Source ({})", month),
            "No income",
            &income,
            currency,
            hide_values,
        ),
        investments: pie_chart(
            &format!("Investments ({})", month),
            "No investments",
            &investments,
            currency,
            hide_values,
        ),
        daily: daily_bar_chart(
            &format!("Daily spending, excl. investments ({})", month),
            &report.daily,
            currency,
            hide_values,
        ),
    }
}
