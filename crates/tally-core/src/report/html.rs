//! HTML report document

use std::fmt::Write as _;

use crate::models::MonthlyReport;

/// Escape text for HTML and SVG content and attributes
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Chart file names, relative to the HTML file
#[derive(Debug, Clone)]
pub struct ChartFiles {
    pub expenses: String,
    pub income: String,
    pub investments: String,
    pub daily: String,
}

// No percentage units here: presentation masking would rewrite them
const STYLE: &str = "
body { font-family: Helvetica, Arial, sans-serif; margin: 32px auto; max-width: 1040px; color: #222; }
h1 { margin-bottom: 4px; }
.meta { color: #666; font-size: 13px; }
.kpis { display: flex; gap: 16px; margin: 24px 0; }
.kpi { flex: 1; border: 1px solid #ddd; border-radius: 6px; padding: 12px 16px; }
.kpi .label { color: #666; font-size: 12px; text-transform: uppercase; }
.kpi .value { font-size: 22px; font-weight: bold; margin-top: 4px; }
table { border-collapse: collapse; margin: 8px 0 24px; min-width: 480px; }
th, td { border-bottom: 1px solid #eee; padding: 6px 10px; text-align: left; font-size: 14px; }
td.num, th.num { text-align: right; }
.charts img { display: block; max-width: 960px; margin: 12px 0; }
.badge { background: #333; color: #fff; border-radius: 4px; padding: 2px 8px; font-size: 12px; }
";

fn money(amount: f64, currency: &str) -> String {
    format!("{:.2} {}", amount, escape_html(currency))
}

fn percent(value: f64) -> String {
    format!("{:.1}%", value)
}

fn kpi(out: &mut String, label: &str, value: &str) {
    let _ = write!(
        out,
        "<div class=\"kpi\"><div class=\"label\">{}</div><div class=\"value\">{}</div></div>",
        escape_html(label),
        value
    );
}

/// Table with a header row; `numeric` marks right-aligned columns.
/// Cells are inserted as given and must already be escaped.
fn table(out: &mut String, headers: &[&str], numeric: &[bool], rows: &[Vec<String>], empty: &str) {
    if rows.is_empty() {
        let _ = writeln!(out, "<p class=\"meta\">{}</p>", escape_html(empty));
        return;
    }

    out.push_str("<table>\n<tr>");
    for (i, h) in headers.iter().enumerate() {
        let class = if numeric.get(i).copied().unwrap_or(false) {
            " class=\"num\""
        } else {
            ""
        };
        let _ = write!(out, "<th{}>{}</th>", class, escape_html(h));
    }
    out.push_str("</tr>\n");

    for row in rows {
        out.push_str("<tr>");
        for (i, cell) in row.iter().enumerate() {
            let class = if numeric.get(i).copied().unwrap_or(false) {
                " class=\"num\""
            } else {
                ""
            };
            let _ = write!(out, "<td{}>{}</td>", class, cell);
        }
        out.push_str("</tr>\n");
    }
    out.push_str("</table>\n");
}

/// Render the full report page
pub fn render_html(
    report: &MonthlyReport,
    charts: &ChartFiles,
    presentation: bool,
    generated_at: &str,
) -> String {
    let cur = report.currency.as_str();
    let month = report.month.to_string();
    let mut out = String::new();

    let _ = write!(
        out,
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>Monthly report {}</title>\n<style>{}</style>\n</head>\n<body>\n",
        month, STYLE
    );
    let _ = writeln!(out, "<h1>Monthly report {}</h1>", month);
    let _ = write!(
        out,
        "<p class=\"meta\">Sources: {} &middot; Generated {}",
        escape_html(&report.source_summary()),
        escape_html(generated_at)
    );
    if presentation {
        out.push_str(" <span class=\"badge\">Presentation mode</span>");
    }
    out.push_str("</p>\n");

    // Headline numbers
    out.push_str("<div class=\"kpis\">");
    kpi(&mut out, "Total income", &money(report.kpis.total_income, cur));
    kpi(&mut out, "Total expenses", &money(report.kpis.total_expenses, cur));
    kpi(&mut out, "Total invested", &money(report.kpis.total_invested, cur));
    kpi(
        &mut out,
        "Avg daily spend (excl. investments)",
        &money(report.kpis.avg_daily_spend, cur),
    );
    out.push_str("</div>\n");

    out.push_str("<h2>Spending by category</h2>\n");
    let rows: Vec<Vec<String>> = report
        .categories
        .iter()
        .map(|c| {
            vec![
                escape_html(&c.category),
                money(c.amount, cur),
                percent(c.percentage),
                c.transaction_count.to_string(),
            ]
        })
        .collect();
    table(
        &mut out,
        &["Category", "Amount", "Share", "Transactions"],
        &[false, true, true, true],
        &rows,
        "No expenses this month.",
    );

    out.push_str("<h2>Income sources</h2>\n");
    let rows: Vec<Vec<String>> = report
        .income_summary
        .iter()
        .map(|s| {
            vec![
                escape_html(&s.source),
                money(s.amount, cur),
                percent(s.percentage),
            ]
        })
        .collect();
    table(
        &mut out,
        &["Source", "Amount", "Share"],
        &[false, true, true],
        &rows,
        "No income this month.",
    );

    out.push_str("<div class=\"charts\">\n");
    for (src, alt) in [
        (&charts.expenses, "Expenses by category"),
        (&charts.income, "Income by source"),
        (&charts.investments, "Investments"),
        (&charts.daily, "Daily spending"),
    ] {
        let _ = writeln!(
            out,
            "<img src=\"{}\" alt=\"{}\">",
            escape_html(src),
            escape_html(alt)
        );
    }
    out.push_str("</div>\n");

    out.push_str("<h2>Top merchants</h2>\n");
    let rows: Vec<Vec<String>> = report
        .top_merchants
        .iter()
        .map(|m| {
            vec![
                escape_html(&m.merchant),
                money(m.total, cur),
                m.transaction_count.to_string(),
            ]
        })
        .collect();
    table(
        &mut out,
        &["Merchant", "Total", "Transactions"],
        &[false, true, true],
        &rows,
        "No merchant spending this month.",
    );

    out.push_str("<h2>Miscellaneous transactions</h2>\n");
    let rows: Vec<Vec<String>> = report
        .misc
        .iter()
        .map(|m| {
            vec![
                m.date.format("%Y-%m-%d").to_string(),
                escape_html(&m.merchant),
                escape_html(&m.description),
                money(m.amount, cur),
            ]
        })
        .collect();
    table(
        &mut out,
        &["Date", "Merchant", "Description", "Amount"],
        &[false, false, false, true],
        &rows,
        "Nothing uncategorized.",
    );

    out.push_str("</body>\n</html>\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::models::{Bank, Month, Transaction};
    use crate::reports::build_monthly_report;
    use chrono::NaiveDate;

    fn report() -> MonthlyReport {
        let tx = |day: u32, amount: f64, merchant: &str, category: &str| Transaction {
            date: NaiveDate::from_ymd_opt(2025, 10, day).unwrap(),
            amount,
            currency: "EUR".to_string(),
            description: String::new(),
            merchant: merchant.to_string(),
            iban: String::new(),
            balance: None,
            kind: String::new(),
            bank: Bank::Revolut,
            category: category.to_string(),
        };
        let txns = vec![
            tx(1, 1000.0, "ACME", "Income:Employer"),
            tx(2, -42.5, "Cafe <Rio>", "Miscellaneous"),
        ];
        let month: Month = "2025-10".parse().unwrap();
        build_monthly_report(&txns, month, &Config::default())
    }

    fn charts() -> ChartFiles {
        ChartFiles {
            expenses: "2025-10_expenses_pie.svg".into(),
            income: "2025-10_income_pie.svg".into(),
            investments: "2025-10_investment_pie.svg".into(),
            daily: "2025-10_daily_spending.svg".into(),
        }
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("a & b <c> \"d\""), "a &amp; b &lt;c&gt; &quot;d&quot;");
    }

    #[test]
    fn test_render_contains_sections() {
        let html = render_html(&report(), &charts(), false, "2025-11-01 09:00");
        assert!(html.contains("Monthly report 2025-10"));
        assert!(html.contains("1000.00 EUR"));
        assert!(html.contains("42.50 EUR"));
        assert!(html.contains("100.0%"));
        assert!(html.contains("Cafe &lt;Rio&gt;"));
        assert!(html.contains("src=\"2025-10_daily_spending.svg\""));
        assert!(html.contains("Sources: Revolut: 2 tx"));
        assert!(!html.contains("Presentation mode"));
    }

    #[test]
    fn test_style_has_no_percent_units() {
        assert!(!STYLE.contains('%'));
    }
}
