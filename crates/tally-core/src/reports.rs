//! Monthly KPIs and report tables

use std::collections::{BTreeMap, HashMap};

use chrono::NaiveDate;

use crate::categorize::{
    compute_income_sources, INCOME_EMPLOYER, INCOME_STUDENTS, INCOME_STUDENTS_CASH, INVESTMENT,
};
use crate::config::Config;
use crate::models::*;

/// Below this a bucket counts as empty
const ZERO_EPSILON: f64 = 1e-9;

fn is_investment(tx: &Transaction) -> bool {
    tx.category == INVESTMENT
}

/// Headline totals for the month
pub fn compute_kpis(txns: &[Transaction], month: &Month) -> Kpis {
    let total_income = txns.iter().filter(|t| t.is_income()).map(|t| t.amount).sum();
    let total_expenses = txns.iter().filter(|t| t.is_expense()).map(|t| t.amount).sum();
    let invested: f64 = txns
        .iter()
        .filter(|t| is_investment(t))
        .map(|t| t.amount)
        .sum();

    let daily = daily_spending(txns, month);
    let avg_daily_spend = if daily.is_empty() {
        0.0
    } else {
        daily.iter().map(|d| d.amount).sum::<f64>() / daily.len() as f64
    };

    Kpis {
        total_income,
        total_expenses,
        total_invested: invested.abs(),
        avg_daily_spend,
    }
}

/// Outflows per category: absolute sum, share of all outflows and count,
/// largest first
pub fn expense_category_summary(txns: &[Transaction]) -> Vec<CategorySpending> {
    let mut groups: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for tx in txns.iter().filter(|t| t.is_expense()) {
        let entry = groups.entry(tx.category.as_str()).or_insert((0.0, 0));
        entry.0 += tx.amount;
        entry.1 += 1;
    }

    let total: f64 = groups.values().map(|(sum, _)| sum.abs()).sum();
    let mut rows: Vec<CategorySpending> = groups
        .into_iter()
        .map(|(category, (sum, count))| CategorySpending {
            category: category.to_string(),
            amount: sum.abs(),
            percentage: if total > 0.0 {
                sum.abs() / total * 100.0
            } else {
                0.0
            },
            transaction_count: count,
        })
        .collect();
    rows.sort_by(|a, b| b.amount.total_cmp(&a.amount));
    rows
}

/// Reporting bucket for an inflow's category
pub fn income_bucket(category: &str) -> &'static str {
    match category {
        INCOME_EMPLOYER => "Employer",
        INCOME_STUDENTS => "Students",
        INCOME_STUDENTS_CASH => "Students:Cash",
        _ => "Other",
    }
}

/// Inflows per bucket with share of all inflows. Empty buckets are dropped,
/// largest first.
pub fn income_source_summary(txns: &[Transaction]) -> Vec<IncomeShare> {
    let mut totals: Vec<(&str, f64)> = vec![
        ("Employer", 0.0),
        ("Students", 0.0),
        ("Students:Cash", 0.0),
        ("Other", 0.0),
    ];
    for tx in txns.iter().filter(|t| t.is_income()) {
        let bucket = income_bucket(&tx.category);
        if let Some(slot) = totals.iter_mut().find(|(name, _)| *name == bucket) {
            slot.1 += tx.amount;
        }
    }

    let grand: f64 = totals.iter().map(|(_, v)| v).sum();
    let mut rows: Vec<IncomeShare> = totals
        .into_iter()
        .filter(|(_, v)| v.abs() >= ZERO_EPSILON)
        .map(|(source, amount)| IncomeShare {
            source: source.to_string(),
            amount,
            percentage: if grand != 0.0 {
                amount / grand * 100.0
            } else {
                0.0
            },
        })
        .collect();
    rows.sort_by(|a, b| b.amount.total_cmp(&a.amount));
    rows
}

/// Uncategorized outflows, largest first, capped at `limit`
pub fn misc_details(txns: &[Transaction], unknown_label: &str, limit: usize) -> Vec<MiscTransaction> {
    let mut misc: Vec<&Transaction> = txns
        .iter()
        .filter(|t| t.is_expense() && t.category == unknown_label)
        .collect();
    misc.sort_by(|a, b| a.amount.total_cmp(&b.amount));

    misc.into_iter()
        .take(limit)
        .map(|t| MiscTransaction {
            date: t.date,
            merchant: t.merchant.clone(),
            description: t.description.clone(),
            amount: t.amount.abs(),
        })
        .collect()
}

/// Outflows grouped by merchant, by absolute total, capped at `limit`
pub fn top_merchants(txns: &[Transaction], limit: usize) -> Vec<MerchantSpending> {
    let mut groups: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
    for tx in txns.iter().filter(|t| t.is_expense()) {
        let entry = groups.entry(tx.merchant.as_str()).or_insert((0.0, 0));
        entry.0 += tx.amount;
        entry.1 += 1;
    }

    let mut rows: Vec<MerchantSpending> = groups
        .into_iter()
        .map(|(merchant, (total, count))| MerchantSpending {
            merchant: merchant.to_string(),
            total,
            transaction_count: count,
        })
        .collect();
    rows.sort_by(|a, b| b.total.abs().total_cmp(&a.total.abs()));
    rows.truncate(limit);
    rows
}

/// Absolute non-investment outflow for every day of the month, zero-filled
pub fn daily_spending(txns: &[Transaction], month: &Month) -> Vec<DailySpend> {
    let mut by_day: HashMap<NaiveDate, f64> = HashMap::new();
    for tx in txns
        .iter()
        .filter(|t| t.is_expense() && !is_investment(t) && month.contains(t.date))
    {
        *by_day.entry(tx.date).or_insert(0.0) += tx.amount;
    }

    month
        .days()
        .map(|date| DailySpend {
            date,
            amount: by_day.get(&date).copied().unwrap_or(0.0).abs(),
        })
        .collect()
}

/// Investment rows per counterparty (merchant, else description), largest first
pub fn investment_breakdown(txns: &[Transaction]) -> Vec<InvestmentShare> {
    let mut groups: BTreeMap<&str, f64> = BTreeMap::new();
    for tx in txns.iter().filter(|t| is_investment(t)) {
        let label = if tx.merchant.trim().is_empty() {
            tx.description.as_str()
        } else {
            tx.merchant.as_str()
        };
        *groups.entry(label).or_insert(0.0) += tx.amount;
    }

    let mut rows: Vec<InvestmentShare> = groups
        .into_iter()
        .map(|(label, sum)| InvestmentShare {
            label: label.to_string(),
            amount: sum.abs(),
        })
        .collect();
    rows.sort_by(|a, b| b.amount.total_cmp(&a.amount));
    rows
}

/// Records per source bank, in bank order
pub fn bank_counts(txns: &[Transaction]) -> Vec<BankCount> {
    let mut counts: BTreeMap<Bank, usize> = BTreeMap::new();
    for tx in txns {
        *counts.entry(tx.bank).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .map(|(bank, count)| BankCount { bank, count })
        .collect()
}

/// Assemble every table for the month
pub fn build_monthly_report(txns: &[Transaction], month: Month, config: &Config) -> MonthlyReport {
    MonthlyReport {
        month,
        currency: config.report.currency.clone(),
        kpis: compute_kpis(txns, &month),
        categories: expense_category_summary(txns),
        income_sources: compute_income_sources(txns),
        income_summary: income_source_summary(txns),
        misc: misc_details(txns, &config.rules.unknown_category, config.report.misc_limit),
        top_merchants: top_merchants(txns, config.report.top_merchants),
        daily: daily_spending(txns, &month),
        investments: investment_breakdown(txns),
        bank_counts: bank_counts(txns),
    }
}
