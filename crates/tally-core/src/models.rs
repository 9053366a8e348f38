//! Domain models for Tally

use chrono::{Datelike, Months, NaiveDate};
use serde::{Deserialize, Serialize, Serializer};

use crate::error::{Error, Result};

/// Default currency when an export does not carry one
pub const DEFAULT_CURRENCY: &str = "EUR";

/// Category every record starts with before the rule cascade runs
pub const DEFAULT_UNKNOWN_CATEGORY: &str = "Miscellaneous";

/// Supported bank export formats
///
/// Variant order is the detection priority: on equal scores the earlier
/// variant wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Bank {
    Revolut,
    Swedbank,
}

impl Bank {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Revolut => "revolut",
            Self::Swedbank => "swedbank",
        }
    }

    /// Human-readable name used in reports and snapshots
    pub fn label(&self) -> &'static str {
        match self {
            Self::Revolut => "Revolut",
            Self::Swedbank => "Swedbank",
        }
    }

    pub fn all() -> &'static [Bank] {
        &[Self::Revolut, Self::Swedbank]
    }
}

impl std::str::FromStr for Bank {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "revolut" => Ok(Self::Revolut),
            "swedbank" | "swed" => Ok(Self::Swedbank),
            _ => Err(format!("Unknown bank: {}", s)),
        }
    }
}

impl std::fmt::Display for Bank {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// A normalized statement line, as produced by the bank normalizer.
///
/// `date` and `amount` are `None` when the source cell could not be parsed;
/// the cleaner drops such rows.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnifiedTransaction {
    pub date: Option<NaiveDate>,
    pub amount: Option<f64>,
    pub currency: String,
    pub description: String,
    pub merchant: String,
    pub iban: String,
    pub balance: Option<f64>,
    #[serde(rename = "type")]
    pub kind: String,
    pub bank: Bank,
}

/// A cleaned transaction with a category
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Transaction {
    pub date: NaiveDate,
    /// Positive = inflow, negative = outflow
    pub amount: f64,
    pub currency: String,
    pub description: String,
    pub merchant: String,
    pub iban: String,
    pub balance: Option<f64>,
    #[serde(rename = "type")]
    pub kind: String,
    pub bank: Bank,
    pub category: String,
}

impl Transaction {
    pub fn is_income(&self) -> bool {
        self.amount > 0.0
    }

    pub fn is_expense(&self) -> bool {
        self.amount < 0.0
    }
}

/// A calendar month selected with `YYYY-MM`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Month {
    first: NaiveDate,
    last: NaiveDate,
}

impl Month {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        let invalid = || Error::InvalidMonth(format!("{:04}-{:02}", year, month));
        let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
        let last = first
            .checked_add_months(Months::new(1))
            .and_then(|next| next.pred_opt())
            .ok_or_else(invalid)?;
        Ok(Self { first, last })
    }

    pub fn year(&self) -> i32 {
        self.first.year()
    }

    pub fn month(&self) -> u32 {
        self.first.month()
    }

    pub fn first_day(&self) -> NaiveDate {
        self.first
    }

    pub fn last_day(&self) -> NaiveDate {
        self.last
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.first && date <= self.last
    }

    pub fn num_days(&self) -> usize {
        self.last.day() as usize
    }

    /// Every calendar day of the month, in order
    pub fn days(&self) -> impl Iterator<Item = NaiveDate> {
        let last = self.last;
        self.first.iter_days().take_while(move |d| *d <= last)
    }
}

impl std::str::FromStr for Month {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let invalid = || Error::InvalidMonth(s.to_string());

        let (year, month) = trimmed.split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || !(1..=2).contains(&month.len()) {
            return Err(invalid());
        }
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let month: u32 = month.parse().map_err(|_| invalid())?;

        Self::new(year, month).map_err(|_| invalid())
    }
}

impl std::fmt::Display for Month {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.first.format("%Y-%m"))
    }
}

impl Serialize for Month {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

// =============================================================================
// Report models
// =============================================================================

/// Headline numbers for the month
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Kpis {
    pub total_income: f64,
    /// Sum of outflows, kept negative
    pub total_expenses: f64,
    /// Absolute amount moved into investments
    pub total_invested: f64,
    /// Mean daily outflow excluding investments, over every day of the month
    pub avg_daily_spend: f64,
}

/// Spending in one category
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategorySpending {
    pub category: String,
    /// Absolute sum of outflows
    pub amount: f64,
    pub percentage: f64,
    pub transaction_count: usize,
}

/// Income bucket total
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IncomeSource {
    pub source: String,
    pub amount: f64,
}

/// Income bucket with its share of all income
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct IncomeShare {
    pub source: String,
    pub amount: f64,
    pub percentage: f64,
}

/// An uncategorized outflow listed for review
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MiscTransaction {
    pub date: NaiveDate,
    pub merchant: String,
    pub description: String,
    /// Absolute amount
    pub amount: f64,
}

/// Outflows grouped by merchant
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MerchantSpending {
    pub merchant: String,
    /// Net signed sum
    pub total: f64,
    pub transaction_count: usize,
}

/// Absolute outflow on one day (investments excluded)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailySpend {
    pub date: NaiveDate,
    pub amount: f64,
}

/// Investment total per counterparty
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvestmentShare {
    pub label: String,
    pub amount: f64,
}

/// Number of records per source bank
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BankCount {
    pub bank: Bank,
    pub count: usize,
}

/// Everything the renderer needs for one month
#[derive(Debug, Clone, Serialize)]
pub struct MonthlyReport {
    pub month: Month,
    pub currency: String,
    pub kpis: Kpis,
    pub categories: Vec<CategorySpending>,
    pub income_sources: Vec<IncomeSource>,
    pub income_summary: Vec<IncomeShare>,
    pub misc: Vec<MiscTransaction>,
    pub top_merchants: Vec<MerchantSpending>,
    pub daily: Vec<DailySpend>,
    pub investments: Vec<InvestmentShare>,
    pub bank_counts: Vec<BankCount>,
}

impl MonthlyReport {
    /// One-line per-bank summary, e.g. "Revolut: 3 tx, Swedbank: 2 tx"
    pub fn source_summary(&self) -> String {
        if self.bank_counts.is_empty() {
            return "n/a".to_string();
        }
        self.bank_counts
            .iter()
            .map(|c| format!("{}: {} tx", c.bank, c.count))
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bank_from_str() {
        assert_eq!("Revolut".parse::<Bank>().unwrap(), Bank::Revolut);
        assert_eq!(" SWEDBANK ".parse::<Bank>().unwrap(), Bank::Swedbank);
        assert!("chase".parse::<Bank>().is_err());
    }

    #[test]
    fn test_bank_display_uses_label() {
        assert_eq!(Bank::Revolut.to_string(), "Revolut");
        assert_eq!(Bank::Swedbank.as_str(), "swedbank");
    }

    #[test]
    fn test_month_parse() {
        let month: Month = "2025-02".parse().unwrap();
        assert_eq!(month.year(), 2025);
        assert_eq!(month.month(), 2);
        assert_eq!(month.last_day(), NaiveDate::from_ymd_opt(2025, 2, 28).unwrap());
        assert_eq!(month.num_days(), 28);
        assert_eq!(month.to_string(), "2025-02");
    }

    #[test]
    fn test_month_parse_leap_year() {
        let month: Month = "2024-02".parse().unwrap();
        assert_eq!(month.num_days(), 29);
        assert_eq!(month.days().count(), 29);
    }

    #[test]
    fn test_month_parse_december() {
        let month: Month = "2025-12".parse().unwrap();
        assert_eq!(month.last_day(), NaiveDate::from_ymd_opt(2025, 12, 31).unwrap());
    }

    #[test]
    fn test_month_parse_invalid() {
        assert!("2025-13".parse::<Month>().is_err());
        assert!("2025".parse::<Month>().is_err());
        assert!("25-01".parse::<Month>().is_err());
        assert!("2025-01-01".parse::<Month>().is_err());
        assert!("abcd-01".parse::<Month>().is_err());
    }

    #[test]
    fn test_month_contains() {
        let month: Month = "2025-10".parse().unwrap();
        assert!(month.contains(NaiveDate::from_ymd_opt(2025, 10, 1).unwrap()));
        assert!(month.contains(NaiveDate::from_ymd_opt(2025, 10, 31).unwrap()));
        assert!(!month.contains(NaiveDate::from_ymd_opt(2025, 11, 1).unwrap()));
        assert!(!month.contains(NaiveDate::from_ymd_opt(2025, 9, 30).unwrap()));
    }
}
