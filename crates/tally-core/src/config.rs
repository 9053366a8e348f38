//! Rules configuration
//!
//! The YAML document is parsed into raw structs where every field is optional,
//! then resolved onto defaults. A missing section means "use the defaults",
//! an empty document is a valid (all-defaults) config.
//!
//! ```yaml
//! unknown_category: Miscellaneous
//! investments: { keywords: [BROKER], ibans: [] }
//! income:
//!   employers: [{ keywords: [ACME], ibans: [] }]
//!   students: { multiples_of: 20, ibans: [] }
//!   cash_students: { keyword: CASH }
//! categories:
//!   Groceries: [MAXIMA, RIMI]
//! report: { misc_limit: 50, top_merchants: 15, currency: EUR }
//! ```

use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_yaml::{Mapping, Value};
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{DEFAULT_CURRENCY, DEFAULT_UNKNOWN_CATEGORY};

pub const DEFAULT_STUDENT_MULTIPLE: f64 = 20.0;
pub const DEFAULT_MISC_LIMIT: usize = 50;
pub const DEFAULT_TOP_MERCHANTS: usize = 15;

/// Keywords matched against text, plus exact counterparty IBANs
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KeywordRule {
    pub keywords: Vec<String>,
    pub ibans: Vec<String>,
}

impl KeywordRule {
    pub fn is_empty(&self) -> bool {
        self.keywords.is_empty() && self.ibans.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StudentsConfig {
    /// Positive amounts divisible by this count as student income
    pub multiples_of: f64,
    pub ibans: Vec<String>,
}

impl Default for StudentsConfig {
    fn default() -> Self {
        Self {
            multiples_of: DEFAULT_STUDENT_MULTIPLE,
            ibans: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct IncomeConfig {
    /// Applied in order, later groups overwrite earlier ones
    pub employers: Vec<KeywordRule>,
    pub students: StudentsConfig,
    /// Empty means the cash rule is disabled
    pub cash_students_keyword: String,
}

/// Everything the categorization cascade reads
#[derive(Debug, Clone, PartialEq)]
pub struct RulesConfig {
    pub unknown_category: String,
    pub investments: KeywordRule,
    pub income: IncomeConfig,
    /// Category label to keywords, in document order
    pub categories: Vec<(String, Vec<String>)>,
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            unknown_category: DEFAULT_UNKNOWN_CATEGORY.to_string(),
            investments: KeywordRule::default(),
            income: IncomeConfig::default(),
            categories: Vec::new(),
        }
    }
}

/// Knobs for the rendered report
#[derive(Debug, Clone, PartialEq)]
pub struct ReportSettings {
    pub misc_limit: usize,
    pub top_merchants: usize,
    /// Unit shown next to amounts
    pub currency: String,
}

impl Default for ReportSettings {
    fn default() -> Self {
        Self {
            misc_limit: DEFAULT_MISC_LIMIT,
            top_merchants: DEFAULT_TOP_MERCHANTS,
            currency: DEFAULT_CURRENCY.to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub rules: RulesConfig,
    pub report: ReportSettings,
}

impl Config {
    /// Load from a YAML file. A missing or unreadable file is a config error.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Failed to read config {}: {}", path.display(), e))
        })?;
        let config = Self::from_yaml_str(&content)?;
        debug!(
            "Loaded config from {} ({} categories, {} employer groups)",
            path.display(),
            config.rules.categories.len(),
            config.rules.income.employers.len()
        );
        Ok(config)
    }

    pub fn from_yaml_str(content: &str) -> Result<Self> {
        let value: Value = serde_yaml::from_str(content)
            .map_err(|e| Error::Config(format!("Invalid config YAML: {}", e)))?;
        if value.is_null() {
            return Ok(Self::default());
        }

        let raw: RawConfig = serde_yaml::from_value(value)
            .map_err(|e| Error::Config(format!("Invalid config YAML: {}", e)))?;
        resolve(raw)
    }
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    unknown_category: Option<String>,
    investments: Option<RawKeywordRule>,
    income: Option<RawIncome>,
    categories: Option<Mapping>,
    report: Option<RawReport>,
}

#[derive(Debug, Deserialize)]
struct RawKeywordRule {
    keywords: Option<Vec<String>>,
    ibans: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct RawIncome {
    employers: Option<Vec<RawKeywordRule>>,
    students: Option<RawStudents>,
    cash_students: Option<RawCashStudents>,
}

#[derive(Debug, Deserialize)]
struct RawStudents {
    multiples_of: Option<f64>,
    ibans: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct RawCashStudents {
    keyword: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawReport {
    misc_limit: Option<usize>,
    top_merchants: Option<usize>,
    currency: Option<String>,
}

/// Drop blank entries; an empty keyword would match every record
fn clean_list(items: Option<Vec<String>>) -> Vec<String> {
    items
        .unwrap_or_default()
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

impl From<RawKeywordRule> for KeywordRule {
    fn from(raw: RawKeywordRule) -> Self {
        Self {
            keywords: clean_list(raw.keywords),
            ibans: clean_list(raw.ibans),
        }
    }
}

fn resolve(raw: RawConfig) -> Result<Config> {
    let mut config = Config::default();

    if let Some(label) = raw.unknown_category.filter(|s| !s.trim().is_empty()) {
        config.rules.unknown_category = label;
    }

    if let Some(investments) = raw.investments {
        config.rules.investments = investments.into();
    }

    if let Some(income) = raw.income {
        if let Some(employers) = income.employers {
            config.rules.income.employers = employers.into_iter().map(Into::into).collect();
        }
        if let Some(students) = income.students {
            if let Some(multiple) = students.multiples_of {
                config.rules.income.students.multiples_of = multiple;
            }
            config.rules.income.students.ibans = clean_list(students.ibans);
        }
        if let Some(keyword) = income.cash_students.and_then(|c| c.keyword) {
            config.rules.income.cash_students_keyword = keyword.trim().to_string();
        }
    }

    if let Some(categories) = raw.categories {
        config.rules.categories = resolve_categories(categories)?;
    }

    if let Some(report) = raw.report {
        if let Some(limit) = report.misc_limit {
            config.report.misc_limit = limit;
        }
        if let Some(limit) = report.top_merchants {
            config.report.top_merchants = limit;
        }
        if let Some(currency) = report.currency.filter(|s| !s.trim().is_empty()) {
            config.report.currency = currency;
        }
    }

    Ok(config)
}

/// Keep the mapping's document order; later labels overwrite earlier matches
fn resolve_categories(mapping: Mapping) -> Result<Vec<(String, Vec<String>)>> {
    let mut categories = Vec::with_capacity(mapping.len());
    for (key, value) in mapping {
        let label = match key {
            Value::String(s) => s,
            other => {
                return Err(Error::Config(format!(
                    "Category name must be a string, got {:?}",
                    other
                )))
            }
        };
        let keywords: Option<Vec<String>> = serde_yaml::from_value(value).map_err(|e| {
            Error::Config(format!("Invalid keywords for category '{}': {}", label, e))
        })?;
        categories.push((label, clean_list(keywords)));
    }
    Ok(categories)
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXAMPLE_CONFIG: &str = include_str!("../../../config.example.yaml");

    #[test]
    fn test_parse_example_config() {
        let config = Config::from_yaml_str(EXAMPLE_CONFIG).unwrap();
        assert_eq!(config.rules.unknown_category, "Miscellaneous");
        assert_eq!(config.rules.income.employers.len(), 1);
        assert_eq!(config.rules.income.cash_students_keyword, "CASH DEPOSIT");
        assert_eq!(config.rules.categories[0].0, "Groceries");
        assert_eq!(config.report.misc_limit, 50);
    }

    #[test]
    fn test_empty_document_is_defaults() {
        assert_eq!(Config::from_yaml_str("").unwrap(), Config::default());
        assert_eq!(Config::from_yaml_str("# nothing\n").unwrap(), Config::default());
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_yaml_str("unknown_category: Other\n").unwrap();
        assert_eq!(config.rules.unknown_category, "Other");
        assert_eq!(config.rules.income.students.multiples_of, 20.0);
        assert!(config.rules.investments.is_empty());
        assert!(config.rules.categories.is_empty());
        assert_eq!(config.report.top_merchants, 15);
        assert_eq!(config.report.currency, "EUR");
    }

    #[test]
    fn test_categories_keep_document_order() {
        let yaml = "categories:\n  Zoo: [ZOO]\n  Alpha: [A]\n  Mid: [M, '']\n  Empty:\n";
        let config = Config::from_yaml_str(yaml).unwrap();
        let labels: Vec<&str> = config
            .rules
            .categories
            .iter()
            .map(|(l, _)| l.as_str())
            .collect();
        assert_eq!(labels, vec!["Zoo", "Alpha", "Mid", "Empty"]);
        // Blank keyword dropped
        assert_eq!(config.rules.categories[2].1, vec!["M"]);
        assert!(config.rules.categories[3].1.is_empty());
    }

    #[test]
    fn test_integer_multiple() {
        let yaml = "income:\n  students:\n    multiples_of: 25\n    ibans: [LT-STUDENT]\n";
        let config = Config::from_yaml_str(yaml).unwrap();
        assert_eq!(config.rules.income.students.multiples_of, 25.0);
        assert_eq!(config.rules.income.students.ibans, vec!["LT-STUDENT"]);
    }

    #[test]
    fn test_invalid_yaml_is_config_error() {
        assert!(matches!(
            Config::from_yaml_str("categories: [unclosed"),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            Config::from_yaml_str("categories:\n  Food: 12\n"),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_load_missing_file() {
        let result = Config::load(Path::new("/nonexistent/config.yaml"));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(&path, "report:\n  misc_limit: 5\n").unwrap();
        let config = Config::load(&path).unwrap();
        assert_eq!(config.report.misc_limit, 5);
    }
}
