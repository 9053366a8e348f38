//! Rule cascade that assigns categories
//!
//! Every transaction first gets the unknown category. Rules then run in a fixed
//! order and each one overwrites `category` on every record it matches, so the
//! last matching rule wins:
//!
//! 1. Investments (merchant keyword or IBAN, any sign)
//! 2. Employer groups, in config order (positive amounts)
//! 3. Students (positive multiples of N, or IBAN)
//! 4. Cash students (description keyword, positive amounts)
//! 5. Expense categories, in config order (negative amounts)

use std::collections::HashSet;

use tracing::debug;

use crate::config::{KeywordRule, RulesConfig};
use crate::models::{IncomeSource, Transaction};

pub const INVESTMENT: &str = "Investment";
pub const INCOME_PREFIX: &str = "Income";
pub const INCOME_EMPLOYER: &str = "Income:Employer";
pub const INCOME_STUDENTS: &str = "Income:Students";
pub const INCOME_STUDENTS_CASH: &str = "Income:Students:Cash";

/// Below this, the "Other" income bucket is treated as float noise
const OTHER_INCOME_EPSILON: f64 = 1e-9;

/// Amount sign a rule applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sign {
    Any,
    Positive,
    Negative,
}

impl Sign {
    fn admits(self, amount: f64) -> bool {
        match self {
            Self::Any => true,
            Self::Positive => amount > 0.0,
            Self::Negative => amount < 0.0,
        }
    }
}

/// Keywords are stored uppercased
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    /// Merchant contains any keyword, or IBAN is listed
    MerchantOrIban {
        keywords: Vec<String>,
        ibans: HashSet<String>,
    },
    /// Amount is a whole multiple, or IBAN is listed
    MultipleOrIban {
        multiple: Option<f64>,
        ibans: HashSet<String>,
    },
    DescriptionContains(String),
    /// Merchant or description contains any keyword
    MerchantOrDescription(Vec<String>),
}

fn contains_any(text: &str, keywords: &[String]) -> bool {
    if keywords.is_empty() {
        return false;
    }
    let upper = text.to_uppercase();
    keywords.iter().any(|k| upper.contains(k.as_str()))
}

fn upper_all(keywords: &[String]) -> Vec<String> {
    keywords.iter().map(|k| k.to_uppercase()).collect()
}

impl Predicate {
    fn matches(&self, tx: &Transaction) -> bool {
        match self {
            Self::MerchantOrIban { keywords, ibans } => {
                contains_any(&tx.merchant, keywords) || ibans.contains(&tx.iban)
            }
            Self::MultipleOrIban { multiple, ibans } => {
                multiple.is_some_and(|m| tx.amount % m == 0.0) || ibans.contains(&tx.iban)
            }
            Self::DescriptionContains(keyword) => tx.description.to_uppercase().contains(keyword),
            Self::MerchantOrDescription(keywords) => {
                contains_any(&tx.merchant, keywords) || contains_any(&tx.description, keywords)
            }
        }
    }
}

/// One step of the cascade
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub label: String,
    pub sign: Sign,
    pub predicate: Predicate,
}

impl Rule {
    pub fn matches(&self, tx: &Transaction) -> bool {
        self.sign.admits(tx.amount) && self.predicate.matches(tx)
    }

    fn keyword_or_iban(label: &str, sign: Sign, rule: &KeywordRule) -> Self {
        Self {
            label: label.to_string(),
            sign,
            predicate: Predicate::MerchantOrIban {
                keywords: upper_all(&rule.keywords),
                ibans: rule.ibans.iter().cloned().collect(),
            },
        }
    }
}

/// Compiled rule cascade
#[derive(Debug, Clone)]
pub struct Categorizer {
    unknown_category: String,
    rules: Vec<Rule>,
}

impl Categorizer {
    pub fn new(config: &RulesConfig) -> Self {
        let mut rules = Vec::new();

        if !config.investments.is_empty() {
            rules.push(Rule::keyword_or_iban(
                INVESTMENT,
                Sign::Any,
                &config.investments,
            ));
        }

        for employer in config.income.employers.iter().filter(|e| !e.is_empty()) {
            rules.push(Rule::keyword_or_iban(
                INCOME_EMPLOYER,
                Sign::Positive,
                employer,
            ));
        }

        let students = &config.income.students;
        let multiple = Some(students.multiples_of).filter(|m| m.is_finite() && *m > 0.0);
        if multiple.is_some() || !students.ibans.is_empty() {
            rules.push(Rule {
                label: INCOME_STUDENTS.to_string(),
                sign: Sign::Positive,
                predicate: Predicate::MultipleOrIban {
                    multiple,
                    ibans: students.ibans.iter().cloned().collect(),
                },
            });
        }

        let cash_keyword = config.income.cash_students_keyword.trim();
        if !cash_keyword.is_empty() {
            rules.push(Rule {
                label: INCOME_STUDENTS_CASH.to_string(),
                sign: Sign::Positive,
                predicate: Predicate::DescriptionContains(cash_keyword.to_uppercase()),
            });
        }

        for (label, keywords) in &config.categories {
            if keywords.is_empty() {
                continue;
            }
            rules.push(Rule {
                label: label.clone(),
                sign: Sign::Negative,
                predicate: Predicate::MerchantOrDescription(upper_all(keywords)),
            });
        }

        Self {
            unknown_category: config.unknown_category.clone(),
            rules,
        }
    }

    pub fn unknown_category(&self) -> &str {
        &self.unknown_category
    }

    /// Rules in evaluation order
    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// Assign the unknown category, then apply every rule in order
    pub fn categorize(&self, txns: &mut [Transaction]) {
        for tx in txns.iter_mut() {
            tx.category = self.unknown_category.clone();
        }

        for rule in &self.rules {
            let mut hits = 0usize;
            for tx in txns.iter_mut().filter(|tx| rule.matches(tx)) {
                tx.category = rule.label.clone();
                hits += 1;
            }
            debug!("Rule '{}' matched {} transactions", rule.label, hits);
        }
    }

    /// Category a single transaction would end up with
    pub fn category_for(&self, tx: &Transaction) -> &str {
        self.rules
            .iter()
            .rev()
            .find(|rule| rule.matches(tx))
            .map(|rule| rule.label.as_str())
            .unwrap_or(self.unknown_category.as_str())
    }
}

/// Positive amounts grouped into Employer, Students and Students:Cash, plus
/// "Other" for income outside the `Income` categories when it is non-zero
pub fn compute_income_sources(txns: &[Transaction]) -> Vec<IncomeSource> {
    let mut employer = 0.0_f64;
    let mut students = 0.0_f64;
    let mut cash = 0.0_f64;
    let mut other = 0.0_f64;

    for tx in txns.iter().filter(|tx| tx.is_income()) {
        match tx.category.as_str() {
            INCOME_EMPLOYER => employer += tx.amount,
            INCOME_STUDENTS => students += tx.amount,
            INCOME_STUDENTS_CASH => cash += tx.amount,
            c if !c.starts_with(INCOME_PREFIX) => other += tx.amount,
            _ => {}
        }
    }

    let mut sources = vec![
        IncomeSource {
            source: "Employer".to_string(),
            amount: employer,
        },
        IncomeSource {
            source: "Students".to_string(),
            amount: students,
        },
        IncomeSource {
            source: "Students:Cash".to_string(),
            amount: cash,
        },
    ];
    if other.abs() > OTHER_INCOME_EPSILON {
        sources.push(IncomeSource {
            source: "Other".to_string(),
            amount: other,
        });
    }
    sources
}
