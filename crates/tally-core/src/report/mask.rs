//! Presentation-mode masking of amounts and percentages

use regex::{Captures, Regex};

use crate::error::Result;
use crate::models::DEFAULT_CURRENCY;

/// Replaces digits in money-like and percent-like runs with `X`
pub struct Masker {
    patterns: Vec<Regex>,
}

impl Masker {
    /// `units` are currency codes matched as whole words next to a number,
    /// in addition to the `€` sign
    pub fn new(units: &[&str]) -> Result<Self> {
        let mut codes: Vec<String> = units
            .iter()
            .map(|u| u.trim())
            .filter(|u| !u.is_empty())
            .map(regex::escape)
            .collect();
        if codes.is_empty() {
            codes.push(DEFAULT_CURRENCY.to_string());
        }
        let code = format!("(?:{})", codes.join("|"));

        // Longest forms first so decimals are masked as one run
        let sources = [
            format!(r"(?:€\s*|\b{code}\s*)\d[\d,]*[.]\d{{1,2}}"),
            format!(r"\d[\d,]*[.]\d{{1,2}}\s*(?:€|\b{code}\b)"),
            format!(r"(?:€\s*|\b{code}\s*)\d[\d,]*\b"),
            format!(r"\b\d[\d,]*\s*(?:€|\b{code}\b)"),
            r"\b\d[\d,]*[.]?\d*\s*%".to_string(),
        ];

        let patterns = sources
            .iter()
            .map(|s| Regex::new(s))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self { patterns })
    }

    pub fn mask(&self, text: &str) -> String {
        let mut out = text.to_string();
        for re in &self.patterns {
            out = re
                .replace_all(&out, |caps: &Captures| {
                    caps[0]
                        .chars()
                        .map(|c| if c.is_numeric() { 'X' } else { c })
                        .collect::<String>()
                })
                .into_owned();
        }
        out
    }
}

/// Mask `€`/`EUR` amounts and percentages
pub fn mask_numeric_strings(text: &str) -> Result<String> {
    Ok(Masker::new(&[DEFAULT_CURRENCY])?.mask(text))
}
