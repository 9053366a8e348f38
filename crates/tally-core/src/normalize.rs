//! Bank format detection and normalization into [`UnifiedTransaction`]s
//!
//! Each input chunk (one file) is scored against every [`BankProfile`]: for
//! each alias group, the first alias present as a column contributes its
//! number of non-blank cells. The highest score wins and ties go to the profile
//! listed first. The winning profile's mapper turns rows into partial records,
//! and [`enforce_schema`] coerces those into the unified field set.
//!
//! Adding a bank means adding a profile entry and a mapper; detection itself
//! doesn't change.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use tracing::debug;

use crate::import::RawChunk;
use crate::models::{Bank, UnifiedTransaction, DEFAULT_CURRENCY};

/// Columns characteristic of one bank's export, plus its row mapper
pub struct BankProfile {
    pub bank: Bank,
    /// Each inner slice is one alias group; first present alias counts
    pub aliases: &'static [&'static [&'static str]],
    map: fn(&RawChunk) -> Vec<PartialRecord>,
}

/// Detection priority order: earlier profiles win ties
pub const PROFILES: &[BankProfile] = &[
    BankProfile {
        bank: Bank::Revolut,
        aliases: &[
            &["completed date", "started date"],
            &["type"],
            &["description"],
            &["amount"],
            &["currency"],
        ],
        map: map_revolut,
    },
    BankProfile {
        bank: Bank::Swedbank,
        aliases: &[
            &["data", "date"],
            &["suma"],
            &["valiuta", "currency"],
            &["d/k", "dk"],
            &["paaiškinimai", "paaiskinimai"],
        ],
        map: map_swedbank,
    },
];

fn profile_for(bank: Bank) -> &'static BankProfile {
    PROFILES
        .iter()
        .find(|p| p.bank == bank)
        .unwrap_or(&PROFILES[0])
}

/// Sum of non-blank cells over the first present alias of each group
pub fn score(chunk: &RawChunk, aliases: &[&[&str]]) -> usize {
    aliases
        .iter()
        .filter_map(|group| chunk.find_column(group))
        .map(|col| chunk.non_null_count(col))
        .sum()
}

/// Score of every profile, in priority order
pub fn score_chunk(chunk: &RawChunk) -> Vec<(Bank, usize)> {
    PROFILES
        .iter()
        .map(|p| (p.bank, score(chunk, p.aliases)))
        .collect()
}

/// Pick the bank format for a chunk. Never fails; a chunk with no identifying
/// columns resolves to the first profile.
pub fn detect_bank(chunk: &RawChunk) -> Bank {
    let mut best: Option<(Bank, usize)> = None;
    for (bank, s) in score_chunk(chunk) {
        match best {
            Some((_, top)) if s <= top => {}
            _ => best = Some((bank, s)),
        }
    }
    best.map(|(bank, _)| bank).unwrap_or(PROFILES[0].bank)
}

/// Detect and normalize one chunk
pub fn normalize_chunk(chunk: &RawChunk) -> Vec<UnifiedTransaction> {
    let bank = detect_bank(chunk);
    debug!(
        "{}: detected {} ({} rows, scores {:?})",
        chunk.source.display(),
        bank,
        chunk.len(),
        score_chunk(chunk)
    );
    normalize_chunk_as(chunk, bank)
}

/// Normalize one chunk with a known bank format
pub fn normalize_chunk_as(chunk: &RawChunk, bank: Bank) -> Vec<UnifiedTransaction> {
    let profile = profile_for(bank);
    (profile.map)(chunk)
        .into_iter()
        .map(|partial| enforce_schema(partial, bank))
        .collect()
}

/// Normalize every chunk in input order and concatenate
pub fn normalize_chunks(chunks: &[RawChunk]) -> Vec<UnifiedTransaction> {
    chunks.iter().flat_map(normalize_chunk).collect()
}

/// A mapper's view of one row, before type coercion and defaults
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PartialRecord {
    pub date: Option<String>,
    pub amount: Option<f64>,
    pub currency: Option<String>,
    pub description: Option<String>,
    pub merchant: Option<String>,
    pub iban: Option<String>,
    pub balance: Option<String>,
    pub kind: Option<String>,
}

/// Coerce a partial record into the unified field set, filling defaults
pub fn enforce_schema(partial: PartialRecord, bank: Bank) -> UnifiedTransaction {
    UnifiedTransaction {
        date: partial.date.as_deref().and_then(parse_date),
        amount: partial.amount.filter(|a| a.is_finite()),
        currency: partial
            .currency
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_CURRENCY.to_string()),
        description: partial.description.unwrap_or_default(),
        merchant: partial.merchant.unwrap_or_default(),
        iban: partial.iban.unwrap_or_default(),
        balance: partial.balance.as_deref().and_then(parse_amount),
        kind: partial.kind.unwrap_or_default(),
        bank,
    }
}

fn owned(value: Option<&str>) -> Option<String> {
    value.map(str::to_string)
}

fn map_revolut(chunk: &RawChunk) -> Vec<PartialRecord> {
    let date = chunk
        .column("completed date")
        .or_else(|| chunk.column("started date"));
    let amount = chunk.column("amount");
    let currency = chunk.column("currency");
    let description = chunk.column("description");
    let balance = chunk.column("balance");
    let kind = chunk.column("type");

    (0..chunk.len())
        .map(|row| {
            let description = owned(chunk.value(row, description));
            PartialRecord {
                date: owned(chunk.value(row, date)),
                amount: chunk.value(row, amount).and_then(parse_amount),
                currency: owned(chunk.value(row, currency)),
                // No separate payee column
                merchant: description.clone(),
                description,
                iban: None,
                balance: owned(chunk.value(row, balance)),
                kind: owned(chunk.value(row, kind)),
            }
        })
        .collect()
}

fn map_swedbank(chunk: &RawChunk) -> Vec<PartialRecord> {
    let date = chunk.column("data").or_else(|| chunk.column("date"));
    let amount = chunk.column("suma");
    let currency = chunk.column("valiuta");
    let description = chunk.find_column(&["paaiškinimai", "paaiskinimai"]);
    let merchant = chunk.find_column(&["gavėjas", "gavejas"]);
    let marker = chunk.find_column(&["d/k", "dk"]);
    let balance = chunk.find_column(&["likutis", "balance"]);
    let iban = chunk.find_column(&["sąskaitos nr.", "saskaitos nr.", "account number"]);

    (0..chunk.len())
        .map(|row| {
            let sign = marker_sign(chunk.value(row, marker).unwrap_or(""));
            let amount = chunk
                .value(row, amount)
                .and_then(parse_amount)
                .map(|a| a * sign);
            let description = owned(chunk.value(row, description));
            let merchant = match merchant {
                Some(_) => owned(chunk.value(row, merchant)),
                None => description.clone(),
            };

            PartialRecord {
                date: owned(chunk.value(row, date)),
                amount,
                currency: owned(chunk.value(row, currency)),
                description,
                merchant,
                iban: owned(chunk.value(row, iban)),
                balance: owned(chunk.value(row, balance)),
                kind: amount.and_then(derived_kind).map(str::to_string),
            }
        })
        .collect()
}

/// "credit"/"debit" from the sign of a corrected amount
fn derived_kind(amount: f64) -> Option<&'static str> {
    if amount > 0.0 {
        Some("credit")
    } else if amount < 0.0 {
        Some("debit")
    } else {
        None
    }
}

/// Multiplier for a debit/credit marker.
///
/// Unrecognized markers (including blank) keep the amount as is.
pub fn marker_sign(marker: &str) -> f64 {
    match marker.trim().to_uppercase().as_str() {
        "D" | "DEBETAS" | "DEBIT" => -1.0,
        "K" | "KREDITAS" | "CREDIT" => 1.0,
        _ => 1.0,
    }
}

/// Parse an amount written in either `1,234.56` or `1 234,56` style.
///
/// Spaces (including NBSP), apostrophes and currency symbols are dropped. When
/// both `,` and `.` appear, the last one is the decimal separator. A lone
/// comma is a decimal separator. `(12.50)` is negative.
pub fn parse_amount(s: &str) -> Option<f64> {
    let mut cleaned: String = s
        .trim()
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '\'' | '€' | '$' | '£'))
        .collect();
    if cleaned.is_empty() {
        return None;
    }

    if cleaned.starts_with('(') && cleaned.ends_with(')') && cleaned.len() > 2 {
        cleaned = format!("-{}", &cleaned[1..cleaned.len() - 1]);
    }

    let last_comma = cleaned.rfind(',');
    let last_dot = cleaned.rfind('.');
    let normalized = match (last_comma, last_dot) {
        (Some(c), Some(d)) if c > d => cleaned.replace('.', "").replace(',', "."),
        (Some(_), Some(_)) => cleaned.replace(',', ""),
        (Some(_), None) if cleaned.matches(',').count() > 1 => cleaned.replace(',', ""),
        (Some(_), None) => cleaned.replace(',', "."),
        (None, Some(_)) if cleaned.matches('.').count() > 1 => cleaned.replace('.', ""),
        _ => cleaned,
    };

    normalized.parse::<f64>().ok().filter(|v| v.is_finite())
}

const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M:%S",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%d.%m.%Y %H:%M",
    "%d.%m.%Y %H:%M:%S",
];

const DATE_FORMATS: &[&str] = &[
    "%Y-%m-%d",
    "%Y.%m.%d",
    "%Y/%m/%d",
    "%d.%m.%Y",
    "%m/%d/%Y",
    "%d/%m/%Y",
];

/// Parse a date or datetime, discarding the time of day
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }

    for fmt in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(s, fmt) {
            return Some(date);
        }
    }
    for fmt in DATETIME_FORMATS {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, fmt) {
            return Some(dt.date());
        }
    }
    DateTime::parse_from_rfc3339(s).ok().map(|dt| dt.date_naive())
}
