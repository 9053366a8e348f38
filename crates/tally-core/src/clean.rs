//! Drop incomplete and duplicate records

use std::collections::HashSet;

use chrono::NaiveDate;
use tracing::debug;

use crate::models::{Bank, Transaction, UnifiedTransaction, DEFAULT_UNKNOWN_CATEGORY};

/// What the cleaner removed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanStats {
    pub input: usize,
    pub missing_date: usize,
    pub missing_amount: usize,
    pub duplicates: usize,
    pub kept: usize,
}

/// Dedup key: amount compared by magnitude, merchant case- and space-folded
type DedupKey = (NaiveDate, u64, String, Bank);

fn dedup_key(tx: &Transaction) -> DedupKey {
    (
        tx.date,
        tx.amount.abs().to_bits(),
        tx.merchant.trim().to_lowercase(),
        tx.bank,
    )
}

/// Filter and deduplicate normalized records, keeping input order
pub fn clean_transactions(records: Vec<UnifiedTransaction>) -> Vec<Transaction> {
    clean_transactions_with_stats(records).0
}

/// Like [`clean_transactions`], also reporting what was dropped.
///
/// A debit and a credit of the same size on the same day from the same
/// merchant and bank share a key, so only the first one is kept.
pub fn clean_transactions_with_stats(
    records: Vec<UnifiedTransaction>,
) -> (Vec<Transaction>, CleanStats) {
    let mut stats = CleanStats {
        input: records.len(),
        ..Default::default()
    };
    let mut seen: HashSet<DedupKey> = HashSet::new();
    let mut kept = Vec::with_capacity(records.len());

    for record in records {
        let Some(amount) = record.amount else {
            stats.missing_amount += 1;
            continue;
        };
        let Some(date) = record.date else {
            stats.missing_date += 1;
            continue;
        };

        let tx = Transaction {
            date,
            amount,
            currency: record.currency,
            description: record.description,
            merchant: record.merchant,
            iban: record.iban,
            balance: record.balance,
            kind: record.kind,
            bank: record.bank,
            category: DEFAULT_UNKNOWN_CATEGORY.to_string(),
        };

        if !seen.insert(dedup_key(&tx)) {
            stats.duplicates += 1;
            continue;
        }
        kept.push(tx);
    }

    stats.kept = kept.len();
    debug!(
        "Cleaned {} records: kept {}, {} without amount, {} without date, {} duplicates",
        stats.input, stats.kept, stats.missing_amount, stats.missing_date, stats.duplicates
    );

    (kept, stats)
}
