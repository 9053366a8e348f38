//! Snapshot of the cleaned, categorized month
//!
//! Two files per month in the output directory:
//! - `clean_transactions_{month}.csv`: one row per transaction
//! - `clean_transactions_{month}.columns.json`: one array per field

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tempfile::NamedTempFile;
use tracing::info;

use crate::error::{Error, Result};
use crate::models::{Month, Transaction};

/// Write via a temp file in the same directory, then rename into place
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let dir = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| Error::Io(e.error))?;
    Ok(())
}

#[derive(Debug, Serialize)]
struct SnapshotRow<'a> {
    date: String,
    amount: f64,
    currency: &'a str,
    description: &'a str,
    merchant: &'a str,
    iban: &'a str,
    balance: Option<f64>,
    #[serde(rename = "type")]
    kind: &'a str,
    bank: &'static str,
    category: &'a str,
}

impl<'a> From<&'a Transaction> for SnapshotRow<'a> {
    fn from(tx: &'a Transaction) -> Self {
        Self {
            date: tx.date.format("%Y-%m-%d").to_string(),
            amount: tx.amount,
            currency: &tx.currency,
            description: &tx.description,
            merchant: &tx.merchant,
            iban: &tx.iban,
            balance: tx.balance,
            kind: &tx.kind,
            bank: tx.bank.label(),
            category: &tx.category,
        }
    }
}

/// Column-oriented copy of the snapshot
#[derive(Debug, Default, Serialize)]
struct Columns<'a> {
    date: Vec<String>,
    amount: Vec<f64>,
    currency: Vec<&'a str>,
    description: Vec<&'a str>,
    merchant: Vec<&'a str>,
    iban: Vec<&'a str>,
    balance: Vec<Option<f64>>,
    #[serde(rename = "type")]
    kind: Vec<&'a str>,
    bank: Vec<&'static str>,
    category: Vec<&'a str>,
}

impl<'a> Columns<'a> {
    fn from_rows(rows: &[SnapshotRow<'a>]) -> Self {
        let mut cols = Self::default();
        for row in rows {
            cols.date.push(row.date.clone());
            cols.amount.push(row.amount);
            cols.currency.push(row.currency);
            cols.description.push(row.description);
            cols.merchant.push(row.merchant);
            cols.iban.push(row.iban);
            cols.balance.push(row.balance);
            cols.kind.push(row.kind);
            cols.bank.push(row.bank);
            cols.category.push(row.category);
        }
        cols
    }
}

/// Render transactions as CSV with a header row
pub fn transactions_to_csv(txns: &[Transaction]) -> Result<String> {
    let mut wtr = csv::Writer::from_writer(Vec::new());
    for tx in txns {
        wtr.serialize(SnapshotRow::from(tx))?;
    }
    if txns.is_empty() {
        wtr.write_record([
            "date",
            "amount",
            "currency",
            "description",
            "merchant",
            "iban",
            "balance",
            "type",
            "bank",
            "category",
        ])?;
    }
    let bytes = wtr.into_inner().map_err(|e| Error::Io(e.into_error()))?;
    String::from_utf8(bytes).map_err(|e| Error::InvalidData(e.to_string()))
}

#[derive(Debug, Clone)]
pub struct SnapshotPaths {
    pub csv: PathBuf,
    pub columns: PathBuf,
}

/// Persist the month's transactions in row and column form
pub fn write_snapshot(txns: &[Transaction], dir: &Path, month: &Month) -> Result<SnapshotPaths> {
    fs::create_dir_all(dir)?;

    let csv_path = dir.join(format!("clean_transactions_{}.csv", month));
    write_atomic(&csv_path, transactions_to_csv(txns)?.as_bytes())?;

    let rows: Vec<SnapshotRow> = txns.iter().map(SnapshotRow::from).collect();
    let columns_path = dir.join(format!("clean_transactions_{}.columns.json", month));
    let json = serde_json::to_vec_pretty(&Columns::from_rows(&rows))?;
    write_atomic(&columns_path, &json)?;

    info!(
        "Snapshot of {} transactions written to {}",
        txns.len(),
        dir.display()
    );

    Ok(SnapshotPaths {
        csv: csv_path,
        columns: columns_path,
    })
}
