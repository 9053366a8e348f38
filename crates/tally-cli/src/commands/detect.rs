//! Bank detection command

use std::path::PathBuf;

use anyhow::{Context, Result};
use serde_json::json;
use tally_core::{detect_bank, score_chunk, Bank, CsvSource, RawChunk};

/// Detection result for one file
pub struct Detection {
    pub path: PathBuf,
    pub rows: usize,
    pub bank: Bank,
    pub scores: Vec<(Bank, usize)>,
}

pub fn detect_chunk(chunk: &RawChunk) -> Detection {
    Detection {
        path: chunk.source.clone(),
        rows: chunk.len(),
        bank: detect_bank(chunk),
        scores: score_chunk(chunk),
    }
}

pub fn cmd_detect(paths: &[PathBuf], as_json: bool) -> Result<()> {
    let chunks = CsvSource::new(paths.iter().cloned())
        .fetch()
        .context("Failed to read CSV files")?;
    let detections: Vec<Detection> = chunks.iter().map(detect_chunk).collect();

    if as_json {
        let out: Vec<_> = detections
            .iter()
            .map(|d| {
                let scores: serde_json::Map<String, serde_json::Value> = d
                    .scores
                    .iter()
                    .map(|(bank, score)| (bank.as_str().to_string(), json!(score)))
                    .collect();
                json!({
                    "file": d.path.display().to_string(),
                    "rows": d.rows,
                    "bank": d.bank.as_str(),
                    "scores": scores,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&out)?);
        return Ok(());
    }

    println!("🔍 Bank detection");
    for d in &detections {
        println!();
        println!("   {} ({} rows)", d.path.display(), d.rows);
        println!("   → {}", d.bank.label());
        for (bank, score) in &d.scores {
            println!("     {:10} {}", bank.label(), score);
        }
    }

    Ok(())
}
