//! CSV ingestion for bank exports
//!
//! Bank exports arrive with unknown delimiters and encodings. Each file is read
//! through an ordered chain of parse attempts (encoding + delimiter); the first
//! attempt that yields more than one column wins. The result is a [`RawChunk`]:
//! untyped rows tagged with the file they came from, handed to the normalizer.

use std::fs;
use std::path::{Path, PathBuf};

use csv::ReaderBuilder;
use tracing::{debug, warn};

use crate::error::{Error, Result};

/// All rows from one physical input file
#[derive(Debug, Clone, PartialEq)]
pub struct RawChunk {
    /// File the rows were read from
    pub source: PathBuf,
    pub headers: Vec<String>,
    /// Each row has exactly `headers.len()` cells
    pub rows: Vec<Vec<String>>,
}

impl RawChunk {
    pub fn new(source: impl Into<PathBuf>, headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let width = headers.len();
        let rows = rows
            .into_iter()
            .map(|mut row| {
                row.resize(width, String::new());
                row
            })
            .collect();
        Self {
            source: source.into(),
            headers,
            rows,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of a column by name (case-insensitive, trimmed, exact)
    pub fn column(&self, name: &str) -> Option<usize> {
        let wanted = name.trim().to_lowercase();
        self.headers
            .iter()
            .position(|h| h.trim().to_lowercase() == wanted)
    }

    /// Index of the first alias present as a column
    pub fn find_column(&self, aliases: &[&str]) -> Option<usize> {
        aliases.iter().find_map(|alias| self.column(alias))
    }

    /// Trimmed cell value, `None` when blank or out of range
    pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Like [`cell`](Self::cell) for a column that may be absent
    pub fn value(&self, row: usize, col: Option<usize>) -> Option<&str> {
        col.and_then(|c| self.cell(row, c))
    }

    /// Number of non-blank cells in a column
    pub fn non_null_count(&self, col: usize) -> usize {
        (0..self.rows.len())
            .filter(|&row| self.cell(row, col).is_some())
            .count()
    }
}

/// Text encodings tried when decoding an export
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Encoding {
    /// UTF-8, with a leading byte-order mark stripped
    Utf8,
    /// ISO-8859-1; every byte maps to one char, so decoding never fails
    Latin1,
}

impl Encoding {
    fn decode(self, bytes: &[u8]) -> Option<String> {
        match self {
            Self::Utf8 => {
                let bytes = bytes.strip_prefix(b"\xEF\xBB\xBF").unwrap_or(bytes);
                String::from_utf8(bytes.to_vec()).ok()
            }
            Self::Latin1 => Some(bytes.iter().map(|&b| b as char).collect()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Delimiter {
    /// Guess from the header line
    Sniff,
    Fixed(u8),
}

impl Delimiter {
    fn resolve(self, text: &str) -> u8 {
        match self {
            Self::Sniff => sniff_delimiter(text),
            Self::Fixed(d) => d,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct ParseAttempt {
    encoding: Encoding,
    delimiter: Delimiter,
}

/// Fallback chain, tried in order
const PARSE_ATTEMPTS: &[ParseAttempt] = &[
    ParseAttempt {
        encoding: Encoding::Utf8,
        delimiter: Delimiter::Sniff,
    },
    ParseAttempt {
        encoding: Encoding::Utf8,
        delimiter: Delimiter::Fixed(b';'),
    },
    ParseAttempt {
        encoding: Encoding::Latin1,
        delimiter: Delimiter::Sniff,
    },
    ParseAttempt {
        encoding: Encoding::Latin1,
        delimiter: Delimiter::Fixed(b';'),
    },
];

const DELIMITER_CANDIDATES: &[u8] = &[b',', b';', b'\t', b'|'];

/// Pick the candidate delimiter occurring most often (outside quotes) in the
/// first non-empty line. Ties go to the earlier candidate; no hits means comma.
fn sniff_delimiter(text: &str) -> u8 {
    let Some(line) = text.lines().find(|l| !l.trim().is_empty()) else {
        return b',';
    };

    let mut counts = [0usize; 4];
    let mut in_quotes = false;
    for b in line.bytes() {
        if b == b'"' {
            in_quotes = !in_quotes;
            continue;
        }
        if in_quotes {
            continue;
        }
        if let Some(i) = DELIMITER_CANDIDATES.iter().position(|&d| d == b) {
            counts[i] += 1;
        }
    }

    let mut best = 0;
    for i in 1..counts.len() {
        if counts[i] > counts[best] {
            best = i;
        }
    }
    DELIMITER_CANDIDATES[best]
}

/// Parse decoded text with one delimiter. Rows wider than the header and rows
/// the reader rejects are skipped; short rows are padded.
fn parse_text(text: &str, delimiter: u8) -> Result<(Vec<String>, Vec<Vec<String>>)> {
    let mut rdr = ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .flexible(true)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = rdr.headers()?.iter().map(|h| h.trim().to_string()).collect();

    let mut rows = Vec::new();
    let mut skipped = 0usize;
    for result in rdr.records() {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                debug!("Skipping malformed CSV line: {}", e);
                skipped += 1;
                continue;
            }
        };

        if record.len() > headers.len() {
            skipped += 1;
            continue;
        }
        if record.iter().all(|v| v.trim().is_empty()) {
            continue;
        }

        rows.push(record.iter().map(|v| v.to_string()).collect());
    }

    if skipped > 0 {
        debug!("Skipped {} malformed lines", skipped);
    }

    Ok((headers, rows))
}

/// Parse raw bytes of one export through the fallback chain.
///
/// Never fails: if no attempt produces more than one column, the last
/// decodable attempt is returned as is.
pub fn read_csv_bytes(bytes: &[u8], source: impl Into<PathBuf>) -> RawChunk {
    let source = source.into();
    let mut fallback: Option<RawChunk> = None;

    for attempt in PARSE_ATTEMPTS {
        let Some(text) = attempt.encoding.decode(bytes) else {
            debug!(
                "{}: not valid {:?}, trying next encoding",
                source.display(),
                attempt.encoding
            );
            continue;
        };

        let delimiter = attempt.delimiter.resolve(&text);
        match parse_text(&text, delimiter) {
            Ok((headers, rows)) => {
                let chunk = RawChunk::new(source.clone(), headers, rows);
                if chunk.headers.len() > 1 {
                    debug!(
                        "{}: parsed {} rows ({:?}, delimiter {:?})",
                        source.display(),
                        chunk.len(),
                        attempt.encoding,
                        delimiter as char
                    );
                    return chunk;
                }
                debug!(
                    "{}: single column with delimiter {:?}, retrying",
                    source.display(),
                    delimiter as char
                );
                fallback = Some(chunk);
            }
            Err(e) => debug!("{}: parse attempt failed: {}", source.display(), e),
        }
    }

    fallback.unwrap_or_else(|| {
        warn!("{}: could not parse any columns", source.display());
        RawChunk::new(source, Vec::new(), Vec::new())
    })
}

/// Read one export from disk
pub fn read_csv_file(path: &Path) -> Result<RawChunk> {
    let bytes = fs::read(path)
        .map_err(|e| Error::Import(format!("Failed to read {}: {}", path.display(), e)))?;
    Ok(read_csv_bytes(&bytes, path))
}

/// A set of CSV exports to read
#[derive(Debug, Clone, Default)]
pub struct CsvSource {
    paths: Vec<PathBuf>,
}

impl CsvSource {
    pub fn new<I, P>(paths: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        Self {
            paths: paths.into_iter().map(Into::into).collect(),
        }
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// One chunk per path, in input order
    pub fn fetch(&self) -> Result<Vec<RawChunk>> {
        self.paths.iter().map(|p| read_csv_file(p)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sniff_delimiter() {
        assert_eq!(sniff_delimiter("a,b,c\n1,2,3"), b',');
        assert_eq!(sniff_delimiter("a;b;c\n1;2;3"), b';');
        assert_eq!(sniff_delimiter("a\tb\tc"), b'\t');
        // Commas inside quotes don't count
        assert_eq!(sniff_delimiter("\"a,b,c\";d;e"), b';');
        // Nothing to go on
        assert_eq!(sniff_delimiter("single"), b',');
        assert_eq!(sniff_delimiter(""), b',');
    }

    #[test]
    fn test_read_comma_separated() {
        let csv = "Type,Started Date,Amount\nCARD_PAYMENT,2025-10-01 10:00:00,-5.50\n";
        let chunk = read_csv_bytes(csv.as_bytes(), "rev.csv");
        assert_eq!(chunk.headers, vec!["Type", "Started Date", "Amount"]);
        assert_eq!(chunk.len(), 1);
        assert_eq!(chunk.cell(0, 2), Some("-5.50"));
        assert_eq!(chunk.source, PathBuf::from("rev.csv"));
    }

    #[test]
    fn test_read_semicolon_with_comma_decimals() {
        let csv = "Data;Suma;D/K\n2025-10-01;12,50;D\n";
        let chunk = read_csv_bytes(csv.as_bytes(), "swed.csv");
        assert_eq!(chunk.headers.len(), 3);
        assert_eq!(chunk.cell(0, 1), Some("12,50"));
    }

    #[test]
    fn test_single_column_retries_with_semicolon() {
        let text = "a;b\n1;2\n";
        let (headers, _) = parse_text(text, b',').unwrap();
        assert_eq!(headers.len(), 1);

        let chunk = read_csv_bytes(text.as_bytes(), "x.csv");
        assert_eq!(chunk.headers, vec!["a", "b"]);
    }

    #[test]
    fn test_strips_utf8_bom() {
        let mut bytes = b"\xEF\xBB\xBF".to_vec();
        bytes.extend_from_slice(b"Date,Amount\n2025-10-01,1\n");
        let chunk = read_csv_bytes(&bytes, "bom.csv");
        assert_eq!(chunk.headers[0], "Date");
        assert_eq!(chunk.column("date"), Some(0));
    }

    #[test]
    fn test_latin1_fallback() {
        let bytes = b"Data;Suma;Gav\xe9jas\n2025-10-01;-5,00;Caf\xe9\n";
        let chunk = read_csv_bytes(bytes, "legacy.csv");
        assert_eq!(chunk.headers[2], "Gav\u{e9}jas");
        assert_eq!(chunk.cell(0, 2), Some("Caf\u{e9}"));
    }

    #[test]
    fn test_skips_overlong_rows_and_pads_short_ones() {
        let csv = "a,b,c\n1,2,3\n1,2,3,4,5\n7,8\n";
        let chunk = read_csv_bytes(csv.as_bytes(), "m.csv");
        assert_eq!(chunk.len(), 2);
        assert_eq!(chunk.rows[1], vec!["7", "8", ""]);
        assert_eq!(chunk.cell(1, 2), None);
    }

    #[test]
    fn test_blank_lines_ignored() {
        let csv = "a,b\n1,2\n,\n\n3,4\n";
        let chunk = read_csv_bytes(csv.as_bytes(), "b.csv");
        assert_eq!(chunk.len(), 2);
    }

    #[test]
    fn test_empty_input_is_empty_chunk() {
        let chunk = read_csv_bytes(b"", "empty.csv");
        assert!(chunk.is_empty());
    }

    #[test]
    fn test_column_lookup_is_case_insensitive() {
        let chunk = RawChunk::new(
            "t.csv",
            vec![" Completed Date ".into(), "AMOUNT".into()],
            vec![vec!["2025-10-01".into(), " ".into()]],
        );
        assert_eq!(chunk.column("completed date"), Some(0));
        assert_eq!(chunk.find_column(&["started date", "amount"]), Some(1));
        assert_eq!(chunk.non_null_count(0), 1);
        assert_eq!(chunk.non_null_count(1), 0);
        assert_eq!(chunk.value(0, None), None);
    }

    #[test]
    fn test_fetch_reads_files_in_order() {
        let dir = tempfile::TempDir::new().unwrap();
        let a = dir.path().join("a.csv");
        let b = dir.path().join("b.csv");
        fs::write(&a, "x,y\n1,2\n").unwrap();
        fs::write(&b, "x;y\n3;4\n").unwrap();

        let chunks = CsvSource::new([&a, &b]).fetch().unwrap();
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].source, a);
        assert_eq!(chunks[1].cell(0, 0), Some("3"));
    }

    #[test]
    fn test_fetch_missing_file_fails() {
        let result = CsvSource::new(["/nonexistent/export.csv"]).fetch();
        assert!(matches!(result, Err(Error::Import(_))));
    }
}
