//! Engine-neutral query results and reference-answer comparison.
//!
//! Every wrapped engine returns results in its own Arrow (or AnyValue)
//! representation; they are converted into [`AnswerTable`] so runs can be
//! compared with each other and with the reference answers shipped with
//! dbgen. Dates are carried as ISO text and all numeric types as `f64`.

use anyhow::{Context, Result};
use std::fmt;
use std::path::Path;

/// Absolute tolerance for numeric comparison. TPC-H answer precision for
/// monetary aggregates is a cent.
const NUMERIC_ABS_TOLERANCE: f64 = 0.01;

/// Relative tolerance, for large aggregates where float rounding exceeds
/// the absolute bound.
const NUMERIC_REL_TOLERANCE: f64 = 1e-9;

/// A single result cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Number(f64),
    Text(String),
    Null,
}

impl Cell {
    /// Parse a reference-answer field: numeric if it parses as `f64`,
    /// otherwise trimmed text. Empty fields are null.
    pub fn parse(raw: &str) -> Cell {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Cell::Null;
        }
        match trimmed.parse::<f64>() {
            Ok(n) => Cell::Number(n),
            Err(_) => Cell::Text(trimmed.to_string()),
        }
    }

    fn matches(&self, other: &Cell) -> bool {
        match (self, other) {
            (Cell::Null, Cell::Null) => true,
            (Cell::Number(a), Cell::Number(b)) => {
                let diff = (a - b).abs();
                diff <= NUMERIC_ABS_TOLERANCE
                    || diff <= NUMERIC_REL_TOLERANCE * a.abs().max(b.abs())
            }
            (Cell::Text(a), Cell::Text(b)) => a.trim() == b.trim(),
            // engines may type a column differently than the reference
            // parser guessed (e.g. a numeric-looking country code)
            (Cell::Number(n), Cell::Text(t)) | (Cell::Text(t), Cell::Number(n)) => {
                t.trim().parse::<f64>().map_or(false, |p| {
                    let diff = (p - n).abs();
                    diff <= NUMERIC_ABS_TOLERANCE
                        || diff <= NUMERIC_REL_TOLERANCE * p.abs().max(n.abs())
                })
            }
            _ => false,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Number(n) => write!(f, "{}", n),
            Cell::Text(t) => f.write_str(t),
            Cell::Null => f.write_str("NULL"),
        }
    }
}

/// A materialized query result.
#[derive(Debug, Clone, Default)]
pub struct AnswerTable {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl AnswerTable {
    pub fn num_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn num_columns(&self) -> usize {
        self.columns.len()
    }
}

/// Why a comparison against the reference answer failed.
#[derive(Debug, thiserror::Error)]
pub enum Mismatch {
    #[error("row count mismatch: expected {expected}, got {actual}")]
    RowCount { expected: usize, actual: usize },
    #[error("column count mismatch: expected {expected}, got {actual}")]
    ColumnCount { expected: usize, actual: usize },
    #[error("row {row}, column {column}: expected {expected}, got {actual}")]
    Cell {
        row: usize,
        column: usize,
        expected: String,
        actual: String,
    },
}

/// Compare a query result against a reference answer.
///
/// Comparison is positional: reference headers never match the aliases the
/// engines emit, so column names are ignored. The first difference is
/// reported.
pub fn compare(actual: &AnswerTable, expected: &AnswerTable) -> Result<(), Mismatch> {
    if actual.num_rows() != expected.num_rows() {
        return Err(Mismatch::RowCount {
            expected: expected.num_rows(),
            actual: actual.num_rows(),
        });
    }
    if actual.num_columns() != expected.num_columns() {
        return Err(Mismatch::ColumnCount {
            expected: expected.num_columns(),
            actual: actual.num_columns(),
        });
    }
    for (i, (a_row, e_row)) in actual.rows.iter().zip(&expected.rows).enumerate() {
        for (j, (a, e)) in a_row.iter().zip(e_row).enumerate() {
            if !a.matches(e) {
                return Err(Mismatch::Cell {
                    row: i,
                    column: j,
                    expected: e.to_string(),
                    actual: a.to_string(),
                });
            }
        }
    }
    Ok(())
}

/// Load the reference answer for a query from a dbgen answers directory.
///
/// The files are named `q<n>.out` and are pipe-delimited with a single
/// header line. Some variants terminate rows with a trailing delimiter,
/// which is stripped.
pub fn load_reference(dir: &Path, query_no: u8) -> Result<AnswerTable> {
    let path = dir.join(format!("q{}.out", query_no));
    let raw = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read reference answer {}", path.display()))?;
    parse_reference(&raw)
        .with_context(|| format!("Malformed reference answer {}", path.display()))
}

fn parse_reference(raw: &str) -> Result<AnswerTable> {
    let mut lines = raw.lines().filter(|l| !l.trim().is_empty());

    let header = lines.next().context("missing header line")?;
    let columns: Vec<String> = split_row(header)
        .into_iter()
        .map(|c| c.trim().to_string())
        .collect();

    let mut rows = Vec::new();
    for line in lines {
        let fields = split_row(line);
        if fields.len() != columns.len() {
            anyhow::bail!(
                "expected {} fields, found {} in row {:?}",
                columns.len(),
                fields.len(),
                line
            );
        }
        rows.push(fields.iter().map(|f| Cell::parse(f)).collect());
    }

    Ok(AnswerTable { columns, rows })
}

fn split_row(line: &str) -> Vec<&str> {
    let line = line.strip_suffix('|').unwrap_or(line);
    line.split('|').collect()
}

/// Render an Arrow-style `Date32` (days since the Unix epoch) as the
/// neutral ISO text form.
pub fn date32_to_iso(days: i32) -> String {
    let date = chrono::NaiveDate::from_ymd_opt(1970, 1, 1).unwrap()
        + chrono::Duration::days(days as i64);
    date.format("%Y-%m-%d").to_string()
}
