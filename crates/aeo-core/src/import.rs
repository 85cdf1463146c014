//! Turning an uploaded CSV file into validated queries.

use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::csv_text::parse_rows;

/// Default cap on data rows accepted from one upload.
pub const DEFAULT_MAX_ROWS: usize = 1000;

/// Downloadable template served next to the upload form.
pub const SAMPLE_CSV: &str = "query,intent,priority\n\
ai overview visibility,informational,1\n\
seo tooling pricing,commercial,2\n";

/// File name offered for [`SAMPLE_CSV`].
pub const SAMPLE_CSV_FILENAME: &str = "queries-sample.csv";

/// One data row as read from the file, every value trimmed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryRow {
    pub query: String,
    pub intent: String,
    pub priority: String,
}

/// A row that passed validation and is ready to be stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportedQuery {
    pub text: String,
    pub intent: Option<String>,
    pub weight: Option<Decimal>,
}

/// Upload rejections. `Display` is the message shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ImportError {
    #[error("CSV file is empty.")]
    Empty,
    #[error("CSV file has no rows.")]
    NoRows,
    #[error("CSV exceeds {max} rows.")]
    TooManyRows { max: usize, found: usize },
    #[error("Missing query values in CSV.")]
    MissingQueryValues,
    #[error("Some rows were missing the query column.")]
    SomeRowsMissingQuery { missing: usize },
    #[error("CSV file must be UTF-8 encoded.")]
    NotUtf8,
}

/// Column positions for `query`, `intent` and `priority`.
struct Columns {
    query: Option<usize>,
    intent: Option<usize>,
    priority: Option<usize>,
}

impl Columns {
    const POSITIONAL: Self = Self {
        query: Some(0),
        intent: Some(1),
        priority: Some(2),
    };

    fn from_header(header: &[String]) -> Self {
        let find = |name: &str| header.iter().position(|cell| cell == name);
        Self {
            query: find("query"),
            intent: find("intent"),
            priority: find("priority"),
        }
    }
}

/// Interpret parsed rows as query rows.
///
/// The first row is a header when any of its cells, trimmed and lowercased,
/// is `query`; columns are then located by name. Otherwise every row is data
/// and columns are positional (query, intent, priority). Missing cells read
/// as empty strings.
#[must_use]
pub fn parse_query_rows(rows: &[Vec<String>]) -> Vec<QueryRow> {
    let Some(first) = rows.first() else {
        return Vec::new();
    };

    let header: Vec<String> = first
        .iter()
        .map(|cell| cell.trim().to_lowercase())
        .collect();
    let has_header = header.iter().any(|cell| cell == "query");

    let (columns, data) = if has_header {
        (Columns::from_header(&header), &rows[1..])
    } else {
        (Columns::POSITIONAL, rows)
    };

    let cell = |row: &[String], index: Option<usize>| -> String {
        index
            .and_then(|i| row.get(i))
            .map(|value| value.trim().to_string())
            .unwrap_or_default()
    };

    data.iter()
        .map(|row| QueryRow {
            query: cell(row, columns.query),
            intent: cell(row, columns.intent),
            priority: cell(row, columns.priority),
        })
        .collect()
}

/// Validate an uploaded file and return the queries to store.
///
/// Checks run in a fixed order and the first failure wins: empty file, no
/// data rows, more than `max_rows` data rows, no query values at all, some
/// query values missing.
///
/// # Errors
///
/// Returns the [`ImportError`] describing the first failed check.
pub fn validate_upload(text: &str, max_rows: usize) -> Result<Vec<ImportedQuery>, ImportError> {
    let text = text.trim_start_matches('\u{feff}').trim();
    if text.is_empty() {
        return Err(ImportError::Empty);
    }

    let rows = parse_query_rows(&parse_rows(text));
    if rows.is_empty() {
        return Err(ImportError::NoRows);
    }
    if rows.len() > max_rows {
        return Err(ImportError::TooManyRows {
            max: max_rows,
            found: rows.len(),
        });
    }

    let missing = rows.iter().filter(|row| row.query.is_empty()).count();
    if missing == rows.len() {
        return Err(ImportError::MissingQueryValues);
    }
    if missing > 0 {
        return Err(ImportError::SomeRowsMissingQuery { missing });
    }

    Ok(rows
        .into_iter()
        .map(|row| ImportedQuery {
            weight: parse_weight(&row.priority),
            intent: (!row.intent.is_empty()).then_some(row.intent),
            text: row.query,
        })
        .collect())
}

/// Borrow uploaded bytes as text. Invalid UTF-8 is rejected rather than
/// replaced, so stored queries never contain substitution characters.
///
/// # Errors
///
/// Returns [`ImportError::NotUtf8`] if `bytes` is not valid UTF-8.
pub fn decode_upload(bytes: &[u8]) -> Result<&str, ImportError> {
    std::str::from_utf8(bytes).map_err(|_| ImportError::NotUtf8)
}

/// Parse a `priority` cell into a query weight.
///
/// Accepts plain decimals and scientific notation; anything else (including
/// the empty string) yields `None`.
#[must_use]
pub fn parse_weight(raw: &str) -> Option<Decimal> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    Decimal::from_str(raw)
        .or_else(|_| Decimal::from_scientific(raw))
        .ok()
}

/// Name given to a query set created from an upload on `date`.
#[must_use]
pub fn default_query_set_name(date: NaiveDate) -> String {
    format!("CSV import {}", date.format("%-m/%-d/%Y"))
}

#[cfg(test)]
#[path = "import_test.rs"]
mod tests;
