//! Lenient CSV scanning for uploaded query files.
//!
//! [`parse_rows`] is a single-pass character scanner. Double quotes toggle a
//! quoted section wherever they appear in a cell, `""` inside a quoted section
//! yields a literal quote, and `,` / `\n` / `\r` / `\r\n` only delimit outside
//! quotes. [`write_rows`] produces text that [`parse_rows`] reads back
//! unchanged.

use std::string::FromUtf8Error;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CsvWriteError {
    #[error(transparent)]
    Csv(#[from] ::csv::Error),
    #[error("failed to flush csv writer: {0}")]
    Flush(String),
    #[error(transparent)]
    Utf8(#[from] FromUtf8Error),
}

/// Split `text` into rows of raw string cells.
///
/// Never yields a row with zero cells. Input that ends without a line break
/// still produces its final row; a trailing line break does not add an empty
/// one.
#[must_use]
pub fn parse_rows(text: &str) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut cell = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' => {
                if in_quotes && chars.peek() == Some(&'"') {
                    cell.push('"');
                    chars.next();
                } else {
                    in_quotes = !in_quotes;
                }
            }
            ',' if !in_quotes => row.push(std::mem::take(&mut cell)),
            '\n' | '\r' if !in_quotes => {
                if ch == '\r' && chars.peek() == Some(&'\n') {
                    chars.next();
                }
                row.push(std::mem::take(&mut cell));
                rows.push(std::mem::take(&mut row));
            }
            _ => cell.push(ch),
        }
    }

    if !cell.is_empty() || !row.is_empty() {
        row.push(cell);
        rows.push(row);
    }

    rows
}

/// Serialize rows as CRLF-terminated CSV, quoting only where needed.
///
/// A row made of a single empty cell is written as `""` so it survives a
/// round trip through [`parse_rows`].
///
/// # Errors
///
/// Returns [`CsvWriteError`] if the underlying writer fails.
pub fn write_rows<R, S>(rows: &[R]) -> Result<String, CsvWriteError>
where
    R: AsRef<[S]>,
    S: AsRef<str>,
{
    let mut writer = ::csv::WriterBuilder::new()
        .flexible(true)
        .quote_style(::csv::QuoteStyle::Necessary)
        .from_writer(Vec::new());

    for row in rows {
        writer.write_record(row.as_ref().iter().map(|cell| cell.as_ref().as_bytes()))?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| CsvWriteError::Flush(e.to_string()))?;
    Ok(String::from_utf8(bytes)?)
}
