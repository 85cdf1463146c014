//! CSV export of scan results.

use chrono::{DateTime, SecondsFormat, Utc};

use crate::csv_text::{write_rows, CsvWriteError};
use crate::synth::ResultFlags;

pub const EXPORT_HEADER: [&str; 7] = [
    "query",
    "ai_presence",
    "brand_mentioned",
    "your_url_cited",
    "cited_urls",
    "note",
    "captured_at",
];

/// One exported result line, borrowed from whatever row type holds it.
#[derive(Debug, Clone, Copy)]
pub struct ExportRecord<'a> {
    pub query: &'a str,
    pub flags: ResultFlags,
    pub cited_urls: &'a [String],
    pub note: Option<&'a str>,
    pub captured_at: DateTime<Utc>,
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "yes"
    } else {
        "no"
    }
}

/// Render results as CSV with a header row. Cited URLs share one cell,
/// separated by a single space.
///
/// # Errors
///
/// Returns [`CsvWriteError`] if the writer fails.
pub fn scan_results_csv<'a, I>(records: I) -> Result<String, CsvWriteError>
where
    I: IntoIterator<Item = ExportRecord<'a>>,
{
    let mut rows: Vec<Vec<String>> = vec![EXPORT_HEADER.iter().map(ToString::to_string).collect()];
    rows.extend(records.into_iter().map(|record| {
        vec![
            record.query.to_string(),
            yes_no(record.flags.ai_presence).to_string(),
            yes_no(record.flags.brand_mentioned).to_string(),
            yes_no(record.flags.your_url_cited).to_string(),
            record.cited_urls.join(" "),
            record.note.unwrap_or_default().to_string(),
            record.captured_at.to_rfc3339_opts(SecondsFormat::Secs, true),
        ]
    }));
    write_rows(&rows)
}
