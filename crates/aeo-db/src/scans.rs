//! Database operations for `scans` and `scan_results`.

use aeo_core::{ExportRecord, ResultFlags, ScanStatus, SynthesizedResult};
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::{list_queries_for_query_set, DbError, QuerySetRow};

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from `scans`, joined with its query set and result count.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ScanRow {
    pub id: i64,
    pub public_id: Uuid,
    pub query_set_id: i64,
    pub query_set_public_id: Uuid,
    pub query_set_name: String,
    #[sqlx(try_from = "String")]
    pub status: ScanStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub result_count: i64,
    pub created_at: DateTime<Utc>,
}

/// A row from `scan_results` with the text of the query it answers.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ScanResultRow {
    pub id: i64,
    pub scan_id: i64,
    pub query_id: i64,
    pub query_text: String,
    pub ai_presence: bool,
    pub brand_mentioned: bool,
    pub your_url_cited: bool,
    pub cited_urls: Vec<String>,
    pub notes: Option<String>,
    pub captured_at: DateTime<Utc>,
}

impl ScanResultRow {
    #[must_use]
    pub fn flags(&self) -> ResultFlags {
        ResultFlags {
            ai_presence: self.ai_presence,
            brand_mentioned: self.brand_mentioned,
            your_url_cited: self.your_url_cited,
        }
    }

    #[must_use]
    pub fn export_record(&self) -> ExportRecord<'_> {
        ExportRecord {
            query: &self.query_text,
            flags: self.flags(),
            cited_urls: &self.cited_urls,
            note: self.notes.as_deref(),
            captured_at: self.captured_at,
        }
    }
}

/// A synthesized result paired with the query it was generated for.
#[derive(Debug, Clone, Copy)]
pub struct NewScanResult<'a> {
    pub query_id: i64,
    pub result: &'a SynthesizedResult,
}

const SCAN_COLUMNS: &str = "s.id, s.public_id, s.query_set_id, \
     qs.public_id AS query_set_public_id, qs.name AS query_set_name, \
     s.status, s.started_at, s.finished_at, \
     (SELECT COUNT(*) FROM scan_results r WHERE r.scan_id = s.id) AS result_count, \
     s.created_at";

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

/// Records a finished scan of `query_set_id`.
///
/// The scan row is inserted as `running`, its results are inserted, and the
/// row moves to `done` with `finished_at` set, all inside one transaction, so
/// no reader ever sees a partially written scan.
///
/// # Errors
///
/// Returns [`DbError::InvalidScanTransition`] if the scan is no longer
/// `running` when it is completed, or [`DbError::Sqlx`] if any statement fails.
pub async fn record_completed_scan(
    pool: &PgPool,
    query_set_id: i64,
    started_at: DateTime<Utc>,
    results: &[NewScanResult<'_>],
) -> Result<ScanRow, DbError> {
    let mut tx = pool.begin().await?;

    let scan_id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO scans (public_id, query_set_id, status, started_at) \
         VALUES ($1, $2, $3, $4) \
         RETURNING id",
    )
    .bind(Uuid::new_v4())
    .bind(query_set_id)
    .bind(ScanStatus::Running.as_str())
    .bind(started_at)
    .fetch_one(&mut *tx)
    .await?;

    for entry in results {
        let result = entry.result;
        sqlx::query(
            "INSERT INTO scan_results \
                 (scan_id, query_id, ai_presence, brand_mentioned, your_url_cited, \
                  cited_urls, notes, captured_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
        )
        .bind(scan_id)
        .bind(entry.query_id)
        .bind(result.ai_presence)
        .bind(result.brand_mentioned)
        .bind(result.your_url_cited)
        .bind(&result.cited_urls)
        .bind(&result.note)
        .bind(result.captured_at)
        .execute(&mut *tx)
        .await?;
    }

    let completed = sqlx::query(
        "UPDATE scans \
         SET status = $2, finished_at = clock_timestamp() \
         WHERE id = $1 AND status = $3",
    )
    .bind(scan_id)
    .bind(ScanStatus::Done.as_str())
    .bind(ScanStatus::Running.as_str())
    .execute(&mut *tx)
    .await?;

    if completed.rows_affected() == 0 {
        return Err(DbError::InvalidScanTransition {
            id: scan_id,
            expected_status: ScanStatus::Running.as_str(),
        });
    }

    let sql = format!(
        "SELECT {SCAN_COLUMNS} \
         FROM scans s JOIN query_sets qs ON qs.id = s.query_set_id \
         WHERE s.id = $1"
    );
    let row = sqlx::query_as::<_, ScanRow>(&sql)
        .bind(scan_id)
        .fetch_one(&mut *tx)
        .await?;

    tx.commit().await?;

    tracing::info!(
        scan_id,
        query_set_id,
        results = results.len(),
        "scan recorded"
    );
    Ok(row)
}

/// Runs a mock scan over every query of `query_set` and records it as done.
///
/// `synthesize` receives the number of queries and must return one result
/// per query, in query order. It is called before any further await, so it
/// may use a thread-local generator. Returns `None` without writing anything
/// when the set has no queries.
///
/// # Errors
///
/// Returns [`DbError`] if reading the queries or recording the scan fails.
pub async fn run_mock_scan<F>(
    pool: &PgPool,
    query_set: &QuerySetRow,
    synthesize: F,
) -> Result<Option<ScanRow>, DbError>
where
    F: FnOnce(usize) -> Vec<SynthesizedResult>,
{
    let queries = list_queries_for_query_set(pool, query_set.id).await?;
    if queries.is_empty() {
        return Ok(None);
    }

    let started_at = Utc::now();
    let results = synthesize(queries.len());
    let entries: Vec<NewScanResult<'_>> = queries
        .iter()
        .zip(&results)
        .map(|(query, result)| NewScanResult {
            query_id: query.id,
            result,
        })
        .collect();

    let scan = record_completed_scan(pool, query_set.id, started_at, &entries).await?;
    Ok(Some(scan))
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// Returns all scans of a query set, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_scans_for_query_set(
    pool: &PgPool,
    query_set_id: i64,
) -> Result<Vec<ScanRow>, DbError> {
    let sql = format!(
        "SELECT {SCAN_COLUMNS} \
         FROM scans s JOIN query_sets qs ON qs.id = s.query_set_id \
         WHERE s.query_set_id = $1 \
         ORDER BY s.created_at DESC, s.id DESC"
    );

    let rows = sqlx::query_as::<_, ScanRow>(&sql)
        .bind(query_set_id)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

/// Returns the scan with `public_id` if it belongs to a query set of
/// `project_id`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_scan_for_project(
    pool: &PgPool,
    project_id: i64,
    public_id: Uuid,
) -> Result<Option<ScanRow>, DbError> {
    let sql = format!(
        "SELECT {SCAN_COLUMNS} \
         FROM scans s JOIN query_sets qs ON qs.id = s.query_set_id \
         WHERE s.public_id = $1 AND qs.project_id = $2"
    );

    let row = sqlx::query_as::<_, ScanRow>(&sql)
        .bind(public_id)
        .bind(project_id)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

/// Returns a scan by its public id, regardless of project.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_scan_by_public_id(
    pool: &PgPool,
    public_id: Uuid,
) -> Result<Option<ScanRow>, DbError> {
    let sql = format!(
        "SELECT {SCAN_COLUMNS} \
         FROM scans s JOIN query_sets qs ON qs.id = s.query_set_id \
         WHERE s.public_id = $1"
    );

    let row = sqlx::query_as::<_, ScanRow>(&sql)
        .bind(public_id)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

/// Returns the results of a scan, most recently captured first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_scan_results(pool: &PgPool, scan_id: i64) -> Result<Vec<ScanResultRow>, DbError> {
    let rows = sqlx::query_as::<_, ScanResultRow>(
        "SELECT r.id, r.scan_id, r.query_id, q.text AS query_text, \
                r.ai_presence, r.brand_mentioned, r.your_url_cited, \
                r.cited_urls, r.notes, r.captured_at \
         FROM scan_results r \
         JOIN queries q ON q.id = r.query_id \
         WHERE r.scan_id = $1 \
         ORDER BY r.captured_at DESC, r.id DESC",
    )
    .bind(scan_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
