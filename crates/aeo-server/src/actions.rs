//! Operations shared by the HTML pages and the JSON API.

use aeo_core::{synthesize_results, validate_upload, ImportError, ScanSummary, SynthesisProfile};
use aeo_db::{DbError, ProjectRow, QuerySetRow, ScanResultRow, ScanRow};
use chrono::NaiveDate;
use sqlx::PgPool;
use thiserror::Error;
use uuid::Uuid;

/// Failure of a user-initiated action. `Display` is the message shown to
/// the user for everything except [`ActionError::Db`].
#[derive(Debug, Error)]
pub enum ActionError {
    #[error("Project not found.")]
    ProjectNotFound,
    #[error("Query set not found.")]
    QuerySetNotFound,
    #[error("Scan not found.")]
    ScanNotFound,
    #[error("No queries in this query set.")]
    EmptyQuerySet,
    #[error(transparent)]
    Import(#[from] ImportError),
    #[error(transparent)]
    Db(#[from] DbError),
}

/// Looks up a project by the id segment of a URL. A malformed id is
/// treated the same as an unknown one.
pub async fn find_project(pool: &PgPool, raw_id: &str) -> Result<ProjectRow, ActionError> {
    let Ok(public_id) = Uuid::parse_str(raw_id) else {
        return Err(ActionError::ProjectNotFound);
    };
    aeo_db::get_project_by_public_id(pool, public_id)
        .await?
        .ok_or(ActionError::ProjectNotFound)
}

pub async fn find_query_set(
    pool: &PgPool,
    project: &ProjectRow,
    raw_id: &str,
) -> Result<QuerySetRow, ActionError> {
    let Ok(public_id) = Uuid::parse_str(raw_id) else {
        return Err(ActionError::QuerySetNotFound);
    };
    aeo_db::get_query_set_for_project(pool, project.id, public_id)
        .await?
        .ok_or(ActionError::QuerySetNotFound)
}

pub async fn find_scan(
    pool: &PgPool,
    project: &ProjectRow,
    raw_id: &str,
) -> Result<ScanRow, ActionError> {
    let Ok(public_id) = Uuid::parse_str(raw_id) else {
        return Err(ActionError::ScanNotFound);
    };
    aeo_db::get_scan_for_project(pool, project.id, public_id)
        .await?
        .ok_or(ActionError::ScanNotFound)
}

/// Validates CSV text and stores it as a new query set of `project`.
pub async fn import_queries(
    pool: &PgPool,
    project: &ProjectRow,
    csv_text: &str,
    name: Option<&str>,
    max_rows: usize,
    today: NaiveDate,
) -> Result<QuerySetRow, ActionError> {
    let queries = validate_upload(csv_text, max_rows)?;
    let query_set = aeo_db::import_query_set(pool, project, name, &queries, today).await?;
    Ok(query_set)
}

/// Runs a mock scan over every query of `query_set` and stores it as done.
pub async fn run_scan(
    pool: &PgPool,
    project: &ProjectRow,
    query_set: &QuerySetRow,
) -> Result<ScanRow, ActionError> {
    let profile = SynthesisProfile::default();
    aeo_db::run_mock_scan(pool, query_set, |count| {
        synthesize_results(&mut rand::rng(), &project.domain, &profile, count)
    })
    .await?
    .ok_or(ActionError::EmptyQuerySet)
}

/// Results of a scan together with their aggregate percentages.
pub async fn scan_report(
    pool: &PgPool,
    scan: &ScanRow,
) -> Result<(ScanSummary, Vec<ScanResultRow>), ActionError> {
    let results = aeo_db::list_scan_results(pool, scan.id).await?;
    let summary = ScanSummary::tally(results.iter().map(ScanResultRow::flags));
    Ok((summary, results))
}
