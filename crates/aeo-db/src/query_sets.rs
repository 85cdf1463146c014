//! Database operations for `query_sets` and `queries`.

use std::collections::HashMap;

use aeo_core::{default_query_set_name, Device, ImportedQuery};
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::{DbError, ProjectRow};

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from `query_sets` with the number of queries it holds.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct QuerySetRow {
    pub id: i64,
    pub public_id: Uuid,
    pub project_id: i64,
    pub name: String,
    pub query_count: i64,
    pub created_at: DateTime<Utc>,
}

/// A row from `queries`.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct SearchQueryRow {
    pub id: i64,
    pub query_set_id: i64,
    pub text: String,
    pub country: String,
    pub device: String,
    pub intent: Option<String>,
    pub weight: Option<Decimal>,
    pub created_at: DateTime<Utc>,
}

const QUERY_SET_COLUMNS: &str = "qs.id, qs.public_id, qs.project_id, qs.name, \
     (SELECT COUNT(*) FROM queries q WHERE q.query_set_id = qs.id) AS query_count, \
     qs.created_at";

const QUERY_COLUMNS: &str =
    "id, query_set_id, text, country, device, intent, weight, created_at";

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

/// Creates a query set and all of its queries in one transaction.
///
/// Every query is stored with the given `country` and `device`. If any insert
/// fails the whole batch is rolled back.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any insert fails.
pub async fn create_query_set_with_queries(
    pool: &PgPool,
    project_id: i64,
    name: &str,
    country: &str,
    device: Device,
    queries: &[ImportedQuery],
) -> Result<QuerySetRow, DbError> {
    let mut tx = pool.begin().await?;

    let (id, public_id, created_at): (i64, Uuid, DateTime<Utc>) = sqlx::query_as(
        "INSERT INTO query_sets (public_id, project_id, name) \
         VALUES ($1, $2, $3) \
         RETURNING id, public_id, created_at",
    )
    .bind(Uuid::new_v4())
    .bind(project_id)
    .bind(name)
    .fetch_one(&mut *tx)
    .await?;

    for query in queries {
        sqlx::query(
            "INSERT INTO queries (query_set_id, text, country, device, intent, weight) \
             VALUES ($1, $2, $3, $4, $5, $6)",
        )
        .bind(id)
        .bind(&query.text)
        .bind(country)
        .bind(device.as_str())
        .bind(query.intent.as_deref())
        .bind(query.weight)
        .execute(&mut *tx)
        .await?;
    }

    tx.commit().await?;

    Ok(QuerySetRow {
        id,
        public_id,
        project_id,
        name: name.to_string(),
        query_count: i64::try_from(queries.len()).unwrap_or(i64::MAX),
        created_at,
    })
}

/// Stores validated upload rows as a new query set of `project`.
///
/// Queries take the project's locale country and the desktop device. A
/// missing or blank `name` becomes the dated default for `today`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any insert fails.
pub async fn import_query_set(
    pool: &PgPool,
    project: &ProjectRow,
    name: Option<&str>,
    queries: &[ImportedQuery],
    today: NaiveDate,
) -> Result<QuerySetRow, DbError> {
    let name = query_set_name(name, today);
    let query_set = create_query_set_with_queries(
        pool,
        project.id,
        &name,
        &project.locale_country,
        Device::Desktop,
        queries,
    )
    .await?;

    tracing::info!(
        project = %project.public_id,
        query_set = %query_set.public_id,
        queries = queries.len(),
        "query set imported"
    );
    Ok(query_set)
}

fn query_set_name(name: Option<&str>, today: NaiveDate) -> String {
    name.map(str::trim)
        .filter(|n| !n.is_empty())
        .map_or_else(|| default_query_set_name(today), ToString::to_string)
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// Returns all query sets of a project, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_query_sets_for_project(
    pool: &PgPool,
    project_id: i64,
) -> Result<Vec<QuerySetRow>, DbError> {
    let sql = format!(
        "SELECT {QUERY_SET_COLUMNS} \
         FROM query_sets qs \
         WHERE qs.project_id = $1 \
         ORDER BY qs.created_at DESC, qs.id DESC"
    );

    let rows = sqlx::query_as::<_, QuerySetRow>(&sql)
        .bind(project_id)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

/// Returns the query set with `public_id` if it belongs to `project_id`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_query_set_for_project(
    pool: &PgPool,
    project_id: i64,
    public_id: Uuid,
) -> Result<Option<QuerySetRow>, DbError> {
    let sql = format!(
        "SELECT {QUERY_SET_COLUMNS} \
         FROM query_sets qs \
         WHERE qs.public_id = $1 AND qs.project_id = $2"
    );

    let row = sqlx::query_as::<_, QuerySetRow>(&sql)
        .bind(public_id)
        .bind(project_id)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

/// Returns a query set by its public id, regardless of project.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_query_set_by_public_id(
    pool: &PgPool,
    public_id: Uuid,
) -> Result<Option<QuerySetRow>, DbError> {
    let sql = format!(
        "SELECT {QUERY_SET_COLUMNS} \
         FROM query_sets qs \
         WHERE qs.public_id = $1"
    );

    let row = sqlx::query_as::<_, QuerySetRow>(&sql)
        .bind(public_id)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

/// Returns the queries of one set in upload order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_queries_for_query_set(
    pool: &PgPool,
    query_set_id: i64,
) -> Result<Vec<SearchQueryRow>, DbError> {
    let sql = format!(
        "SELECT {QUERY_COLUMNS} FROM queries \
         WHERE query_set_id = $1 \
         ORDER BY id"
    );

    let rows = sqlx::query_as::<_, SearchQueryRow>(&sql)
        .bind(query_set_id)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

/// Returns the queries of several sets, grouped by set id, each group in
/// upload order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_queries_for_query_sets(
    pool: &PgPool,
    query_set_ids: &[i64],
) -> Result<HashMap<i64, Vec<SearchQueryRow>>, DbError> {
    if query_set_ids.is_empty() {
        return Ok(HashMap::new());
    }

    let sql = format!(
        "SELECT {QUERY_COLUMNS} FROM queries \
         WHERE query_set_id = ANY($1) \
         ORDER BY query_set_id, id"
    );

    let rows = sqlx::query_as::<_, SearchQueryRow>(&sql)
        .bind(query_set_ids)
        .fetch_all(pool)
        .await?;

    let mut grouped: HashMap<i64, Vec<SearchQueryRow>> = HashMap::new();
    for row in rows {
        grouped.entry(row.query_set_id).or_default().push(row);
    }
    Ok(grouped)
}
