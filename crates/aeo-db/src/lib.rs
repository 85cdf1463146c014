//! Postgres persistence for workspaces, projects, query sets and scans.

use std::time::Duration;

use sqlx::{postgres::PgPoolOptions, PgPool};
use thiserror::Error;

pub mod projects;
pub mod query_sets;
pub mod scans;
pub mod seed;
pub mod workspaces;

pub use projects::{
    create_project, find_project_by_name, get_project_by_public_id, list_projects, ProjectRow,
};
pub use query_sets::{
    create_query_set_with_queries, get_query_set_by_public_id, get_query_set_for_project,
    import_query_set, list_queries_for_query_set, list_queries_for_query_sets,
    list_query_sets_for_project, QuerySetRow, SearchQueryRow,
};
pub use scans::{
    get_scan_by_public_id, get_scan_for_project, list_scan_results, list_scans_for_query_set,
    record_completed_scan, run_mock_scan, NewScanResult, ScanResultRow, ScanRow,
};
pub use seed::seed_demo;
pub use workspaces::{ensure_default_workspace, SYSTEM_USER_EMAIL};

// Relative to crates/aeo-db/Cargo.toml.
static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!("../../migrations");

#[derive(Debug, Error)]
pub enum DbError {
    #[error("scan {id} is not in '{expected_status}' status")]
    InvalidScanTransition {
        id: i64,
        expected_status: &'static str,
    },
    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
    #[error(transparent)]
    Migration(#[from] sqlx::migrate::MigrateError),
}

/// Connection limits for the shared pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: Duration,
}

impl PoolConfig {
    #[must_use]
    pub fn from_app_config(config: &aeo_core::AppConfig) -> Self {
        Self {
            max_connections: config.db_max_connections,
            min_connections: config.db_min_connections,
            acquire_timeout: Duration::from_secs(config.db_acquire_timeout_secs),
        }
    }
}

/// Open a pool against `database_url`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if no connection can be established.
pub async fn connect_pool(database_url: &str, config: PoolConfig) -> Result<PgPool, DbError> {
    let pool = PgPoolOptions::new()
        .max_connections(config.max_connections)
        .min_connections(config.min_connections)
        .acquire_timeout(config.acquire_timeout)
        .connect(database_url)
        .await?;
    Ok(pool)
}

/// Apply pending migrations and return how many ran.
///
/// # Errors
///
/// Returns [`DbError::Migration`] if a migration fails.
pub async fn run_migrations(pool: &PgPool) -> Result<usize, DbError> {
    let before = applied_migrations(pool).await;
    MIGRATOR.run(pool).await?;
    let after = applied_migrations(pool).await;
    Ok(after.saturating_sub(before))
}

// The bookkeeping table is missing on a fresh database, which counts as zero.
async fn applied_migrations(pool: &PgPool) -> usize {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM _sqlx_migrations WHERE success")
        .fetch_one(pool)
        .await
        .ok()
        .and_then(|n| usize::try_from(n).ok())
        .unwrap_or(0)
}

/// Round-trip a trivial query to prove the pool can reach the database.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn health_check(pool: &PgPool) -> Result<(), DbError> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}
