//! Database operations for the `projects` table.

use aeo_core::NewProject;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row type
// ---------------------------------------------------------------------------

/// A row from `projects`, joined with its workspace name.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProjectRow {
    pub id: i64,
    pub public_id: Uuid,
    pub workspace_id: i64,
    pub workspace_name: String,
    pub name: String,
    pub domain: String,
    pub locale_country: String,
    pub locale_language: String,
    pub created_at: DateTime<Utc>,
}

impl ProjectRow {
    /// Locale label such as `EN-US`.
    #[must_use]
    pub fn locale_label(&self) -> String {
        aeo_core::locale_label(&self.locale_language, &self.locale_country)
    }
}

const PROJECT_COLUMNS: &str = "p.id, p.public_id, p.workspace_id, w.name AS workspace_name, \
     p.name, p.domain, p.locale_country, p.locale_language, p.created_at";

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Inserts a project into `workspace_id` and returns it.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails (including an unknown workspace).
pub async fn create_project(
    pool: &PgPool,
    workspace_id: i64,
    project: &NewProject,
) -> Result<ProjectRow, DbError> {
    let sql = format!(
        "WITH p AS ( \
             INSERT INTO projects (public_id, workspace_id, name, domain, locale_country, locale_language) \
             VALUES ($1, $2, $3, $4, $5, $6) \
             RETURNING * \
         ) \
         SELECT {PROJECT_COLUMNS} FROM p JOIN workspaces w ON w.id = p.workspace_id"
    );

    let row = sqlx::query_as::<_, ProjectRow>(&sql)
        .bind(Uuid::new_v4())
        .bind(workspace_id)
        .bind(&project.name)
        .bind(&project.domain)
        .bind(&project.locale.country)
        .bind(&project.locale.language)
        .fetch_one(pool)
        .await?;

    Ok(row)
}

/// Returns the most recent `limit` projects, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_projects(pool: &PgPool, limit: i64) -> Result<Vec<ProjectRow>, DbError> {
    let sql = format!(
        "SELECT {PROJECT_COLUMNS} \
         FROM projects p JOIN workspaces w ON w.id = p.workspace_id \
         ORDER BY p.created_at DESC, p.id DESC \
         LIMIT $1"
    );

    let rows = sqlx::query_as::<_, ProjectRow>(&sql)
        .bind(limit)
        .fetch_all(pool)
        .await?;

    Ok(rows)
}

/// Returns a project by its public id, or `None` if not found.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_project_by_public_id(
    pool: &PgPool,
    public_id: Uuid,
) -> Result<Option<ProjectRow>, DbError> {
    let sql = format!(
        "SELECT {PROJECT_COLUMNS} \
         FROM projects p JOIN workspaces w ON w.id = p.workspace_id \
         WHERE p.public_id = $1"
    );

    let row = sqlx::query_as::<_, ProjectRow>(&sql)
        .bind(public_id)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}

/// Returns the project named `name` in `workspace_id`, or `None`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn find_project_by_name(
    pool: &PgPool,
    workspace_id: i64,
    name: &str,
) -> Result<Option<ProjectRow>, DbError> {
    let sql = format!(
        "SELECT {PROJECT_COLUMNS} \
         FROM projects p JOIN workspaces w ON w.id = p.workspace_id \
         WHERE p.workspace_id = $1 AND p.name = $2 \
         ORDER BY p.id \
         LIMIT 1"
    );

    let row = sqlx::query_as::<_, ProjectRow>(&sql)
        .bind(workspace_id)
        .bind(name)
        .fetch_optional(pool)
        .await?;

    Ok(row)
}
