//! `aeo-cli queries` handlers.

use std::path::Path;

use aeo_core::{decode_upload, validate_upload, AppConfig};
use anyhow::Context;
use chrono::Utc;
use uuid::Uuid;

pub(crate) async fn load_project(
    pool: &sqlx::PgPool,
    project: Uuid,
) -> anyhow::Result<aeo_db::ProjectRow> {
    aeo_db::get_project_by_public_id(pool, project)
        .await?
        .ok_or_else(|| anyhow::anyhow!("project {project} not found"))
}

/// Import a CSV file into a new query set of `project`.
///
/// Uses the same validation and storage as the web upload, including the
/// configured row cap.
pub(crate) async fn run_import(
    pool: &sqlx::PgPool,
    config: &AppConfig,
    project: Uuid,
    file: &Path,
    name: Option<&str>,
) -> anyhow::Result<()> {
    let project = load_project(pool, project).await?;
    let bytes = std::fs::read(file).with_context(|| format!("failed to read {}", file.display()))?;
    let text = decode_upload(&bytes)?;

    let queries = validate_upload(text, config.csv_max_rows)?;
    let set =
        aeo_db::import_query_set(pool, &project, name, &queries, Utc::now().date_naive()).await?;

    println!(
        "imported {} queries into '{}' ({})",
        set.query_count, set.name, set.public_id
    );
    Ok(())
}
