use aeo_core::SeedFile;
use sqlx::PgPool;
use uuid::Uuid;

use crate::workspaces::{find_or_create_workspace, upsert_user};
use crate::DbError;

/// Load demo data: the seed owner, their workspace, and each listed project.
///
/// Returns the number of projects inserted. A project whose name already
/// exists in the workspace is left untouched, so seeding twice is a no-op.
/// Everything runs inside a single transaction; if any statement fails the
/// whole batch is rolled back.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any database operation fails.
pub async fn seed_demo(pool: &PgPool, seed: &SeedFile) -> Result<usize, DbError> {
    let mut tx = pool.begin().await?;

    let owner_id = upsert_user(&mut tx, &seed.owner.email, &seed.owner.name).await?;
    let workspace_id = find_or_create_workspace(&mut tx, owner_id, &seed.workspace).await?;

    let mut inserted = 0usize;
    for entry in &seed.projects {
        let project = match entry.to_new_project() {
            Ok(project) => project,
            Err(e) => {
                tracing::warn!(project = %entry.name, error = %e, "skipping invalid seed project");
                continue;
            }
        };

        let result = sqlx::query(
            "INSERT INTO projects \
                 (public_id, workspace_id, name, domain, locale_country, locale_language) \
             SELECT $1, $2, $3, $4, $5, $6 \
             WHERE NOT EXISTS ( \
                 SELECT 1 FROM projects WHERE workspace_id = $2 AND name = $3 \
             )",
        )
        .bind(Uuid::new_v4())
        .bind(workspace_id)
        .bind(&project.name)
        .bind(&project.domain)
        .bind(&project.locale.country)
        .bind(&project.locale.language)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() > 0 {
            inserted += 1;
        }
    }

    tx.commit().await?;

    tracing::info!(
        workspace = %seed.workspace,
        inserted,
        listed = seed.projects.len(),
        "demo data seeded"
    );
    Ok(inserted)
}
