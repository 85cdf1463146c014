//! Database operations for `users` and `workspaces`.

use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::DbError;

/// Owner recorded for the workspace created on first use.
pub const SYSTEM_USER_EMAIL: &str = "system@local.dev";
const SYSTEM_USER_NAME: &str = "System";
const DEFAULT_WORKSPACE_NAME: &str = "Default Workspace";

/// Insert a user by email, or return the existing one's id.
///
/// An existing user's name is left untouched.
pub(crate) async fn upsert_user(
    conn: &mut PgConnection,
    email: &str,
    name: &str,
) -> Result<i64, DbError> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO users (email, name) VALUES ($1, $2) \
         ON CONFLICT (email) DO UPDATE SET updated_at = NOW() \
         RETURNING id",
    )
    .bind(email)
    .bind(name)
    .fetch_one(conn)
    .await?;

    Ok(id)
}

/// Return the id of the workspace `name` owned by `owner_user_id`, creating it
/// if needed.
pub(crate) async fn find_or_create_workspace(
    conn: &mut PgConnection,
    owner_user_id: i64,
    name: &str,
) -> Result<i64, DbError> {
    let id = sqlx::query_scalar::<_, i64>(
        "INSERT INTO workspaces (public_id, name, owner_user_id) VALUES ($1, $2, $3) \
         ON CONFLICT (owner_user_id, name) DO UPDATE SET name = EXCLUDED.name \
         RETURNING id",
    )
    .bind(Uuid::new_v4())
    .bind(name)
    .bind(owner_user_id)
    .fetch_one(conn)
    .await?;

    Ok(id)
}

/// Returns the workspace new projects are created in.
///
/// Uses the oldest existing workspace; on an empty database the system user
/// and a `Default Workspace` are created in one transaction.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any query fails.
pub async fn ensure_default_workspace(pool: &PgPool) -> Result<i64, DbError> {
    let existing =
        sqlx::query_scalar::<_, i64>("SELECT id FROM workspaces ORDER BY created_at, id LIMIT 1")
            .fetch_optional(pool)
            .await?;

    if let Some(id) = existing {
        return Ok(id);
    }

    let mut tx = pool.begin().await?;
    let owner_id = upsert_user(&mut tx, SYSTEM_USER_EMAIL, SYSTEM_USER_NAME).await?;
    let workspace_id = find_or_create_workspace(&mut tx, owner_id, DEFAULT_WORKSPACE_NAME).await?;
    tx.commit().await?;

    tracing::info!(workspace_id, "created default workspace");
    Ok(workspace_id)
}
