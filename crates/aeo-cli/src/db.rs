//! `aeo-cli db` handlers.

use std::path::Path;

pub(crate) async fn run_ping(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    aeo_db::health_check(pool).await?;
    println!("database: ok");
    Ok(())
}

pub(crate) async fn run_migrate(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let applied = aeo_db::run_migrations(pool).await?;
    println!("applied {applied} migration(s)");
    Ok(())
}

/// Apply pending migrations, then load the seed file.
///
/// # Errors
///
/// Returns an error if the seed file is missing or invalid, or if any
/// database write fails.
pub(crate) async fn run_seed(pool: &sqlx::PgPool, path: &Path) -> anyhow::Result<()> {
    let seed = aeo_core::load_seed(path)?;
    aeo_db::run_migrations(pool).await?;

    let inserted = aeo_db::seed_demo(pool, &seed).await?;
    println!(
        "seeded workspace '{}': {inserted} new project(s), {} already present",
        seed.workspace,
        seed.projects.len().saturating_sub(inserted)
    );
    Ok(())
}
