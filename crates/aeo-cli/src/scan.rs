//! `aeo-cli scan` handlers.

use std::path::Path;

use aeo_core::{synthesize_results, ScanSummary, SynthesisProfile, SynthesizedResult};
use aeo_db::ScanResultRow;
use anyhow::Context;
use rand::rngs::StdRng;
use rand::SeedableRng;
use uuid::Uuid;

use crate::queries::load_project;

fn synthesize(domain: &str, count: usize, seed: Option<u64>) -> Vec<SynthesizedResult> {
    let profile = SynthesisProfile::default();
    match seed {
        Some(seed) => synthesize_results(&mut StdRng::seed_from_u64(seed), domain, &profile, count),
        None => synthesize_results(&mut rand::rng(), domain, &profile, count),
    }
}

async fn load_scan(pool: &sqlx::PgPool, scan: Uuid) -> anyhow::Result<aeo_db::ScanRow> {
    aeo_db::get_scan_by_public_id(pool, scan)
        .await?
        .ok_or_else(|| anyhow::anyhow!("scan {scan} not found"))
}

pub(crate) fn summary_lines(summary: &ScanSummary) -> [String; 3] {
    [
        format!(
            "AI presence:    {:>3}% ({}/{})",
            summary.ai_presence_percent(),
            summary.ai_presence_count,
            summary.total
        ),
        format!(
            "Brand mention:  {:>3}% ({}/{})",
            summary.brand_mention_percent(),
            summary.brand_mention_count,
            summary.total
        ),
        format!(
            "Your URL cited: {:>3}% ({}/{})",
            summary.url_cited_percent(),
            summary.url_cited_count,
            summary.total
        ),
    ]
}

/// Run a mock scan over every query of `query_set`, which must belong to
/// `project`.
pub(crate) async fn run_scan(
    pool: &sqlx::PgPool,
    project: Uuid,
    query_set: Uuid,
    seed: Option<u64>,
) -> anyhow::Result<()> {
    let project = load_project(pool, project).await?;
    let set = aeo_db::get_query_set_for_project(pool, project.id, query_set)
        .await?
        .ok_or_else(|| anyhow::anyhow!("query set {query_set} not found in this project"))?;

    let scan = aeo_db::run_mock_scan(pool, &set, |count| {
        synthesize(&project.domain, count, seed)
    })
    .await?
    .ok_or_else(|| anyhow::anyhow!("query set {query_set} has no queries"))?;

    let results = aeo_db::list_scan_results(pool, scan.id).await?;
    let summary = ScanSummary::tally(results.iter().map(ScanResultRow::flags));

    println!("scan {} ({}) over '{}'", scan.public_id, scan.status, set.name);
    for line in summary_lines(&summary) {
        println!("  {line}");
    }
    Ok(())
}

pub(crate) async fn run_show(pool: &sqlx::PgPool, scan: Uuid) -> anyhow::Result<()> {
    let scan = load_scan(pool, scan).await?;
    let results = aeo_db::list_scan_results(pool, scan.id).await?;
    let summary = ScanSummary::tally(results.iter().map(ScanResultRow::flags));

    println!(
        "scan {} · {} · {}",
        scan.public_id, scan.query_set_name, scan.status
    );
    for line in summary_lines(&summary) {
        println!("  {line}");
    }
    for result in &results {
        let urls = if result.cited_urls.is_empty() {
            "-".to_string()
        } else {
            result.cited_urls.join(", ")
        };
        println!(
            "- {} | presence={} mention={} cited={} | {urls}",
            result.query_text, result.ai_presence, result.brand_mentioned, result.your_url_cited
        );
    }
    Ok(())
}

pub(crate) async fn run_export(
    pool: &sqlx::PgPool,
    scan: Uuid,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let scan = load_scan(pool, scan).await?;
    let results = aeo_db::list_scan_results(pool, scan.id).await?;
    let csv = aeo_core::scan_results_csv(results.iter().map(ScanResultRow::export_record))?;

    match output {
        Some(path) => {
            std::fs::write(path, csv)
                .with_context(|| format!("failed to write {}", path.display()))?;
            tracing::info!(path = %path.display(), rows = results.len(), "scan exported");
        }
        None => print!("{csv}"),
    }
    Ok(())
}
