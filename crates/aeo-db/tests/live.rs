//! Live integration tests for aeo-db using `#[sqlx::test]`.
//!
//! Each test gets a fresh, fully-migrated Postgres database spun up by the
//! sqlx test harness. The `migrations` path is relative to the crate root
//! (`crates/aeo-db/`), so `"../../migrations"` resolves to the workspace
//! migration directory.

use std::str::FromStr;

use aeo_core::{Device, ImportedQuery, NewProject, ScanStatus, SeedFile, SynthesizedResult};
use aeo_db::{
    create_project, create_query_set_with_queries, ensure_default_workspace,
    find_project_by_name, get_project_by_public_id, get_query_set_by_public_id,
    get_query_set_for_project, import_query_set, run_mock_scan,
    get_scan_by_public_id, get_scan_for_project, list_projects, list_queries_for_query_set,
    list_queries_for_query_sets, list_query_sets_for_project, list_scan_results,
    list_scans_for_query_set, record_completed_scan, seed_demo, NewScanResult, ProjectRow,
    QuerySetRow,
};
use chrono::{Duration, Utc};
use rust_decimal::Decimal;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn insert_test_project(pool: &sqlx::PgPool, name: &str, domain: &str) -> ProjectRow {
    let workspace_id = ensure_default_workspace(pool)
        .await
        .expect("ensure_default_workspace failed");
    let project = NewProject::parse(name, domain, "US", "en").expect("valid project");
    create_project(pool, workspace_id, &project)
        .await
        .unwrap_or_else(|e| panic!("create_project failed for '{name}': {e}"))
}

fn imported(text: &str) -> ImportedQuery {
    ImportedQuery {
        text: text.to_string(),
        intent: None,
        weight: None,
    }
}

async fn insert_test_query_set(
    pool: &sqlx::PgPool,
    project: &ProjectRow,
    texts: &[&str],
) -> QuerySetRow {
    let queries: Vec<ImportedQuery> = texts.iter().map(|t| imported(t)).collect();
    create_query_set_with_queries(
        pool,
        project.id,
        "CSV import 1/2/2026",
        &project.locale_country,
        Device::Desktop,
        &queries,
    )
    .await
    .expect("create_query_set_with_queries failed")
}

fn present_result(cited: bool, offset_secs: i64) -> SynthesizedResult {
    SynthesizedResult {
        ai_presence: true,
        brand_mentioned: !cited,
        your_url_cited: cited,
        cited_urls: vec!["https://industryreport.com/aeo-trends".to_string()],
        note: "AI answer detected (mock)".to_string(),
        captured_at: Utc::now() + Duration::seconds(offset_secs),
    }
}

fn absent_result(offset_secs: i64) -> SynthesizedResult {
    SynthesizedResult {
        ai_presence: false,
        brand_mentioned: false,
        your_url_cited: false,
        cited_urls: Vec::new(),
        note: "AI answer absent (mock)".to_string(),
        captured_at: Utc::now() + Duration::seconds(offset_secs),
    }
}

// ---------------------------------------------------------------------------
// Section 1: Workspaces and projects
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn default_workspace_is_created_once(pool: sqlx::PgPool) {
    let first = ensure_default_workspace(&pool).await.expect("first call");
    let second = ensure_default_workspace(&pool).await.expect("second call");
    assert_eq!(first, second);

    let owner: String = sqlx::query_scalar(
        "SELECT u.email FROM workspaces w JOIN users u ON u.id = w.owner_user_id WHERE w.id = $1",
    )
    .bind(first)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(owner, aeo_db::SYSTEM_USER_EMAIL);
}

#[sqlx::test(migrations = "../../migrations")]
async fn created_project_is_readable_by_public_id(pool: sqlx::PgPool) {
    let project = insert_test_project(&pool, "Acme", "https://Acme.io/").await;

    assert_eq!(project.domain, "acme.io");
    assert_eq!(project.workspace_name, "Default Workspace");

    let fetched = get_project_by_public_id(&pool, project.public_id)
        .await
        .expect("get failed")
        .expect("project should exist");
    assert_eq!(fetched.id, project.id);
    assert_eq!(fetched.locale_label(), "EN-US");
}

#[sqlx::test(migrations = "../../migrations")]
async fn unknown_project_public_id_returns_none(pool: sqlx::PgPool) {
    let fetched = get_project_by_public_id(&pool, uuid::Uuid::new_v4())
        .await
        .expect("get failed");
    assert!(fetched.is_none());
}

#[sqlx::test(migrations = "../../migrations")]
async fn list_projects_is_newest_first_and_limited(pool: sqlx::PgPool) {
    let first = insert_test_project(&pool, "First", "first.com").await;
    let second = insert_test_project(&pool, "Second", "second.com").await;
    let third = insert_test_project(&pool, "Third", "third.com").await;

    let rows = list_projects(&pool, 2).await.expect("list failed");
    let ids: Vec<i64> = rows.iter().map(|r| r.id).collect();
    assert_eq!(ids, vec![third.id, second.id]);
    assert!(!ids.contains(&first.id));
}

// ---------------------------------------------------------------------------
// Section 2: Query sets
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn query_set_stores_queries_in_upload_order(pool: sqlx::PgPool) {
    let project = insert_test_project(&pool, "Acme", "acme.io").await;
    let mut weighted = imported("zeta query");
    weighted.intent = Some("commercial".to_string());
    weighted.weight = Some(Decimal::from_str("2.5").unwrap());

    let qs = create_query_set_with_queries(
        &pool,
        project.id,
        "CSV import 1/2/2026",
        "US",
        Device::Desktop,
        &[weighted, imported("alpha query")],
    )
    .await
    .expect("create failed");
    assert_eq!(qs.query_count, 2);

    let queries = list_queries_for_query_set(&pool, qs.id)
        .await
        .expect("list failed");
    let texts: Vec<&str> = queries.iter().map(|q| q.text.as_str()).collect();
    assert_eq!(texts, vec!["zeta query", "alpha query"]);
    assert_eq!(queries[0].intent.as_deref(), Some("commercial"));
    assert_eq!(queries[0].weight, Some(Decimal::from_str("2.5").unwrap()));
    assert!(queries.iter().all(|q| q.country == "US" && q.device == "desktop"));
}

#[sqlx::test(migrations = "../../migrations")]
async fn validated_weights_are_stored_exactly(pool: sqlx::PgPool) {
    let project = insert_test_project(&pool, "Acme", "acme.io").await;
    let queries = aeo_core::validate_upload(
        "query,priority\nbig,123456789012345678\nfine,0.1234567\ntiny,1e-20\n",
        aeo_core::DEFAULT_MAX_ROWS,
    )
    .expect("upload should validate");
    let expected: Vec<Option<Decimal>> = queries.iter().map(|q| q.weight).collect();
    assert!(expected.iter().all(Option::is_some));

    let qs = create_query_set_with_queries(
        &pool,
        project.id,
        "CSV import 1/2/2026",
        "US",
        Device::Desktop,
        &queries,
    )
    .await
    .expect("large and precise weights should be storable");

    let stored: Vec<Option<Decimal>> = list_queries_for_query_set(&pool, qs.id)
        .await
        .expect("list failed")
        .into_iter()
        .map(|q| q.weight)
        .collect();
    assert_eq!(stored, expected);
    assert_eq!(
        stored[1].map(|w| w.to_string()).as_deref(),
        Some("0.1234567")
    );
}

#[sqlx::test(migrations = "../../migrations")]
async fn failed_query_insert_rolls_back_the_set(pool: sqlx::PgPool) {
    let project = insert_test_project(&pool, "Acme", "acme.io").await;

    // Empty text violates the column check.
    let result = create_query_set_with_queries(
        &pool,
        project.id,
        "broken",
        "US",
        Device::Desktop,
        &[imported("fine"), imported("")],
    )
    .await;
    assert!(result.is_err());

    let sets = list_query_sets_for_project(&pool, project.id)
        .await
        .expect("list failed");
    assert!(sets.is_empty(), "no partial query set should survive");
}

#[sqlx::test(migrations = "../../migrations")]
async fn query_set_lookup_is_scoped_to_project(pool: sqlx::PgPool) {
    let owner = insert_test_project(&pool, "Owner", "owner.com").await;
    let other = insert_test_project(&pool, "Other", "other.com").await;
    let qs = insert_test_query_set(&pool, &owner, &["q1"]).await;

    let found = get_query_set_for_project(&pool, owner.id, qs.public_id)
        .await
        .expect("get failed");
    assert!(found.is_some());

    let foreign = get_query_set_for_project(&pool, other.id, qs.public_id)
        .await
        .expect("get failed");
    assert!(foreign.is_none());

    let unscoped = get_query_set_by_public_id(&pool, qs.public_id)
        .await
        .expect("get failed")
        .expect("query set should exist");
    assert_eq!(unscoped.id, qs.id);
    assert_eq!(unscoped.project_id, owner.id);
}

#[sqlx::test(migrations = "../../migrations")]
async fn queries_for_several_sets_are_grouped(pool: sqlx::PgPool) {
    let project = insert_test_project(&pool, "Acme", "acme.io").await;
    let a = insert_test_query_set(&pool, &project, &["a1", "a2"]).await;
    let b = insert_test_query_set(&pool, &project, &["b1"]).await;

    let grouped = list_queries_for_query_sets(&pool, &[a.id, b.id])
        .await
        .expect("list failed");
    assert_eq!(grouped.get(&a.id).map(Vec::len), Some(2));
    assert_eq!(grouped.get(&b.id).map(Vec::len), Some(1));

    let none = list_queries_for_query_sets(&pool, &[])
        .await
        .expect("empty list failed");
    assert!(none.is_empty());
}

// ---------------------------------------------------------------------------
// Section 3: Scans
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn recorded_scan_is_done_with_all_results(pool: sqlx::PgPool) {
    let project = insert_test_project(&pool, "Acme", "acme.io").await;
    let qs = insert_test_query_set(&pool, &project, &["q1", "q2"]).await;
    let queries = list_queries_for_query_set(&pool, qs.id).await.unwrap();

    let synthesized = [present_result(true, 0), absent_result(1)];
    let entries: Vec<NewScanResult<'_>> = queries
        .iter()
        .zip(&synthesized)
        .map(|(q, r)| NewScanResult {
            query_id: q.id,
            result: r,
        })
        .collect();

    let started_at = Utc::now();
    let scan = record_completed_scan(&pool, qs.id, started_at, &entries)
        .await
        .expect("record failed");

    assert_eq!(scan.status, ScanStatus::Done);
    assert_eq!(scan.result_count, 2);
    assert_eq!(scan.query_set_public_id, qs.public_id);
    let finished = scan.finished_at.expect("finished_at should be set");
    assert!(finished >= scan.started_at.expect("started_at should be set"));
}

#[sqlx::test(migrations = "../../migrations")]
async fn scan_results_are_newest_first_with_query_text(pool: sqlx::PgPool) {
    let project = insert_test_project(&pool, "Acme", "acme.io").await;
    let qs = insert_test_query_set(&pool, &project, &["older", "newer"]).await;
    let queries = list_queries_for_query_set(&pool, qs.id).await.unwrap();

    let synthesized = [absent_result(0), present_result(false, 60)];
    let entries: Vec<NewScanResult<'_>> = queries
        .iter()
        .zip(&synthesized)
        .map(|(q, r)| NewScanResult {
            query_id: q.id,
            result: r,
        })
        .collect();
    let scan = record_completed_scan(&pool, qs.id, Utc::now(), &entries)
        .await
        .unwrap();

    let results = list_scan_results(&pool, scan.id).await.expect("list failed");
    let texts: Vec<&str> = results.iter().map(|r| r.query_text.as_str()).collect();
    assert_eq!(texts, vec!["newer", "older"]);
    assert!(results[0].ai_presence);
    assert!(results[1].cited_urls.is_empty());
    assert_eq!(results[1].notes.as_deref(), Some("AI answer absent (mock)"));
}

#[sqlx::test(migrations = "../../migrations")]
async fn scan_row_rejects_mentions_without_presence(pool: sqlx::PgPool) {
    let project = insert_test_project(&pool, "Acme", "acme.io").await;
    let qs = insert_test_query_set(&pool, &project, &["q1"]).await;
    let queries = list_queries_for_query_set(&pool, qs.id).await.unwrap();

    let mut inconsistent = absent_result(0);
    inconsistent.brand_mentioned = true;
    let entries = [NewScanResult {
        query_id: queries[0].id,
        result: &inconsistent,
    }];

    let err = record_completed_scan(&pool, qs.id, Utc::now(), &entries).await;
    assert!(err.is_err());

    let scans = list_scans_for_query_set(&pool, qs.id).await.unwrap();
    assert!(scans.is_empty(), "failed scan must not leave a row behind");
}

#[sqlx::test(migrations = "../../migrations")]
async fn scans_are_listed_newest_first_and_scoped(pool: sqlx::PgPool) {
    let project = insert_test_project(&pool, "Acme", "acme.io").await;
    let other = insert_test_project(&pool, "Other", "other.com").await;
    let qs = insert_test_query_set(&pool, &project, &["q1"]).await;

    let first = record_completed_scan(&pool, qs.id, Utc::now(), &[])
        .await
        .unwrap();
    let second = record_completed_scan(&pool, qs.id, Utc::now(), &[])
        .await
        .unwrap();

    let scans = list_scans_for_query_set(&pool, qs.id).await.unwrap();
    let ids: Vec<i64> = scans.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![second.id, first.id]);

    assert!(get_scan_for_project(&pool, project.id, first.public_id)
        .await
        .unwrap()
        .is_some());
    assert!(get_scan_for_project(&pool, other.id, first.public_id)
        .await
        .unwrap()
        .is_none());
    assert!(get_scan_by_public_id(&pool, first.public_id)
        .await
        .unwrap()
        .is_some());
}

// ---------------------------------------------------------------------------
// Section 4: Seed
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../migrations")]
async fn seed_demo_is_idempotent(pool: sqlx::PgPool) {
    let seed = SeedFile::default();

    let first = seed_demo(&pool, &seed).await.expect("first seed failed");
    let second = seed_demo(&pool, &seed).await.expect("second seed failed");
    assert_eq!(first, 1);
    assert_eq!(second, 0);

    let workspace_id = ensure_default_workspace(&pool).await.unwrap();
    let project = find_project_by_name(&pool, workspace_id, "Demo Project")
        .await
        .unwrap()
        .expect("seeded project should exist");
    assert_eq!(project.domain, "example.com");

    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM projects")
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(count, 1);
}

#[sqlx::test(migrations = "../../migrations")]
async fn imported_query_set_uses_project_locale_and_default_name(pool: sqlx::PgPool) {
    let workspace_id = ensure_default_workspace(&pool).await.expect("workspace");
    let project = NewProject::parse("Acme UK", "acme.co.uk", "gb", "en").expect("valid project");
    let project = create_project(&pool, workspace_id, &project)
        .await
        .expect("create project");
    let today = chrono::NaiveDate::from_ymd_opt(2026, 4, 9).expect("date");

    let qs = import_query_set(&pool, &project, Some("  "), &[imported("q1")], today)
        .await
        .expect("import failed");
    assert_eq!(qs.name, "CSV import 4/9/2026");

    let queries = list_queries_for_query_set(&pool, qs.id)
        .await
        .expect("list failed");
    assert_eq!(queries.len(), 1);
    assert_eq!(queries[0].country, "GB");
    assert_eq!(queries[0].device, "desktop");
}

#[sqlx::test(migrations = "../../migrations")]
async fn mock_scan_skips_empty_sets_and_pairs_results_in_order(pool: sqlx::PgPool) {
    let project = insert_test_project(&pool, "Acme", "acme.io").await;
    let empty = insert_test_query_set(&pool, &project, &[]).await;

    let skipped = run_mock_scan(&pool, &empty, |_| panic!("no queries to synthesize"))
        .await
        .expect("scan failed");
    assert!(skipped.is_none());
    assert!(list_scans_for_query_set(&pool, empty.id)
        .await
        .expect("list failed")
        .is_empty());

    let qs = insert_test_query_set(&pool, &project, &["first", "second"]).await;
    let scan = run_mock_scan(&pool, &qs, |count| {
        assert_eq!(count, 2);
        vec![present_result(true, 0), absent_result(-10)]
    })
    .await
    .expect("scan failed")
    .expect("scan should be recorded");
    assert_eq!(scan.status, ScanStatus::Done);
    assert_eq!(scan.result_count, 2);

    let results = list_scan_results(&pool, scan.id).await.expect("results");
    let by_text: Vec<(&str, bool)> = results
        .iter()
        .map(|r| (r.query_text.as_str(), r.ai_presence))
        .collect();
    assert_eq!(by_text, vec![("first", true), ("second", false)]);
}
