use super::*;
use axum::body::{to_bytes, Body};
use axum::http::Request;
use tower::ServiceExt;

async fn send(pool: &sqlx::PgPool, request: Request<Body>) -> (StatusCode, serde_json::Value) {
    let app = build_app(AppState::with_defaults(pool.clone()));
    let response = app.oneshot(request).await.expect("response");
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body bytes");
    let json = serde_json::from_slice(&body).unwrap_or(serde_json::Value::Null);
    (status, json)
}

fn get_request(uri: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .body(Body::empty())
        .expect("request")
}

fn post_json(uri: &str, body: &serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request")
}

async fn create_demo_project(pool: &sqlx::PgPool) -> String {
    let (status, json) = send(
        pool,
        post_json(
            "/api/v1/projects",
            &serde_json::json!({
                "name": "Acme",
                "domain": "https://www.Acme.io/pricing",
                "locale_country": "gb",
                "locale_language": "EN",
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create project: {json}");
    json["data"]["project_id"]
        .as_str()
        .expect("project id")
        .to_string()
}

#[test]
fn normalize_limit_applies_defaults_and_bounds() {
    assert_eq!(normalize_limit(None), 50);
    assert_eq!(normalize_limit(Some(0)), 1);
    assert_eq!(normalize_limit(Some(1_000)), 200);
    assert_eq!(normalize_limit(Some(25)), 25);
}

#[test]
fn api_error_validation_error_maps_to_bad_request() {
    let response = ApiError::new("req-1", "validation_error", "invalid input").into_response();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[test]
fn unknown_error_codes_map_to_internal_error() {
    let not_found = ApiError::new("req-1", "not_found", "missing").into_response();
    assert_eq!(not_found.status(), StatusCode::NOT_FOUND);

    for code in ["internal_error", "conflict"] {
        let response = ApiError::new("req-1", code, "boom").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR, "{code}");
    }
}

#[test]
fn action_errors_map_to_api_codes() {
    let not_found = map_action_error("r".into(), ActionError::QuerySetNotFound);
    assert_eq!(not_found.error.code, "not_found");
    assert_eq!(not_found.error.message, "Query set not found.");

    let empty = map_action_error("r".into(), ActionError::EmptyQuerySet);
    assert_eq!(empty.error.code, "validation_error");

    let import = map_action_error("r".into(), ActionError::Import(aeo_core::ImportError::Empty));
    assert_eq!(import.error.message, "CSV file is empty.");
}

#[sqlx::test(migrations = "../../migrations")]
async fn health_reports_database_ok(pool: sqlx::PgPool) {
    let (status, json) = send(&pool, get_request("/api/v1/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["status"], "ok");
    assert!(json["meta"]["request_id"].is_string());
}

#[sqlx::test(migrations = "../../migrations")]
async fn created_project_is_normalized_and_listed(pool: sqlx::PgPool) {
    let id = create_demo_project(&pool).await;

    let (status, json) = send(&pool, get_request(&format!("/api/v1/projects/{id}"))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"]["domain"], "www.acme.io");
    assert_eq!(json["data"]["locale"], "EN-GB");
    assert_eq!(json["data"]["workspace"], "Default Workspace");

    let (status, json) = send(&pool, get_request("/api/v1/projects")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"].as_array().map(Vec::len), Some(1));
}

#[sqlx::test(migrations = "../../migrations")]
async fn invalid_project_is_rejected(pool: sqlx::PgPool) {
    let (status, json) = send(
        &pool,
        post_json(
            "/api/v1/projects",
            &serde_json::json!({ "name": "Acme", "domain": "not a domain" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["code"], "validation_error");
}

#[sqlx::test(migrations = "../../migrations")]
async fn unknown_project_returns_404(pool: sqlx::PgPool) {
    let (status, _) = send(&pool, get_request("/api/v1/projects/not-a-uuid")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let uri = format!("/api/v1/projects/{}", uuid::Uuid::new_v4());
    let (status, json) = send(&pool, get_request(&uri)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"]["message"], "Project not found.");
}

#[sqlx::test(migrations = "../../migrations")]
async fn query_set_upload_validates_csv(pool: sqlx::PgPool) {
    let id = create_demo_project(&pool).await;
    let uri = format!("/api/v1/projects/{id}/query-sets");

    let (status, json) = send(
        &pool,
        post_json(&uri, &serde_json::json!({ "csv": "query,intent\n" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(json["error"]["message"], "CSV file has no rows.");

    let (status, json) = send(
        &pool,
        post_json(
            &uri,
            &serde_json::json!({ "csv": "query,intent,priority\nbest crm,commercial,2\n,x,1\n" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        json["error"]["message"],
        "Some rows were missing the query column."
    );
}

#[sqlx::test(migrations = "../../migrations")]
async fn scan_runs_over_uploaded_queries(pool: sqlx::PgPool) {
    let id = create_demo_project(&pool).await;

    let (status, json) = send(
        &pool,
        post_json(
            &format!("/api/v1/projects/{id}/query-sets"),
            &serde_json::json!({
                "csv": "query,intent,priority\nbest crm,commercial,2\ncrm pricing,,\n",
                "name": "Launch queries",
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "upload: {json}");
    assert_eq!(json["data"]["name"], "Launch queries");
    assert_eq!(json["data"]["query_count"], 2);
    assert_eq!(json["data"]["queries"][0]["country"], "GB");
    assert_eq!(json["data"]["queries"][0]["device"], "desktop");
    assert_eq!(
        json["data"]["queries"][0]["weight"]
            .as_str()
            .and_then(|w| w.parse::<f64>().ok()),
        Some(2.0)
    );
    assert!(json["data"]["queries"][1]["weight"].is_null());
    let qs = json["data"]["query_set_id"].as_str().expect("qs id").to_string();

    let scans_uri = format!("/api/v1/projects/{id}/query-sets/{qs}/scans");
    let (status, json) = send(&pool, post_json(&scans_uri, &serde_json::json!({}))).await;
    assert_eq!(status, StatusCode::CREATED, "scan: {json}");
    assert_eq!(json["data"]["status"], "done");
    assert_eq!(json["data"]["summary"]["total"], 2);
    assert_eq!(json["data"]["results"].as_array().map(Vec::len), Some(2));
    let scan_id = json["data"]["scan_id"].as_str().expect("scan id").to_string();

    let (status, json) = send(&pool, get_request(&scans_uri)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["data"][0]["result_count"], 2);

    let (status, json) = send(
        &pool,
        get_request(&format!("/api/v1/projects/{id}/scans/{scan_id}")),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    for result in json["data"]["results"].as_array().expect("results") {
        if result["ai_presence"] == false {
            assert_eq!(result["brand_mentioned"], false);
            assert_eq!(result["your_url_cited"], false);
            assert_eq!(result["cited_urls"].as_array().map(Vec::len), Some(0));
        }
    }
}

#[sqlx::test(migrations = "../../migrations")]
async fn upload_keeps_large_and_precise_priorities(pool: sqlx::PgPool) {
    let id = create_demo_project(&pool).await;

    let (status, json) = send(
        &pool,
        post_json(
            &format!("/api/v1/projects/{id}/query-sets"),
            &serde_json::json!({
                "csv": "query,priority\nbig,123456789012345678\nfine,0.1234567\n",
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "upload: {json}");
    assert_eq!(json["data"]["queries"][0]["weight"], "123456789012345678");
    assert_eq!(json["data"]["queries"][1]["weight"], "0.1234567");
}

#[sqlx::test(migrations = "../../migrations")]
async fn scan_of_foreign_query_set_is_not_found(pool: sqlx::PgPool) {
    let owner = create_demo_project(&pool).await;
    let other = create_demo_project(&pool).await;

    let (_, json) = send(
        &pool,
        post_json(
            &format!("/api/v1/projects/{owner}/query-sets"),
            &serde_json::json!({ "csv": "best crm\n" }),
        ),
    )
    .await;
    let qs = json["data"]["query_set_id"].as_str().expect("qs id").to_string();

    let (status, json) = send(
        &pool,
        post_json(
            &format!("/api/v1/projects/{other}/query-sets/{qs}/scans"),
            &serde_json::json!({}),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(json["error"]["message"], "Query set not found.");
}
