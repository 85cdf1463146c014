mod projects;
mod query_sets;
mod scans;

use aeo_core::AppConfig;
use axum::{
    extract::{DefaultBodyLimit, State},
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::get,
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::actions::ActionError;
use crate::middleware::{request_id, RequestId, REQUEST_ID_HEADER};
use crate::pages;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    /// Data rows accepted from one CSV upload.
    pub csv_max_rows: usize,
    pub upload_max_bytes: usize,
}

impl AppState {
    #[must_use]
    pub fn new(pool: PgPool, config: &AppConfig) -> Self {
        Self {
            pool,
            csv_max_rows: config.csv_max_rows,
            upload_max_bytes: config.upload_max_bytes,
        }
    }

    #[cfg(test)]
    pub fn with_defaults(pool: PgPool) -> Self {
        Self {
            pool,
            csv_max_rows: aeo_core::DEFAULT_MAX_ROWS,
            upload_max_bytes: 2 * 1024 * 1024,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    database: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub(super) fn normalize_limit(limit: Option<i64>) -> i64 {
    limit.unwrap_or(50).clamp(1, 200)
}

pub(super) fn map_db_error(request_id: String, error: &aeo_db::DbError) -> ApiError {
    tracing::error!(error = %error, "database query failed");
    ApiError::new(request_id, "internal_error", "database query failed")
}

pub(super) fn map_action_error(request_id: String, error: ActionError) -> ApiError {
    match error {
        ActionError::Db(e) => map_db_error(request_id, &e),
        not_found @ (ActionError::ProjectNotFound
        | ActionError::QuerySetNotFound
        | ActionError::ScanNotFound) => {
            ApiError::new(request_id, "not_found", not_found.to_string())
        }
        invalid @ (ActionError::EmptyQuerySet | ActionError::Import(_)) => {
            ApiError::new(request_id, "validation_error", invalid.to_string())
        }
    }
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static(REQUEST_ID_HEADER)])
}

fn api_router() -> Router<AppState> {
    Router::new()
        .route("/api/v1/health", get(health))
        .route(
            "/api/v1/projects",
            get(projects::list_projects).post(projects::create_project),
        )
        .route("/api/v1/projects/{id}", get(projects::get_project))
        .route(
            "/api/v1/projects/{id}/query-sets",
            get(query_sets::list_query_sets).post(query_sets::create_query_set),
        )
        .route(
            "/api/v1/projects/{id}/query-sets/{query_set_id}/scans",
            get(scans::list_scans).post(scans::run_scan),
        )
        .route("/api/v1/projects/{id}/scans/{scan_id}", get(scans::get_scan))
        .layer(build_cors())
}

pub fn build_app(state: AppState) -> Router {
    let body_limit = state.upload_max_bytes;

    Router::new()
        .merge(pages::router())
        .merge(api_router())
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(axum::middleware::from_fn(request_id))
                .layer(DefaultBodyLimit::max(body_limit)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let meta = ResponseMeta::new(req_id.0);

    match aeo_db::health_check(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse {
                data: HealthData {
                    status: "ok",
                    database: "ok",
                },
                meta,
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: database unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse {
                    data: HealthData {
                        status: "degraded",
                        database: "unavailable",
                    },
                    meta,
                }),
            )
        }
    }
}

#[cfg(test)]
mod tests;
