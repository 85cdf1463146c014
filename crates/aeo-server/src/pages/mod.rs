//! Server-rendered pages and form actions.

mod html;
mod projects;
mod queries;
mod scans;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::get,
    Router,
};
use percent_encoding::{utf8_percent_encode, NON_ALPHANUMERIC};
use serde::Deserialize;

use crate::actions::ActionError;
use crate::api::AppState;

/// Optional `?error=` message carried by a redirect.
#[derive(Debug, Default, Deserialize)]
pub(super) struct ErrorQuery {
    pub error: Option<String>,
}

/// Failure that cannot be shown as a redirect banner.
#[derive(Debug)]
pub(super) enum PageError {
    Internal,
}

impl From<aeo_db::DbError> for PageError {
    fn from(error: aeo_db::DbError) -> Self {
        tracing::error!(error = %error, "database query failed");
        PageError::Internal
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        let body = html::page(
            "Something went wrong",
            "<h1>Something went wrong</h1>\n<p class=\"muted\">Please try again.</p>\n",
        );
        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}

/// 303 redirect to `path` carrying `message` as a percent-encoded `error`
/// query parameter.
pub(super) fn redirect_with_error(path: &str, message: &str) -> Response {
    let location = format!(
        "{path}?error={}",
        utf8_percent_encode(message, NON_ALPHANUMERIC)
    );
    Redirect::to(&location).into_response()
}

/// Turn an action failure into a redirect back to `path`, or a 500 page for
/// storage errors.
pub(super) fn action_redirect(path: &str, error: ActionError) -> Response {
    match error {
        ActionError::Db(e) => PageError::from(e).into_response(),
        not_found @ ActionError::ProjectNotFound => {
            redirect_with_error("/projects", &not_found.to_string())
        }
        other => redirect_with_error(path, &other.to_string()),
    }
}

pub(super) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(projects::home))
        .route(
            "/projects",
            get(projects::list_projects).post(projects::create_project),
        )
        .route("/projects/new", get(projects::new_project))
        .route("/projects/{id}", get(projects::project_detail))
        .route(
            "/projects/{id}/queries",
            get(queries::queries_page).post(queries::upload_queries),
        )
        .route("/projects/{id}/queries/sample", get(queries::sample_csv))
        .route(
            "/projects/{id}/queries/{query_set_id}/scans",
            get(scans::list_scans).post(scans::run_scan),
        )
        .route("/projects/{id}/scans/{scan_id}", get(scans::scan_detail))
        .route(
            "/projects/{id}/scans/{scan_id}/export.csv",
            get(scans::export_scan),
        )
}
