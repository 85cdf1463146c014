use axum::{
    body::Bytes,
    extract::{
        multipart::{Multipart, MultipartError, MultipartRejection},
        Path, Query, State,
    },
    http::{header, StatusCode},
    response::{IntoResponse, Redirect, Response},
};
use chrono::Utc;

use aeo_core::{decode_upload, SAMPLE_CSV, SAMPLE_CSV_FILENAME};
use aeo_db::{QuerySetRow, SearchQueryRow};
use uuid::Uuid;

use crate::actions::{self, ActionError};
use crate::api::AppState;

use super::html::{self, escape};
use super::{action_redirect, redirect_with_error, ErrorQuery, PageError};

const SELECT_FILE: &str = "Please select a CSV file.";
const TOO_LARGE: &str = "CSV file is too large.";
const UNREADABLE: &str = "The upload could not be read. Please try again.";

/// Reads the raw bytes of the `file` field. `None` when no file was chosen.
async fn read_csv_field(multipart: &mut Multipart) -> Result<Option<Bytes>, MultipartError> {
    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let has_file_name = field.file_name().is_some_and(|name| !name.is_empty());
        let bytes = field.bytes().await?;
        if !has_file_name && bytes.is_empty() {
            return Ok(None);
        }
        return Ok(Some(bytes));
    }
    Ok(None)
}

/// Message for an upload whose body could not be read to the end.
fn read_failure_message(error: &MultipartError) -> &'static str {
    if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
        TOO_LARGE
    } else {
        UNREADABLE
    }
}

fn query_set_card(project_id: Uuid, set: &QuerySetRow, queries: &[SearchQueryRow]) -> String {
    let qs = set.public_id;
    let items: String = queries
        .iter()
        .map(|q| {
            let intent = q
                .intent
                .as_deref()
                .map(|i| format!(" <span class=\"muted\">({})</span>", escape(i)))
                .unwrap_or_default();
            format!("<li>{}{intent}</li>\n", escape(&q.text))
        })
        .collect();

    format!(
        "<div class=\"card\">\n<strong>{name}</strong>\n\
         <div class=\"muted\">{count} queries · {created}</div>\n<ul>\n{items}</ul>\n\
         <form method=\"post\" action=\"/projects/{project_id}/queries/{qs}/scans\">\n\
         <button type=\"submit\">Run scan</button>\n</form>\n\
         <a class=\"muted\" href=\"/projects/{project_id}/queries/{qs}/scans\">View scans</a>\n</div>\n",
        name = escape(&set.name),
        count = set.query_count,
        created = html::date(set.created_at),
    )
}

/// GET /projects/{id}/queries
pub(super) async fn queries_page(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<ErrorQuery>,
) -> Result<Response, PageError> {
    let project = match actions::find_project(&state.pool, &id).await {
        Ok(project) => project,
        Err(ActionError::Db(e)) => return Err(e.into()),
        Err(_) => {
            let page = html::not_found("Project not found", "/projects", "Back to projects");
            return Ok((StatusCode::NOT_FOUND, page).into_response());
        }
    };

    let sets = aeo_db::list_query_sets_for_project(&state.pool, project.id).await?;
    let ids: Vec<i64> = sets.iter().map(|s| s.id).collect();
    let mut queries = aeo_db::list_queries_for_query_sets(&state.pool, &ids).await?;

    let pid = project.public_id;
    let mut body = html::back_link("/projects", "Back to projects");
    body.push_str(&format!(
        "<h1>{name}</h1>\n<p class=\"muted\">{domain}</p>\n\
         <p><a href=\"/projects/{pid}\">View project</a></p>\n",
        name = escape(&project.name),
        domain = escape(&project.domain),
    ));
    body.push_str(&html::error_banner(query.error.as_deref()));
    body.push_str(&format!(
        "<section class=\"card\">\n<h2>Upload CSV</h2>\n\
         <p class=\"muted\">One query per row. Optional columns: intent, priority.</p>\n\
         <p><a href=\"/projects/{pid}/queries/sample\">Download sample CSV</a></p>\n\
         <form method=\"post\" action=\"/projects/{pid}/queries\" enctype=\"multipart/form-data\">\n\
         <input type=\"file\" name=\"file\" accept=\".csv,text/csv\">\n\
         <button type=\"submit\">Upload</button>\n</form>\n</section>\n"
    ));

    body.push_str("<section class=\"card\">\n<h2>Query sets</h2>\n");
    if sets.is_empty() {
        body.push_str("<p class=\"muted\">No query sets yet. Upload a CSV to create one.</p>\n");
    }
    for set in &sets {
        let set_queries = queries.remove(&set.id).unwrap_or_default();
        body.push_str(&query_set_card(pid, set, &set_queries));
    }
    body.push_str("</section>\n");

    Ok(html::page(&format!("{} queries", project.name), &body).into_response())
}

/// POST /projects/{id}/queries
pub(super) async fn upload_queries(
    State(state): State<AppState>,
    Path(id): Path<String>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Response {
    let project = match actions::find_project(&state.pool, &id).await {
        Ok(project) => project,
        Err(e) => return action_redirect("/projects", e),
    };
    let back = format!("/projects/{}/queries", project.public_id);

    let Ok(mut multipart) = multipart else {
        return redirect_with_error(&back, SELECT_FILE);
    };
    let bytes = match read_csv_field(&mut multipart).await {
        Ok(Some(bytes)) => bytes,
        Ok(None) => return redirect_with_error(&back, SELECT_FILE),
        Err(e) => {
            tracing::warn!(error = %e, project = %project.public_id, "failed to read upload");
            return redirect_with_error(&back, read_failure_message(&e));
        }
    };
    let text = match decode_upload(&bytes) {
        Ok(text) => text,
        Err(e) => return action_redirect(&back, e.into()),
    };

    match actions::import_queries(
        &state.pool,
        &project,
        text,
        None,
        state.csv_max_rows,
        Utc::now().date_naive(),
    )
    .await
    {
        Ok(_) => Redirect::to(&back).into_response(),
        Err(e) => action_redirect(&back, e),
    }
}

/// GET /projects/{id}/queries/sample
pub(super) async fn sample_csv() -> impl IntoResponse {
    (
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{SAMPLE_CSV_FILENAME}\""),
            ),
        ],
        SAMPLE_CSV,
    )
}
