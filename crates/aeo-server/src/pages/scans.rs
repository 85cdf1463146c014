use axum::{
    extract::{Path, State},
    http::{header, StatusCode},
    response::{IntoResponse, Redirect, Response},
};

use aeo_core::ScanSummary;
use aeo_db::{ScanResultRow, ScanRow};
use uuid::Uuid;

use crate::actions::{self, ActionError};
use crate::api::AppState;

use super::html::{self, escape};
use super::{action_redirect, PageError};

fn missing(heading: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        html::not_found(heading, "/projects", "Back to projects"),
    )
        .into_response()
}

fn scan_item(project_id: Uuid, scan: &ScanRow) -> String {
    let finished = scan.finished_at.map_or_else(
        || "In progress".to_string(),
        |at| format!("Finished {}", html::date_time(at)),
    );
    format!(
        "<li class=\"card\"><a href=\"/projects/{project_id}/scans/{sid}\">Scan {created}</a>\
         <div class=\"muted\">Status: {status} · {count} results</div>\
         <div class=\"muted\">{finished}</div></li>\n",
        sid = scan.public_id,
        created = html::date_time(scan.created_at),
        status = scan.status,
        count = scan.result_count,
    )
}

fn metric_card(label: &str, percent: u32) -> String {
    format!(
        "<div class=\"card\"><div class=\"muted\">{label}</div>\
         <div class=\"metric\">{percent}%</div></div>\n"
    )
}

fn summary_cards(summary: &ScanSummary) -> String {
    format!(
        "<section class=\"cards\">\n{}{}{}</section>\n",
        metric_card("AI PRESENCE", summary.ai_presence_percent()),
        metric_card("BRAND MENTION", summary.brand_mention_percent()),
        metric_card("YOUR URL CITED", summary.url_cited_percent()),
    )
}

/// GET /projects/{id}/queries/{query_set_id}/scans
pub(super) async fn list_scans(
    State(state): State<AppState>,
    Path((id, query_set_id)): Path<(String, String)>,
) -> Result<Response, PageError> {
    let project = match actions::find_project(&state.pool, &id).await {
        Ok(project) => project,
        Err(ActionError::Db(e)) => return Err(e.into()),
        Err(_) => return Ok(missing("Query set not found")),
    };
    let query_set = match actions::find_query_set(&state.pool, &project, &query_set_id).await {
        Ok(set) => set,
        Err(ActionError::Db(e)) => return Err(e.into()),
        Err(_) => return Ok(missing("Query set not found")),
    };

    let scans = aeo_db::list_scans_for_query_set(&state.pool, query_set.id).await?;

    let pid = project.public_id;
    let mut body = html::back_link(&format!("/projects/{pid}/queries"), "Back to queries");
    body.push_str(&format!(
        "<h1>{name}</h1>\n<p class=\"muted\">{domain} · {set}</p>\n\
         <section class=\"card\">\n<h2>Scans</h2>\n",
        name = escape(&project.name),
        domain = escape(&project.domain),
        set = escape(&query_set.name),
    ));

    if scans.is_empty() {
        body.push_str(
            "<p class=\"muted\">No scans yet. Run a scan from the query set list.</p>\n",
        );
    } else {
        body.push_str("<ul>\n");
        for scan in &scans {
            body.push_str(&scan_item(pid, scan));
        }
        body.push_str("</ul>\n");
    }
    body.push_str("</section>\n");

    Ok(html::page(&format!("{} scans", query_set.name), &body).into_response())
}

/// POST /projects/{id}/queries/{query_set_id}/scans
pub(super) async fn run_scan(
    State(state): State<AppState>,
    Path((id, query_set_id)): Path<(String, String)>,
) -> Response {
    let project = match actions::find_project(&state.pool, &id).await {
        Ok(project) => project,
        Err(e) => return action_redirect("/projects", e),
    };
    let back = format!("/projects/{}/queries", project.public_id);

    let query_set = match actions::find_query_set(&state.pool, &project, &query_set_id).await {
        Ok(set) => set,
        Err(e) => return action_redirect(&back, e),
    };

    match actions::run_scan(&state.pool, &project, &query_set).await {
        Ok(scan) => {
            Redirect::to(&format!("/projects/{}/scans/{}", project.public_id, scan.public_id))
                .into_response()
        }
        Err(e) => action_redirect(&back, e),
    }
}

fn result_row(result: &ScanResultRow) -> String {
    let cited = if result.cited_urls.is_empty() {
        "-".to_string()
    } else {
        result
            .cited_urls
            .iter()
            .map(|url| escape(url))
            .collect::<Vec<_>>()
            .join(", ")
    };
    format!(
        "<tr><td><strong>{query}</strong></td><td>{presence}</td><td>{mention}</td>\
         <td>{cited_flag}</td><td class=\"muted\">{cited}</td><td class=\"muted\">{note}</td></tr>\n",
        query = escape(&result.query_text),
        presence = html::yes_no(result.ai_presence),
        mention = html::yes_no(result.brand_mentioned),
        cited_flag = html::yes_no(result.your_url_cited),
        note = escape(result.notes.as_deref().unwrap_or_default()),
    )
}

/// GET /projects/{id}/scans/{scan_id}
pub(super) async fn scan_detail(
    State(state): State<AppState>,
    Path((id, scan_id)): Path<(String, String)>,
) -> Result<Response, PageError> {
    let project = match actions::find_project(&state.pool, &id).await {
        Ok(project) => project,
        Err(ActionError::Db(e)) => return Err(e.into()),
        Err(_) => return Ok(missing("Scan not found")),
    };
    let scan = match actions::find_scan(&state.pool, &project, &scan_id).await {
        Ok(scan) => scan,
        Err(ActionError::Db(e)) => return Err(e.into()),
        Err(_) => return Ok(missing("Scan not found")),
    };
    let (summary, results) = match actions::scan_report(&state.pool, &scan).await {
        Ok(report) => report,
        Err(ActionError::Db(e)) => return Err(e.into()),
        Err(_) => return Ok(missing("Scan not found")),
    };

    let pid = project.public_id;
    let sid = scan.public_id;
    let mut body = html::back_link(
        &format!("/projects/{pid}/queries/{}/scans", scan.query_set_public_id),
        "Back to scans",
    );
    body.push_str(&format!(
        "<h1>Scan detail</h1>\n<p class=\"muted\">{name} · {set} · {created}</p>\n\
         <p><a href=\"/projects/{pid}/scans/{sid}/export.csv\">Export CSV</a></p>\n",
        name = escape(&project.name),
        set = escape(&scan.query_set_name),
        created = html::date_time(scan.created_at),
    ));
    body.push_str(&summary_cards(&summary));
    body.push_str("<section class=\"card\">\n<h2>Results</h2>\n");

    if results.is_empty() {
        body.push_str("<p class=\"muted\">No results recorded for this scan.</p>\n");
    } else {
        body.push_str(
            "<table>\n<thead><tr><th>Query</th><th>AI presence</th><th>Brand mentioned</th>\
             <th>Your URL cited</th><th>Cited URLs</th><th>Note</th></tr></thead>\n<tbody>\n",
        );
        for result in &results {
            body.push_str(&result_row(result));
        }
        body.push_str("</tbody>\n</table>\n");
    }
    body.push_str("</section>\n");

    Ok(html::page("Scan detail", &body).into_response())
}

/// GET /projects/{id}/scans/{scan_id}/export.csv
pub(super) async fn export_scan(
    State(state): State<AppState>,
    Path((id, scan_id)): Path<(String, String)>,
) -> Result<Response, PageError> {
    let project = match actions::find_project(&state.pool, &id).await {
        Ok(project) => project,
        Err(ActionError::Db(e)) => return Err(e.into()),
        Err(_) => return Ok(missing("Scan not found")),
    };
    let scan = match actions::find_scan(&state.pool, &project, &scan_id).await {
        Ok(scan) => scan,
        Err(ActionError::Db(e)) => return Err(e.into()),
        Err(_) => return Ok(missing("Scan not found")),
    };

    let results = aeo_db::list_scan_results(&state.pool, scan.id).await?;
    let csv = aeo_core::scan_results_csv(results.iter().map(ScanResultRow::export_record))
        .map_err(|e| {
            tracing::error!(error = %e, scan = %scan.public_id, "failed to render scan export");
            PageError::Internal
        })?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"scan-{}.csv\"", scan.public_id),
            ),
        ],
        csv,
    )
        .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summary_cards_render_each_metric_in_order() {
        let summary = ScanSummary {
            total: 4,
            ai_presence_count: 3,
            brand_mention_count: 1,
            url_cited_count: 0,
        };
        let cards = summary_cards(&summary);

        let presence = cards.find("AI PRESENCE</div><div class=\"metric\">75%").unwrap();
        let mention = cards.find("BRAND MENTION</div><div class=\"metric\">25%").unwrap();
        let cited = cards.find("YOUR URL CITED</div><div class=\"metric\">0%").unwrap();
        assert!(presence < mention && mention < cited);
        assert!(cards.starts_with("<section class=\"cards\">\n"));
        assert!(cards.ends_with("</section>\n"));
    }
}
