use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use aeo_core::{ScanStatus, ScanSummary};
use aeo_db::{ScanResultRow, ScanRow};

use crate::actions;
use crate::middleware::RequestId;

use super::{map_action_error, map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Serialize)]
pub(super) struct ScanItem {
    pub scan_id: Uuid,
    pub query_set_id: Uuid,
    pub query_set_name: String,
    pub status: ScanStatus,
    pub result_count: i64,
    pub started_at: Option<DateTime<Utc>>,
    pub finished_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl From<ScanRow> for ScanItem {
    fn from(row: ScanRow) -> Self {
        Self {
            scan_id: row.public_id,
            query_set_id: row.query_set_public_id,
            query_set_name: row.query_set_name,
            status: row.status,
            result_count: row.result_count,
            started_at: row.started_at,
            finished_at: row.finished_at,
            created_at: row.created_at,
        }
    }
}

#[derive(Debug, Serialize, PartialEq, Eq)]
pub(super) struct SummaryItem {
    pub total: usize,
    pub ai_presence_percent: u32,
    pub brand_mention_percent: u32,
    pub url_cited_percent: u32,
}

impl From<ScanSummary> for SummaryItem {
    fn from(summary: ScanSummary) -> Self {
        Self {
            total: summary.total,
            ai_presence_percent: summary.ai_presence_percent(),
            brand_mention_percent: summary.brand_mention_percent(),
            url_cited_percent: summary.url_cited_percent(),
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct ResultItem {
    pub query: String,
    pub ai_presence: bool,
    pub brand_mentioned: bool,
    pub your_url_cited: bool,
    pub cited_urls: Vec<String>,
    pub note: Option<String>,
    pub captured_at: DateTime<Utc>,
}

impl From<ScanResultRow> for ResultItem {
    fn from(row: ScanResultRow) -> Self {
        Self {
            query: row.query_text,
            ai_presence: row.ai_presence,
            brand_mentioned: row.brand_mentioned,
            your_url_cited: row.your_url_cited,
            cited_urls: row.cited_urls,
            note: row.notes,
            captured_at: row.captured_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct ScanDetail {
    #[serde(flatten)]
    pub scan: ScanItem,
    pub summary: SummaryItem,
    pub results: Vec<ResultItem>,
}

async fn scan_detail(state: &AppState, req_id: &str, scan: ScanRow) -> Result<ScanDetail, ApiError> {
    let (summary, results) = actions::scan_report(&state.pool, &scan)
        .await
        .map_err(|e| map_action_error(req_id.to_owned(), e))?;

    Ok(ScanDetail {
        scan: ScanItem::from(scan),
        summary: SummaryItem::from(summary),
        results: results.into_iter().map(ResultItem::from).collect(),
    })
}

/// GET /api/v1/projects/{id}/query-sets/{query_set_id}/scans
pub(super) async fn list_scans(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path((id, query_set_id)): Path<(String, String)>,
) -> Result<Json<ApiResponse<Vec<ScanItem>>>, ApiError> {
    let project = actions::find_project(&state.pool, &id)
        .await
        .map_err(|e| map_action_error(req_id.0.clone(), e))?;
    let query_set = actions::find_query_set(&state.pool, &project, &query_set_id)
        .await
        .map_err(|e| map_action_error(req_id.0.clone(), e))?;

    let rows = aeo_db::list_scans_for_query_set(&state.pool, query_set.id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: rows.into_iter().map(ScanItem::from).collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// POST /api/v1/projects/{id}/query-sets/{query_set_id}/scans
pub(super) async fn run_scan(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path((id, query_set_id)): Path<(String, String)>,
) -> Result<(StatusCode, Json<ApiResponse<ScanDetail>>), ApiError> {
    let project = actions::find_project(&state.pool, &id)
        .await
        .map_err(|e| map_action_error(req_id.0.clone(), e))?;
    let query_set = actions::find_query_set(&state.pool, &project, &query_set_id)
        .await
        .map_err(|e| map_action_error(req_id.0.clone(), e))?;

    let scan = actions::run_scan(&state.pool, &project, &query_set)
        .await
        .map_err(|e| map_action_error(req_id.0.clone(), e))?;
    let data = scan_detail(&state, &req_id.0, scan).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data,
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

/// GET /api/v1/projects/{id}/scans/{scan_id}
pub(super) async fn get_scan(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path((id, scan_id)): Path<(String, String)>,
) -> Result<Json<ApiResponse<ScanDetail>>, ApiError> {
    let project = actions::find_project(&state.pool, &id)
        .await
        .map_err(|e| map_action_error(req_id.0.clone(), e))?;
    let scan = actions::find_scan(&state.pool, &project, &scan_id)
        .await
        .map_err(|e| map_action_error(req_id.0.clone(), e))?;

    let data = scan_detail(&state, &req_id.0, scan).await?;

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}

#[cfg(test)]
mod tests {
    use super::SummaryItem;
    use aeo_core::{ResultFlags, ScanSummary};

    #[test]
    fn summary_item_reports_rounded_percentages() {
        let present = ResultFlags {
            ai_presence: true,
            brand_mentioned: true,
            your_url_cited: false,
        };
        let summary = ScanSummary::tally([present, present, ResultFlags::default()]);

        assert_eq!(
            SummaryItem::from(summary),
            SummaryItem {
                total: 3,
                ai_presence_percent: 67,
                brand_mention_percent: 67,
                url_cited_percent: 0,
            }
        );
    }
}
