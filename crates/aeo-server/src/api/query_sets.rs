use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use aeo_db::{QuerySetRow, SearchQueryRow};

use crate::actions;
use crate::middleware::RequestId;

use super::{map_action_error, map_db_error, ApiError, ApiResponse, AppState, ResponseMeta};

#[derive(Debug, Deserialize)]
pub(super) struct CreateQuerySetRequest {
    pub csv: String,
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct QueryItem {
    pub text: String,
    pub country: String,
    pub device: String,
    pub intent: Option<String>,
    #[serde(with = "rust_decimal::serde::str_option")]
    pub weight: Option<Decimal>,
}

#[derive(Debug, Serialize)]
pub(super) struct QuerySetItem {
    pub query_set_id: Uuid,
    pub name: String,
    pub query_count: i64,
    pub created_at: DateTime<Utc>,
    pub queries: Vec<QueryItem>,
}

impl From<SearchQueryRow> for QueryItem {
    fn from(row: SearchQueryRow) -> Self {
        Self {
            text: row.text,
            country: row.country,
            device: row.device,
            intent: row.intent,
            weight: row.weight,
        }
    }
}

fn query_set_item(row: QuerySetRow, queries: Vec<SearchQueryRow>) -> QuerySetItem {
    QuerySetItem {
        query_set_id: row.public_id,
        name: row.name,
        query_count: row.query_count,
        created_at: row.created_at,
        queries: queries.into_iter().map(QueryItem::from).collect(),
    }
}

/// GET /api/v1/projects/{id}/query-sets
pub(super) async fn list_query_sets(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<Vec<QuerySetItem>>>, ApiError> {
    let project = actions::find_project(&state.pool, &id)
        .await
        .map_err(|e| map_action_error(req_id.0.clone(), e))?;

    let sets = aeo_db::list_query_sets_for_project(&state.pool, project.id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    let ids: Vec<i64> = sets.iter().map(|s| s.id).collect();
    let mut queries = aeo_db::list_queries_for_query_sets(&state.pool, &ids)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = sets
        .into_iter()
        .map(|set| {
            let set_queries = queries.remove(&set.id).unwrap_or_default();
            query_set_item(set, set_queries)
        })
        .collect();

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// POST /api/v1/projects/{id}/query-sets
pub(super) async fn create_query_set(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
    Json(body): Json<CreateQuerySetRequest>,
) -> Result<(StatusCode, Json<ApiResponse<QuerySetItem>>), ApiError> {
    let project = actions::find_project(&state.pool, &id)
        .await
        .map_err(|e| map_action_error(req_id.0.clone(), e))?;

    let set = actions::import_queries(
        &state.pool,
        &project,
        &body.csv,
        body.name.as_deref(),
        state.csv_max_rows,
        Utc::now().date_naive(),
    )
    .await
    .map_err(|e| map_action_error(req_id.0.clone(), e))?;

    let queries = aeo_db::list_queries_for_query_set(&state.pool, set.id)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: query_set_item(set, queries),
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}
