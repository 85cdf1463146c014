use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use aeo_core::NewProject;
use aeo_db::ProjectRow;

use crate::actions;
use crate::middleware::RequestId;

use super::{
    map_action_error, map_db_error, normalize_limit, ApiError, ApiResponse, AppState,
    ResponseMeta,
};

#[derive(Debug, Deserialize)]
pub(super) struct ProjectsQuery {
    pub limit: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub(super) struct CreateProjectRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub locale_country: String,
    #[serde(default)]
    pub locale_language: String,
}

#[derive(Debug, Serialize)]
pub(super) struct ProjectItem {
    pub project_id: Uuid,
    pub name: String,
    pub domain: String,
    pub locale_country: String,
    pub locale_language: String,
    pub locale: String,
    pub workspace: String,
    pub created_at: DateTime<Utc>,
}

impl From<ProjectRow> for ProjectItem {
    fn from(row: ProjectRow) -> Self {
        Self {
            locale: row.locale_label(),
            project_id: row.public_id,
            name: row.name,
            domain: row.domain,
            locale_country: row.locale_country,
            locale_language: row.locale_language,
            workspace: row.workspace_name,
            created_at: row.created_at,
        }
    }
}

/// GET /api/v1/projects
pub(super) async fn list_projects(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<ProjectsQuery>,
) -> Result<Json<ApiResponse<Vec<ProjectItem>>>, ApiError> {
    let rows = aeo_db::list_projects(&state.pool, normalize_limit(query.limit))
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: rows.into_iter().map(ProjectItem::from).collect(),
        meta: ResponseMeta::new(req_id.0),
    }))
}

/// POST /api/v1/projects
pub(super) async fn create_project(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<CreateProjectRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ProjectItem>>), ApiError> {
    let project = NewProject::parse(
        &body.name,
        &body.domain,
        &body.locale_country,
        &body.locale_language,
    )
    .map_err(|e| ApiError::new(req_id.0.clone(), "validation_error", e.to_string()))?;

    let workspace_id = aeo_db::ensure_default_workspace(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;
    let row = aeo_db::create_project(&state.pool, workspace_id, &project)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    tracing::info!(project = %row.public_id, domain = %row.domain, "project created");

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse {
            data: ProjectItem::from(row),
            meta: ResponseMeta::new(req_id.0),
        }),
    ))
}

/// GET /api/v1/projects/{id}
pub(super) async fn get_project(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<ProjectItem>>, ApiError> {
    let row = actions::find_project(&state.pool, &id)
        .await
        .map_err(|e| map_action_error(req_id.0.clone(), e))?;

    Ok(Json(ApiResponse {
        data: ProjectItem::from(row),
        meta: ResponseMeta::new(req_id.0),
    }))
}
