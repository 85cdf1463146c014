use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    Form,
};
use serde::Deserialize;

use aeo_core::NewProject;
use aeo_db::ProjectRow;

use crate::actions::{self, ActionError};
use crate::api::AppState;

use super::html::{self, escape};
use super::{redirect_with_error, ErrorQuery, PageError};

const PROJECT_LIST_LIMIT: i64 = 200;

#[derive(Debug, Deserialize)]
pub(super) struct NewProjectForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub domain: String,
    #[serde(default)]
    pub locale_country: String,
    #[serde(default)]
    pub locale_language: String,
}

fn project_item(project: &ProjectRow) -> String {
    format!(
        "<li class=\"card\"><a href=\"/projects/{id}\"><strong>{name}</strong></a>\
         <div class=\"muted\">{domain} · {locale}</div>\
         <div class=\"muted\">{created}</div></li>\n",
        id = project.public_id,
        name = escape(&project.name),
        domain = escape(&project.domain),
        locale = escape(&project.locale_label()),
        created = html::date(project.created_at),
    )
}

fn project_card(project: &ProjectRow) -> String {
    format!(
        "<div class=\"card\">\n<h1>{name}</h1>\n<p class=\"muted\">{domain}</p>\n\
         <p><a href=\"/projects/{id}/queries\">View queries</a></p>\n\
         <div class=\"muted\">Locale: {locale}</div>\n\
         <div class=\"muted\">Workspace: {workspace}</div>\n\
         <div class=\"muted\">Created {created}</div>\n</div>\n",
        name = escape(&project.name),
        domain = escape(&project.domain),
        id = project.public_id,
        locale = escape(&project.locale_label()),
        workspace = escape(&project.workspace_name),
        created = html::date(project.created_at),
    )
}

/// GET /
pub(super) async fn home() -> Html<String> {
    html::page(
        "Home",
        "<h1>AEO Visibility OS</h1>\n\
         <p class=\"muted\">Track how AI answer engines surface your domain: upload \
         the queries you care about, run a scan, and read the visibility summary.</p>\n\
         <p><a href=\"/projects\">View projects</a></p>\n",
    )
}

/// GET /projects
pub(super) async fn list_projects(
    State(state): State<AppState>,
    Query(query): Query<ErrorQuery>,
) -> Result<Html<String>, PageError> {
    let projects = aeo_db::list_projects(&state.pool, PROJECT_LIST_LIMIT).await?;

    let mut body = String::from(
        "<h1>Projects</h1>\n<p class=\"muted\">Track AI visibility by project and domain.</p>\n\
         <p><a href=\"/projects/new\">New project</a></p>\n",
    );
    body.push_str(&html::error_banner(query.error.as_deref()));

    if projects.is_empty() {
        body.push_str("<div class=\"card muted\">No projects yet. Create the first one.</div>\n");
    } else {
        body.push_str("<ul>\n");
        for project in &projects {
            body.push_str(&project_item(project));
        }
        body.push_str("</ul>\n");
    }

    Ok(html::page("Projects", &body))
}

/// GET /projects/new
pub(super) async fn new_project(Query(query): Query<ErrorQuery>) -> Html<String> {
    let mut body = html::back_link("/projects", "Back to projects");
    body.push_str("<h1>New project</h1>\n");
    body.push_str(&html::error_banner(query.error.as_deref()));
    body.push_str(
        "<form method=\"post\" action=\"/projects\" class=\"card\">\n\
         <label>Name <input name=\"name\" required maxlength=\"200\"></label>\n\
         <label>Domain <input name=\"domain\" required placeholder=\"example.com\"></label>\n\
         <label>Locale country <input name=\"locale_country\" required value=\"US\" maxlength=\"3\"></label>\n\
         <label>Locale language <input name=\"locale_language\" required value=\"en\" maxlength=\"3\"></label>\n\
         <button type=\"submit\">Create project</button>\n\
         </form>\n",
    );
    html::page("New project", &body)
}

/// POST /projects
pub(super) async fn create_project(
    State(state): State<AppState>,
    Form(form): Form<NewProjectForm>,
) -> Result<Response, PageError> {
    let project = match NewProject::parse(
        &form.name,
        &form.domain,
        &form.locale_country,
        &form.locale_language,
    ) {
        Ok(project) => project,
        Err(e) => return Ok(redirect_with_error("/projects/new", &e.to_string())),
    };

    let workspace_id = aeo_db::ensure_default_workspace(&state.pool).await?;
    let row = aeo_db::create_project(&state.pool, workspace_id, &project).await?;
    tracing::info!(project = %row.public_id, domain = %row.domain, "project created");

    Ok(Redirect::to(&format!("/projects/{}", row.public_id)).into_response())
}

/// GET /projects/{id}
pub(super) async fn project_detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Response, PageError> {
    let project = match actions::find_project(&state.pool, &id).await {
        Ok(project) => project,
        Err(ActionError::Db(e)) => return Err(e.into()),
        Err(_) => {
            let mut body = html::back_link("/projects", "Back to projects");
            body.push_str(
                "<h1>Project not found</h1>\n\
                 <p class=\"muted\">Check the project ID and try again.</p>\n",
            );
            return Ok((StatusCode::NOT_FOUND, html::page("Project not found", &body)).into_response());
        }
    };

    let mut body = html::back_link("/projects", "Back to projects");
    body.push_str(&project_card(&project));

    Ok(html::page(&project.name, &body).into_response())
}
