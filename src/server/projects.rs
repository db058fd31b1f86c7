//! Project route handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use super::{ApiResult, AppState};
use crate::models::{NewProject, Project, ProjectPatch, ProjectTaskView};

/// `GET /api/projects` - all projects, ordered by position.
pub(crate) async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<Project>>> {
    let storage = state.storage.lock().await;
    Ok(Json(storage.list_projects()?))
}

/// `GET /api/projects/{id}` - a single project.
pub(crate) async fn show(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Project>> {
    let storage = state.storage.lock().await;
    Ok(Json(storage.get_project(&id)?))
}

/// `POST /api/projects` - create a project at the end of the list.
pub(crate) async fn create(
    State(state): State<AppState>,
    Json(body): Json<NewProject>,
) -> ApiResult<(StatusCode, Json<Project>)> {
    let mut storage = state.storage.lock().await;
    let project = storage.create_project(body)?;
    tracing::info!(project_id = %project.id, "created project");
    Ok((StatusCode::CREATED, Json(project)))
}

/// `PATCH /api/projects/{id}` - partial update.
pub(crate) async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<ProjectPatch>,
) -> ApiResult<Json<Project>> {
    let mut storage = state.storage.lock().await;
    Ok(Json(storage.update_project(&id, &patch)?))
}

/// `DELETE /api/projects/{id}` - delete; referencing tasks lose their
/// project badge but survive.
pub(crate) async fn remove(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let mut storage = state.storage.lock().await;
    storage.delete_project(&id)?;
    tracing::info!(project_id = %id, "deleted project");
    Ok(StatusCode::NO_CONTENT)
}

/// `GET /api/projects/{id}/tasks` - the project's tasks, newest first.
pub(crate) async fn list_tasks(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<Vec<ProjectTaskView>>> {
    let storage = state.storage.lock().await;
    Ok(Json(storage.list_project_tasks(&id)?))
}
