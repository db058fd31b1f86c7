//! Task route handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use super::{ApiResult, AppState};
use crate::models::{NewTask, TaskPatch, TaskReorder, TaskView};

/// `GET /api/tasks` - all assigned tasks, grouped by board.
pub(crate) async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<TaskView>>> {
    let storage = state.storage.lock().await;
    Ok(Json(storage.list_assigned_tasks()?))
}

/// `GET /api/tasks/unassigned` - inbox tasks, newest first.
pub(crate) async fn list_unassigned(
    State(state): State<AppState>,
) -> ApiResult<Json<Vec<TaskView>>> {
    let storage = state.storage.lock().await;
    Ok(Json(storage.list_unassigned_tasks()?))
}

/// `POST /api/tasks` - create a task, optionally appended to a board.
pub(crate) async fn create(
    State(state): State<AppState>,
    Json(body): Json<NewTask>,
) -> ApiResult<(StatusCode, Json<TaskView>)> {
    let mut storage = state.storage.lock().await;
    let task = storage.create_task(body)?;
    tracing::info!(task_id = %task.id, "created task");
    Ok((StatusCode::CREATED, Json(task)))
}

/// `PATCH /api/tasks/{id}` - partial update. `completed`/`archived`
/// booleans set or clear the corresponding timestamps.
pub(crate) async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<TaskPatch>,
) -> ApiResult<Json<TaskView>> {
    let mut storage = state.storage.lock().await;
    Ok(Json(storage.update_task(&id, &patch)?))
}

/// `DELETE /api/tasks/{id}` - delete; the task's column (if any) closes
/// ranks.
pub(crate) async fn remove(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let mut storage = state.storage.lock().await;
    storage.delete_task(&id)?;
    tracing::info!(task_id = %id, "deleted task");
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /api/tasks/{id}/reorder` - move within or across boards, or out
/// of any board when `board_id` is null.
pub(crate) async fn reorder(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<TaskReorder>,
) -> ApiResult<Json<TaskView>> {
    let mut storage = state.storage.lock().await;
    Ok(Json(storage.reorder_task(
        &id,
        body.board_id.as_deref(),
        body.sort_order,
    )?))
}
