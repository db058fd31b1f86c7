//! Board route handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use super::{ApiResult, AppState};
use crate::models::{Board, BoardPatch, BoardReorder, NewBoard};

/// `GET /api/boards` - all boards, ordered by position.
pub(crate) async fn list(State(state): State<AppState>) -> ApiResult<Json<Vec<Board>>> {
    let storage = state.storage.lock().await;
    Ok(Json(storage.list_boards()?))
}

/// `POST /api/boards` - create a board at the end of the list.
pub(crate) async fn create(
    State(state): State<AppState>,
    Json(body): Json<NewBoard>,
) -> ApiResult<(StatusCode, Json<Board>)> {
    let mut storage = state.storage.lock().await;
    let board = storage.create_board(body)?;
    tracing::info!(board_id = %board.id, "created board");
    Ok((StatusCode::CREATED, Json(board)))
}

/// `PATCH /api/boards/{id}` - partial update.
pub(crate) async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(patch): Json<BoardPatch>,
) -> ApiResult<Json<Board>> {
    let mut storage = state.storage.lock().await;
    Ok(Json(storage.update_board(&id, &patch)?))
}

/// `DELETE /api/boards/{id}` - delete and compact the board list.
pub(crate) async fn remove(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<StatusCode> {
    let mut storage = state.storage.lock().await;
    storage.delete_board(&id)?;
    tracing::info!(board_id = %id, "deleted board");
    Ok(StatusCode::NO_CONTENT)
}

/// `POST /api/boards/{id}/reorder` - move a board within the list.
pub(crate) async fn reorder(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<BoardReorder>,
) -> ApiResult<Json<Board>> {
    let mut storage = state.storage.lock().await;
    Ok(Json(storage.reorder_board(&id, body.sort_order)?))
}
