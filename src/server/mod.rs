//! HTTP server for the TaskTimer API.
//!
//! Thin request layer: handlers deserialize bodies, call into
//! [`Storage`](crate::storage::Storage), and serialize the results. All
//! ordering logic lives in the storage layer; the server's only jobs are
//! routing, CORS, and mapping [`Error`] variants to status codes.

pub mod boards;
pub mod projects;
pub mod tasks;

use axum::{
    Json, Router,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, patch, post},
};
use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::cors::{Any, CorsLayer};

use crate::storage::Storage;
use crate::Error;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Storage instance (single write connection, serialized by the mutex)
    pub storage: Arc<Mutex<Storage>>,
}

impl AppState {
    pub fn new(storage: Storage) -> Self {
        Self {
            storage: Arc::new(Mutex::new(storage)),
        }
    }
}

/// Build the API router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/health", get(health))
        .route("/api/boards", get(boards::list).post(boards::create))
        .route(
            "/api/boards/{id}",
            patch(boards::update).delete(boards::remove),
        )
        .route("/api/boards/{id}/reorder", post(boards::reorder))
        .route("/api/tasks", get(tasks::list).post(tasks::create))
        .route("/api/tasks/unassigned", get(tasks::list_unassigned))
        .route(
            "/api/tasks/{id}",
            patch(tasks::update).delete(tasks::remove),
        )
        .route("/api/tasks/{id}/reorder", post(tasks::reorder))
        .route("/api/projects", get(projects::list).post(projects::create))
        .route(
            "/api/projects/{id}",
            get(projects::show)
                .patch(projects::update)
                .delete(projects::remove),
        )
        .route("/api/projects/{id}/tasks", get(projects::list_tasks))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Start the API server.
pub async fn start_server(db_path: &Path, host: &str, port: u16) -> crate::Result<()> {
    let storage = Storage::open(db_path)?;
    let state = AppState::new(storage);
    let app = router(state);

    let host_addr: IpAddr = host
        .parse()
        .map_err(|e| Error::InvalidInput(format!("invalid host address '{}': {}", host, e)))?;
    let addr = SocketAddr::from((host_addr, port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("tasktimer API listening on http://{}", addr);

    axum::serve(listener, app).await?;
    Ok(())
}

/// Health check with build info.
async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "commit": env!("TT_GIT_COMMIT"),
        "built_at": env!("TT_BUILD_TIMESTAMP"),
    }))
}

/// Error wrapper mapping storage failures to HTTP responses.
pub struct ApiError(Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::InvalidInput(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status == StatusCode::INTERNAL_SERVER_ERROR {
            tracing::error!("request failed: {}", self.0);
        }
        (
            status,
            Json(serde_json::json!({ "error": self.0.to_string() })),
        )
            .into_response()
    }
}

/// Handler result alias.
pub(crate) type ApiResult<T> = std::result::Result<T, ApiError>;
