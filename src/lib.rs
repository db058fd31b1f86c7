//! TaskTimer - a task/board management backend.
//!
//! This library provides the core functionality for the `tasktimer` server:
//! boards (ordered columns), projects, tasks, and the board-task assignments
//! that place a task into a board's column at a dense, gap-free position.
//!
//! The interesting part lives in [`storage::ordering`]: every container that
//! carries a `sort_order` (the board list, the project list, and each board's
//! task column) is kept a contiguous `0..n` sequence across inserts, deletes,
//! reorders, and cross-board moves.

pub mod cli;
pub mod models;
pub mod server;
pub mod storage;

/// Library-level error type for TaskTimer operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for TaskTimer operations.
pub type Result<T> = std::result::Result<T, Error>;
