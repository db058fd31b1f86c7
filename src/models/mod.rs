//! Data models for TaskTimer entities.
//!
//! This module defines the core data structures:
//! - `Board` - An ordered column tasks can be placed into
//! - `Project` - A grouping tasks may optionally reference
//! - `Task` - A work item, independent of any board
//! - `Placement` - The (board, position) edge for an assigned task
//!
//! Request-side types come in two flavors: `New*` structs for creation and
//! `*Patch` structs for partial updates. Patch fields that are nullable in
//! storage use a double `Option` so that "field absent" (leave unchanged)
//! and "field null" (clear the value) stay distinguishable after JSON
//! deserialization.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

/// Generate a fresh entity ID.
pub(crate) fn new_id() -> String {
    Uuid::new_v4().to_string()
}

/// A board: an ordered column on the kanban surface.
#[derive(Debug, Clone, Serialize)]
pub struct Board {
    /// Unique identifier (server-assigned UUID)
    pub id: String,

    /// Display label
    pub label: String,

    /// Display color (hex string, client-defined)
    pub color: String,

    /// Position in the board list; dense 0..n across all boards
    pub sort_order: i64,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Board {
    /// Create a new board at the given position.
    pub fn new(label: String, color: String, sort_order: i64) -> Self {
        Self {
            id: new_id(),
            label,
            color,
            sort_order,
            created_at: Utc::now(),
        }
    }
}

/// A project grouping tasks.
#[derive(Debug, Clone, Serialize)]
pub struct Project {
    /// Unique identifier (server-assigned UUID)
    pub id: String,

    /// Full project name
    pub name: String,

    /// Short display name (badge text)
    pub short_name: String,

    /// Optional display color
    pub color: Option<String>,

    /// Position in the project list; dense 0..n across all projects
    pub sort_order: i64,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,
}

impl Project {
    /// Create a new project at the given position.
    pub fn new(name: String, short_name: String, color: Option<String>, sort_order: i64) -> Self {
        Self {
            id: new_id(),
            name,
            short_name,
            color,
            sort_order,
            created_at: Utc::now(),
        }
    }
}

/// A work item. A task exists independently of any board; its placement in
/// a board's column is a separate [`Placement`] edge (at most one per task).
#[derive(Debug, Clone)]
pub struct Task {
    /// Unique identifier (server-assigned UUID)
    pub id: String,

    /// Task title
    pub title: String,

    /// Detailed description
    pub description: Option<String>,

    /// Optional project reference
    pub project_id: Option<String>,

    /// Scheduled start date
    pub scheduled_start: Option<NaiveDate>,

    /// Scheduled end date
    pub scheduled_end: Option<NaiveDate>,

    /// Completion timestamp; presence means completed
    pub completed_at: Option<DateTime<Utc>>,

    /// Archival timestamp; presence means archived
    pub archived_at: Option<DateTime<Utc>>,

    /// Creation timestamp
    pub created_at: DateTime<Utc>,

    /// Last update timestamp
    pub updated_at: DateTime<Utc>,
}

impl Task {
    /// Create a new task with the given title.
    pub fn new(title: String) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            title,
            description: None,
            project_id: None,
            scheduled_start: None,
            scheduled_end: None,
            completed_at: None,
            archived_at: None,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Placement of a task in a board's column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Placement {
    /// Board the task is assigned to
    pub board_id: String,

    /// Position within that board; dense 0..k among the board's tasks
    pub sort_order: i64,
}

/// Short project shape embedded in task responses.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectSummary {
    pub id: String,
    pub name: String,
    pub short_name: String,
    pub color: Option<String>,
}

/// A task as rendered on the wire.
///
/// Assigned tasks carry `board_id`/`sort_order` via the flattened placement;
/// unassigned ("inbox") tasks lack those fields entirely.
#[derive(Debug, Clone, Serialize)]
pub struct TaskView {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    #[serde(flatten)]
    pub placement: Option<Placement>,
    pub scheduled_start: Option<NaiveDate>,
    pub scheduled_end: Option<NaiveDate>,
    pub completed_at: Option<DateTime<Utc>>,
    pub archived_at: Option<DateTime<Utc>>,
    pub project: Option<ProjectSummary>,
}

/// A task as rendered in a project's task list, with the owning board's
/// label denormalized in for display.
#[derive(Debug, Clone, Serialize)]
pub struct ProjectTaskView {
    pub id: String,
    pub title: String,
    pub description: Option<String>,
    pub scheduled_start: Option<NaiveDate>,
    pub scheduled_end: Option<NaiveDate>,
    pub completed_at: Option<DateTime<Utc>>,
    pub archived_at: Option<DateTime<Utc>>,
    pub board_id: Option<String>,
    pub board_name: Option<String>,
    pub sort_order: Option<i64>,
}

// === Request types ===

/// Body for `POST /api/boards`.
#[derive(Debug, Deserialize)]
pub struct NewBoard {
    pub label: String,
    pub color: String,
}

/// Body for `POST /api/projects`.
#[derive(Debug, Deserialize)]
pub struct NewProject {
    pub name: String,
    pub short_name: String,
    #[serde(default)]
    pub color: Option<String>,
}

/// Body for `POST /api/tasks`.
#[derive(Debug, Deserialize)]
pub struct NewTask {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub scheduled_start: Option<NaiveDate>,
    #[serde(default)]
    pub scheduled_end: Option<NaiveDate>,
    #[serde(default)]
    pub project_id: Option<String>,
    /// When present, the task is appended to this board's column.
    #[serde(default)]
    pub board_id: Option<String>,
}

/// Body for `POST /api/boards/{id}/reorder`.
#[derive(Debug, Deserialize)]
pub struct BoardReorder {
    pub sort_order: i64,
}

/// Body for `POST /api/tasks/{id}/reorder`.
///
/// `board_id: null` (or absent) unassigns the task back to the inbox.
#[derive(Debug, Deserialize)]
pub struct TaskReorder {
    #[serde(default)]
    pub board_id: Option<String>,
    #[serde(default)]
    pub sort_order: i64,
}

/// Deserialize helper for nullable patch fields: maps any present JSON
/// value (including `null`) to `Some(...)`, so a missing field stays `None`.
fn patch_field<'de, D, T>(deserializer: D) -> std::result::Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Partial update for a board. Absent fields are left unchanged.
#[derive(Debug, Default, Deserialize)]
pub struct BoardPatch {
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

impl BoardPatch {
    /// True when no field was supplied.
    pub fn is_empty(&self) -> bool {
        self.label.is_none() && self.color.is_none()
    }

    /// Apply the supplied fields to a board row.
    pub fn apply(&self, board: &mut Board) {
        if let Some(label) = &self.label {
            board.label = label.clone();
        }
        if let Some(color) = &self.color {
            board.color = color.clone();
        }
    }
}

/// Partial update for a project. Absent fields are left unchanged;
/// `color: null` clears the color.
#[derive(Debug, Default, Deserialize)]
pub struct ProjectPatch {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub short_name: Option<String>,
    #[serde(default, deserialize_with = "patch_field")]
    pub color: Option<Option<String>>,
}

impl ProjectPatch {
    /// True when no field was supplied.
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.short_name.is_none() && self.color.is_none()
    }

    /// Apply the supplied fields to a project row.
    pub fn apply(&self, project: &mut Project) {
        if let Some(name) = &self.name {
            project.name = name.clone();
        }
        if let Some(short_name) = &self.short_name {
            project.short_name = short_name.clone();
        }
        if let Some(color) = &self.color {
            project.color = color.clone();
        }
    }
}

/// Partial update for a task. Absent fields are left unchanged.
///
/// `completed` and `archived` are booleans on the wire but are persisted as
/// nullable timestamps: `true` stamps the current time, `false` clears it.
#[derive(Debug, Default, Deserialize)]
pub struct TaskPatch {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "patch_field")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "patch_field")]
    pub project_id: Option<Option<String>>,
    #[serde(default, deserialize_with = "patch_field")]
    pub scheduled_start: Option<Option<NaiveDate>>,
    #[serde(default, deserialize_with = "patch_field")]
    pub scheduled_end: Option<Option<NaiveDate>>,
    #[serde(default)]
    pub completed: Option<bool>,
    #[serde(default)]
    pub archived: Option<bool>,
}

impl TaskPatch {
    /// True when no field was supplied.
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.project_id.is_none()
            && self.scheduled_start.is_none()
            && self.scheduled_end.is_none()
            && self.completed.is_none()
            && self.archived.is_none()
    }

    /// Apply the supplied fields to a task row, stamping `updated_at`.
    pub fn apply(&self, task: &mut Task) {
        let now = Utc::now();
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(description) = &self.description {
            task.description = description.clone();
        }
        if let Some(project_id) = &self.project_id {
            task.project_id = project_id.clone();
        }
        if let Some(scheduled_start) = &self.scheduled_start {
            task.scheduled_start = *scheduled_start;
        }
        if let Some(scheduled_end) = &self.scheduled_end {
            task.scheduled_end = *scheduled_end;
        }
        if let Some(completed) = self.completed {
            task.completed_at = if completed { Some(now) } else { None };
        }
        if let Some(archived) = self.archived {
            task.archived_at = if archived { Some(now) } else { None };
        }
        task.updated_at = now;
    }
}
