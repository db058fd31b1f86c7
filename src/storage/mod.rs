//! Storage layer for TaskTimer data.
//!
//! All state lives in a single SQLite database (rusqlite, bundled). Four
//! tables back the entities: `boards`, `projects`, `tasks`, and
//! `board_tasks` (the join placing a task into a board's column).
//!
//! Every mutating operation runs inside one transaction on the single
//! write connection, so the dense sort-order invariant maintained by
//! [`ordering`] either fully applies or fully rolls back. Concurrent
//! requests are serialized by the connection itself (the server wraps
//! `Storage` in a mutex), which is what keeps the read-shift-write
//! sequences race-free.

pub mod ordering;

use crate::models::{
    Board, BoardPatch, NewBoard, NewProject, NewTask, Placement, Project, ProjectPatch,
    ProjectSummary, ProjectTaskView, Task, TaskPatch, TaskView,
};
use crate::{Error, Result};
use ordering::Scope;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::fs;
use std::path::Path;

/// Storage manager over a single SQLite database.
pub struct Storage {
    conn: Connection,
}

impl Storage {
    /// Open (creating if necessary) the database at the given path.
    pub fn open(db_path: &Path) -> Result<Self> {
        if let Some(parent) = db_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(db_path)?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        init_schema(&conn)?;
        Ok(Self { conn })
    }

    /// Open an in-memory database. Used by tests and throwaway setups.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute("PRAGMA foreign_keys = ON", [])?;
        init_schema(&conn)?;
        Ok(Self { conn })
    }

    // === Board Operations ===

    /// List all boards, ordered by position.
    pub fn list_boards(&self) -> Result<Vec<Board>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, label, color, sort_order, created_at FROM boards ORDER BY sort_order",
        )?;
        let boards = stmt
            .query_map([], board_from_row)?
            .collect::<std::result::Result<_, _>>()?;
        Ok(boards)
    }

    /// Create a board, appended at the end of the board list.
    pub fn create_board(&mut self, new: NewBoard) -> Result<Board> {
        let tx = self.conn.transaction()?;
        let next = ordering::next_order(&tx, Scope::Boards)?;
        let board = Board::new(new.label, new.color, next);
        tx.execute(
            "INSERT INTO boards (id, label, color, sort_order, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                board.id,
                board.label,
                board.color,
                board.sort_order,
                board.created_at
            ],
        )?;
        tx.commit()?;
        Ok(board)
    }

    /// Apply a partial update to a board.
    pub fn update_board(&mut self, id: &str, patch: &BoardPatch) -> Result<Board> {
        if patch.is_empty() {
            return Err(Error::InvalidInput("no fields to update".to_string()));
        }
        let tx = self.conn.transaction()?;
        let mut board = get_board(&tx, id)?;
        patch.apply(&mut board);
        tx.execute(
            "UPDATE boards SET label = ?1, color = ?2 WHERE id = ?3",
            params![board.label, board.color, id],
        )?;
        tx.commit()?;
        Ok(board)
    }

    /// Delete a board. Its task assignments are dropped by cascade (the
    /// tasks themselves survive, back in the inbox) and the remaining
    /// boards close ranks.
    pub fn delete_board(&mut self, id: &str) -> Result<()> {
        let tx = self.conn.transaction()?;
        let board = get_board(&tx, id)?;
        tx.execute("DELETE FROM boards WHERE id = ?1", [id])?;
        ordering::close_gap(&tx, Scope::Boards, board.sort_order)?;
        tx.commit()?;
        Ok(())
    }

    /// Move a board to a new position in the board list. Out-of-range
    /// targets are clamped.
    pub fn reorder_board(&mut self, id: &str, requested: i64) -> Result<Board> {
        let tx = self.conn.transaction()?;
        let board = get_board(&tx, id)?;
        let count = ordering::count(&tx, Scope::Boards)?;
        let new_order = requested.clamp(0, count - 1);
        if new_order != board.sort_order {
            ordering::shift_for_move(&tx, Scope::Boards, board.sort_order, new_order)?;
            tx.execute(
                "UPDATE boards SET sort_order = ?1 WHERE id = ?2",
                params![new_order, id],
            )?;
        }
        let board = get_board(&tx, id)?;
        tx.commit()?;
        Ok(board)
    }

    // === Project Operations ===

    /// List all projects, ordered by position.
    pub fn list_projects(&self) -> Result<Vec<Project>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, short_name, color, sort_order, created_at
             FROM projects ORDER BY sort_order",
        )?;
        let projects = stmt
            .query_map([], project_from_row)?
            .collect::<std::result::Result<_, _>>()?;
        Ok(projects)
    }

    /// Get a project by ID.
    pub fn get_project(&self, id: &str) -> Result<Project> {
        get_project(&self.conn, id)
    }

    /// Create a project, appended at the end of the project list.
    pub fn create_project(&mut self, new: NewProject) -> Result<Project> {
        let tx = self.conn.transaction()?;
        let next = ordering::next_order(&tx, Scope::Projects)?;
        let project = Project::new(new.name, new.short_name, new.color, next);
        tx.execute(
            "INSERT INTO projects (id, name, short_name, color, sort_order, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                project.id,
                project.name,
                project.short_name,
                project.color,
                project.sort_order,
                project.created_at
            ],
        )?;
        tx.commit()?;
        Ok(project)
    }

    /// Apply a partial update to a project.
    pub fn update_project(&mut self, id: &str, patch: &ProjectPatch) -> Result<Project> {
        if patch.is_empty() {
            return Err(Error::InvalidInput("no fields to update".to_string()));
        }
        let tx = self.conn.transaction()?;
        let mut project = get_project(&tx, id)?;
        patch.apply(&mut project);
        tx.execute(
            "UPDATE projects SET name = ?1, short_name = ?2, color = ?3 WHERE id = ?4",
            params![project.name, project.short_name, project.color, id],
        )?;
        tx.commit()?;
        Ok(project)
    }

    /// Delete a project. Referencing tasks keep existing with their
    /// project reference cleared (FK is ON DELETE SET NULL) and the
    /// remaining projects close ranks.
    pub fn delete_project(&mut self, id: &str) -> Result<()> {
        let tx = self.conn.transaction()?;
        let project = get_project(&tx, id)?;
        tx.execute("DELETE FROM projects WHERE id = ?1", [id])?;
        ordering::close_gap(&tx, Scope::Projects, project.sort_order)?;
        tx.commit()?;
        Ok(())
    }

    /// List a project's tasks, newest first, with the owning board's
    /// label denormalized in for assigned tasks.
    pub fn list_project_tasks(&self, project_id: &str) -> Result<Vec<ProjectTaskView>> {
        get_project(&self.conn, project_id)?;
        let mut stmt = self.conn.prepare(
            "SELECT t.id, t.title, t.description, t.scheduled_start, t.scheduled_end,
                    t.completed_at, t.archived_at, bt.board_id, b.label, bt.sort_order
             FROM tasks t
             LEFT JOIN board_tasks bt ON bt.task_id = t.id
             LEFT JOIN boards b ON b.id = bt.board_id
             WHERE t.project_id = ?1
             ORDER BY t.created_at DESC",
        )?;
        let tasks = stmt
            .query_map([project_id], |row| {
                Ok(ProjectTaskView {
                    id: row.get(0)?,
                    title: row.get(1)?,
                    description: row.get(2)?,
                    scheduled_start: row.get(3)?,
                    scheduled_end: row.get(4)?,
                    completed_at: row.get(5)?,
                    archived_at: row.get(6)?,
                    board_id: row.get(7)?,
                    board_name: row.get(8)?,
                    sort_order: row.get(9)?,
                })
            })?
            .collect::<std::result::Result<_, _>>()?;
        Ok(tasks)
    }

    // === Task Operations ===

    /// List all tasks currently assigned to a board, grouped by board and
    /// ordered by position within each column.
    pub fn list_assigned_tasks(&self) -> Result<Vec<TaskView>> {
        let sql = format!(
            "{TASK_VIEW_SELECT} WHERE bt.task_id IS NOT NULL
             ORDER BY bt.board_id, bt.sort_order"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let tasks = stmt
            .query_map([], task_view_from_row)?
            .collect::<std::result::Result<_, _>>()?;
        Ok(tasks)
    }

    /// List all unassigned ("inbox") tasks, newest first.
    pub fn list_unassigned_tasks(&self) -> Result<Vec<TaskView>> {
        let sql = format!(
            "{TASK_VIEW_SELECT} WHERE bt.task_id IS NULL
             ORDER BY t.created_at DESC"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let tasks = stmt
            .query_map([], task_view_from_row)?
            .collect::<std::result::Result<_, _>>()?;
        Ok(tasks)
    }

    /// Get a single task view by ID.
    pub fn get_task(&self, id: &str) -> Result<TaskView> {
        get_task_view(&self.conn, id)
    }

    /// Create a task. When `board_id` is supplied the task is appended at
    /// the end of that board's column; otherwise it lands in the inbox.
    pub fn create_task(&mut self, new: NewTask) -> Result<TaskView> {
        let tx = self.conn.transaction()?;

        if let Some(project_id) = &new.project_id {
            if !row_exists(&tx, "projects", project_id)? {
                return Err(Error::InvalidInput(format!(
                    "unknown project_id: {}",
                    project_id
                )));
            }
        }
        if let Some(board_id) = &new.board_id {
            if !row_exists(&tx, "boards", board_id)? {
                return Err(Error::InvalidInput(format!(
                    "unknown board_id: {}",
                    board_id
                )));
            }
        }

        let mut task = Task::new(new.title);
        task.description = new.description;
        task.project_id = new.project_id;
        task.scheduled_start = new.scheduled_start;
        task.scheduled_end = new.scheduled_end;

        tx.execute(
            "INSERT INTO tasks (id, title, description, project_id, scheduled_start,
                                scheduled_end, completed_at, archived_at, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                task.id,
                task.title,
                task.description,
                task.project_id,
                task.scheduled_start,
                task.scheduled_end,
                task.completed_at,
                task.archived_at,
                task.created_at,
                task.updated_at
            ],
        )?;

        if let Some(board_id) = &new.board_id {
            let next = ordering::next_order(&tx, Scope::BoardTasks(board_id))?;
            tx.execute(
                "INSERT INTO board_tasks (board_id, task_id, sort_order) VALUES (?1, ?2, ?3)",
                params![board_id, task.id, next],
            )?;
        }

        let view = get_task_view(&tx, &task.id)?;
        tx.commit()?;
        Ok(view)
    }

    /// Apply a partial update to a task.
    pub fn update_task(&mut self, id: &str, patch: &TaskPatch) -> Result<TaskView> {
        if patch.is_empty() {
            return Err(Error::InvalidInput("no fields to update".to_string()));
        }
        let tx = self.conn.transaction()?;
        let mut task = get_task_row(&tx, id)?;

        if let Some(Some(project_id)) = &patch.project_id {
            if !row_exists(&tx, "projects", project_id)? {
                return Err(Error::InvalidInput(format!(
                    "unknown project_id: {}",
                    project_id
                )));
            }
        }

        patch.apply(&mut task);
        tx.execute(
            "UPDATE tasks SET title = ?1, description = ?2, project_id = ?3,
                              scheduled_start = ?4, scheduled_end = ?5,
                              completed_at = ?6, archived_at = ?7, updated_at = ?8
             WHERE id = ?9",
            params![
                task.title,
                task.description,
                task.project_id,
                task.scheduled_start,
                task.scheduled_end,
                task.completed_at,
                task.archived_at,
                task.updated_at,
                id
            ],
        )?;
        let view = get_task_view(&tx, id)?;
        tx.commit()?;
        Ok(view)
    }

    /// Delete a task. If it was assigned, its board's column closes ranks.
    pub fn delete_task(&mut self, id: &str) -> Result<()> {
        let tx = self.conn.transaction()?;
        let placement = get_placement(&tx, id)?;
        let deleted = tx.execute("DELETE FROM tasks WHERE id = ?1", [id])?;
        if deleted == 0 {
            return Err(Error::NotFound(format!("Task not found: {}", id)));
        }
        if let Some(placement) = placement {
            ordering::close_gap(
                &tx,
                Scope::BoardTasks(&placement.board_id),
                placement.sort_order,
            )?;
        }
        tx.commit()?;
        Ok(())
    }

    /// Move a task to a position in a board's column, possibly from
    /// another board or from the inbox. `board_id = None` unassigns the
    /// task. Out-of-range targets are clamped.
    pub fn reorder_task(
        &mut self,
        id: &str,
        board_id: Option<&str>,
        requested: i64,
    ) -> Result<TaskView> {
        let tx = self.conn.transaction()?;
        if !row_exists(&tx, "tasks", id)? {
            return Err(Error::NotFound(format!("Task not found: {}", id)));
        }
        let current = get_placement(&tx, id)?;

        match board_id {
            None => {
                // Explicit unassign: drop the placement, close the gap.
                if let Some(current) = current {
                    tx.execute("DELETE FROM board_tasks WHERE task_id = ?1", [id])?;
                    ordering::close_gap(
                        &tx,
                        Scope::BoardTasks(&current.board_id),
                        current.sort_order,
                    )?;
                }
            }
            Some(target) => {
                get_board(&tx, target)?;
                match &current {
                    Some(current) if current.board_id == target => {
                        let count = ordering::count(&tx, Scope::BoardTasks(target))?;
                        let new_order = requested.clamp(0, count - 1);
                        if new_order != current.sort_order {
                            ordering::shift_for_move(
                                &tx,
                                Scope::BoardTasks(target),
                                current.sort_order,
                                new_order,
                            )?;
                            tx.execute(
                                "UPDATE board_tasks SET sort_order = ?1 WHERE task_id = ?2",
                                params![new_order, id],
                            )?;
                        }
                    }
                    Some(current) => {
                        // Cross-board move: close the gap left behind,
                        // then open a slot in the target column.
                        ordering::close_gap(
                            &tx,
                            Scope::BoardTasks(&current.board_id),
                            current.sort_order,
                        )?;
                        let count = ordering::count(&tx, Scope::BoardTasks(target))?;
                        let new_order = requested.clamp(0, count);
                        ordering::open_slot(&tx, Scope::BoardTasks(target), new_order)?;
                        tx.execute(
                            "UPDATE board_tasks SET board_id = ?1, sort_order = ?2
                             WHERE task_id = ?3",
                            params![target, new_order, id],
                        )?;
                    }
                    None => {
                        // From the inbox: just open a slot and insert.
                        let count = ordering::count(&tx, Scope::BoardTasks(target))?;
                        let new_order = requested.clamp(0, count);
                        ordering::open_slot(&tx, Scope::BoardTasks(target), new_order)?;
                        tx.execute(
                            "INSERT INTO board_tasks (board_id, task_id, sort_order)
                             VALUES (?1, ?2, ?3)",
                            params![target, id, new_order],
                        )?;
                    }
                }
            }
        }

        let view = get_task_view(&tx, id)?;
        tx.commit()?;
        Ok(view)
    }
}

/// Initialize the SQLite schema.
pub(crate) fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS boards (
            id TEXT PRIMARY KEY,
            label TEXT NOT NULL,
            color TEXT NOT NULL,
            sort_order INTEGER NOT NULL,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS projects (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            short_name TEXT NOT NULL,
            color TEXT,
            sort_order INTEGER NOT NULL,
            created_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS tasks (
            id TEXT PRIMARY KEY,
            title TEXT NOT NULL,
            description TEXT,
            project_id TEXT REFERENCES projects(id) ON DELETE SET NULL,
            scheduled_start TEXT,
            scheduled_end TEXT,
            completed_at TEXT,
            archived_at TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS board_tasks (
            board_id TEXT NOT NULL REFERENCES boards(id) ON DELETE CASCADE,
            task_id TEXT NOT NULL UNIQUE REFERENCES tasks(id) ON DELETE CASCADE,
            sort_order INTEGER NOT NULL,
            PRIMARY KEY (board_id, task_id)
        );

        CREATE INDEX IF NOT EXISTS idx_tasks_project ON tasks(project_id);
        CREATE INDEX IF NOT EXISTS idx_tasks_created ON tasks(created_at);
        CREATE INDEX IF NOT EXISTS idx_board_tasks_board ON board_tasks(board_id);
        "#,
    )?;
    Ok(())
}

/// Shared SELECT for hydrating task views (placement + project summary).
const TASK_VIEW_SELECT: &str = "SELECT t.id, t.title, t.description, bt.board_id, bt.sort_order,
        t.scheduled_start, t.scheduled_end, t.completed_at, t.archived_at,
        p.id, p.name, p.short_name, p.color
 FROM tasks t
 LEFT JOIN board_tasks bt ON bt.task_id = t.id
 LEFT JOIN projects p ON p.id = t.project_id";

fn board_from_row(row: &Row) -> rusqlite::Result<Board> {
    Ok(Board {
        id: row.get(0)?,
        label: row.get(1)?,
        color: row.get(2)?,
        sort_order: row.get(3)?,
        created_at: row.get(4)?,
    })
}

fn project_from_row(row: &Row) -> rusqlite::Result<Project> {
    Ok(Project {
        id: row.get(0)?,
        name: row.get(1)?,
        short_name: row.get(2)?,
        color: row.get(3)?,
        sort_order: row.get(4)?,
        created_at: row.get(5)?,
    })
}

fn task_view_from_row(row: &Row) -> rusqlite::Result<TaskView> {
    let board_id: Option<String> = row.get(3)?;
    let placement = match board_id {
        Some(board_id) => Some(Placement {
            board_id,
            sort_order: row.get(4)?,
        }),
        None => None,
    };
    let project_id: Option<String> = row.get(9)?;
    let project = match project_id {
        Some(id) => Some(ProjectSummary {
            id,
            name: row.get(10)?,
            short_name: row.get(11)?,
            color: row.get(12)?,
        }),
        None => None,
    };
    Ok(TaskView {
        id: row.get(0)?,
        title: row.get(1)?,
        description: row.get(2)?,
        placement,
        scheduled_start: row.get(5)?,
        scheduled_end: row.get(6)?,
        completed_at: row.get(7)?,
        archived_at: row.get(8)?,
        project,
    })
}

fn get_board(conn: &Connection, id: &str) -> Result<Board> {
    conn.query_row(
        "SELECT id, label, color, sort_order, created_at FROM boards WHERE id = ?1",
        [id],
        board_from_row,
    )
    .optional()?
    .ok_or_else(|| Error::NotFound(format!("Board not found: {}", id)))
}

fn get_project(conn: &Connection, id: &str) -> Result<Project> {
    conn.query_row(
        "SELECT id, name, short_name, color, sort_order, created_at FROM projects WHERE id = ?1",
        [id],
        project_from_row,
    )
    .optional()?
    .ok_or_else(|| Error::NotFound(format!("Project not found: {}", id)))
}

fn get_task_row(conn: &Connection, id: &str) -> Result<Task> {
    conn.query_row(
        "SELECT id, title, description, project_id, scheduled_start, scheduled_end,
                completed_at, archived_at, created_at, updated_at
         FROM tasks WHERE id = ?1",
        [id],
        |row| {
            Ok(Task {
                id: row.get(0)?,
                title: row.get(1)?,
                description: row.get(2)?,
                project_id: row.get(3)?,
                scheduled_start: row.get(4)?,
                scheduled_end: row.get(5)?,
                completed_at: row.get(6)?,
                archived_at: row.get(7)?,
                created_at: row.get(8)?,
                updated_at: row.get(9)?,
            })
        },
    )
    .optional()?
    .ok_or_else(|| Error::NotFound(format!("Task not found: {}", id)))
}

fn get_task_view(conn: &Connection, id: &str) -> Result<TaskView> {
    let sql = format!("{TASK_VIEW_SELECT} WHERE t.id = ?1");
    conn.query_row(&sql, [id], task_view_from_row)
        .optional()?
        .ok_or_else(|| Error::NotFound(format!("Task not found: {}", id)))
}

fn get_placement(conn: &Connection, task_id: &str) -> Result<Option<Placement>> {
    let placement = conn
        .query_row(
            "SELECT board_id, sort_order FROM board_tasks WHERE task_id = ?1",
            [task_id],
            |row| {
                Ok(Placement {
                    board_id: row.get(0)?,
                    sort_order: row.get(1)?,
                })
            },
        )
        .optional()?;
    Ok(placement)
}

fn row_exists(conn: &Connection, table: &str, id: &str) -> Result<bool> {
    let sql = format!("SELECT COUNT(*) > 0 FROM {} WHERE id = ?1", table);
    let exists = conn.query_row(&sql, [id], |row| row.get(0))?;
    Ok(exists)
}
