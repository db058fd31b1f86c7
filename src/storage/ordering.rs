//! Dense sort-order maintenance for ordered collections.
//!
//! Every container with a `sort_order` column (the board list, the project
//! list, and each board's task column) keeps its values a contiguous
//! `{0..n-1}` set: no gaps, no duplicates. The primitives here are the four
//! moves that preserve that invariant:
//!
//! - append: next free position is `max + 1` (`0` for an empty scope)
//! - close a gap after a removal
//! - open a slot before an insertion
//! - shift the interval between an entity's old and new position
//!
//! All of them run against the caller's open transaction
//! ([`rusqlite::Transaction`] derefs to [`Connection`]), so a failed
//! operation rolls back without any partial shift becoming visible. The
//! shifts are single bulk UPDATEs; no UNIQUE constraint sits on
//! `sort_order`, so intermediate states inside the transaction are free to
//! collide and only the committed result must be dense.

use rusqlite::{Connection, ToSql};

use crate::Result;

/// A named ordered collection: the set of sibling rows among which
/// `sort_order` is kept dense.
#[derive(Debug, Clone, Copy)]
pub(crate) enum Scope<'a> {
    /// All boards
    Boards,
    /// All projects
    Projects,
    /// Assignments within one board's column
    BoardTasks(&'a str),
}

impl Scope<'_> {
    fn table(self) -> &'static str {
        match self {
            Scope::Boards => "boards",
            Scope::Projects => "projects",
            Scope::BoardTasks(_) => "board_tasks",
        }
    }

    /// Predicate narrowing the table to this scope, appended after the
    /// operation's own conditions.
    fn filter(self) -> (&'static str, Vec<Box<dyn ToSql>>) {
        match self {
            Scope::Boards | Scope::Projects => ("", Vec::new()),
            Scope::BoardTasks(board_id) => (
                " AND board_id = ?",
                vec![Box::new(board_id.to_string()) as Box<dyn ToSql>],
            ),
        }
    }
}

/// Next free position in the scope: `max(sort_order) + 1`, or `0` when
/// the scope is empty.
pub(crate) fn next_order(conn: &Connection, scope: Scope) -> Result<i64> {
    let (filter, params_vec) = scope.filter();
    let sql = format!(
        "SELECT COALESCE(MAX(sort_order), -1) + 1 FROM {} WHERE 1=1{}",
        scope.table(),
        filter
    );
    let params_refs: Vec<&dyn ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
    let next = conn.query_row(&sql, params_refs.as_slice(), |row| row.get(0))?;
    Ok(next)
}

/// Number of members in the scope.
pub(crate) fn count(conn: &Connection, scope: Scope) -> Result<i64> {
    let (filter, params_vec) = scope.filter();
    let sql = format!(
        "SELECT COUNT(*) FROM {} WHERE 1=1{}",
        scope.table(),
        filter
    );
    let params_refs: Vec<&dyn ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
    let n = conn.query_row(&sql, params_refs.as_slice(), |row| row.get(0))?;
    Ok(n)
}

/// Close the gap left at `removed_order`: every member past it moves one
/// position earlier. The removed row must already be gone (or about to be
/// repositioned out of the scope).
pub(crate) fn close_gap(conn: &Connection, scope: Scope, removed_order: i64) -> Result<()> {
    let (filter, filter_params) = scope.filter();
    let sql = format!(
        "UPDATE {} SET sort_order = sort_order - 1 WHERE sort_order > ?{}",
        scope.table(),
        filter
    );
    let mut params_vec: Vec<Box<dyn ToSql>> = vec![Box::new(removed_order)];
    params_vec.extend(filter_params);
    let params_refs: Vec<&dyn ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
    conn.execute(&sql, params_refs.as_slice())?;
    Ok(())
}

/// Open a slot at `at`: every member at or past it moves one position
/// later, making room for an insertion.
pub(crate) fn open_slot(conn: &Connection, scope: Scope, at: i64) -> Result<()> {
    let (filter, filter_params) = scope.filter();
    let sql = format!(
        "UPDATE {} SET sort_order = sort_order + 1 WHERE sort_order >= ?{}",
        scope.table(),
        filter
    );
    let mut params_vec: Vec<Box<dyn ToSql>> = vec![Box::new(at)];
    params_vec.extend(filter_params);
    let params_refs: Vec<&dyn ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
    conn.execute(&sql, params_refs.as_slice())?;
    Ok(())
}

/// Shift the interval between an entity's old and new position so the
/// entity can land at `new_order`. The moved row itself sits at
/// `old_order`, outside both shifted ranges; the caller updates it
/// afterwards.
pub(crate) fn shift_for_move(
    conn: &Connection,
    scope: Scope,
    old_order: i64,
    new_order: i64,
) -> Result<()> {
    if old_order == new_order {
        return Ok(());
    }

    let (filter, filter_params) = scope.filter();
    let (sql, bounds) = if old_order < new_order {
        // Moving later: (old, new] steps one position earlier.
        (
            format!(
                "UPDATE {} SET sort_order = sort_order - 1 \
                 WHERE sort_order > ? AND sort_order <= ?{}",
                scope.table(),
                filter
            ),
            (old_order, new_order),
        )
    } else {
        // Moving earlier: [new, old) steps one position later.
        (
            format!(
                "UPDATE {} SET sort_order = sort_order + 1 \
                 WHERE sort_order >= ? AND sort_order < ?{}",
                scope.table(),
                filter
            ),
            (new_order, old_order),
        )
    };

    let mut params_vec: Vec<Box<dyn ToSql>> = vec![Box::new(bounds.0), Box::new(bounds.1)];
    params_vec.extend(filter_params);
    let params_refs: Vec<&dyn ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
    conn.execute(&sql, params_refs.as_slice())?;
    Ok(())
}

/// All sort orders in the scope, ascending. Test support for asserting the
/// density invariant.
#[cfg(test)]
pub(crate) fn orders(conn: &Connection, scope: Scope) -> Result<Vec<i64>> {
    let (filter, params_vec) = scope.filter();
    let sql = format!(
        "SELECT sort_order FROM {} WHERE 1=1{} ORDER BY sort_order",
        scope.table(),
        filter
    );
    let params_refs: Vec<&dyn ToSql> = params_vec.iter().map(|p| p.as_ref()).collect();
    let mut stmt = conn.prepare(&sql)?;
    let values: Vec<i64> = stmt
        .query_map(params_refs.as_slice(), |row| row.get(0))?
        .collect::<std::result::Result<_, _>>()?;
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::{params, Connection};

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        crate::storage::init_schema(&conn).unwrap();
        conn
    }

    fn insert_board(conn: &Connection, id: &str, sort_order: i64) {
        conn.execute(
            "INSERT INTO boards (id, label, color, sort_order, created_at)
             VALUES (?1, ?1, '#888', ?2, '2026-01-01T00:00:00Z')",
            params![id, sort_order],
        )
        .unwrap();
    }

    #[test]
    fn test_next_order_empty_scope() {
        let conn = test_conn();
        assert_eq!(next_order(&conn, Scope::Boards).unwrap(), 0);
    }

    #[test]
    fn test_next_order_appends_after_max() {
        let conn = test_conn();
        insert_board(&conn, "a", 0);
        insert_board(&conn, "b", 1);
        assert_eq!(next_order(&conn, Scope::Boards).unwrap(), 2);
    }

    #[test]
    fn test_close_gap_compacts() {
        let conn = test_conn();
        for (id, so) in [("a", 0), ("b", 1), ("c", 2), ("d", 3)] {
            insert_board(&conn, id, so);
        }
        // Simulate removal of position 1
        conn.execute("DELETE FROM boards WHERE id = 'b'", []).unwrap();
        close_gap(&conn, Scope::Boards, 1).unwrap();
        assert_eq!(orders(&conn, Scope::Boards).unwrap(), vec![0, 1, 2]);
    }

    #[test]
    fn test_open_slot_shifts_tail() {
        let conn = test_conn();
        for (id, so) in [("a", 0), ("b", 1), ("c", 2)] {
            insert_board(&conn, id, so);
        }
        open_slot(&conn, Scope::Boards, 1).unwrap();
        assert_eq!(orders(&conn, Scope::Boards).unwrap(), vec![0, 2, 3]);
    }

    #[test]
    fn test_shift_for_move_later_and_earlier() {
        let conn = test_conn();
        for (id, so) in [("a", 0), ("b", 1), ("c", 2), ("d", 3)] {
            insert_board(&conn, id, so);
        }

        // Move "a" from 0 to 2: (0, 2] steps back, then "a" takes 2.
        shift_for_move(&conn, Scope::Boards, 0, 2).unwrap();
        conn.execute("UPDATE boards SET sort_order = 2 WHERE id = 'a'", [])
            .unwrap();
        assert_eq!(orders(&conn, Scope::Boards).unwrap(), vec![0, 1, 2, 3]);

        // And back again: round trip restores the original ordering.
        shift_for_move(&conn, Scope::Boards, 2, 0).unwrap();
        conn.execute("UPDATE boards SET sort_order = 0 WHERE id = 'a'", [])
            .unwrap();
        let ids: Vec<String> = {
            let mut stmt = conn
                .prepare("SELECT id FROM boards ORDER BY sort_order")
                .unwrap();
            stmt.query_map([], |row| row.get(0))
                .unwrap()
                .collect::<std::result::Result<_, _>>()
                .unwrap()
        };
        assert_eq!(ids, vec!["a", "b", "c", "d"]);
    }

    #[test]
    fn test_shift_for_move_noop() {
        let conn = test_conn();
        for (id, so) in [("a", 0), ("b", 1)] {
            insert_board(&conn, id, so);
        }
        shift_for_move(&conn, Scope::Boards, 1, 1).unwrap();
        assert_eq!(orders(&conn, Scope::Boards).unwrap(), vec![0, 1]);
    }

    #[test]
    fn test_board_task_scope_is_isolated() {
        let conn = test_conn();
        insert_board(&conn, "x", 0);
        insert_board(&conn, "y", 1);
        for (task, board, so) in [("t1", "x", 0), ("t2", "x", 1), ("t3", "y", 0)] {
            conn.execute(
                "INSERT INTO tasks (id, title, created_at, updated_at)
                 VALUES (?1, ?1, '2026-01-01T00:00:00Z', '2026-01-01T00:00:00Z')",
                params![task],
            )
            .unwrap();
            conn.execute(
                "INSERT INTO board_tasks (board_id, task_id, sort_order) VALUES (?1, ?2, ?3)",
                params![board, task, so],
            )
            .unwrap();
        }

        open_slot(&conn, Scope::BoardTasks("x"), 0).unwrap();
        assert_eq!(orders(&conn, Scope::BoardTasks("x")).unwrap(), vec![1, 2]);
        // Board y's column is untouched
        assert_eq!(orders(&conn, Scope::BoardTasks("y")).unwrap(), vec![0]);
    }
}
