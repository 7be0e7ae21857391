//! All SQL run against the local store.
//!
//! Write paths clear the `synced_to_remote` flag so the sync worker picks
//! the row up again; only `mark_*_synced` ever sets it.

use rusqlite::{Connection, params};

use crate::errors::AppResult;
use crate::models::command::{CloseVisit, Command, InsertVisit, RegisterVisitor, UpsertVisitor};
use crate::models::{StationVisit, Visitor};

// ---------------------------------------------------------------------------
// Write commands (persistence worker)
// ---------------------------------------------------------------------------

/// Create the visitor row at first sighting. A duplicate token is a no-op:
/// the row keeps its first-seen `created_at`.
pub fn insert_visitor_if_absent(conn: &Connection, cmd: &UpsertVisitor) -> AppResult<usize> {
    let n = conn.execute(
        "INSERT INTO visitors (token, created_at) VALUES (?1, ?2)
         ON CONFLICT(token) DO NOTHING",
        params![cmd.token, cmd.created_at],
    )?;
    Ok(n)
}

pub fn insert_visit(conn: &Connection, cmd: &InsertVisit) -> AppResult<usize> {
    let n = conn.execute(
        "INSERT INTO station_visits (token, station_id, check_in_time, created_at)
         VALUES (?1, ?2, ?3, ?4)",
        params![cmd.token, cmd.station_id, cmd.check_in_time, cmd.created_at],
    )?;
    Ok(n)
}

/// Close the open visit for `(token, station_id)`. Matches only rows whose
/// checkout is still NULL; zero matches means the exit event is dropped.
pub fn close_open_visit(conn: &Connection, cmd: &CloseVisit) -> AppResult<usize> {
    let n = conn.execute(
        "UPDATE station_visits
         SET check_out_time = ?1, synced_to_remote = 0
         WHERE token = ?2 AND station_id = ?3 AND check_out_time IS NULL",
        params![cmd.check_out_time, cmd.token, cmd.station_id],
    )?;
    Ok(n)
}

pub fn register_visitor(conn: &Connection, cmd: &RegisterVisitor) -> AppResult<usize> {
    let n = conn.execute(
        "UPDATE visitors
         SET fullname = ?1, age = ?2, gender = ?3, school = ?4, email = ?5,
             phone = ?6, registered_at = ?7, reward_claimed_at = ?8,
             synced_to_remote = 0
         WHERE token = ?9",
        params![
            cmd.fullname,
            cmd.age,
            cmd.gender,
            cmd.school,
            cmd.email,
            cmd.phone,
            cmd.registered_at,
            cmd.reward_claimed_at,
            cmd.token,
        ],
    )?;
    Ok(n)
}

/// Dispatch one buffered command to its prepared operation. Returns the
/// number of rows affected (0 is legal, e.g. a checkout with no open visit).
pub fn apply_command(conn: &Connection, cmd: &Command) -> AppResult<usize> {
    match cmd {
        Command::UpsertVisitor(c) => insert_visitor_if_absent(conn, c),
        Command::InsertVisit(c) => insert_visit(conn, c),
        Command::CloseVisit(c) => close_open_visit(conn, c),
        Command::RegisterVisitor(c) => register_visitor(conn, c),
    }
}

// ---------------------------------------------------------------------------
// Sync worker selects / flag updates
// ---------------------------------------------------------------------------

pub fn select_unsynced_visitors(conn: &Connection, limit: usize) -> AppResult<Vec<Visitor>> {
    let mut stmt = conn.prepare(
        "SELECT * FROM visitors WHERE synced_to_remote = 0 LIMIT ?1",
    )?;
    let rows = stmt.query_map([limit as i64], Visitor::map_row)?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

pub fn select_unsynced_visits(conn: &Connection, limit: usize) -> AppResult<Vec<StationVisit>> {
    let mut stmt = conn.prepare(
        "SELECT * FROM station_visits WHERE synced_to_remote = 0 LIMIT ?1",
    )?;
    let rows = stmt.query_map([limit as i64], StationVisit::map_row)?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

/// Flag exactly the uploaded visitor rows as synced, in one transaction.
pub fn mark_visitors_synced(conn: &mut Connection, rows: &[Visitor]) -> AppResult<()> {
    let tx = conn.transaction()?;
    {
        let mut stmt =
            tx.prepare("UPDATE visitors SET synced_to_remote = 1 WHERE token = ?1")?;
        for row in rows {
            stmt.execute([&row.token])?;
        }
    }
    tx.commit()?;
    Ok(())
}

/// Flag exactly the uploaded visit rows as synced, in one transaction.
pub fn mark_visits_synced(conn: &mut Connection, rows: &[StationVisit]) -> AppResult<()> {
    let tx = conn.transaction()?;
    {
        let mut stmt =
            tx.prepare("UPDATE station_visits SET synced_to_remote = 1 WHERE id = ?1")?;
        for row in rows {
            stmt.execute([row.id])?;
        }
    }
    tx.commit()?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Read-only surface (fallback query service, `status` command)
// ---------------------------------------------------------------------------

/// All visitors, newest first.
pub fn list_visitors(conn: &Connection) -> AppResult<Vec<Visitor>> {
    let mut stmt = conn.prepare("SELECT * FROM visitors ORDER BY created_at DESC")?;
    let rows = stmt.query_map([], Visitor::map_row)?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

/// All station visits, newest first.
pub fn list_station_visits(conn: &Connection) -> AppResult<Vec<StationVisit>> {
    let mut stmt = conn.prepare("SELECT * FROM station_visits ORDER BY created_at DESC")?;
    let rows = stmt.query_map([], StationVisit::map_row)?;

    let mut out = Vec::new();
    for r in rows {
        out.push(r?);
    }
    Ok(out)
}

/// Row and backlog counts per table, for the `status` command.
#[derive(Debug, Clone, Copy)]
pub struct TableCounts {
    pub visitors: i64,
    pub visitors_unsynced: i64,
    pub visits: i64,
    pub visits_unsynced: i64,
}

pub fn table_counts(conn: &Connection) -> AppResult<TableCounts> {
    let count = |sql: &str| -> AppResult<i64> {
        let n: i64 = conn.query_row(sql, [], |row| row.get(0))?;
        Ok(n)
    };
    Ok(TableCounts {
        visitors: count("SELECT COUNT(*) FROM visitors")?,
        visitors_unsynced: count("SELECT COUNT(*) FROM visitors WHERE synced_to_remote = 0")?,
        visits: count("SELECT COUNT(*) FROM station_visits")?,
        visits_unsynced: count(
            "SELECT COUNT(*) FROM station_visits WHERE synced_to_remote = 0",
        )?,
    })
}

/// Oldest not-yet-synced row creation time across both tables, if any.
/// Used by the sync worker's backlog-age warning.
pub fn oldest_unsynced_created_at(conn: &Connection) -> AppResult<Option<String>> {
    let min: Option<String> = conn.query_row(
        "SELECT MIN(created_at) FROM (
             SELECT created_at FROM visitors WHERE synced_to_remote = 0
             UNION ALL
             SELECT created_at FROM station_visits WHERE synced_to_remote = 0
         )",
        [],
        |row| row.get(0),
    )?;
    Ok(min)
}
