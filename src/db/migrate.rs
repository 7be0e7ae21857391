//! Schema migrations, tracked through SQLite's `user_version` pragma.
//! Each entry runs at most once, in order, inside `execute_batch`.

use crate::errors::{AppError, AppResult};
use rusqlite::Connection;

const MIGRATIONS: &[(i64, &str)] = &[(
    1,
    r#"
    CREATE TABLE IF NOT EXISTS visitors (
        token             TEXT PRIMARY KEY,
        created_at        TEXT NOT NULL,
        fullname          TEXT,
        age               INTEGER,
        gender            TEXT,
        school            TEXT,
        email             TEXT,
        phone             TEXT,
        registered_at     TEXT,
        reward_claimed_at TEXT,
        synced_to_remote  INTEGER NOT NULL DEFAULT 0
    );

    CREATE TABLE IF NOT EXISTS station_visits (
        id               INTEGER PRIMARY KEY AUTOINCREMENT,
        token            TEXT NOT NULL,
        station_id       TEXT NOT NULL,
        check_in_time    TEXT NOT NULL,
        check_out_time   TEXT,
        created_at       TEXT NOT NULL,
        synced_to_remote INTEGER NOT NULL DEFAULT 0
    );

    CREATE INDEX IF NOT EXISTS idx_visits_open
        ON station_visits(token, station_id) WHERE check_out_time IS NULL;
    CREATE INDEX IF NOT EXISTS idx_visitors_unsynced
        ON visitors(synced_to_remote);
    CREATE INDEX IF NOT EXISTS idx_visits_unsynced
        ON station_visits(synced_to_remote);
    "#,
)];

fn current_version(conn: &Connection) -> AppResult<i64> {
    let v: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    Ok(v)
}

/// Apply every migration newer than the stored `user_version`.
pub fn run_pending_migrations(conn: &Connection) -> AppResult<()> {
    let mut version = current_version(conn)?;

    for (target, sql) in MIGRATIONS {
        if *target <= version {
            continue;
        }
        conn.execute_batch(sql).map_err(|e| {
            AppError::Migration(format!("migration {} failed: {}", target, e))
        })?;
        conn.pragma_update(None, "user_version", target)?;
        version = *target;
    }

    Ok(())
}
