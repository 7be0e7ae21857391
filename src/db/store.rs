//! Shared handle on the local SQLite store.
//!
//! The pipeline has exactly two writers (persistence worker, sync worker)
//! running as tasks on the same runtime; the mutex serializes them against
//! the single connection. The lock is only ever held across synchronous DB
//! sections, never across an await.

use std::path::Path;
use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::db::initialize::init_db;
use crate::errors::{AppError, AppResult};

#[derive(Clone)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
}

impl Store {
    /// Open (or create) the database file, switch it to WAL and run
    /// pending migrations. Failure here is fatal to the process.
    pub fn open(path: &str) -> AppResult<Self> {
        let conn = Connection::open(Path::new(path))?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        init_db(&conn)?;
        Ok(Self::from_connection(conn))
    }

    /// Wrap an already initialized connection (tests use in-memory ones).
    pub fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Run a closure against the connection under the lock.
    pub fn with_conn<T>(
        &self,
        func: impl FnOnce(&mut Connection) -> AppResult<T>,
    ) -> AppResult<T> {
        let mut guard = self
            .conn
            .lock()
            .map_err(|_| AppError::Other("store mutex poisoned".to_string()))?;
        func(&mut guard)
    }
}
