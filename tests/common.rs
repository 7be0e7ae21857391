#![allow(dead_code)]
use std::env;
use std::path::PathBuf;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use assert_cmd::{Command, cargo_bin_cmd};
use async_trait::async_trait;
use rusqlite::Connection;

use stationsync::db::Store;
use stationsync::db::initialize::init_db;
use stationsync::errors::{AppError, AppResult};
use stationsync::models::{StationVisit, Visitor};
use stationsync::remote::RemoteStore;

pub fn ssync() -> Command {
    cargo_bin_cmd!("stationsync")
}

/// Create a unique test DB path inside the system temp dir and remove any existing file
pub fn setup_test_db(name: &str) -> String {
    let mut path: PathBuf = env::temp_dir();
    path.push(format!("{}_stationsync.sqlite", name));
    let db_path = path.to_string_lossy().to_string();
    std::fs::remove_file(&db_path).ok();
    db_path
}

/// Fresh in-memory store with the full schema applied.
pub fn memory_store() -> Store {
    let conn = Connection::open_in_memory().expect("open in-memory db");
    init_db(&conn).expect("init schema");
    Store::from_connection(conn)
}

/// Recording fake of the remote store. Batches are captured per table and
/// `fail` turns every upsert into a rejected batch.
#[derive(Default)]
pub struct MockRemote {
    pub visitor_batches: Mutex<Vec<Vec<Visitor>>>,
    pub visit_batches: Mutex<Vec<Vec<StationVisit>>>,
    pub fail: AtomicBool,
}

impl MockRemote {
    pub fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub fn visitor_batch_count(&self) -> usize {
        self.visitor_batches.lock().unwrap().len()
    }

    pub fn visit_batch_count(&self) -> usize {
        self.visit_batches.lock().unwrap().len()
    }
}

#[async_trait]
impl RemoteStore for MockRemote {
    async fn upsert_visitors(&self, rows: &[Visitor]) -> AppResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::Remote("simulated visitor upsert failure".into()));
        }
        self.visitor_batches.lock().unwrap().push(rows.to_vec());
        Ok(())
    }

    async fn upsert_visits(&self, rows: &[StationVisit]) -> AppResult<()> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(AppError::Remote("simulated visit upsert failure".into()));
        }
        self.visit_batches.lock().unwrap().push(rows.to_vec());
        Ok(())
    }
}
