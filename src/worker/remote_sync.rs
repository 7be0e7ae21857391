//! Remote sync worker: mirrors not-yet-synced local rows to the remote
//! store in bounded batches.
//!
//! A row is flagged synced only after the remote upsert was acknowledged.
//! A crash between the acknowledgment and the flag update re-uploads the
//! same rows next tick; the upsert is idempotent by primary key, so that
//! is a harmless duplicate, never a loss.

use std::cmp;
use std::time::Duration;

use chrono::{Local, NaiveDateTime};
use tokio::time::sleep;
use tracing::{info, warn};

use crate::db::Store;
use crate::db::queries::{
    mark_visitors_synced, mark_visits_synced, oldest_unsynced_created_at,
    select_unsynced_visitors, select_unsynced_visits,
};
use crate::remote::RemoteStore;
use crate::utils::time::SORTABLE_FORMAT;

/// Backoff cap for consecutive failing ticks.
const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Warn when unsynced rows have been waiting longer than this.
const BACKLOG_AGE_WARN_SECS: i64 = 120;

/// Outcome of one sync cycle, for logs and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub visitors_synced: usize,
    pub visits_synced: usize,
    pub failed_tables: usize,
}

impl SyncReport {
    pub fn is_clean(&self) -> bool {
        self.failed_tables == 0
    }
}

/// One cycle: for each table, select up to `batch_size` unsynced rows,
/// upsert them as a single batch and flag exactly those rows on success.
/// A failing table leaves its flags untouched (the same rows are selected
/// again next cycle) and never aborts the sibling table.
pub async fn sync_once(
    store: &Store,
    remote: &dyn RemoteStore,
    batch_size: usize,
) -> SyncReport {
    let mut report = SyncReport::default();

    // visitors, conflict key: token
    match store.with_conn(|conn| select_unsynced_visitors(conn, batch_size)) {
        Ok(rows) if rows.is_empty() => {}
        Ok(rows) => match remote.upsert_visitors(&rows).await {
            Ok(()) => match store.with_conn(|conn| mark_visitors_synced(conn, &rows)) {
                Ok(()) => {
                    report.visitors_synced = rows.len();
                    info!(count = rows.len(), "visitors batch synced");
                }
                Err(e) => {
                    report.failed_tables += 1;
                    warn!(error = %e, "failed to flag synced visitors");
                }
            },
            Err(e) => {
                report.failed_tables += 1;
                warn!(error = %e, count = rows.len(), "visitors batch sync failed");
            }
        },
        Err(e) => {
            report.failed_tables += 1;
            warn!(error = %e, "visitors batch select failed");
        }
    }

    // station_visits, conflict key: id
    match store.with_conn(|conn| select_unsynced_visits(conn, batch_size)) {
        Ok(rows) if rows.is_empty() => {}
        Ok(rows) => match remote.upsert_visits(&rows).await {
            Ok(()) => match store.with_conn(|conn| mark_visits_synced(conn, &rows)) {
                Ok(()) => {
                    report.visits_synced = rows.len();
                    info!(count = rows.len(), "station_visits batch synced");
                }
                Err(e) => {
                    report.failed_tables += 1;
                    warn!(error = %e, "failed to flag synced visits");
                }
            },
            Err(e) => {
                report.failed_tables += 1;
                warn!(error = %e, count = rows.len(), "station_visits batch sync failed");
            }
        },
        Err(e) => {
            report.failed_tables += 1;
            warn!(error = %e, "station_visits batch select failed");
        }
    }

    report
}

/// Age in seconds of the oldest unsynced row, if any.
fn backlog_age_secs(store: &Store) -> Option<i64> {
    let oldest = store
        .with_conn(|conn| oldest_unsynced_created_at(conn))
        .ok()
        .flatten()?;
    let parsed = NaiveDateTime::parse_from_str(&oldest, SORTABLE_FORMAT).ok()?;
    Some((Local::now().naive_local() - parsed).num_seconds())
}

/// Timer loop around [`sync_once`] with bounded exponential backoff: the
/// delay doubles from the configured interval on consecutive failing
/// cycles, capped at [`MAX_BACKOFF`], and resets on the first clean cycle.
pub async fn run_sync_worker(store: Store, remote: impl RemoteStore, interval: Duration, batch_size: usize) {
    let mut consecutive_failures: u32 = 0;

    loop {
        let delay = if consecutive_failures == 0 {
            interval
        } else {
            cmp::min(interval * 2u32.saturating_pow(consecutive_failures.min(6)), MAX_BACKOFF)
        };
        sleep(delay).await;

        let report = sync_once(&store, &remote, batch_size).await;
        if report.is_clean() {
            consecutive_failures = 0;
        } else {
            consecutive_failures = consecutive_failures.saturating_add(1);
            if let Some(age) = backlog_age_secs(&store) {
                if age > BACKLOG_AGE_WARN_SECS {
                    warn!(age_secs = age, "unsynced backlog is aging");
                }
            }
        }
    }
}
