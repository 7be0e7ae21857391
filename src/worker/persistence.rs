//! Persistence worker: drains the command queue into the local store.
//!
//! One flush = one SQLite transaction over everything drained in that tick.
//! A failing command is logged and skipped; the rest of the flush still
//! commits. Local persistence favours availability over all-or-nothing
//! atomicity across unrelated commands.

use std::time::Duration;

use tokio::time::{self, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::db::Store;
use crate::db::queries::apply_command;
use crate::errors::AppResult;
use crate::queue::CommandQueue;

/// Outcome of one flush, for logs and tests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlushReport {
    pub drained: usize,
    pub applied: usize,
    pub failed: usize,
}

/// Drain the queue and apply everything in one transaction.
///
/// Commands arriving after the drain wait for the next tick. An empty
/// drain is a no-op and never opens a transaction.
pub fn flush_once(store: &Store, queue: &CommandQueue) -> AppResult<FlushReport> {
    let commands = queue.drain();
    if commands.is_empty() {
        return Ok(FlushReport::default());
    }

    let mut report = FlushReport {
        drained: commands.len(),
        ..FlushReport::default()
    };

    store.with_conn(|conn| {
        let tx = conn.transaction()?;
        for cmd in &commands {
            match apply_command(&tx, cmd) {
                Ok(affected) => {
                    report.applied += 1;
                    debug!(kind = cmd.kind(), token = cmd.token(), affected, "applied");
                }
                Err(e) => {
                    // Contained to this command; the flush carries on.
                    report.failed += 1;
                    warn!(kind = cmd.kind(), token = cmd.token(), error = %e, "command failed");
                }
            }
        }
        tx.commit()?;
        Ok(())
    })?;

    info!(
        drained = report.drained,
        applied = report.applied,
        failed = report.failed,
        "flush committed"
    );
    Ok(report)
}

/// Timer loop around [`flush_once`]. The tick body runs to completion
/// before the next tick is taken, so flushes can never overlap; ticks
/// missed while a flush is still applying are skipped, not bursted.
pub async fn run_flush_worker(store: Store, queue: CommandQueue, interval: Duration) {
    let mut ticker = time::interval(interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        ticker.tick().await;
        if let Err(e) = flush_once(&store, &queue) {
            // Transaction-level failure (store handle trouble); the drained
            // commands are lost but the worker itself stays up.
            warn!(error = %e, "flush failed");
        }
    }
}
