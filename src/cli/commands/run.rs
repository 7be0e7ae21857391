use std::time::Duration;

use tracing::info;

use crate::config::Config;
use crate::db::Store;
use crate::errors::AppResult;
use crate::ingest::run_ingestor;
use crate::queue::CommandQueue;
use crate::remote::PostgrestRemote;
use crate::worker::persistence::run_flush_worker;
use crate::worker::remote_sync::run_sync_worker;

/// Handle the `run` command: wire the pipeline together and run it until
/// Ctrl-C. Only the store failing to open/initialize is fatal; everything
/// past that point is contained and retried by the individual tasks.
pub async fn handle(cfg: &Config) -> AppResult<()> {
    // Fatal if the local store cannot be opened or migrated.
    let store = Store::open(&cfg.database)?;
    let queue = CommandQueue::new();
    let remote = PostgrestRemote::new(cfg)?;

    info!(db = %cfg.database, "local store ready");

    let flush = tokio::spawn(run_flush_worker(
        store.clone(),
        queue.clone(),
        Duration::from_millis(cfg.flush_interval_ms),
    ));
    let sync = tokio::spawn(run_sync_worker(
        store.clone(),
        remote,
        Duration::from_secs(cfg.sync_interval_secs),
        cfg.batch_size,
    ));

    // The ingestor runs on this task; workers are dropped with the runtime
    // once Ctrl-C lands.
    tokio::select! {
        res = run_ingestor(cfg, queue.clone()) => res?,
        _ = tokio::signal::ctrl_c() => {
            info!("shutdown requested, draining remaining commands");
            flush.abort();
            sync.abort();
            // One last flush so nothing buffered is lost on exit.
            crate::worker::persistence::flush_once(&store, &queue)?;
        }
    }

    Ok(())
}
