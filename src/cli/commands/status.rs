use crate::config::Config;
use crate::db::Store;
use crate::db::queries::table_counts;
use crate::errors::AppResult;

/// Handle the `status` command: row counts and unsynced backlog per table.
/// The backlog is the only user-facing signal of local/remote divergence.
pub fn handle(cfg: &Config) -> AppResult<()> {
    let store = Store::open(&cfg.database)?;
    let counts = store.with_conn(|conn| table_counts(conn))?;

    println!("🗄️  Database: {}", &cfg.database);
    println!(
        "👤 visitors       : {} rows ({} unsynced)",
        counts.visitors, counts.visitors_unsynced
    );
    println!(
        "📍 station_visits : {} rows ({} unsynced)",
        counts.visits, counts.visits_unsynced
    );

    if counts.visitors_unsynced == 0 && counts.visits_unsynced == 0 {
        println!("✅ Local store is fully synced to the remote.");
    } else {
        println!("⚠️  Unsynced backlog present; the sync worker will retry.");
    }
    Ok(())
}
