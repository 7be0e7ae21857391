use crate::config::Config;
use crate::db::Store;
use crate::errors::AppResult;

/// Handle the `init` command
///
/// This initializes:
///  - the config directory (if missing)
///  - the configuration file
///  - the SQLite database schema (all pending migrations)
pub fn handle(cfg: &Config) -> AppResult<()> {
    println!("⚙️  Initializing stationsync…");
    println!("📄 Config file : {}", Config::config_file().display());
    println!("🗄️  Database   : {}", &cfg.database);

    // Store open runs the migrations; failure here aborts the process.
    Store::open(&cfg.database)?;

    println!("✅ Database initialized at {}", &cfg.database);
    println!("🎉 stationsync initialization completed!");
    Ok(())
}
