use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::PathBuf;

use crate::errors::{AppError, AppResult};

#[derive(Debug, Serialize, Deserialize)]
pub struct Config {
    /// Path of the local SQLite backup database.
    pub database: String,

    // Broker
    #[serde(default = "default_broker_host")]
    pub broker_host: String,
    #[serde(default = "default_broker_port")]
    pub broker_port: u16,
    #[serde(default = "default_topic")]
    pub topic: String,
    #[serde(default = "default_client_id")]
    pub client_id: String,
    #[serde(default = "default_keep_alive_secs")]
    pub keep_alive_secs: u64,

    // Remote store
    #[serde(default)]
    pub remote_url: String,
    #[serde(default)]
    pub remote_key: String,

    // Cadences and limits
    #[serde(default = "default_flush_interval_ms")]
    pub flush_interval_ms: u64,
    #[serde(default = "default_sync_interval_secs")]
    pub sync_interval_secs: u64,
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_broker_host() -> String {
    "localhost".to_string()
}
fn default_broker_port() -> u16 {
    1883
}
fn default_topic() -> String {
    "openhouse/qrscan".to_string()
}
fn default_client_id() -> String {
    "stationsync-edge".to_string()
}
fn default_keep_alive_secs() -> u64 {
    30
}
fn default_flush_interval_ms() -> u64 {
    1000
}
fn default_sync_interval_secs() -> u64 {
    5
}
fn default_batch_size() -> usize {
    200
}
fn default_request_timeout_secs() -> u64 {
    4
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database: Self::database_file().to_string_lossy().to_string(),
            broker_host: default_broker_host(),
            broker_port: default_broker_port(),
            topic: default_topic(),
            client_id: default_client_id(),
            keep_alive_secs: default_keep_alive_secs(),
            remote_url: String::new(),
            remote_key: String::new(),
            flush_interval_ms: default_flush_interval_ms(),
            sync_interval_secs: default_sync_interval_secs(),
            batch_size: default_batch_size(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl Config {
    /// Return the standard configuration directory depending on the platform
    pub fn config_dir() -> PathBuf {
        if cfg!(target_os = "windows") {
            let appdata = env::var("APPDATA").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(appdata).join("stationsync")
        } else {
            let home = env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".stationsync")
        }
    }

    /// Return the full path of the config file
    pub fn config_file() -> PathBuf {
        Self::config_dir().join("stationsync.conf")
    }

    /// Return the full path of the SQLite database
    pub fn database_file() -> PathBuf {
        Self::config_dir().join("stationsync.sqlite")
    }

    /// Load configuration from file, or return defaults if not found
    pub fn load() -> AppResult<Self> {
        let path = Self::config_file();

        if path.exists() {
            let content = fs::read_to_string(&path).map_err(|_| AppError::ConfigLoad)?;
            serde_yaml::from_str(&content)
                .map_err(|e| AppError::Config(format!("cannot parse {}: {}", path.display(), e)))
        } else {
            Ok(Self::default())
        }
    }

    /// Write the current configuration to the config file
    pub fn save(&self) -> AppResult<()> {
        let dir = Self::config_dir();
        fs::create_dir_all(&dir)?;
        let content = serde_yaml::to_string(self).map_err(|_| AppError::ConfigSave)?;
        fs::write(Self::config_file(), content)?;
        Ok(())
    }

    /// Create the config directory and a default config file if missing,
    /// then return the effective configuration. A `--db` override from the
    /// CLI is applied in memory only, never written back.
    pub fn ensure_exists() -> AppResult<Self> {
        let cfg = Self::load()?;
        if !Self::config_file().exists() {
            cfg.save()?;
        }
        Ok(cfg)
    }
}
