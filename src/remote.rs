//! Remote store client.
//!
//! The pipeline only ever needs one remote operation per table: a batched
//! upsert by primary key. `RemoteStore` is the seam; the production
//! implementation talks to a PostgREST-style endpoint (Supabase), tests
//! plug in a mock.

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;

use crate::config::Config;
use crate::errors::{AppError, AppResult};
use crate::models::{StationVisit, Visitor};

#[async_trait]
pub trait RemoteStore: Send + Sync {
    /// Upsert a batch of visitor rows, conflict key `token`.
    async fn upsert_visitors(&self, rows: &[Visitor]) -> AppResult<()>;

    /// Upsert a batch of visit rows, conflict key `id`.
    async fn upsert_visits(&self, rows: &[StationVisit]) -> AppResult<()>;
}

/// PostgREST client: `POST {base}/rest/v1/{table}?on_conflict={key}` with
/// merge-duplicates semantics, so a re-upload of an already present key
/// overwrites all columns instead of duplicating the row.
pub struct PostgrestRemote {
    client: Client,
    base_url: String,
    api_key: String,
}

impl PostgrestRemote {
    pub fn new(cfg: &Config) -> AppResult<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(cfg.request_timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url: cfg.remote_url.trim_end_matches('/').to_string(),
            api_key: cfg.remote_key.clone(),
        })
    }

    async fn upsert<T: Serialize + Sync>(
        &self,
        table: &str,
        conflict_key: &str,
        rows: &[T],
    ) -> AppResult<()> {
        let url = format!(
            "{}/rest/v1/{}?on_conflict={}",
            self.base_url, table, conflict_key
        );

        // Rows serialize without the local sync flag (serde skip).
        let resp = self
            .client
            .post(&url)
            .header("apikey", &self.api_key)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Prefer", "resolution=merge-duplicates")
            .json(rows)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AppError::Remote(format!(
                "{} upsert returned {}: {}",
                table, status, body
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteStore for PostgrestRemote {
    async fn upsert_visitors(&self, rows: &[Visitor]) -> AppResult<()> {
        self.upsert("visitors", "token", rows).await
    }

    async fn upsert_visits(&self, rows: &[StationVisit]) -> AppResult<()> {
        self.upsert("station_visits", "id", rows).await
    }
}
