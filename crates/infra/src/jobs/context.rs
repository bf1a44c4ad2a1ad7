use std::sync::Arc;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use tracing::{error, info};
use uuid::Uuid;

use easyerp_events::{EventEnvelope, InMemoryEventBus};

use crate::config::AppConfig;
use crate::service::PostingService;
use crate::store::{InMemoryLedgerStore, LedgerStore, PostgresLedgerStore};

pub type SharedLedgerStore = Arc<dyn LedgerStore>;
pub type LedgerBus = Arc<InMemoryEventBus<EventEnvelope<JsonValue>>>;

/// Identifier of one job run, carried on every log line it emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct JobId(pub Uuid);

impl JobId {
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for JobId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Everything a job needs, built once and passed in explicitly.
pub struct JobContext {
    pub job_name: String,
    pub environment: String,
    pub run_id: JobId,
    pub config: AppConfig,
    pub service: PostingService<SharedLedgerStore, LedgerBus>,
    pub bus: LedgerBus,
}

impl JobContext {
    pub fn new(job_name: impl Into<String>, config: AppConfig, store: SharedLedgerStore) -> Self {
        let bus: LedgerBus = Arc::new(InMemoryEventBus::new());
        let service = PostingService::new(store, bus.clone(), config.posting.policy());
        Self {
            job_name: job_name.into(),
            environment: std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string()),
            run_id: JobId::new(),
            config,
            service,
            bus,
        }
    }

    /// Context over a fresh in-memory ledger.
    pub fn in_memory(job_name: impl Into<String>, config: AppConfig) -> Self {
        Self::new(job_name, config, Arc::new(InMemoryLedgerStore::new()))
    }

    /// Context over Postgres when `database.url` is set, in memory otherwise.
    pub async fn connect(job_name: impl Into<String>, config: AppConfig) -> anyhow::Result<Self> {
        let Some(url) = config.database.url.clone() else {
            return Ok(Self::in_memory(job_name, config));
        };

        let store = PostgresLedgerStore::connect(&url, config.database.max_connections)
            .await
            .context("connecting to the ledger database")?;
        store
            .apply_schema()
            .await
            .context("applying the ledger schema")?;
        Ok(Self::new(job_name, config, Arc::new(store)))
    }

    pub fn store(&self) -> &SharedLedgerStore {
        self.service.store()
    }

    pub fn started(&self) {
        info!(
            job = %self.job_name,
            run_id = %self.run_id,
            environment = %self.environment,
            "job started"
        );
    }

    /// Log the job outcome once and hand the result back unchanged.
    pub fn finish<T>(&self, result: anyhow::Result<T>) -> anyhow::Result<T> {
        match &result {
            Ok(_) => info!(job = %self.job_name, run_id = %self.run_id, "job completed"),
            Err(err) => error!(
                job = %self.job_name,
                run_id = %self.run_id,
                error = ?err,
                "job failed"
            ),
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_memory_context_uses_configured_policy() {
        let config = AppConfig::from_toml("[posting]\nrequire_balanced = true").unwrap();
        let ctx = JobContext::in_memory("test", config);
        assert_eq!(ctx.service.policy(), easyerp_accounting::PostingPolicy::Strict);
        assert_eq!(ctx.job_name, "test");
    }

    #[test]
    fn finish_returns_the_result_unchanged() {
        let ctx = JobContext::in_memory("test", AppConfig::default());
        assert_eq!(ctx.finish(Ok(7)).unwrap(), 7);
        assert!(ctx.finish::<()>(Err(anyhow::anyhow!("boom"))).is_err());
    }

    #[tokio::test]
    async fn connect_without_url_stays_in_memory() {
        let ctx = JobContext::connect("test", AppConfig::default()).await.unwrap();
        assert!(ctx.store().chart().await.unwrap().is_empty());
    }
}
