pub mod config;

use crate::core::{Result, StoreError};
use crate::interface::StoreClient;
use crate::storage::{DryRunStore, InMemoryStore, PlannedWrite, RestStore};
use config::StoreConfig;
use std::sync::Arc;
use tracing::info;

/// Store session handle
///
/// A maintenance run opens exactly one session at start-up and drops it at
/// exit. Opening pings the store, so a bad URL or rejected credentials fail
/// before any procedure starts.
pub struct Session {
    client: Arc<dyn StoreClient>,
    dry_run: Option<Arc<DryRunStore>>,
    endpoint: String,
}

impl Session {
    /// Connect using `config`.
    ///
    /// # Examples
    ///
    /// ```ignore
    /// let config = StoreConfig::new("https://league-default-rtdb.firebaseio.com")
    ///     .token(&secret);
    /// let session = Session::open(&config).await?;
    /// let summary = run_cleanup(session.client().as_ref(), &BatchOptions::default()).await?;
    /// ```
    pub async fn open(config: &StoreConfig) -> Result<Self> {
        config.validate().map_err(StoreError::Config)?;

        let client: Arc<dyn StoreClient> = if config.is_memory() {
            Arc::new(InMemoryStore::new())
        } else {
            Arc::new(RestStore::new(config)?)
        };
        Self::attach(client, &config.redacted_url()).await
    }

    /// Wrap an already constructed client, e.g. a seeded in-memory store.
    pub async fn attach(client: Arc<dyn StoreClient>, endpoint: &str) -> Result<Self> {
        client.ping().await.map_err(|err| match err {
            StoreError::Connection(_) | StoreError::Config(_) => err,
            other => StoreError::Connection(other.to_string()),
        })?;
        info!(endpoint, "connected to store");

        Ok(Self {
            client,
            dry_run: None,
            endpoint: endpoint.to_string(),
        })
    }

    /// Route all further writes into a recorder instead of the store.
    pub fn into_dry_run(self) -> Self {
        let recorder = Arc::new(DryRunStore::new(self.client));
        info!(endpoint = %self.endpoint, "dry run: writes will not be sent");
        Self {
            client: recorder.clone(),
            dry_run: Some(recorder),
            endpoint: self.endpoint,
        }
    }

    pub fn client(&self) -> Arc<dyn StoreClient> {
        Arc::clone(&self.client)
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run.is_some()
    }

    /// Writes suppressed so far; empty unless in dry-run mode.
    pub fn planned_writes(&self) -> Vec<PlannedWrite> {
        self.dry_run
            .as_ref()
            .map(|recorder| recorder.planned_writes())
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::StorePath;
    use crate::storage::Operation;
    use serde_json::json;

    #[tokio::test]
    async fn test_open_memory_session() {
        let session = Session::open(&StoreConfig::new("memory://")).await.unwrap();
        assert!(!session.is_dry_run());
        let loans = StorePath::parse("loans").unwrap();
        assert_eq!(session.client().fetch_subtree(&loans).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_open_rejects_invalid_config() {
        let err = Session::open(&StoreConfig::new("")).await.err().unwrap();
        assert!(matches!(err, StoreError::Config(_)));
    }

    #[tokio::test]
    async fn test_attach_maps_ping_failure_to_connection_error() {
        let store = Arc::new(InMemoryStore::new());
        store.fail_on(Operation::Ping, "").unwrap();
        let err = Session::attach(store, "memory://").await.err().unwrap();
        assert!(matches!(err, StoreError::Connection(_)));
    }

    #[tokio::test]
    async fn test_dry_run_session_records_writes() {
        let store = Arc::new(InMemoryStore::with_data(json!({"loans": {"l1": {"p": 1}}})));
        let session = Session::attach(store.clone(), "memory://")
            .await
            .unwrap()
            .into_dry_run();

        let loans = StorePath::parse("loans").unwrap();
        session.client().delete_subtree(&loans).await.unwrap();

        assert!(session.is_dry_run());
        assert_eq!(session.planned_writes().len(), 1);
        assert_eq!(store.count(Operation::Delete), 0);
    }
}
