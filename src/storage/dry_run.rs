use crate::core::{Result, StorePath};
use crate::interface::StoreClient;
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::{Arc, Mutex};
use tracing::info;

/// A write the dry run would have sent.
#[derive(Debug, Clone, PartialEq)]
pub enum PlannedWrite {
    Delete { path: String },
    Patch { path: String, fields: Map<String, Value> },
}

/// Wraps a store so that reads go through and writes are only recorded.
///
/// Lets an operator preview exactly which records a maintenance run would
/// touch before letting it loose on the live database.
pub struct DryRunStore {
    inner: Arc<dyn StoreClient>,
    planned: Mutex<Vec<PlannedWrite>>,
}

impl DryRunStore {
    pub fn new(inner: Arc<dyn StoreClient>) -> Self {
        Self {
            inner,
            planned: Mutex::new(Vec::new()),
        }
    }

    pub fn planned_writes(&self) -> Vec<PlannedWrite> {
        self.planned
            .lock()
            .map(|writes| writes.clone())
            .unwrap_or_default()
    }
}

#[async_trait]
impl StoreClient for DryRunStore {
    async fn fetch_subtree(&self, path: &StorePath) -> Result<Option<Value>> {
        self.inner.fetch_subtree(path).await
    }

    async fn delete_subtree(&self, path: &StorePath) -> Result<()> {
        info!(path = %path, "dry run: would delete subtree");
        self.planned.lock()?.push(PlannedWrite::Delete {
            path: path.to_string(),
        });
        Ok(())
    }

    async fn patch_record(&self, path: &StorePath, fields: Map<String, Value>) -> Result<()> {
        let shown = Value::Object(fields.clone());
        info!(path = %path, fields = %shown, "dry run: would patch record");
        self.planned.lock()?.push(PlannedWrite::Patch {
            path: path.to_string(),
            fields,
        });
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        self.inner.ping().await
    }

    async fn count_children(&self, path: &StorePath) -> Result<usize> {
        self.inner.count_children(path).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryStore;
    use serde_json::json;

    #[tokio::test]
    async fn test_writes_are_recorded_not_applied() {
        let data = json!({"loans": {"l1": {"player": "p1"}}, "managers": {"m1": {"points": 4}}});
        let inner = Arc::new(InMemoryStore::with_data(data.clone()));
        let dry = DryRunStore::new(inner.clone());

        let loans = StorePath::parse("loans").unwrap();
        let m1 = StorePath::parse("managers/m1").unwrap();

        dry.delete_subtree(&loans).await.unwrap();
        let fields = json!({"points": 0}).as_object().cloned().unwrap();
        dry.patch_record(&m1, fields.clone()).await.unwrap();

        assert_eq!(inner.snapshot().await, data);
        assert_eq!(
            dry.planned_writes(),
            vec![
                PlannedWrite::Delete { path: "loans".into() },
                PlannedWrite::Patch { path: "managers/m1".into(), fields },
            ]
        );

        let read = dry.fetch_subtree(&m1).await.unwrap();
        assert_eq!(read, Some(json!({"points": 4})));
    }
}
