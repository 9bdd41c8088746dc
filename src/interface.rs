use crate::core::{Result, StorePath, child_count};
use async_trait::async_trait;
use serde_json::{Map, Value};

/// Data-access seam between the maintenance procedures and the hierarchical store.
///
/// The procedures only ever talk to the store through these primitives, so the
/// hosted database (`RestStore`) and the in-memory tree used in tests
/// (`InMemoryStore`) are interchangeable.
#[async_trait]
pub trait StoreClient: Send + Sync {
    /// Full subtree at `path`, or `None` when nothing is stored there.
    async fn fetch_subtree(&self, path: &StorePath) -> Result<Option<Value>>;

    /// Remove everything at `path`. Deleting an absent path succeeds.
    async fn delete_subtree(&self, path: &StorePath) -> Result<()>;

    /// Merge `fields` into the record at `path`, leaving other fields untouched.
    async fn patch_record(&self, path: &StorePath, fields: Map<String, Value>) -> Result<()>;

    /// Check that the store is reachable and the credentials are accepted.
    async fn ping(&self) -> Result<()>;

    /// Number of direct children under `path`, 0 when absent.
    ///
    /// Backends that can list keys without downloading values override this.
    async fn count_children(&self, path: &StorePath) -> Result<usize> {
        Ok(self
            .fetch_subtree(path)
            .await?
            .map_or(0, |value| child_count(&value)))
    }
}

#[async_trait]
impl<C: StoreClient + ?Sized> StoreClient for std::sync::Arc<C> {
    async fn fetch_subtree(&self, path: &StorePath) -> Result<Option<Value>> {
        (**self).fetch_subtree(path).await
    }

    async fn delete_subtree(&self, path: &StorePath) -> Result<()> {
        (**self).delete_subtree(path).await
    }

    async fn patch_record(&self, path: &StorePath, fields: Map<String, Value>) -> Result<()> {
        (**self).patch_record(path, fields).await
    }

    async fn ping(&self) -> Result<()> {
        (**self).ping().await
    }

    async fn count_children(&self, path: &StorePath) -> Result<usize> {
        (**self).count_children(path).await
    }
}
