//! Whole-collection access for the procedures.
//!
//! A `NotFound` on a top-level collection means the collection does not
//! exist, which is an empty state rather than a failure.

use crate::core::{Result, StoreError, StorePath};
use crate::interface::StoreClient;
use serde_json::Value;
use tracing::debug;

pub(crate) async fn fetch_collection<C>(client: &C, path: &StorePath) -> Result<Option<Value>>
where
    C: StoreClient + ?Sized,
{
    match client.fetch_subtree(path).await {
        Err(StoreError::NotFound(_)) => {
            debug!(path = %path, "collection not found, treating as empty");
            Ok(None)
        }
        other => other,
    }
}

pub(crate) async fn count_collection<C>(client: &C, path: &StorePath) -> Result<usize>
where
    C: StoreClient + ?Sized,
{
    match client.count_children(path).await {
        Err(StoreError::NotFound(_)) => Ok(0),
        other => other,
    }
}

/// Deleting an absent collection succeeds.
pub(crate) async fn delete_collection<C>(client: &C, path: &StorePath) -> Result<()>
where
    C: StoreClient + ?Sized,
{
    match client.delete_subtree(path).await {
        Err(StoreError::NotFound(_)) => {
            debug!(path = %path, "collection already absent");
            Ok(())
        }
        other => other,
    }
}
