use super::batch::{BatchOptions, RecordFailure, sweep};
use super::collections::{count_collection, delete_collection, fetch_collection};
use crate::core::{
    Collection, Result, StoreError, StorePath, collection_entries, counter_reset_patch,
};
use crate::interface::StoreClient;
use serde::Serialize;
use serde_json::Value;
use tracing::{info, instrument, warn};

/// Outcome of a season cleanup run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CleanupSummary {
    /// Loan records present before the wipe (0 when the collection was absent,
    /// `None` when they could not be counted)
    pub loans_removed: Option<usize>,
    pub matches_removed: Option<usize>,
    pub loans_cleared: bool,
    pub matches_cleared: bool,
    /// Ids of managers whose counters were reset, sorted
    pub managers_reset: Vec<String>,
    pub failures: Vec<RecordFailure>,
}

impl CleanupSummary {
    pub fn managers_updated(&self) -> usize {
        self.managers_reset.len()
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }
}

/// Wipe loans and matches, then zero every manager's performance counters.
///
/// The two collection wipes run concurrently and must both succeed before
/// any manager is touched; either delete failing aborts the run. Counting
/// the records beforehand is best-effort. Manager resets are
/// best-effort: a failed write is logged, recorded in the summary, and the
/// sweep carries on. Budgets are never part of the patch.
///
/// Every step is idempotent, so an interrupted run can simply be repeated.
#[instrument(skip_all)]
pub async fn run_cleanup<C>(client: &C, options: &BatchOptions) -> Result<CleanupSummary>
where
    C: StoreClient + ?Sized,
{
    let (loans_removed, matches_removed) = tokio::try_join!(
        clear_collection(client, Collection::Loans),
        clear_collection(client, Collection::Matches),
    )?;

    let mut summary = CleanupSummary {
        loans_removed,
        matches_removed,
        loans_cleared: true,
        matches_cleared: true,
        ..CleanupSummary::default()
    };

    let managers_path = Collection::Managers.path();
    let Some(managers) = fetch_collection(client, &managers_path).await? else {
        info!("no managers collection, nothing to reset");
        return Ok(summary);
    };
    let entries = collection_entries(&managers_path, managers)?;
    info!(managers = entries.len(), "resetting manager counters");

    let managers_path = &managers_path;
    let outcomes = sweep(entries, options, move |(manager_id, record)| async move {
        let outcome = reset_counters(client, managers_path, &manager_id, &record).await;
        (manager_id, outcome)
    })
    .await;

    for (manager_id, outcome) in outcomes {
        match outcome {
            Ok(()) => summary.managers_reset.push(manager_id),
            Err(err) => {
                warn!(manager_id = %manager_id, error = %err, "failed to reset manager counters");
                summary.failures.push(RecordFailure::new(&manager_id, &err));
            }
        }
    }
    summary.managers_reset.sort();
    summary.failures.sort_by(|a, b| a.manager_id.cmp(&b.manager_id));

    info!(
        reset = summary.managers_reset.len(),
        failed = summary.failures.len(),
        "cleanup finished"
    );
    Ok(summary)
}

/// Delete a whole collection, returning how many records it held if that
/// could be determined.
async fn clear_collection<C>(client: &C, collection: Collection) -> Result<Option<usize>>
where
    C: StoreClient + ?Sized,
{
    let path = collection.path();
    let removed = match count_collection(client, &path).await {
        Ok(count) => Some(count),
        Err(err) => {
            warn!(collection = %collection, error = %err, "could not count records before clearing");
            None
        }
    };
    delete_collection(client, &path).await?;
    info!(collection = %collection, removed = ?removed, "collection cleared");
    Ok(removed)
}

async fn reset_counters<C>(
    client: &C,
    managers_path: &StorePath,
    manager_id: &str,
    record: &Value,
) -> Result<()>
where
    C: StoreClient + ?Sized,
{
    let path = managers_path.child(manager_id)?;
    if !record.is_object() {
        return Err(StoreError::decode(path, "manager record is not an object"));
    }
    client.patch_record(&path, counter_reset_patch()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{InMemoryStore, Operation};
    use serde_json::json;

    #[tokio::test]
    async fn test_cleanup_resets_counters_and_keeps_budget() {
        let store = InMemoryStore::with_data(json!({
            "loans": {"l1": {"player": "p1"}, "l2": {"player": "p2"}},
            "matches": {"x": {"home": "m1"}},
            "managers": {
                "m1": {"points": 12, "wins": 3, "losses": 1, "draws": 0, "matchesPlayed": 4, "budget": 700000000}
            }
        }));

        let summary = run_cleanup(&store, &BatchOptions::default()).await.unwrap();

        assert_eq!(summary.loans_removed, Some(2));
        assert_eq!(summary.matches_removed, Some(1));
        assert!(summary.loans_cleared && summary.matches_cleared);
        assert_eq!(summary.managers_reset, vec!["m1".to_string()]);
        assert!(!summary.has_failures());
        assert_eq!(
            store.snapshot().await,
            json!({"managers": {"m1": {
                "points": 0, "wins": 0, "losses": 0, "draws": 0, "matchesPlayed": 0,
                "budget": 700000000
            }}})
        );
    }

    #[tokio::test]
    async fn test_cleanup_on_empty_store() {
        let store = InMemoryStore::new();
        let summary = run_cleanup(&store, &BatchOptions::default()).await.unwrap();

        assert_eq!(summary.loans_removed, Some(0));
        assert_eq!(summary.matches_removed, Some(0));
        assert_eq!(summary.managers_updated(), 0);
        assert_eq!(store.count(Operation::Delete), 2);
        assert_eq!(store.count(Operation::Patch), 0);
    }

    #[tokio::test]
    async fn test_collection_delete_failure_is_fatal() {
        let store = InMemoryStore::with_data(json!({"managers": {"m1": {"points": 3}}}));
        store.fail_on(Operation::Delete, "matches").unwrap();

        let err = run_cleanup(&store, &BatchOptions::default()).await.unwrap_err();
        assert!(matches!(err, StoreError::Write { .. }));
        assert_eq!(store.count(Operation::Patch), 0);
    }

    #[tokio::test]
    async fn test_uncountable_collection_is_still_cleared() {
        let store = InMemoryStore::with_data(json!({
            "loans": {"l1": {"player": "p1"}},
            "managers": {"m1": {"points": 3}}
        }));
        store.fail_on(Operation::Fetch, "loans").unwrap();

        let summary = run_cleanup(&store, &BatchOptions::default()).await.unwrap();

        assert_eq!(summary.loans_removed, None);
        assert!(summary.loans_cleared);
        assert_eq!(summary.managers_reset, vec!["m1".to_string()]);
        assert_eq!(
            store.snapshot().await,
            json!({"managers": {"m1": {
                "points": 0, "wins": 0, "losses": 0, "draws": 0, "matchesPlayed": 0
            }}})
        );
    }

    #[tokio::test]
    async fn test_malformed_manager_is_not_written() {
        let store = InMemoryStore::with_data(json!({
            "managers": {"good": {"points": 2}, "odd": "legacy-string"}
        }));

        let summary = run_cleanup(&store, &BatchOptions::default()).await.unwrap();
        assert_eq!(summary.managers_reset, vec!["good".to_string()]);
        assert_eq!(summary.failures.len(), 1);
        assert_eq!(summary.failures[0].manager_id, "odd");
        assert_eq!(store.snapshot().await["managers"]["odd"], "legacy-string");
    }
}
