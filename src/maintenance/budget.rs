use super::batch::{BatchOptions, RecordFailure, sweep};
use super::collections::fetch_collection;
use crate::core::{
    BUDGET_FIELD, Collection, Result, StoreError, StorePath, budget_of, collection_entries,
    manager_name_of,
};
use crate::interface::StoreClient;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info, instrument, warn};

/// A manager whose budget was raised to the floor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BudgetChange {
    pub manager_id: String,
    pub manager_name: Option<String>,
    pub old_budget: i64,
    pub new_budget: i64,
    pub delta: i64,
}

/// A manager already at or above the floor; nothing was written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedManager {
    pub manager_id: String,
    pub manager_name: Option<String>,
    pub budget: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MigrationSummary {
    pub target_budget: i64,
    pub updated: Vec<BudgetChange>,
    pub skipped: Vec<SkippedManager>,
    pub failures: Vec<RecordFailure>,
}

impl MigrationSummary {
    pub fn updated_count(&self) -> usize {
        self.updated.len()
    }

    pub fn skipped_count(&self) -> usize {
        self.skipped.len()
    }

    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    /// Currency injected across all updated managers.
    pub fn total_added(&self) -> i64 {
        self.updated
            .iter()
            .fold(0i64, |total, change| total.saturating_add(change.delta))
    }
}

enum Outcome {
    Updated(BudgetChange),
    Skipped(SkippedManager),
    Failed(RecordFailure),
}

/// Raise every manager's budget to at least `target_budget`.
///
/// Post-condition for each manager that did not fail:
/// `budget == max(previous budget, target_budget)`. Higher budgets are
/// left alone and never written, so a second run with the same target
/// updates nobody.
///
/// A missing or non-numeric `budget` counts as 0. Failing to read the
/// managers collection aborts the run; a failed write for one manager is
/// recorded and the rest are still processed.
#[instrument(skip(client, options))]
pub async fn run_budget_migration<C>(
    client: &C,
    target_budget: i64,
    options: &BatchOptions,
) -> Result<MigrationSummary>
where
    C: StoreClient + ?Sized,
{
    if target_budget < 0 {
        return Err(StoreError::InvalidArgument(format!(
            "target budget must not be negative, got {target_budget}"
        )));
    }

    let mut summary = MigrationSummary {
        target_budget,
        ..MigrationSummary::default()
    };

    let managers_path = Collection::Managers.path();
    let Some(managers) = fetch_collection(client, &managers_path).await? else {
        info!("no managers collection, nothing to migrate");
        return Ok(summary);
    };
    let entries = collection_entries(&managers_path, managers)?;
    info!(managers = entries.len(), target_budget, "migrating budgets");

    let managers_path = &managers_path;
    let outcomes = sweep(entries, options, move |(manager_id, record)| async move {
        migrate_one(client, managers_path, manager_id, record, target_budget).await
    })
    .await;

    for outcome in outcomes {
        match outcome {
            Outcome::Updated(change) => summary.updated.push(change),
            Outcome::Skipped(skipped) => summary.skipped.push(skipped),
            Outcome::Failed(failure) => summary.failures.push(failure),
        }
    }
    summary.updated.sort_by(|a, b| a.manager_id.cmp(&b.manager_id));
    summary.skipped.sort_by(|a, b| a.manager_id.cmp(&b.manager_id));
    summary.failures.sort_by(|a, b| a.manager_id.cmp(&b.manager_id));

    info!(
        updated = summary.updated_count(),
        skipped = summary.skipped_count(),
        failed = summary.failures.len(),
        "budget migration finished"
    );
    Ok(summary)
}

async fn migrate_one<C>(
    client: &C,
    managers_path: &StorePath,
    manager_id: String,
    record: Value,
    target_budget: i64,
) -> Outcome
where
    C: StoreClient + ?Sized,
{
    let path = match managers_path.child(&manager_id) {
        Ok(path) => path,
        Err(err) => return failed(&manager_id, err),
    };
    let Value::Object(record) = record else {
        return failed(
            &manager_id,
            StoreError::decode(&path, "manager record is not an object"),
        );
    };

    let current = budget_of(&record);
    let manager_name = manager_name_of(&record);

    if current >= target_budget {
        debug!(manager_id = %manager_id, budget = current, "budget already at floor");
        return Outcome::Skipped(SkippedManager {
            manager_id,
            manager_name,
            budget: current,
        });
    }

    let mut patch = Map::new();
    patch.insert(BUDGET_FIELD.to_string(), Value::from(target_budget));
    if let Err(err) = client.patch_record(&path, patch).await {
        return failed(&manager_id, err);
    }

    debug!(manager_id = %manager_id, from = current, to = target_budget, "budget raised");
    Outcome::Updated(BudgetChange {
        manager_id,
        manager_name,
        old_budget: current,
        new_budget: target_budget,
        delta: target_budget.saturating_sub(current),
    })
}

fn failed(manager_id: &str, err: StoreError) -> Outcome {
    warn!(manager_id, error = %err, "failed to migrate manager budget");
    Outcome::Failed(RecordFailure::new(manager_id, &err))
}
