use crate::core::StoreError;
use futures::stream::{self, StreamExt};
use serde::Serialize;
use std::future::Future;

/// Knobs shared by the per-record sweeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOptions {
    /// Maximum number of record writes in flight. 1 means strictly sequential.
    pub concurrency: usize,
}

impl BatchOptions {
    pub fn concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    fn in_flight(&self) -> usize {
        self.concurrency.max(1)
    }
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self { concurrency: 1 }
    }
}

/// A single manager that could not be processed.
///
/// Carries the id so the operator can retry that record by hand.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RecordFailure {
    pub manager_id: String,
    pub error: String,
}

impl RecordFailure {
    pub fn new(manager_id: &str, error: &StoreError) -> Self {
        Self {
            manager_id: manager_id.to_string(),
            error: error.to_string(),
        }
    }
}

/// Run `op` over every item with at most `options.concurrency` futures in
/// flight. Output order follows completion, not input.
pub(crate) async fn sweep<I, F, Fut>(items: I, options: &BatchOptions, op: F) -> Vec<Fut::Output>
where
    I: IntoIterator,
    F: FnMut(I::Item) -> Fut,
    Fut: Future,
{
    stream::iter(items)
        .map(op)
        .buffer_unordered(options.in_flight())
        .collect()
        .await
}
