//! The two batch procedures and their reports.
//!
//! Both procedures are parameterised over [`StoreClient`](crate::StoreClient)
//! and return a summary value; neither prints anything.

pub mod batch;
pub mod budget;
pub mod cleanup;
mod collections;
pub mod report;

pub use batch::{BatchOptions, RecordFailure};
pub use budget::{BudgetChange, MigrationSummary, SkippedManager, run_budget_migration};
pub use cleanup::{CleanupSummary, run_cleanup};
pub use report::{format_amount, to_json};
