// ============================================================================
// fantasy-admin library
// ============================================================================
//
// Maintenance procedures for the fantasy-football realtime database:
// season cleanup (wipe loans and matches, zero manager counters) and
// budget migration (raise every manager to a budget floor).

pub mod core;
pub mod storage;
pub mod connection;
pub mod maintenance;
mod interface;

pub use crate::core::{Collection, Manager, Result, StoreError, StorePath};
pub use interface::StoreClient;

pub use connection::{
    Session,
    config::{StoreConfig, TokenKind},
};

pub use maintenance::{
    BatchOptions, CleanupSummary, MigrationSummary, RecordFailure, run_budget_migration,
    run_cleanup,
};
