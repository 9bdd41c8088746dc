pub mod dry_run;
pub mod memory;
pub mod rest;

pub use dry_run::{DryRunStore, PlannedWrite};
pub use memory::{InMemoryStore, Operation, RecordedOp};
pub use rest::RestStore;
