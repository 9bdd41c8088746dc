pub mod error;
pub mod path;
pub mod types;

pub use error::{Result, StoreError};
pub use path::StorePath;
pub use types::{
    BUDGET_FIELD, COUNTER_FIELDS, Collection, Manager, budget_of, child_count, collection_entries,
    counter_reset_patch, manager_name_of,
};
