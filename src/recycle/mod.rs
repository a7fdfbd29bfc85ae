//! Recycle bin
//!
//! Soft-deleted files live in a directory shared by all tenants. Records are
//! keyed by content hash; the locator maps a record back to its blob.

pub mod locator;
pub mod operations;
pub mod record;
pub mod store;

pub use locator::{Located, RecycleLocator};
pub use operations::{ClearOutcome, RecycleService};
pub use record::RecycleRecord;
pub use store::RecycleStore;
