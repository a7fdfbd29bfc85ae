//! Directed and public shares
//!
//! Share records, their store, the containment-checked path resolver and the
//! file operations available through a share.

pub mod operations;
pub mod record;
pub mod resolver;
pub mod store;

pub use operations::{OpenedShare, ShareService};
pub use record::{ShareKind, ShareRecord};
pub use resolver::{ResolvedSharePath, resolve_share_path};
pub use store::ShareStore;
