//! File system storage management
//!
//! Per-user storage roots, file operations and lexical path validation.

pub mod operations;
pub mod results;
pub mod validation;

pub use operations::user_root;
pub use results::EntryInfo;
pub use validation::{normalize_virtual_path, virtual_to_real_path};
