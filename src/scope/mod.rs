//! App scope authorization
//!
//! Action vocabulary, capability sets and the per-request app scope check
//! every protocol request passes before it reaches storage.

pub mod actions;
pub mod authorizer;
pub mod capability;

pub use actions::{Action, Method};
pub use authorizer::{AppScope, resolve_scope};
pub use capability::CapabilitySet;
