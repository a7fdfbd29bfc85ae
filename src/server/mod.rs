//! Server core functionality
//!
//! The accept loop, the retention sweep task and the state shared by every
//! session.

pub mod core;
pub mod state;

pub use core::Server;
pub use state::DriveState;
