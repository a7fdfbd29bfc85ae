//! Control connection protocol
//!
//! Request line parsing, response formatting and command dispatch.

pub mod commands;
pub mod handlers;
pub mod responses;

pub use commands::{Command, CommandResult, CommandStatus, parse_command};
pub use handlers::handle_command;
