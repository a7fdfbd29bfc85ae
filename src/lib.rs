pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod protocol;
pub mod recycle;
pub mod scope;
pub mod server;
pub mod share;
pub mod storage;

pub use config::ServerConfig;
pub use server::Server;
