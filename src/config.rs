//! Configuration management for the RAX drive server
//!
//! Separates startup configuration (requires restart) from runtime configuration
//! (shared behind a lock so it can be adjusted while the server is running), and
//! carries the app scope settings consulted on every request.

use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::scope::capability::{CapabilitySet, split_list};
use crate::storage::validation::normalize_virtual_path;

pub const DEFAULT_APP_PREFIX: &str = "/apps";

/// Complete server configuration with startup/runtime separation
#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(flatten)]
    pub startup: StartupConfig,

    #[serde(flatten)]
    pub runtime: RuntimeConfig,

    #[serde(default)]
    pub app_scope: AppScopeConfig,
}

/// Configuration that requires server restart to take effect
#[derive(Debug, Deserialize, Clone)]
pub struct StartupConfig {
    // ═══ NETWORK (Environment Override Supported) ═══
    /// IP address to bind the control connection
    pub bind_address: String,

    /// Port for the control connection
    pub control_port: u16,

    // ═══ STORAGE ═══
    /// Root directory holding every user's storage root and the recycle bin
    pub storage_root: String,

    /// Name of the shared recycle directory under the storage root
    #[serde(default = "default_recycle_dir_name")]
    pub recycle_dir_name: String,

    /// Days a soft-deleted file is kept before the sweep purges it
    pub recycle_retention_days: u64,

    /// Seconds between retention sweeps
    pub sweep_interval_secs: u64,

    // ═══ INTERNAL LIMITS (TOML Only) ═══
    pub max_command_length: usize,
    pub max_username_length: usize,
}

/// Configuration that can be updated at runtime
#[derive(Debug, Deserialize, Clone)]
pub struct RuntimeConfig {
    /// Maximum concurrent clients
    /// Environment: RAX_DRIVE_MAX_CLIENTS
    pub max_clients: usize,

    /// Maximum upload size in MB
    /// Environment: RAX_DRIVE_MAX_UPLOAD_SIZE_MB
    pub max_upload_size_mb: u64,
}

/// App scope settings
///
/// Scoping is active when any entry of `required_resource_pattern` starts
/// with `app:`.
#[derive(Debug, Deserialize, Clone)]
pub struct AppScopeConfig {
    /// Comma or pipe delimited resource patterns
    #[serde(default)]
    pub required_resource_pattern: String,

    /// Optional comma or pipe delimited action names every app grant is masked by
    #[serde(default)]
    pub required_action_allow_list: String,

    /// Path prefix whose first segment names the app
    #[serde(default = "default_app_prefix")]
    pub path_prefix: String,
}

/// Thread-safe runtime configuration wrapper
pub type SharedRuntimeConfig = Arc<RwLock<RuntimeConfig>>;

fn default_recycle_dir_name() -> String {
    ".recycle".to_string()
}

fn default_app_prefix() -> String {
    DEFAULT_APP_PREFIX.to_string()
}

impl Default for AppScopeConfig {
    fn default() -> Self {
        Self {
            required_resource_pattern: String::new(),
            required_action_allow_list: String::new(),
            path_prefix: default_app_prefix(),
        }
    }
}

impl ServerConfig {
    /// Load configuration from config.toml with environment overrides
    pub fn load() -> Result<Self, config::ConfigError> {
        let config_paths = ["rax-drive/config", "config"];

        let mut last_error = None;

        for config_path in &config_paths {
            match Config::builder()
                .add_source(File::with_name(config_path))
                .add_source(
                    Environment::with_prefix("RAX_DRIVE")
                        .prefix_separator("_")
                        .separator("__")
                        .try_parsing(true),
                )
                .build()
            {
                Ok(settings) => {
                    let config: ServerConfig = settings.try_deserialize()?;
                    config.validate()?;
                    return Ok(config);
                }
                Err(e) => {
                    last_error = Some(e);
                    continue;
                }
            }
        }

        Err(last_error.unwrap_or_else(|| {
            config::ConfigError::Message(format!(
                "Failed to load config.toml from any location. Tried: {config_paths:?}"
            ))
        }))
    }

    /// Split into startup (immutable) and runtime (mutable) parts
    pub fn split(self) -> (StartupConfig, SharedRuntimeConfig, AppScopeConfig) {
        let runtime = Arc::new(RwLock::new(self.runtime));
        (self.startup, runtime, self.app_scope)
    }

    /// Validation for all configuration values
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.startup.control_port == 0 {
            return Err(config::ConfigError::Message(
                "Control port cannot be 0".into(),
            ));
        }

        if self.startup.storage_root.is_empty() {
            return Err(config::ConfigError::Message(
                "storage_root cannot be empty".into(),
            ));
        }

        let recycle = &self.startup.recycle_dir_name;
        if recycle.is_empty() || recycle.contains(['/', '\\']) || recycle == ".." {
            return Err(config::ConfigError::Message(
                "recycle_dir_name must be a single path segment".into(),
            ));
        }

        if self.startup.sweep_interval_secs == 0 {
            return Err(config::ConfigError::Message(
                "sweep_interval_secs must be greater than 0".into(),
            ));
        }

        if self.runtime.max_clients == 0 {
            return Err(config::ConfigError::Message(
                "max_clients must be greater than 0".into(),
            ));
        }

        if self.runtime.max_upload_size_mb == 0 {
            return Err(config::ConfigError::Message(
                "max_upload_size_mb must be greater than 0".into(),
            ));
        }

        Ok(())
    }
}

impl StartupConfig {
    /// Get bind address and control port as socket address
    pub fn control_socket(&self) -> String {
        format!("{}:{}", self.bind_address, self.control_port)
    }

    pub fn storage_root_path(&self) -> PathBuf {
        PathBuf::from(&self.storage_root)
    }

    /// Absolute location of the shared recycle directory
    pub fn recycle_dir_path(&self) -> PathBuf {
        self.storage_root_path().join(&self.recycle_dir_name)
    }

    pub fn recycle_retention(&self) -> chrono::Duration {
        chrono::Duration::days(self.recycle_retention_days as i64)
    }

    pub fn sweep_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.sweep_interval_secs)
    }
}

impl RuntimeConfig {
    /// Get maximum upload size in bytes
    pub fn max_upload_size_bytes(&self) -> u64 {
        self.max_upload_size_mb * 1024 * 1024
    }
}

impl AppScopeConfig {
    /// Whether the deployment requires app-scoped capabilities
    pub fn scoping_enabled(&self) -> bool {
        split_list(&self.required_resource_pattern).any(|p| p.starts_with("app:"))
    }

    /// The global action allow-list, if one is configured
    pub fn action_allow_list(&self) -> Option<CapabilitySet> {
        if split_list(&self.required_action_allow_list).next().is_none() {
            return None;
        }
        Some(CapabilitySet::from_actions(split_list(
            &self.required_action_allow_list,
        )))
    }

    /// Prefix in the same canonical form as request paths; empty or `/` means `/apps`.
    pub fn normalized_prefix(&self) -> String {
        match normalize_virtual_path(&self.path_prefix) {
            prefix if prefix == "/" => DEFAULT_APP_PREFIX.to_string(),
            prefix => prefix,
        }
    }
}
