//! Shared server state
//!
//! Everything a session needs to serve a request: configuration, the share
//! service and the recycle service.

use crate::config::{AppScopeConfig, ServerConfig, SharedRuntimeConfig, StartupConfig};
use crate::recycle::RecycleService;
use crate::share::ShareService;

pub struct DriveState {
    pub startup: StartupConfig,
    pub runtime: SharedRuntimeConfig,
    pub app_scope: AppScopeConfig,
    pub shares: ShareService,
    pub recycle: RecycleService,
}

impl DriveState {
    pub fn new(config: ServerConfig) -> Self {
        let (startup, runtime, app_scope) = config.split();
        let storage_root = startup.storage_root_path();
        let recycle = RecycleService::new(storage_root.clone(), startup.recycle_dir_path());
        let shares = ShareService::new(storage_root);

        Self {
            startup,
            runtime,
            app_scope,
            shares,
            recycle,
        }
    }
}
