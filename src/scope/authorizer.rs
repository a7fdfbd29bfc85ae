//! App scope authorizer
//!
//! Derives a per-request [`AppScope`] from the caller's presented app
//! capabilities and decides whether a path/action pair is permitted. Paths
//! under the configured prefix belong to the app named by their first segment;
//! an active scope denies anything outside the prefix and any app it holds no
//! grant for.

use std::collections::HashMap;

use log::debug;

use crate::auth::Principal;
use crate::config::AppScopeConfig;
use crate::error::ScopeError;
use crate::storage::validation::normalize_virtual_path;

use super::actions::{Action, Method};
use super::capability::CapabilitySet;

/// Authorization scope for one request.
#[derive(Debug, Clone)]
pub struct AppScope {
    active: bool,
    prefix: String,
    actions: HashMap<String, CapabilitySet>,
}

impl AppScope {
    /// A scope that restricts nothing.
    pub fn inactive() -> Self {
        Self {
            active: false,
            prefix: crate::config::DEFAULT_APP_PREFIX.to_string(),
            actions: HashMap::new(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn capabilities(&self, app: &str) -> Option<&CapabilitySet> {
        self.actions.get(app)
    }

    /// True if `path` normalizes to the scope prefix itself.
    pub fn is_scope_root(&self, path: &str) -> bool {
        normalize_virtual_path(path) == self.prefix
    }

    /// The app identifier owning `path`, if it lies strictly under the prefix.
    pub fn app_for_path(&self, path: &str) -> Option<String> {
        let normalized = normalize_virtual_path(path);
        let rest = normalized
            .strip_prefix(self.prefix.as_str())?
            .strip_prefix('/')?;
        rest.split('/')
            .next()
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }

    /// Whether at least one of `required` is granted on `path`.
    ///
    /// An empty `required` means read. Inactive scopes allow everything.
    pub fn authorize(&self, path: &str, required: &[Action]) -> bool {
        if !self.active {
            return true;
        }

        let required = if required.is_empty() {
            &[Action::Read][..]
        } else {
            required
        };

        let Some(app) = self.app_for_path(path) else {
            return false;
        };

        self.actions
            .get(&app)
            .is_some_and(|set| set.allows_any(required))
    }

    /// [`authorize`](Self::authorize) as a `Result`.
    pub fn require(&self, path: &str, required: &[Action]) -> Result<(), ScopeError> {
        if self.authorize(path, required) {
            Ok(())
        } else {
            Err(denied(path, required))
        }
    }

    /// Checks a protocol request, including the destination of MOVE/COPY.
    pub fn authorize_request(
        &self,
        method: Method,
        path: &str,
        destination: Option<&str>,
    ) -> Result<(), ScopeError> {
        if !self.active {
            return Ok(());
        }

        let required = method.required_actions();

        if self.is_scope_root(path) {
            if !method.allowed_at_scope_root() {
                debug!("{} denied at app scope root {}", method, self.prefix);
                return Err(ScopeError::Denied(format!(
                    "{} is not permitted on {}",
                    method, self.prefix
                )));
            }
        } else {
            self.require(path, required)?;
        }

        if method.has_destination() {
            let destination = destination.ok_or_else(|| {
                ScopeError::Denied(format!("{} requires a destination", method))
            })?;
            if self.is_scope_root(destination) {
                return Err(ScopeError::Denied(format!(
                    "{} into {} is not permitted",
                    method, self.prefix
                )));
            }
            self.require(destination, required)?;
        }

        Ok(())
    }
}

fn denied(path: &str, required: &[Action]) -> ScopeError {
    let names: Vec<&str> = required.iter().map(|a| a.as_str()).collect();
    ScopeError::Denied(format!("{} on {}", names.join("|"), path))
}

/// Derives the app scope for a request.
///
/// Malformed tokens deny even when valid ones are also present.
pub fn resolve_scope(principal: &Principal, config: &AppScopeConfig) -> Result<AppScope, ScopeError> {
    if !config.scoping_enabled() {
        return Ok(AppScope::inactive());
    }

    if !principal.invalid_app_tokens.is_empty() {
        debug!(
            "User {} presented {} malformed app token(s)",
            principal.username,
            principal.invalid_app_tokens.len()
        );
        return Err(ScopeError::Denied("malformed app capability token".into()));
    }

    if !principal.has_any_app_capabilities() {
        return Err(ScopeError::Required);
    }

    let allow_list = config.action_allow_list();
    let mut actions: HashMap<String, CapabilitySet> = HashMap::new();

    for claim in &principal.app_claims {
        let set = CapabilitySet::from_actions(&claim.actions);
        let entry = actions.entry(claim.app.clone()).or_default();
        *entry = entry.union(&set);
    }

    if let Some(mask) = allow_list {
        for set in actions.values_mut() {
            *set = set.intersect(&mask);
        }
    }

    Ok(AppScope {
        active: true,
        prefix: config.normalized_prefix(),
        actions,
    })
}
