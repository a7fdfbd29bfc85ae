//! Capability sets
//!
//! Per-scope record of which actions a capability grants. Stored flags are
//! never expanded; `write` implies the finer-grained mutations only when a
//! permission is queried.

use std::fmt;
use std::str::FromStr;

use super::actions::Action;

/// Seven independent grants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CapabilitySet {
    pub read: bool,
    pub write: bool,
    pub create: bool,
    pub update: bool,
    pub delete: bool,
    pub r#move: bool,
    pub copy: bool,
}

impl CapabilitySet {
    /// Every action granted.
    pub fn full() -> Self {
        Self {
            read: true,
            write: true,
            create: true,
            update: true,
            delete: true,
            r#move: true,
            copy: true,
        }
    }

    /// Builds a set from raw action strings.
    ///
    /// `*` and `access` grant everything. Unrecognized entries are dropped.
    pub fn from_actions<I, S>(actions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::default();
        for raw in actions {
            let raw = raw.as_ref().trim();
            if raw == "*" || raw.eq_ignore_ascii_case("access") {
                return Self::full();
            }
            if let Some(action) = Action::parse(raw) {
                set.grant(action);
            }
        }
        set
    }

    pub fn grant(&mut self, action: Action) {
        *self.flag_mut(action) = true;
    }

    /// Whether the stored flag for `action` is set, without expansion.
    pub fn has(&self, action: Action) -> bool {
        match action {
            Action::Read => self.read,
            Action::Write => self.write,
            Action::Create => self.create,
            Action::Update => self.update,
            Action::Delete => self.delete,
            Action::Move => self.r#move,
            Action::Copy => self.copy,
        }
    }

    fn flag_mut(&mut self, action: Action) -> &mut bool {
        match action {
            Action::Read => &mut self.read,
            Action::Write => &mut self.write,
            Action::Create => &mut self.create,
            Action::Update => &mut self.update,
            Action::Delete => &mut self.delete,
            Action::Move => &mut self.r#move,
            Action::Copy => &mut self.copy,
        }
    }

    /// Permission query with `write` expansion.
    pub fn allows(&self, action: Action) -> bool {
        match action {
            Action::Read => self.read || self.write,
            Action::Write => {
                self.write || self.create || self.update || self.delete || self.r#move || self.copy
            }
            Action::Create => self.write || self.create,
            Action::Update => self.write || self.update,
            Action::Delete => self.write || self.delete,
            Action::Move => self.write || self.r#move,
            Action::Copy => self.write || self.copy,
        }
    }

    /// Like [`allows`](Self::allows) for an untyped action name; unknown names deny.
    pub fn allows_str(&self, action: &str) -> bool {
        Action::parse(action).is_some_and(|a| self.allows(a))
    }

    /// True if at least one of `actions` is allowed.
    pub fn allows_any(&self, actions: &[Action]) -> bool {
        actions.iter().any(|a| self.allows(*a))
    }

    pub fn union(&self, other: &CapabilitySet) -> CapabilitySet {
        CapabilitySet {
            read: self.read || other.read,
            write: self.write || other.write,
            create: self.create || other.create,
            update: self.update || other.update,
            delete: self.delete || other.delete,
            r#move: self.r#move || other.r#move,
            copy: self.copy || other.copy,
        }
    }

    /// Masks this set down to the flags also present in `mask`.
    pub fn intersect(&self, mask: &CapabilitySet) -> CapabilitySet {
        CapabilitySet {
            read: self.read && mask.read,
            write: self.write && mask.write,
            create: self.create && mask.create,
            update: self.update && mask.update,
            delete: self.delete && mask.delete,
            r#move: self.r#move && mask.r#move,
            copy: self.copy && mask.copy,
        }
    }

    pub fn is_empty(&self) -> bool {
        Action::ALL.iter().all(|a| !self.has(*a))
    }
}

impl fmt::Display for CapabilitySet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<&str> = Action::ALL
            .iter()
            .filter(|a| self.has(**a))
            .map(|a| a.as_str())
            .collect();
        f.write_str(&names.join(","))
    }
}

impl FromStr for CapabilitySet {
    type Err = std::convert::Infallible;

    /// Parses the comma or pipe separated form stored on share records.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(CapabilitySet::from_actions(split_list(s)))
    }
}

/// Splits a comma or pipe delimited list, dropping blank entries.
pub fn split_list(raw: &str) -> impl Iterator<Item = &str> {
    raw.split([',', '|'])
        .map(str::trim)
        .filter(|s| !s.is_empty())
}
