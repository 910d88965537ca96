//! Provisioning: ordering, requirement gating and the install lifecycle.
//!
//! [`Resolver`] decides the order and whether requirements are met,
//! [`Manager`] runs the ordered loop, threading an [`Environment`] snapshot
//! from one provisioner to the next so tools installed early (and the
//! directories they add to `PATH`) are visible to later verify and install
//! commands.
pub mod install;
pub mod manager;
pub mod package;
pub mod paths;
pub mod resolver;
pub mod system;

use std::collections::BTreeMap;
use std::path::Path;

pub use manager::Manager;
pub use package::PackageManager;
pub use resolver::{RequirementCheck, Resolver};

#[cfg(windows)]
const PATH_SEPARATOR: char = ';';
#[cfg(not(windows))]
const PATH_SEPARATOR: char = ':';

/// Mutable snapshot of environment variables handed to child processes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    vars: BTreeMap<String, String>,
}

impl Environment {
    /// Snapshot the current process environment.
    ///
    /// Variables whose name or value is not valid Unicode are skipped.
    #[must_use]
    pub fn from_process() -> Self {
        Self {
            vars: std::env::vars_os()
                .filter_map(|(k, v)| Some((k.into_string().ok()?, v.into_string().ok()?)))
                .collect(),
        }
    }

    /// Build a snapshot from explicit variables.
    #[must_use]
    pub fn from_vars<K: Into<String>, V: Into<String>>(
        vars: impl IntoIterator<Item = (K, V)>,
    ) -> Self {
        Self {
            vars: vars
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    /// All variables, for passing to a child process.
    #[must_use]
    pub const fn vars(&self) -> &BTreeMap<String, String> {
        &self.vars
    }

    /// Current `PATH` value (empty when unset).
    #[must_use]
    pub fn path(&self) -> &str {
        self.vars.get("PATH").map_or("", String::as_str)
    }

    /// Put `dir` at the front of `PATH` unless an identical entry exists.
    ///
    /// Returns `true` if `PATH` changed.
    pub fn prepend_path(&mut self, dir: &Path) -> bool {
        let dir = dir.to_string_lossy();
        let current = self.path();
        if current.split(PATH_SEPARATOR).any(|entry| entry == dir) {
            return false;
        }
        let updated = if current.is_empty() {
            dir.into_owned()
        } else {
            format!("{dir}{PATH_SEPARATOR}{current}")
        };
        self.vars.insert("PATH".to_string(), updated);
        true
    }
}
