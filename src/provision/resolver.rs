//! Install ordering and requirement gating.
use std::collections::BTreeMap;

use crate::config::provisioners::Provisioner;
use crate::exec::Executor;
use crate::logging::Log;

/// Outcome of checking a provisioner's requirements.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RequirementCheck {
    /// Required tools found neither on PATH nor in any provisioner's
    /// `provides`, sorted.
    pub missing: Vec<String>,
}

impl RequirementCheck {
    /// `true` if nothing is missing.
    #[must_use]
    pub fn is_satisfied(&self) -> bool {
        self.missing.is_empty()
    }
}

/// Orders provisioners and answers requirement queries.
///
/// Ordering is a plain sort on `(priority, name)`: requirements are not
/// used to derive the order, and a provisioner whose requirement is
/// provided by a later one is still considered satisfied.
#[derive(Debug)]
pub struct Resolver {
    provisioners: Vec<Provisioner>,
    providers: BTreeMap<String, String>,
}

impl Resolver {
    /// Build a resolver, indexing which provisioner provides each tool.
    ///
    /// When two provisioners provide the same tool the later one wins and a
    /// warning is logged.
    #[must_use]
    pub fn new(provisioners: Vec<Provisioner>, log: &dyn Log) -> Self {
        let mut providers: BTreeMap<String, String> = BTreeMap::new();
        for p in &provisioners {
            for tool in &p.provides {
                if let Some(previous) = providers.insert(tool.clone(), p.name.clone())
                    && previous != p.name
                {
                    log.warn(&format!(
                        "'{tool}' is provided by both '{previous}' and '{}'; using '{}'",
                        p.name, p.name
                    ));
                }
            }
        }
        Self {
            provisioners,
            providers,
        }
    }

    /// All provisioner names sorted by `(priority, name)`.
    #[must_use]
    pub fn install_order(&self) -> Vec<&str> {
        let mut ordered: Vec<&Provisioner> = self.provisioners.iter().collect();
        ordered.sort_by(|a, b| (a.priority, &a.name).cmp(&(b.priority, &b.name)));
        ordered.into_iter().map(|p| p.name.as_str()).collect()
    }

    /// Check each required tool against PATH and the provider index.
    #[must_use]
    pub fn check_requirements(
        &self,
        provisioner: &Provisioner,
        executor: &dyn Executor,
    ) -> RequirementCheck {
        // `requires` is a BTreeSet, so the result is already sorted.
        let missing = provisioner
            .requires
            .iter()
            .filter(|tool| !executor.which(tool) && !self.providers.contains_key(*tool))
            .cloned()
            .collect();
        RequirementCheck { missing }
    }

    /// Name of the provisioner that provides `tool`.
    #[must_use]
    pub fn find_provider(&self, tool: &str) -> Option<&str> {
        self.providers.get(tool).map(String::as_str)
    }

    /// Look up a provisioner by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Provisioner> {
        self.provisioners.iter().rev().find(|p| p.name == name)
    }

    /// All provisioners in load order.
    #[must_use]
    pub fn provisioners(&self) -> &[Provisioner] {
        &self.provisioners
    }
}
