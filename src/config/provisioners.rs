//! Provisioner descriptors loaded from `[provisioners.*]` and `[enhancements.*]`.
use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::shell::ShellStage;

/// Role of a provisioner in the environment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Base tooling everything else builds on.
    Foundation,
    /// Language toolchains and package managers.
    Provisioner,
    /// Optional quality-of-life tools.
    Enhancement,
}

impl Category {
    /// Parse a config value case-insensitively, falling back to
    /// [`Category::Provisioner`].
    #[must_use]
    pub fn parse_lenient(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "foundation" => Self::Foundation,
            "enhancement" => Self::Enhancement,
            _ => Self::Provisioner,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Foundation => write!(f, "foundation"),
            Self::Provisioner => write!(f, "provisioner"),
            Self::Enhancement => write!(f, "enhancement"),
        }
    }
}

/// How a provisioner gets installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InstallMethod {
    /// Run an arbitrary shell script.
    Script,
    /// Install through the system package manager.
    Package,
    /// Download a single executable.
    Binary,
}

impl InstallMethod {
    /// Parse a config value case-insensitively, falling back to
    /// [`InstallMethod::Script`].
    #[must_use]
    pub fn parse_lenient(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "package" => Self::Package,
            "binary" => Self::Binary,
            _ => Self::Script,
        }
    }
}

/// A named tool installer with its declared capabilities and requirements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Provisioner {
    /// Unique name (the config table key).
    pub name: String,
    /// Human-readable summary.
    pub description: String,
    /// Category used by `--type` filtering.
    pub category: Category,
    /// Install strategy.
    pub method: InstallMethod,
    /// Tools this provisioner makes available.
    pub provides: BTreeSet<String>,
    /// Tools that must be available before installing.
    pub requires: BTreeSet<String>,
    /// Ordering key; lower runs earlier.
    pub priority: i64,
    /// Command whose success means "already installed"; empty when unknown.
    pub verify_command: String,
    /// Whether the tool contributes shell integration.
    pub shell_integration: bool,
    /// Shell stage the tool's integration belongs to.
    pub stage: ShellStage,
    /// Script payload for [`InstallMethod::Script`].
    pub install_script: Option<String>,
    /// Package name for [`InstallMethod::Package`]; defaults to `name`.
    pub package_name: Option<String>,
    /// Download URL for [`InstallMethod::Binary`].
    pub binary_url: Option<String>,
}

impl Provisioner {
    /// Create a provisioner with default settings.
    #[must_use]
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            description: String::new(),
            category: Category::Provisioner,
            method: InstallMethod::Script,
            provides: BTreeSet::new(),
            requires: BTreeSet::new(),
            priority: DEFAULT_PRIORITY,
            verify_command: String::new(),
            shell_integration: false,
            stage: ShellStage::Main,
            install_script: None,
            package_name: None,
            binary_url: None,
        }
    }

    /// Package to request from the system package manager.
    #[must_use]
    pub fn package(&self) -> &str {
        self.package_name.as_deref().unwrap_or(&self.name)
    }
}

/// Priority assigned when none is configured.
pub const DEFAULT_PRIORITY: i64 = 5;

/// Raw table shape of a provisioner entry.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub(super) struct RawProvisioner {
    description: String,
    #[serde(rename = "type")]
    category: Option<String>,
    install_method: Option<String>,
    provides: Vec<String>,
    requires: Vec<String>,
    priority: Option<i64>,
    verify_command: String,
    shell_integration: bool,
    stage: Option<i64>,
    install_script: Option<String>,
    package_name: Option<String>,
    binary_url: Option<String>,
}

/// Treat empty strings as absent payloads.
fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl RawProvisioner {
    /// Convert into a descriptor named `name`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidStage`] for a stage other than 0, 5 or 9.
    pub(super) fn into_provisioner(self, name: &str) -> Result<Provisioner, ConfigError> {
        let stage = match self.stage {
            None => ShellStage::Main,
            Some(value) => ShellStage::from_ordinal(value).ok_or_else(|| {
                ConfigError::InvalidStage {
                    item: name.to_string(),
                    value,
                }
            })?,
        };

        Ok(Provisioner {
            name: name.to_string(),
            description: self.description,
            category: self
                .category
                .as_deref()
                .map_or(Category::Provisioner, Category::parse_lenient),
            method: self
                .install_method
                .as_deref()
                .map_or(InstallMethod::Script, InstallMethod::parse_lenient),
            provides: self.provides.into_iter().collect(),
            requires: self.requires.into_iter().collect(),
            priority: self.priority.unwrap_or(DEFAULT_PRIORITY),
            verify_command: self.verify_command,
            shell_integration: self.shell_integration,
            stage,
            install_script: non_empty(self.install_script),
            package_name: non_empty(self.package_name),
            binary_url: non_empty(self.binary_url),
        })
    }
}
