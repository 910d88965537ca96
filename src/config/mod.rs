//! `dot.toml` loading.
//!
//! The file is read once per invocation into a [`Config`]. Provisioners and
//! enhancements share a single descriptor list; an enhancement with the same
//! name as a provisioner replaces it in place.
pub mod provisioners;
pub mod snippets;
pub mod toml_loader;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;
use crate::logging::Log;
use crate::shell::ShellSnippet;
use provisioners::{Provisioner, RawProvisioner};
use snippets::RawSnippet;

/// Default location of the dotfile sources.
const DEFAULT_SOURCE: &str = "~/.dot-config";

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawConfig {
    config: RawSettings,
    home: RawHome,
    provisioners: BTreeMap<String, toml::Value>,
    enhancements: BTreeMap<String, toml::Value>,
    shell_integration: RawShellIntegration,
    packages: BTreeMap<String, toml::Value>,
    cleanup: RawCleanup,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawSettings {
    source: Option<String>,
    backup: Option<bool>,
    package_manager: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawHome {
    files: BTreeMap<String, String>,
    dirs: BTreeMap<String, String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawCleanup {
    patterns: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawShellIntegration {
    snippets: BTreeMap<String, toml::Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawPackageSet {
    packages: Vec<String>,
}

/// All loaded configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding dotfile sources (`~` expanded).
    pub source: PathBuf,
    /// Whether real files or directories in the way of a link are moved
    /// aside instead of deleted.
    pub backup: bool,
    /// Package manager override; `None` uses the detected one.
    pub package_manager: Option<String>,
    /// Home-relative destination to source-relative file.
    pub files: BTreeMap<PathBuf, PathBuf>,
    /// Home-relative destination to source-relative directory.
    pub dirs: BTreeMap<PathBuf, PathBuf>,
    /// Home-relative glob patterns removed by `cleanup`.
    pub cleanup: Vec<String>,
    /// Provisioners followed by enhancements.
    pub provisioners: Vec<Provisioner>,
    /// Shell integration snippets.
    pub snippets: Vec<ShellSnippet>,
    /// Foundation system packages per package manager.
    pub packages: BTreeMap<String, Vec<String>>,
}

impl Config {
    /// An empty configuration for `home`.
    #[must_use]
    pub fn empty(home: &Path) -> Self {
        Self {
            source: expand_home(DEFAULT_SOURCE, home),
            backup: true,
            package_manager: None,
            files: BTreeMap::new(),
            dirs: BTreeMap::new(),
            cleanup: Vec::new(),
            provisioners: Vec::new(),
            snippets: Vec::new(),
            packages: BTreeMap::new(),
        }
    }

    /// Load `path`, or an empty configuration (with a warning) if it does
    /// not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, is not valid TOML, or
    /// declares an invalid stage.
    pub fn load(path: &Path, home: &Path, log: &dyn Log) -> Result<Self, ConfigError> {
        match toml_loader::load_config::<RawConfig>(path)? {
            Some(raw) => Self::from_raw(raw, path, home, log),
            None => {
                log.warn(&format!("config file not found: {}", path.display()));
                Ok(Self::empty(home))
            }
        }
    }

    /// Parse configuration text; `path` only labels errors.
    ///
    /// # Errors
    ///
    /// Same as [`Config::load`], minus I/O.
    pub fn parse(content: &str, path: &Path, home: &Path, log: &dyn Log) -> Result<Self, ConfigError> {
        let raw: RawConfig = toml_loader::parse_config(content, path)?;
        Self::from_raw(raw, path, home, log)
    }

    /// The package manager to drive: the configured override, else `detected`.
    #[must_use]
    pub fn package_manager_or(&self, detected: Option<&str>) -> Option<String> {
        self.package_manager
            .clone()
            .or_else(|| detected.map(str::to_string))
    }

    fn from_raw(raw: RawConfig, path: &Path, home: &Path, log: &dyn Log) -> Result<Self, ConfigError> {
        let mut provisioners = descriptors(raw.provisioners, "provisioners", path, log)?;
        for enhancement in descriptors(raw.enhancements, "enhancements", path, log)? {
            match provisioners.iter_mut().find(|p| p.name == enhancement.name) {
                Some(existing) => *existing = enhancement,
                None => provisioners.push(enhancement),
            }
        }

        let mut snippets = Vec::new();
        for (name, value) in raw.shell_integration.snippets {
            if !value.is_table() {
                log.warn(&format!("ignoring snippet '{name}': not a table"));
                continue;
            }
            let snippet: RawSnippet =
                toml_loader::entry(value, "shell_integration.snippets", &name, path)?;
            snippets.push(snippet.into_snippet(&name)?);
        }

        let mut packages = BTreeMap::new();
        for (manager, value) in raw.packages {
            if !value.is_table() {
                log.warn(&format!("invalid package configuration for {manager}"));
                continue;
            }
            let set: RawPackageSet = toml_loader::entry(value, "packages", &manager, path)?;
            packages.insert(manager, set.packages);
        }

        Ok(Self {
            source: expand_home(raw.config.source.as_deref().unwrap_or(DEFAULT_SOURCE), home),
            backup: raw.config.backup.unwrap_or(true),
            package_manager: raw.config.package_manager.filter(|m| !m.is_empty()),
            files: mappings(raw.home.files),
            dirs: mappings(raw.home.dirs),
            cleanup: raw.cleanup.patterns,
            provisioners,
            snippets,
            packages,
        })
    }
}

fn descriptors(
    table: BTreeMap<String, toml::Value>,
    section: &str,
    path: &Path,
    log: &dyn Log,
) -> Result<Vec<Provisioner>, ConfigError> {
    let mut out = Vec::with_capacity(table.len());
    for (name, value) in table {
        if !value.is_table() {
            log.warn(&format!("ignoring [{section}] entry '{name}': not a table"));
            continue;
        }
        let raw: RawProvisioner = toml_loader::entry(value, section, &name, path)?;
        out.push(raw.into_provisioner(&name)?);
    }
    Ok(out)
}

fn mappings(table: BTreeMap<String, String>) -> BTreeMap<PathBuf, PathBuf> {
    table
        .into_iter()
        .map(|(dest, source)| (PathBuf::from(dest), PathBuf::from(source)))
        .collect()
}

/// Expand a leading `~` or `~/` against `home`; anything else (including
/// `~user`) is returned unchanged.
#[must_use]
pub fn expand_home(path: &str, home: &Path) -> PathBuf {
    let Some(rest) = path.strip_prefix('~') else {
        return PathBuf::from(path);
    };
    if rest.is_empty() {
        return home.to_path_buf();
    }
    rest.strip_prefix('/')
        .or_else(|| rest.strip_prefix(std::path::MAIN_SEPARATOR))
        .map_or_else(|| PathBuf::from(path), |tail| home.join(tail))
}
