//! System and provisioning status report.
use std::collections::BTreeMap;
use std::path::Path;

use serde::Serialize;

use crate::config::Config;
use crate::config::provisioners::Category;
use crate::platform::{Os, Platform};
use crate::provision::Manager;

/// Full status report, serialized as JSON by the `status` command.
#[derive(Debug, Clone, Serialize)]
pub struct StatusReport {
    /// Detected platform.
    pub platform: PlatformSummary,
    /// Per-provisioner install state.
    pub provisioners: BTreeMap<String, ProvisionerStatus>,
    /// Per-file link state, keyed by home-relative destination.
    pub dotfiles: BTreeMap<String, LinkStatus>,
}

/// Platform section of the report.
#[derive(Debug, Clone, Serialize)]
pub struct PlatformSummary {
    /// Operating system family.
    pub os: Os,
    /// Linux distribution id.
    pub distro: Option<String>,
    /// Running under WSL.
    pub is_wsl: bool,
    /// Package manager the provisioner would drive.
    pub package_manager: Option<String>,
}

/// Install state of one provisioner.
#[derive(Debug, Clone, Serialize)]
pub struct ProvisionerStatus {
    /// Whether the verify command succeeded.
    pub installed: bool,
    /// Provisioner category.
    #[serde(rename = "type")]
    pub category: Category,
    /// Human-readable summary.
    pub description: String,
}

/// State of a managed dotfile symlink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LinkStatus {
    /// Symlink points at its source.
    Ok,
    /// Nothing (or a dangling link) at the destination.
    Missing,
    /// A regular file or directory occupies the destination.
    NotSymlink,
    /// A symlink pointing somewhere else.
    WrongTarget,
}

/// Inspect `dest`, which should be a symlink resolving to `source`.
#[must_use]
pub fn link_status(dest: &Path, source: &Path) -> LinkStatus {
    if !dest.exists() {
        return LinkStatus::Missing;
    }
    if !dest.is_symlink() {
        return LinkStatus::NotSymlink;
    }
    match (dest.canonicalize(), source.canonicalize()) {
        (Ok(resolved), Ok(expected)) if resolved == expected => LinkStatus::Ok,
        _ => LinkStatus::WrongTarget,
    }
}

/// How many verify commands may run at once while collecting status.
pub const VERIFY_CONCURRENCY: usize = 8;

/// Build the report. Verify commands run against the process environment.
#[must_use]
pub fn collect(
    platform: &Platform,
    package_manager: Option<String>,
    config: &Config,
    manager: &Manager,
) -> StatusReport {
    let installed = manager.installed_states(VERIFY_CONCURRENCY);
    let provisioners = manager
        .resolver()
        .provisioners()
        .iter()
        .map(|p| {
            (
                p.name.clone(),
                ProvisionerStatus {
                    installed: installed.get(&p.name).copied().unwrap_or(false),
                    category: p.category,
                    description: p.description.clone(),
                },
            )
        })
        .collect();

    let dotfiles = config
        .files
        .iter()
        .map(|(dest, source)| {
            (
                dest.display().to_string(),
                link_status(&platform.home.join(dest), &config.source.join(source)),
            )
        })
        .collect();

    StatusReport {
        platform: PlatformSummary {
            os: platform.os,
            distro: platform.distro.clone(),
            is_wsl: platform.is_wsl,
            package_manager,
        },
        provisioners,
        dotfiles,
    }
}
