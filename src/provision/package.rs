//! System package managers and their install command lines.
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use crate::error::ProvisionError;

/// Supported package managers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PackageManager {
    /// Debian and Ubuntu (`apt-get`).
    Apt,
    /// Homebrew.
    Brew,
    /// Fedora and RHEL.
    Dnf,
    /// Arch Linux.
    Pacman,
}

impl fmt::Display for PackageManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Apt => write!(f, "apt"),
            Self::Brew => write!(f, "brew"),
            Self::Dnf => write!(f, "dnf"),
            Self::Pacman => write!(f, "pacman"),
        }
    }
}

impl FromStr for PackageManager {
    type Err = ProvisionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "apt" => Ok(Self::Apt),
            "brew" => Ok(Self::Brew),
            "dnf" => Ok(Self::Dnf),
            "pacman" => Ok(Self::Pacman),
            other => Err(ProvisionError::UnsupportedPackageManager(other.to_string())),
        }
    }
}

impl PackageManager {
    /// Resolve the configured manager name.
    ///
    /// # Errors
    ///
    /// [`ProvisionError::NoPackageManager`] when `name` is `None`,
    /// [`ProvisionError::UnsupportedPackageManager`] for unknown names.
    pub fn resolve(name: Option<&str>) -> Result<Self, ProvisionError> {
        name.ok_or(ProvisionError::NoPackageManager)?.parse()
    }

    /// Command installing a single provisioner package.
    #[must_use]
    pub fn install_command(self, package: &str) -> String {
        match self {
            Self::Apt => format!("sudo apt-get update && sudo apt-get install -y {package}"),
            Self::Brew => format!("brew install {package}"),
            Self::Dnf => format!("sudo dnf install -y {package}"),
            Self::Pacman => format!("sudo pacman -S --noconfirm {package}"),
        }
    }

    /// Command installing a batch of foundation packages.
    #[must_use]
    pub fn batch_install_command(self, packages: &[&str]) -> String {
        let names = packages.join(" ");
        match self {
            Self::Pacman => format!("sudo pacman -S --noconfirm --needed {names}"),
            Self::Apt | Self::Brew | Self::Dnf => self.install_command(&names),
        }
    }

    /// Command listing installed packages, for managers that can be queried
    /// cheaply before installing.
    #[must_use]
    pub fn installed_query(self, packages: &[&str]) -> Option<String> {
        match self {
            Self::Apt => Some(format!(
                "dpkg -l {} 2>/dev/null | grep '^ii' | awk '{{print $2}}' | cut -d: -f1",
                packages.join(" ")
            )),
            Self::Brew => Some("brew list --formula".to_string()),
            Self::Dnf | Self::Pacman => None,
        }
    }
}

/// Parse the output of [`PackageManager::installed_query`] into a name set.
#[must_use]
pub fn parse_installed(output: &str) -> HashSet<String> {
    output.split_whitespace().map(str::to_string).collect()
}
