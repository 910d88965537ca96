//! Platform detection: OS family, distribution, WSL and package manager.
use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::Result;
use serde::Serialize;

use crate::exec::Executor;

/// Detected operating system platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Os {
    /// Linux, including WSL.
    Linux,
    /// macOS.
    Macos,
    /// Anything else; no package manager is inferred.
    Other,
}

impl fmt::Display for Os {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Linux => write!(f, "linux"),
            Self::Macos => write!(f, "macos"),
            Self::Other => write!(f, "other"),
        }
    }
}

/// Platform information for the current system.
#[derive(Debug, Clone)]
pub struct Platform {
    /// Operating system family.
    pub os: Os,
    /// Linux distribution id from `/etc/os-release`.
    pub distro: Option<String>,
    /// Running under Windows Subsystem for Linux.
    pub is_wsl: bool,
    /// Detected system package manager name.
    pub package_manager: Option<String>,
    /// User home directory.
    pub home: PathBuf,
}

impl Platform {
    /// Detect the current platform.
    ///
    /// `executor` answers the search-path probe used to find `brew` on macOS.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn detect(executor: &dyn Executor) -> Result<Self> {
        let os = Self::detect_os();
        let (distro, is_wsl) = if os == Os::Linux {
            (
                read_optional(Path::new("/etc/os-release"))
                    .and_then(|text| distro_from_os_release(&text)),
                read_optional(Path::new("/proc/version"))
                    .is_some_and(|text| is_wsl_kernel(&text)),
            )
        } else {
            (None, false)
        };
        let has_brew = os == Os::Macos && executor.which("brew");
        let package_manager =
            package_manager_for(os, distro.as_deref(), has_brew).map(str::to_string);

        Ok(Self {
            os,
            distro,
            is_wsl,
            package_manager,
            home: home_dir()?,
        })
    }

    /// Create a platform with explicit values (for testing and embedding).
    #[must_use]
    pub fn new(os: Os, distro: Option<&str>, package_manager: Option<&str>, home: &Path) -> Self {
        Self {
            os,
            distro: distro.map(str::to_string),
            is_wsl: false,
            package_manager: package_manager.map(str::to_string),
            home: home.to_path_buf(),
        }
    }

    /// Return `true` on Linux.
    #[must_use]
    pub fn is_linux(&self) -> bool {
        self.os == Os::Linux
    }

    /// Return `true` on macOS.
    #[must_use]
    pub fn is_macos(&self) -> bool {
        self.os == Os::Macos
    }

    fn detect_os() -> Os {
        if cfg!(target_os = "linux") {
            Os::Linux
        } else if cfg!(target_os = "macos") {
            Os::Macos
        } else {
            Os::Other
        }
    }
}

/// Resolve the user home directory from the environment.
///
/// # Errors
///
/// Returns an error if neither `HOME` nor `USERPROFILE` is set.
pub fn home_dir() -> Result<PathBuf> {
    std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .map(PathBuf::from)
        .map_err(|_| anyhow::anyhow!("neither HOME nor USERPROFILE environment variable is set"))
}

fn read_optional(path: &Path) -> Option<String> {
    std::fs::read_to_string(path).ok()
}

/// Extract the `ID=` value from `/etc/os-release` content.
#[must_use]
pub fn distro_from_os_release(text: &str) -> Option<String> {
    text.lines()
        .find_map(|line| line.strip_prefix("ID="))
        .map(|id| id.trim().trim_matches('"').to_string())
        .filter(|id| !id.is_empty())
}

/// WSL kernels identify themselves in `/proc/version`.
#[must_use]
pub fn is_wsl_kernel(proc_version: &str) -> bool {
    proc_version.to_lowercase().contains("microsoft")
}

/// Map an OS and distro to the package manager the provisioner drives.
#[must_use]
pub fn package_manager_for(os: Os, distro: Option<&str>, has_brew: bool) -> Option<&'static str> {
    match os {
        Os::Macos => has_brew.then_some("brew"),
        Os::Linux => match distro? {
            "debian" | "ubuntu" | "raspbian" => Some("apt"),
            "fedora" | "centos" | "rhel" => Some("dnf"),
            "arch" | "manjaro" => Some("pacman"),
            _ => None,
        },
        Os::Other => None,
    }
}
