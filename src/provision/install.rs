//! Install strategies: script, system package, and binary download.
use crate::config::provisioners::{InstallMethod, Provisioner};
use crate::error::ProvisionError;
use crate::exec::{CommandEngine, CommandResult, RunOptions, SPAWN_FAILURE_CODE};
use crate::logging::Log;

use super::Environment;
use super::package::PackageManager;

/// Directory binaries are downloaded into before being moved.
pub const DOWNLOAD_DIR: &str = "/tmp";
/// Directory downloaded binaries are moved into.
pub const BIN_DIR: &str = "/usr/local/bin/";

/// Everything a strategy needs besides the descriptor.
pub struct InstallContext<'a> {
    /// Engine running the install commands.
    pub engine: &'a CommandEngine,
    /// Environment snapshot for the commands.
    pub env: &'a Environment,
    /// Reporter for diagnostics.
    pub log: &'a dyn Log,
    /// Name of the active system package manager.
    pub package_manager: Option<&'a str>,
}

impl std::fmt::Debug for InstallContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstallContext")
            .field("engine", self.engine)
            .field("env", self.env)
            .field("log", &"<dyn Log>")
            .field("package_manager", &self.package_manager)
            .finish()
    }
}

impl InstallContext<'_> {
    /// Run `command` unchecked against the snapshot.
    fn run(&self, command: &str) -> Result<CommandResult, ProvisionError> {
        let opts = RunOptions::captured().with_env(self.env.vars());
        let result = self
            .engine
            .run(command, &opts)
            .map_err(|e| ProvisionError::SpawnFailure {
                reason: e.to_string(),
            })?;
        if !result.success && result.code == SPAWN_FAILURE_CODE {
            return Err(ProvisionError::SpawnFailure {
                reason: result.stderr.trim().to_string(),
            });
        }
        Ok(result)
    }

    fn log_stderr(&self, result: &CommandResult) {
        let stderr = result.stderr.trim();
        if !stderr.is_empty() {
            self.log.error(&format!("error output:\n{stderr}"));
        }
    }
}

/// Install `provisioner` with the strategy its method selects.
///
/// # Errors
///
/// Returns the [`ProvisionError`] describing why the install failed.
pub fn install(provisioner: &Provisioner, ctx: &InstallContext<'_>) -> Result<(), ProvisionError> {
    match provisioner.method {
        InstallMethod::Script => via_script(provisioner, ctx),
        InstallMethod::Package => via_package(provisioner, ctx),
        InstallMethod::Binary => via_binary(provisioner, ctx),
    }
}

fn via_script(provisioner: &Provisioner, ctx: &InstallContext<'_>) -> Result<(), ProvisionError> {
    let script = provisioner
        .install_script
        .as_deref()
        .ok_or(ProvisionError::NoInstallPayload {
            method: "install script",
        })?;

    let result = ctx.run(script)?;
    if result.success {
        return Ok(());
    }

    ctx.log.error(&format!("failed to install {}", provisioner.name));
    ctx.log_stderr(&result);
    let stdout = result.stdout.trim();
    if !stdout.is_empty() {
        ctx.log.debug(&format!("standard output:\n{stdout}"));
    }
    Err(ProvisionError::ExecutionFailure { code: result.code })
}

fn via_package(provisioner: &Provisioner, ctx: &InstallContext<'_>) -> Result<(), ProvisionError> {
    let manager = PackageManager::resolve(ctx.package_manager)?;
    let result = ctx.run(&manager.install_command(provisioner.package()))?;
    if result.success {
        return Ok(());
    }

    ctx.log
        .error(&format!("failed to install {} via {manager}", provisioner.name));
    ctx.log_stderr(&result);
    Err(ProvisionError::ExecutionFailure { code: result.code })
}

fn via_binary(provisioner: &Provisioner, ctx: &InstallContext<'_>) -> Result<(), ProvisionError> {
    let url = provisioner
        .binary_url
        .as_deref()
        .ok_or(ProvisionError::NoInstallPayload {
            method: "binary URL",
        })?;
    let staged = format!("{DOWNLOAD_DIR}/{}", provisioner.name);

    let steps: [(String, ProvisionError); 3] = [
        (
            format!("curl -L {url} -o {staged}"),
            ProvisionError::DownloadFailure {
                url: url.to_string(),
            },
        ),
        (
            format!("chmod +x {staged}"),
            ProvisionError::PermissionFailure {
                path: staged.clone(),
            },
        ),
        (
            format!("sudo mv {staged} {BIN_DIR}"),
            ProvisionError::RelocationFailure {
                path: staged.clone(),
                destination: BIN_DIR.to_string(),
            },
        ),
    ];

    for (command, failure) in steps {
        let result = ctx.run(&command)?;
        if !result.success {
            ctx.log.error(&format!("{}: {failure}", provisioner.name));
            ctx.log_stderr(&result);
            return Err(failure);
        }
    }
    Ok(())
}
