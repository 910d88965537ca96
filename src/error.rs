//! Domain-specific error types for the provisioning engine.
//!
//! Internal modules return typed errors (e.g., [`ExecError`],
//! [`ProvisionError`]) while command handlers at the CLI boundary convert
//! them to [`anyhow::Error`] via the standard `?` operator.
//!
//! # Error hierarchy
//!
//! ```text
//! ExecError        : checked command failures, spawn failures
//! ProvisionError   : per-provisioner install failures (recorded, never fatal)
//! ConfigError      : dot.toml reading and value parsing
//! ```

use thiserror::Error;

/// Errors raised by the command engine.
///
/// Only returned from [`CommandEngine::run`](crate::exec::CommandEngine::run)
/// when the caller asked for a checked run; unchecked runs report failures
/// through [`CommandResult`](crate::exec::CommandResult) instead.
#[derive(Error, Debug)]
pub enum ExecError {
    /// The command ran but exited non-zero.
    #[error("command '{command}' failed (exit {code}): {}", .stderr.trim())]
    ProcessFailed {
        /// Exit code reported by the process.
        code: i32,
        /// The command line that was executed.
        command: String,
        /// Captured standard output.
        stdout: String,
        /// Captured standard error.
        stderr: String,
    },

    /// The process could not be started at all.
    #[error("failed to execute '{command}'")]
    Spawn {
        /// The command line that could not be started.
        command: String,
        /// Underlying spawn error.
        source: std::io::Error,
    },
}

/// Reasons a single provisioner could not be installed.
///
/// These are captured as values by the provisioning loop, logged, and
/// recorded as a failed entry; they never abort the run.
#[derive(Error, Debug)]
pub enum ProvisionError {
    /// The install command exited non-zero.
    #[error("install command exited with code {code}")]
    ExecutionFailure {
        /// Exit code of the failing command.
        code: i32,
    },

    /// The install command could not be started.
    #[error("install command could not be started: {reason}")]
    SpawnFailure {
        /// Error text captured from the spawn attempt.
        reason: String,
    },

    /// Required tools are neither on the search path nor declared by any provisioner.
    #[error("missing requirements: {}", .missing.join(", "))]
    UnmetRequirement {
        /// Tools that could not be resolved.
        missing: Vec<String>,
    },

    /// Downloading a binary failed.
    #[error("failed to download {url}")]
    DownloadFailure {
        /// URL that was being downloaded.
        url: String,
    },

    /// Marking a downloaded binary executable failed.
    #[error("failed to make {path} executable")]
    PermissionFailure {
        /// Path of the downloaded binary.
        path: String,
    },

    /// Moving a downloaded binary into the system binary directory failed.
    #[error("failed to move {path} to {destination}")]
    RelocationFailure {
        /// Path of the downloaded binary.
        path: String,
        /// Directory the binary was being moved into.
        destination: String,
    },

    /// No system package manager was detected or configured.
    #[error("no package manager available")]
    NoPackageManager,

    /// The detected package manager is not one the engine knows how to drive.
    #[error("unsupported package manager: {0}")]
    UnsupportedPackageManager(String),

    /// The chosen install method has no payload (script text or URL).
    #[error("no {method} configured")]
    NoInstallPayload {
        /// Human-readable name of the missing payload.
        method: &'static str,
    },
}

/// Errors that arise from loading `dot.toml`.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// An I/O error occurred while reading the config file.
    #[error("IO error reading config file {path}: {source}")]
    Io {
        /// Path to the file that could not be read.
        path: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The file is not valid TOML or does not match the expected shape.
    #[error("Invalid TOML in {path}: {message}")]
    Parse {
        /// Path to the file that failed to parse.
        path: String,
        /// Parser diagnostic.
        message: String,
    },

    /// A `stage` value is not one of the known stage ordinals.
    #[error("Invalid stage {value} for '{item}': must be one of 0, 5, 9")]
    InvalidStage {
        /// Name of the provisioner or snippet declaring the stage.
        item: String,
        /// The rejected value.
        value: i64,
    },
}
