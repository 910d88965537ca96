//! External command execution: single checked/unchecked runs and bounded
//! concurrent batches.
use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::process::{Command, ExitStatus, Output, Stdio};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rayon::prelude::*;

use crate::error::ExecError;
use crate::logging::Log;

/// Exit code reported for a command that could not be started.
pub const SPAWN_FAILURE_CODE: i32 = -1;

/// Offset added to the signal number of a signal-terminated process.
pub const SIGNAL_EXIT_BASE: i32 = 128;

/// Result of a command execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandResult {
    /// Whether the command exited with status zero.
    pub success: bool,
    /// Captured standard output (empty when not captured).
    pub stdout: String,
    /// Captured standard error (empty when not captured).
    pub stderr: String,
    /// Numeric exit code; `128 + signal` for a process killed by a signal,
    /// [`SPAWN_FAILURE_CODE`] only when the process never started.
    pub code: i32,
    /// Wall-clock time spent waiting for the command.
    pub duration: Duration,
}

impl CommandResult {
    /// A successful result with no output, as produced by dry-run mode.
    #[must_use]
    pub const fn dry() -> Self {
        Self {
            success: true,
            stdout: String::new(),
            stderr: String::new(),
            code: 0,
            duration: Duration::ZERO,
        }
    }

    /// A synthetic failed result describing a spawn error.
    #[must_use]
    pub fn spawn_failure(error: &std::io::Error, duration: Duration) -> Self {
        Self {
            success: false,
            stdout: String::new(),
            stderr: error.to_string(),
            code: SPAWN_FAILURE_CODE,
            duration,
        }
    }
}

impl From<Output> for CommandResult {
    fn from(output: Output) -> Self {
        Self {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            success: output.status.success(),
            code: exit_code(output.status),
            duration: Duration::ZERO,
        }
    }
}

/// Shell-style exit code for `status`.
fn exit_code(status: ExitStatus) -> i32 {
    if let Some(code) = status.code() {
        return code;
    }
    #[cfg(unix)]
    {
        use std::os::unix::process::ExitStatusExt as _;
        if let Some(signal) = status.signal() {
            return SIGNAL_EXIT_BASE + signal;
        }
    }
    1
}

/// Per-invocation options for [`CommandEngine::run`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RunOptions<'a> {
    /// Return [`ExecError`] instead of a failed result.
    pub check: bool,
    /// Capture stdout/stderr instead of inheriting the terminal.
    pub capture: bool,
    /// Complete environment for the child; `None` inherits the process environment.
    pub env: Option<&'a BTreeMap<String, String>>,
}

impl<'a> RunOptions<'a> {
    /// Unchecked run with captured output.
    #[must_use]
    pub const fn captured() -> Self {
        Self {
            check: false,
            capture: true,
            env: None,
        }
    }

    /// Checked run with captured output.
    #[must_use]
    pub const fn checked() -> Self {
        Self {
            check: true,
            capture: true,
            env: None,
        }
    }

    /// Run with `env` as the child's complete environment.
    #[must_use]
    pub const fn with_env(mut self, env: &'a BTreeMap<String, String>) -> Self {
        self.env = Some(env);
        self
    }
}

/// Abstraction over process spawning, so the engine can be driven by mocks.
#[cfg_attr(test, mockall::automock)]
pub trait Executor: Send + Sync {
    /// Run `command` through the platform shell and wait for it.
    ///
    /// Returns the raw outcome; `duration` is filled in by the caller.
    ///
    /// # Errors
    ///
    /// Returns an error if the process could not be spawned.
    fn execute<'a>(
        &self,
        command: &str,
        capture: bool,
        env: Option<&'a BTreeMap<String, String>>,
    ) -> std::io::Result<CommandResult>;

    /// Check if a program is available on the process search path.
    fn which(&self, program: &str) -> bool;
}

/// [`Executor`] that spawns real processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemExecutor;

/// Build a [`Command`] that hands `command` to the platform shell.
fn shell_command(command: &str) -> Command {
    #[cfg(windows)]
    {
        let mut cmd = Command::new("cmd");
        cmd.args(["/C", command]);
        cmd
    }
    #[cfg(not(windows))]
    {
        let mut cmd = Command::new("sh");
        cmd.args(["-c", command]);
        cmd
    }
}

impl Executor for SystemExecutor {
    fn execute<'a>(
        &self,
        command: &str,
        capture: bool,
        env: Option<&'a BTreeMap<String, String>>,
    ) -> std::io::Result<CommandResult> {
        let mut cmd = shell_command(command);
        // Install commands may prompt (sudo), so stdin stays attached.
        cmd.stdin(Stdio::inherit());
        if capture {
            cmd.stdout(Stdio::piped()).stderr(Stdio::piped());
        } else {
            cmd.stdout(Stdio::inherit()).stderr(Stdio::inherit());
        }
        if let Some(env) = env {
            cmd.env_clear().envs(env);
        }
        cmd.output().map(CommandResult::from)
    }

    fn which(&self, program: &str) -> bool {
        which::which(program).is_ok()
    }
}

/// Runs external commands on behalf of the provisioning pipeline.
///
/// In dry-run mode no process is ever spawned: every [`run`](Self::run)
/// logs the command and returns [`CommandResult::dry`].
#[derive(Clone)]
pub struct CommandEngine {
    executor: Arc<dyn Executor>,
    log: Arc<dyn Log>,
    dry_run: bool,
}

impl std::fmt::Debug for CommandEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandEngine")
            .field("executor", &"<dyn Executor>")
            .field("log", &"<dyn Log>")
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl CommandEngine {
    /// Create an engine over `executor`.
    #[must_use]
    pub fn new(executor: Arc<dyn Executor>, log: Arc<dyn Log>, dry_run: bool) -> Self {
        Self {
            executor,
            log,
            dry_run,
        }
    }

    /// A copy of this engine with dry-run mode set to `dry_run`.
    #[must_use]
    pub fn with_dry_run(&self, dry_run: bool) -> Self {
        Self {
            dry_run,
            ..self.clone()
        }
    }

    /// Whether this engine skips spawning processes.
    #[must_use]
    pub const fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// Run a single command.
    ///
    /// Unchecked runs always return `Ok`: a non-zero exit yields
    /// `success = false`, and a spawn error yields a synthetic result with
    /// [`SPAWN_FAILURE_CODE`] and the error text in `stderr`.
    ///
    /// # Errors
    ///
    /// Only when `opts.check` is set: [`ExecError::ProcessFailed`] for a
    /// non-zero exit and [`ExecError::Spawn`] when the process could not start.
    pub fn run(&self, command: &str, opts: &RunOptions<'_>) -> Result<CommandResult, ExecError> {
        if self.dry_run {
            self.log.dry_run(&format!("would execute: {command}"));
            return Ok(CommandResult::dry());
        }

        self.log.debug(&format!("executing: {command}"));
        let start = Instant::now();
        match self.executor.execute(command, opts.capture, opts.env) {
            Ok(mut result) => {
                result.duration = start.elapsed();
                if opts.check && !result.success {
                    return Err(ExecError::ProcessFailed {
                        code: result.code,
                        command: command.to_string(),
                        stdout: result.stdout,
                        stderr: result.stderr,
                    });
                }
                Ok(result)
            }
            Err(source) if opts.check => Err(ExecError::Spawn {
                command: command.to_string(),
                source,
            }),
            Err(e) => {
                self.log.error(&format!("failed to execute '{command}': {e}"));
                Ok(CommandResult::spawn_failure(&e, start.elapsed()))
            }
        }
    }

    /// Run independent commands with at most `max_concurrent` in flight.
    ///
    /// Results line up index-for-index with `commands`. With `stop_on_error`
    /// collection ends after the first failed result in submission order;
    /// commands already dispatched alongside it may still have run.
    /// An unexpected fault anywhere in the batch yields an empty list.
    pub fn run_many<S: AsRef<str> + Sync>(
        &self,
        commands: &[S],
        max_concurrent: usize,
        stop_on_error: bool,
    ) -> Vec<CommandResult> {
        let pool = match rayon::ThreadPoolBuilder::new()
            .num_threads(max_concurrent.max(1))
            .build()
        {
            Ok(pool) => pool,
            Err(e) => {
                self.log
                    .error(&format!("error in parallel execution: cannot start pool: {e}"));
                return Vec::new();
            }
        };

        let opts = RunOptions::captured();
        let batch = std::panic::catch_unwind(AssertUnwindSafe(|| {
            pool.install(|| {
                commands
                    .par_iter()
                    .map(|command| self.run(command.as_ref(), &opts))
                    .collect::<Result<Vec<_>, _>>()
            })
        }));

        let results = match batch {
            Ok(Ok(results)) => results,
            Ok(Err(e)) => {
                self.log.error(&format!("error in parallel execution: {e}"));
                return Vec::new();
            }
            Err(_) => {
                self.log
                    .error("error in parallel execution: a command worker panicked");
                return Vec::new();
            }
        };

        let mut collected = Vec::with_capacity(results.len());
        for result in results {
            let failed = !result.success;
            collected.push(result);
            if stop_on_error && failed {
                break;
            }
        }
        collected
    }
}
