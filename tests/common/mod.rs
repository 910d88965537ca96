// Shared helpers for integration tests.
//
// Provides a temporary home directory with a `dot.toml`, a scripted
// executor that never spawns real processes, and an in-memory logger, so
// each integration test can drive the command layer in isolation.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code, clippy::expect_used, clippy::unwrap_used)]

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use dot_provision::commands::CommandSetup;
use dot_provision::exec::{CommandResult, Executor};
use dot_provision::logging::{Log, TaskStatus};
use dot_provision::platform::{Os, Platform};

// ---------------------------------------------------------------------------
// Executor
// ---------------------------------------------------------------------------

/// One executed command and the `PATH` it was given.
#[derive(Debug, Clone)]
pub struct Invocation {
    /// The command line.
    pub command: String,
    /// `PATH` from the explicit environment, if one was passed.
    pub path: Option<String>,
}

/// An [`Executor`] answering from substring rules.
///
/// The first rule whose pattern occurs in the command decides the outcome;
/// unmatched commands succeed with empty output.
#[derive(Debug, Default)]
pub struct FakeExecutor {
    rules: Vec<(String, bool, String)>,
    on_path: BTreeSet<String>,
    calls: Mutex<Vec<Invocation>>,
}

impl FakeExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands containing `pattern` exit 0 printing `stdout`.
    pub fn succeed(mut self, pattern: &str, stdout: &str) -> Self {
        self.rules
            .push((pattern.to_string(), true, stdout.to_string()));
        self
    }

    /// Commands containing `pattern` exit 1.
    pub fn fail(mut self, pattern: &str) -> Self {
        self.rules.push((pattern.to_string(), false, String::new()));
        self
    }

    /// Programs `which` reports as present.
    pub fn with_on_path(mut self, programs: &[&str]) -> Self {
        self.on_path
            .extend(programs.iter().map(|p| (*p).to_string()));
        self
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.calls.lock().unwrap().clone()
    }

    pub fn commands(&self) -> Vec<String> {
        self.invocations().into_iter().map(|i| i.command).collect()
    }
}

impl Executor for FakeExecutor {
    fn execute<'a>(
        &self,
        command: &str,
        _capture: bool,
        env: Option<&'a BTreeMap<String, String>>,
    ) -> std::io::Result<CommandResult> {
        self.calls.lock().unwrap().push(Invocation {
            command: command.to_string(),
            path: env.and_then(|e| e.get("PATH").cloned()),
        });
        let (success, stdout) = self
            .rules
            .iter()
            .find(|(pattern, _, _)| command.contains(pattern.as_str()))
            .map_or((true, String::new()), |(_, ok, out)| (*ok, out.clone()));
        Ok(CommandResult {
            success,
            stdout,
            stderr: if success { String::new() } else { "failed".to_string() },
            code: i32::from(!success),
            duration: Duration::ZERO,
        })
    }

    fn which(&self, program: &str) -> bool {
        self.on_path.contains(program)
    }
}

// ---------------------------------------------------------------------------
// Logger
// ---------------------------------------------------------------------------

/// A [`Log`] that keeps `"<level>: <msg>"` lines and task records in memory.
#[derive(Debug, Default)]
pub struct MemoryLog {
    lines: Mutex<Vec<String>>,
    tasks: Mutex<Vec<(String, TaskStatus)>>,
}

impl MemoryLog {
    pub fn contains(&self, needle: &str) -> bool {
        self.lines.lock().unwrap().iter().any(|l| l.contains(needle))
    }

    pub fn tasks(&self) -> Vec<(String, TaskStatus)> {
        self.tasks.lock().unwrap().clone()
    }

    pub fn status_of(&self, name: &str) -> Option<TaskStatus> {
        self.tasks()
            .into_iter()
            .find(|(n, _)| n == name)
            .map(|(_, s)| s)
    }

    fn push(&self, level: &str, msg: &str) {
        self.lines.lock().unwrap().push(format!("{level}: {msg}"));
    }
}

impl Log for MemoryLog {
    fn stage(&self, msg: &str) {
        self.push("stage", msg);
    }
    fn info(&self, msg: &str) {
        self.push("info", msg);
    }
    fn debug(&self, msg: &str) {
        self.push("debug", msg);
    }
    fn warn(&self, msg: &str) {
        self.push("warn", msg);
    }
    fn error(&self, msg: &str) {
        self.push("error", msg);
    }
    fn dry_run(&self, msg: &str) {
        self.push("dry_run", msg);
    }
    fn record_task(&self, name: &str, status: TaskStatus, _message: Option<&str>) {
        self.tasks.lock().unwrap().push((name.to_string(), status));
    }
}

// ---------------------------------------------------------------------------
// Test context
// ---------------------------------------------------------------------------

/// An isolated home directory backed by a [`tempfile::TempDir`], holding
/// `dot.toml` and the dotfile sources.
pub struct IntegrationTestContext {
    /// Temporary directory used as the home directory.
    pub home: tempfile::TempDir,
}

impl IntegrationTestContext {
    /// Create a context whose `dot.toml` contains `config`.
    pub fn with_config(config: &str) -> Self {
        let home = tempfile::tempdir().expect("create temp dir");
        std::fs::write(home.path().join("dot.toml"), config).expect("write dot.toml");
        Self { home }
    }

    pub fn home_path(&self) -> &Path {
        self.home.path()
    }

    pub fn config_path(&self) -> PathBuf {
        self.home.path().join("dot.toml")
    }

    /// A Debian-like Linux platform rooted at this context's home.
    pub fn platform(&self) -> Platform {
        Platform::new(Os::Linux, Some("debian"), Some("apt"), self.home_path())
    }

    /// Create `relative` (and its parents) under the home directory.
    pub fn touch(&self, relative: &str) -> PathBuf {
        let path = self.home_path().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("create parent");
        }
        std::fs::write(&path, "").expect("write file");
        path
    }

    /// Load the configuration into a [`CommandSetup`] driven by `executor`.
    pub fn setup(&self, executor: &Arc<FakeExecutor>, log: &Arc<MemoryLog>) -> CommandSetup {
        CommandSetup::with_platform(
            &self.config_path(),
            self.platform(),
            Arc::<FakeExecutor>::clone(executor),
            Arc::<MemoryLog>::clone(log),
        )
        .expect("command setup")
    }
}
