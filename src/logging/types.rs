//! Core logging types: summary entries, status, and the [`Log`] trait.

/// Provisioning result for summary reporting.
#[derive(Debug, Clone)]
pub struct TaskEntry {
    /// Provisioner (or step) name.
    pub name: String,
    /// Final status of the entry.
    pub status: TaskStatus,
    /// Optional detail message (e.g., failure reason).
    pub message: Option<String>,
}

/// Status of a completed provisioning step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskStatus {
    /// Freshly installed.
    Ok,
    /// The verify command already succeeded; nothing was installed.
    AlreadyInstalled,
    /// Ran in dry-run mode; no changes were applied.
    DryRun,
    /// Could not be installed.
    Failed,
}

/// Abstraction over logging backends.
///
/// Every component receives an `Arc<dyn Log>` at construction time instead
/// of reaching for a process-wide logger, so tests can substitute an
/// in-memory recorder.
pub trait Log: Send + Sync {
    /// Log a stage header (major section).
    fn stage(&self, msg: &str);
    /// Log an informational message.
    fn info(&self, msg: &str);
    /// Log a debug message (may be suppressed on console).
    fn debug(&self, msg: &str);
    /// Log a warning message.
    fn warn(&self, msg: &str);
    /// Log an error message.
    fn error(&self, msg: &str);
    /// Log a dry-run action message.
    fn dry_run(&self, msg: &str);
    /// Record a provisioning result for the summary.
    fn record_task(&self, name: &str, status: TaskStatus, message: Option<&str>);
}
