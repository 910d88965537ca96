//! The production [`Log`]: forwards to `tracing` and tallies provisioning results.
use std::path::PathBuf;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use super::subscriber::{DRY_RUN_TARGET, STAGE_TARGET};
use super::types::{Log, TaskEntry, TaskStatus};
use super::utils::log_file_path;

/// Implement the display methods of [`Log`] by delegating to inherent methods
/// of the same name on the implementing type.
macro_rules! forward_log_methods {
    ($($method:ident),+ $(,)?) => {
        $(
            fn $method(&self, msg: &str) {
                self.$method(msg);
            }
        )+
    };
}

/// Counts per status over a run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    /// Freshly installed.
    pub installed: usize,
    /// Already present before the run.
    pub present: usize,
    /// Skipped by dry run.
    pub dry_run: usize,
    /// Failed.
    pub failed: usize,
}

impl Tally {
    /// Count `entries` by status.
    #[must_use]
    pub fn of(entries: &[TaskEntry]) -> Self {
        entries.iter().fold(Self::default(), |mut t, e| {
            match e.status {
                TaskStatus::Ok => t.installed += 1,
                TaskStatus::AlreadyInstalled => t.present += 1,
                TaskStatus::DryRun => t.dry_run += 1,
                TaskStatus::Failed => t.failed += 1,
            }
            t
        })
    }

    /// Total number of entries.
    #[must_use]
    pub const fn total(&self) -> usize {
        self.installed + self.present + self.dry_run + self.failed
    }
}

/// One line per entry, followed by the counts line.
fn summary_lines(entries: &[TaskEntry], elapsed: Duration) -> Vec<String> {
    let mut lines: Vec<String> = entries
        .iter()
        .map(|entry| {
            let (icon, color) = match entry.status {
                TaskStatus::Ok => ("✓", "\x1b[32m"),
                TaskStatus::AlreadyInstalled => ("·", "\x1b[2m"),
                TaskStatus::DryRun => ("~", "\x1b[37m"),
                TaskStatus::Failed => ("✗", "\x1b[31m"),
            };
            let reason = entry
                .message
                .as_deref()
                .map_or_else(String::new, |m| format!(" ({m})"));
            format!("{color}{icon} {}{reason}\x1b[0m", entry.name)
        })
        .collect();

    let t = Tally::of(entries);
    lines.push(format!(
        "{} in {:.1}s: \x1b[32m{} installed\x1b[0m, \x1b[2m{} already present\x1b[0m, \
         \x1b[37m{} dry-run\x1b[0m, \x1b[31m{} failed\x1b[0m",
        t.total(),
        elapsed.as_secs_f64(),
        t.installed,
        t.present,
        t.dry_run,
        t.failed
    ));
    lines
}

/// Structured logger with dry-run awareness and a provisioning summary.
///
/// Console and file output both go through [`tracing`]; the file sink is
/// installed by [`init_subscriber`](super::subscriber::init_subscriber).
#[derive(Debug)]
pub struct Logger {
    entries: Mutex<Vec<TaskEntry>>,
    log_file: Option<PathBuf>,
    started: Instant,
}

impl Logger {
    /// Create a logger for `command`.
    ///
    /// Only remembers the log file path for the summary; the file itself is
    /// created by the subscriber's file layer.
    #[must_use]
    pub fn new(command: &str) -> Self {
        Self {
            entries: Mutex::new(Vec::new()),
            log_file: log_file_path(command),
            started: Instant::now(),
        }
    }

    /// Snapshot of every recorded entry.
    #[must_use]
    pub fn entries(&self) -> Vec<TaskEntry> {
        self.entries.lock().map_or_else(|_| Vec::new(), |g| g.clone())
    }

    /// Log an error message.
    pub fn error(&self, msg: &str) {
        tracing::error!("{msg}");
    }

    /// Log a warning message.
    pub fn warn(&self, msg: &str) {
        tracing::warn!("{msg}");
    }

    /// Log a stage header.
    pub fn stage(&self, msg: &str) {
        tracing::info!(target: STAGE_TARGET, "{msg}");
    }

    /// Log an informational message.
    pub fn info(&self, msg: &str) {
        tracing::info!("{msg}");
    }

    /// Log a debug message (console only when verbose; always in the file).
    pub fn debug(&self, msg: &str) {
        tracing::debug!("{msg}");
    }

    /// Log what a dry run would have done.
    pub fn dry_run(&self, msg: &str) {
        tracing::info!(target: DRY_RUN_TARGET, "{msg}");
    }

    /// Record a provisioning result for the summary.
    pub fn record_task(&self, name: &str, status: TaskStatus, message: Option<&str>) {
        if let Ok(mut guard) = self.entries.lock() {
            guard.push(TaskEntry {
                name: name.to_string(),
                status,
                message: message.map(String::from),
            });
        }
    }

    /// Counts of the entries recorded so far.
    #[must_use]
    pub fn tally(&self) -> Tally {
        Tally::of(&self.entries())
    }

    /// Return `true` if any recorded entry failed.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        self.tally().failed > 0
    }

    /// Log the summary of all recorded entries, if any.
    pub fn print_summary(&self) {
        let entries = self.entries();
        if entries.is_empty() {
            return;
        }
        self.stage("Summary");
        for line in summary_lines(&entries, self.started.elapsed()) {
            self.info(&line);
        }
        if let Some(path) = &self.log_file {
            self.info(&format!("\x1b[2mlog: {}\x1b[0m", path.display()));
        }
    }
}

impl Log for Logger {
    forward_log_methods!(stage, info, debug, warn, error, dry_run);

    fn record_task(&self, name: &str, status: TaskStatus, message: Option<&str>) {
        self.record_task(name, status, message);
    }
}
