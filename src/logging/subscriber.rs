//! Tracing subscriber: console and file sinks sharing one event classification.
use std::fs;
use std::io::Write as _;
use std::sync::Mutex;

use tracing::Level;
use tracing::field::{Field, Visit};

use super::utils::{Stamp, keep_previous, log_file_path, strip_ansi, timestamp};

/// Target used for stage headers.
pub(super) const STAGE_TARGET: &str = "dot::stage";
/// Target used for dry-run notices.
pub(super) const DRY_RUN_TARGET: &str = "dot::dry_run";

/// What an event means to the reader, independent of the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Stage,
    DryRun,
    Error,
    Warn,
    Info,
    Debug,
}

impl Kind {
    fn of(level: Level, target: &str) -> Self {
        match level {
            Level::ERROR => Self::Error,
            Level::WARN => Self::Warn,
            Level::INFO if target == STAGE_TARGET => Self::Stage,
            Level::INFO if target == DRY_RUN_TARGET => Self::DryRun,
            Level::INFO => Self::Info,
            _ => Self::Debug,
        }
    }

    /// Colored terminal rendering.
    fn console(self, msg: &str) -> String {
        match self {
            Self::Stage => format!("\x1b[1;34m==>\x1b[0m \x1b[1m{msg}\x1b[0m"),
            Self::DryRun => format!("  \x1b[33m[DRY RUN]\x1b[0m {msg}"),
            Self::Error => format!("\x1b[31mERROR\x1b[0m {msg}"),
            Self::Warn => format!("\x1b[33mWARN\x1b[0m  {msg}"),
            Self::Info => format!("  {msg}"),
            Self::Debug => format!("  \x1b[2m{msg}\x1b[0m"),
        }
    }

    /// Plain, timestamped log file rendering.
    fn file(self, time: &str, msg: &str) -> String {
        let tag = match self {
            Self::Stage => return format!("[{time}] ==> {msg}"),
            Self::DryRun => "[dry run] ",
            Self::Error => "[error] ",
            Self::Warn => "[warn] ",
            Self::Debug => "[debug] ",
            Self::Info => "",
        };
        format!("[{time}]     {tag}{msg}")
    }
}

/// Pulls the `message` field out of an event.
#[derive(Default)]
struct Message(String);

impl Visit for Message {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            value.clone_into(&mut self.0);
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if field.name() == "message" {
            self.0 = format!("{value:?}");
        }
    }
}

fn classify(event: &tracing::Event<'_>) -> (Kind, String) {
    let metadata = event.metadata();
    let mut message = Message::default();
    event.record(&mut message);
    (Kind::of(*metadata.level(), metadata.target()), message.0)
}

/// Appends every event to `<log dir>/<command>.log`.
///
/// The previous run's file is kept as `<command>.log.prev`.
#[derive(Debug)]
struct FileLayer {
    file: Mutex<fs::File>,
}

impl FileLayer {
    /// Open a fresh log for `command`, along with a note if the previous
    /// log could not be kept.
    fn open(command: &str) -> Option<(Self, Option<String>)> {
        let path = log_file_path(command)?;
        let rotation = keep_previous(&path)
            .err()
            .map(|e| format!("could not keep previous log {}: {e}", path.display()));
        let version =
            option_env!("DOT_VERSION").unwrap_or(concat!("dev-", env!("CARGO_PKG_VERSION")));
        let rule = "=".repeat(42);
        let header = format!(
            "{rule}\ndot {version} {command} {}\n{rule}\n",
            timestamp(Stamp::DateTime)
        );
        fs::write(&path, header).ok()?;
        let file = fs::OpenOptions::new().append(true).open(&path).ok()?;
        Some((
            Self {
                file: Mutex::new(file),
            },
            rotation,
        ))
    }
}

impl<S: tracing::Subscriber> tracing_subscriber::Layer<S> for FileLayer {
    fn on_event(&self, event: &tracing::Event<'_>, _ctx: tracing_subscriber::layer::Context<'_, S>) {
        let (kind, msg) = classify(event);
        let line = kind.file(&timestamp(Stamp::Time), &strip_ansi(&msg));
        if let Ok(mut file) = self.file.lock() {
            writeln!(file, "{line}").ok();
        }
    }
}

/// Console event format.
struct ConsoleFormatter;

impl<S, N> tracing_subscriber::fmt::FormatEvent<S, N> for ConsoleFormatter
where
    S: tracing::Subscriber + for<'a> tracing_subscriber::registry::LookupSpan<'a>,
    N: for<'a> tracing_subscriber::fmt::FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        _ctx: &tracing_subscriber::fmt::FmtContext<'_, S, N>,
        mut writer: tracing_subscriber::fmt::format::Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        let (kind, msg) = classify(event);
        writeln!(writer, "{}", kind.console(&msg))
    }
}

/// Initialise the global [`tracing`] subscriber.
///
/// The console shows `info` and above (`debug` too when `verbose`):
/// warnings and errors on stderr, the rest on stdout. With `quiet` every
/// console line goes to stderr, for commands whose stdout is data. The log
/// file always receives `debug` and above. Call once, before any logging.
pub fn init_subscriber(verbose: bool, quiet: bool, command: &str) {
    use tracing_subscriber::fmt::writer::MakeWriterExt as _;
    use tracing_subscriber::{
        Layer as _, filter::LevelFilter, fmt, layer::SubscriberExt as _,
        util::SubscriberInitExt as _,
    };

    let console_level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };

    let console = fmt::layer().event_format(ConsoleFormatter);
    let console = if quiet {
        console.with_writer(std::io::stderr).boxed()
    } else {
        console
            .with_writer(
                std::io::stderr
                    .with_max_level(Level::WARN)
                    .and(std::io::stdout.with_min_level(Level::INFO)),
            )
            .boxed()
    };

    let (file, rotation) = FileLayer::open(command).map_or((None, None), |(layer, note)| {
        (Some(layer.with_filter(LevelFilter::DEBUG)), note)
    });

    tracing_subscriber::registry()
        .with(console.with_filter(console_level))
        .with(file)
        .init();

    if let Some(note) = rotation {
        tracing::debug!("{note}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn targets_select_stage_and_dry_run() {
        assert_eq!(Kind::of(Level::INFO, STAGE_TARGET), Kind::Stage);
        assert_eq!(Kind::of(Level::INFO, DRY_RUN_TARGET), Kind::DryRun);
        assert_eq!(Kind::of(Level::INFO, "dot_provision::exec"), Kind::Info);
        assert_eq!(Kind::of(Level::WARN, STAGE_TARGET), Kind::Warn);
        assert_eq!(Kind::of(Level::TRACE, "x"), Kind::Debug);
    }

    #[test]
    fn file_lines_are_tagged_and_aligned() {
        assert_eq!(Kind::Stage.file("12:00:00", "Provisioning"), "[12:00:00] ==> Provisioning");
        assert_eq!(
            Kind::Error.file("12:00:00", "rustup failed"),
            "[12:00:00]     [error] rustup failed"
        );
        assert_eq!(Kind::Info.file("12:00:00", "ok"), "[12:00:00]     ok");
    }

    #[test]
    fn console_lines_carry_color() {
        assert_eq!(strip_ansi(&Kind::Warn.console("careful")), "WARN  careful");
        assert_eq!(
            strip_ansi(&Kind::DryRun.console("would execute: ls")),
            "  [DRY RUN] would execute: ls"
        );
        assert!(Kind::Error.console("x").starts_with("\x1b[31m"));
    }
}
