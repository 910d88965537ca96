//! Log file placement, ANSI stripping and timestamps.
use std::fs;
use std::path::{Path, PathBuf};

/// Environment variable that overrides the log directory.
pub(super) const LOG_DIR_VAR: &str = "DOT_LOG_DIR";

/// Suffix given to the previous run's log when a new run starts.
const PREVIOUS_SUFFIX: &str = "prev";

/// Pick the log directory from an environment lookup.
///
/// `DOT_LOG_DIR` wins; otherwise `$XDG_CACHE_HOME/dot`, then
/// `$HOME/.cache/dot` (`USERPROFILE` on Windows), then `./.cache/dot`.
pub(super) fn resolve_log_dir(lookup: &dyn Fn(&str) -> Option<String>) -> PathBuf {
    if let Some(dir) = lookup(LOG_DIR_VAR).filter(|d| !d.is_empty()) {
        return PathBuf::from(dir);
    }
    let cache = lookup("XDG_CACHE_HOME")
        .filter(|d| !d.is_empty())
        .map_or_else(
            || {
                lookup("HOME")
                    .or_else(|| lookup("USERPROFILE"))
                    .map_or_else(|| PathBuf::from("."), PathBuf::from)
                    .join(".cache")
            },
            PathBuf::from,
        );
    cache.join("dot")
}

/// Log file path for `command`, creating the directory if needed.
pub(super) fn log_file_path(command: &str) -> Option<PathBuf> {
    let dir = resolve_log_dir(&|key| std::env::var(key).ok());
    fs::create_dir_all(&dir).ok()?;
    Some(dir.join(format!("{command}.log")))
}

/// Move an existing log at `path` aside so one previous run survives.
///
/// # Errors
///
/// Returns the rename error; the caller's new log then replaces the old one.
pub(super) fn keep_previous(path: &Path) -> std::io::Result<()> {
    if path.exists() {
        fs::rename(path, path.with_extension(format!("log.{PREVIOUS_SUFFIX}")))?;
    }
    Ok(())
}

#[derive(Clone, Copy)]
enum Scan {
    Text,
    Escape,
    Csi,
}

/// Remove ANSI escape sequences: CSI sequences (`ESC [` up to a final
/// byte in `@`..=`~`) and two-character escapes such as `ESC M`.
pub(super) fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut state = Scan::Text;
    for c in s.chars() {
        state = match (state, c) {
            (Scan::Text, '\x1b') => Scan::Escape,
            (Scan::Text, _) => {
                out.push(c);
                Scan::Text
            }
            (Scan::Escape, '[') => Scan::Csi,
            (Scan::Escape, _) | (Scan::Csi, '@'..='~') => Scan::Text,
            (Scan::Csi, _) => Scan::Csi,
        };
    }
    out
}

/// How much of the current UTC time to render.
#[derive(Clone, Copy)]
pub(super) enum Stamp {
    /// `YYYY-MM-DD HH:MM:SS`, for run headers.
    DateTime,
    /// `HH:MM:SS`, for individual lines.
    Time,
}

/// Format the current UTC time.
pub(super) fn timestamp(stamp: Stamp) -> String {
    let format = match stamp {
        Stamp::DateTime => "%Y-%m-%d %H:%M:%S",
        Stamp::Time => "%H:%M:%S",
    };
    chrono::Utc::now().format(format).to_string()
}
