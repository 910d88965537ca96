//! Removal of unwanted files from the home directory by glob pattern.
use std::path::{Component, Path, PathBuf};

use crate::logging::Log;

use super::remove_entry;

/// Why a pattern could not be expanded.
fn reject(pattern: &str) -> Option<&'static str> {
    let path = Path::new(pattern);
    if pattern.is_empty() {
        Some("empty pattern")
    } else if path.has_root() || path.is_absolute() {
        Some("pattern must be relative to the home directory")
    } else if path.components().any(|c| c == Component::ParentDir) {
        Some("pattern must not leave the home directory")
    } else {
        None
    }
}

/// Paths under `home` matching `pattern`, in glob order.
///
/// # Errors
///
/// Returns a message when the pattern is rejected or is not a valid glob.
pub fn matches(home: &Path, pattern: &str) -> Result<Vec<PathBuf>, String> {
    if let Some(reason) = reject(pattern) {
        return Err(reason.to_string());
    }
    let home = home
        .to_str()
        .ok_or_else(|| format!("home directory is not valid UTF-8: {}", home.display()))?;
    let full = Path::new(&glob::Pattern::escape(home)).join(pattern);
    let paths = glob::glob(&full.to_string_lossy()).map_err(|e| e.to_string())?;
    Ok(paths.filter_map(Result::ok).collect())
}

/// Remove everything under `home` matching any of `patterns`.
///
/// Directories are removed with their contents; symlinks are removed, not
/// followed. Returns `false` if a pattern was invalid or an entry could not
/// be removed; the remaining patterns are still processed.
pub fn cleanup(home: &Path, patterns: &[String], dry_run: bool, log: &dyn Log) -> bool {
    if patterns.is_empty() {
        log.info("no cleanup patterns configured");
        return true;
    }

    let mut ok = true;
    let mut removed = 0_usize;
    for pattern in patterns {
        let found = match matches(home, pattern) {
            Ok(found) => found,
            Err(reason) => {
                log.error(&format!("failed to clean pattern {pattern}: {reason}"));
                ok = false;
                continue;
            }
        };
        log.debug(&format!("{pattern}: {} matches", found.len()));

        for path in found {
            if dry_run {
                log.dry_run(&format!("would remove: {}", path.display()));
                removed += 1;
                continue;
            }
            log.info(&format!("removing: {}", path.display()));
            match remove_entry(&path) {
                Ok(()) => removed += 1,
                Err(e) => {
                    log.error(&format!("failed to remove {}: {e}", path.display()));
                    ok = false;
                }
            }
        }
    }

    if dry_run {
        log.info(&format!("{removed} would be removed"));
    } else {
        log.info(&format!("{removed} removed"));
    }
    ok
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::logging::test_helpers::RecordingLog;
    use std::fs;

    fn patterns(list: &[&str]) -> Vec<String> {
        list.iter().map(|p| (*p).to_string()).collect()
    }

    #[test]
    fn removes_matching_files_and_dirs() {
        let home = tempfile::tempdir().unwrap();
        fs::write(home.path().join(".zcompdump"), "").unwrap();
        fs::write(home.path().join(".zcompdump-host-5.9"), "").unwrap();
        fs::create_dir_all(home.path().join(".cache/old/nested")).unwrap();
        fs::write(home.path().join(".zshrc"), "").unwrap();
        let log = RecordingLog::new();

        assert!(cleanup(
            home.path(),
            &patterns(&[".zcompdump*", ".cache/old"]),
            false,
            &log
        ));

        assert!(!home.path().join(".zcompdump").exists());
        assert!(!home.path().join(".zcompdump-host-5.9").exists());
        assert!(!home.path().join(".cache/old").exists());
        assert!(home.path().join(".cache").exists());
        assert!(home.path().join(".zshrc").exists());
        assert!(log.contains("info: 3 removed"));
    }

    #[test]
    fn dry_run_only_reports() {
        let home = tempfile::tempdir().unwrap();
        fs::write(home.path().join(".lesshst"), "").unwrap();
        let log = RecordingLog::new();

        assert!(cleanup(home.path(), &patterns(&[".lesshst"]), true, &log));

        assert!(home.path().join(".lesshst").exists());
        assert!(log.contains("dry_run: would remove:"));
        assert!(log.contains("info: 1 would be removed"));
    }

    #[test]
    fn no_patterns_is_a_no_op() {
        let log = RecordingLog::new();
        assert!(cleanup(Path::new("/nonexistent"), &[], false, &log));
        assert!(log.contains("no cleanup patterns configured"));
    }

    #[test]
    fn patterns_outside_home_are_rejected() {
        let home = tempfile::tempdir().unwrap();
        fs::write(home.path().join(".keep"), "").unwrap();
        let log = RecordingLog::new();

        assert!(!cleanup(
            home.path(),
            &patterns(&["/tmp/*", "../*", ".keep"]),
            true,
            &log
        ));
        // Later patterns still run.
        assert!(log.contains("would remove:"));
        assert!(log.contains("must be relative"));
        assert!(log.contains("must not leave"));
    }

    #[test]
    fn invalid_glob_is_an_error() {
        let home = tempfile::tempdir().unwrap();
        assert!(matches(home.path(), "[").is_err());
    }

    #[test]
    fn home_with_glob_metacharacters_is_literal() {
        let root = tempfile::tempdir().unwrap();
        let home = root.path().join("we[ird]");
        fs::create_dir_all(&home).unwrap();
        fs::write(home.join(".viminfo"), "").unwrap();
        assert_eq!(matches(&home, ".viminfo").unwrap(), vec![home.join(".viminfo")]);
    }

    #[cfg(unix)]
    #[test]
    fn symlinked_directory_is_unlinked_not_emptied() {
        let root = tempfile::tempdir().unwrap();
        let home = root.path().join("home");
        let kept = root.path().join("kept");
        fs::create_dir_all(&home).unwrap();
        fs::create_dir_all(&kept).unwrap();
        fs::write(kept.join("data"), "").unwrap();
        std::os::unix::fs::symlink(&kept, home.join(".old-link")).unwrap();

        assert!(cleanup(&home, &patterns(&[".old-link"]), false, &RecordingLog::new()));

        assert!(home.join(".old-link").symlink_metadata().is_err());
        assert!(kept.join("data").exists());
    }
}
