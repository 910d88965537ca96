//! Dotfile symlinks from `[home.files]` and `[home.dirs]`.
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};

use crate::config::Config;
use crate::logging::{Log, TaskStatus};
use crate::status::{LinkStatus, link_status};

use super::remove_entry;

/// Suffix given to an entry moved out of a link's way.
const BACKUP_SUFFIX: &str = "bak";

/// One managed link: `target` in the home directory pointing at `source`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    /// Home-relative destination as written in the config.
    pub name: String,
    /// Path the link points at.
    pub source: PathBuf,
    /// Path of the link itself.
    pub target: PathBuf,
}

/// What [`apply`] did for one link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkOutcome {
    /// The link was created; `backup` holds where an existing entry went.
    Created {
        /// New location of the entry that was in the way, if it was kept.
        backup: Option<PathBuf>,
    },
    /// The link already pointed at its source.
    AlreadyLinked,
    /// Dry run: the link would have been created.
    WouldLink,
    /// The source does not exist, so nothing was touched.
    SourceMissing,
}

/// Every managed link: files first, then directories, each sorted by
/// destination.
#[must_use]
pub fn planned(config: &Config, home: &Path) -> Vec<Link> {
    config
        .files
        .iter()
        .chain(&config.dirs)
        .map(|(dest, source)| Link {
            name: dest.display().to_string(),
            source: config.source.join(source),
            target: home.join(dest),
        })
        .collect()
}

/// Create `link`, replacing whatever occupies its target.
///
/// With `backup` a real file or directory in the way is renamed to
/// `<name>.bak` (or `<name>.bak.N` if that is taken); other entries and
/// stale links are removed.
///
/// # Errors
///
/// Returns an error if the parent directory cannot be created, the
/// existing entry cannot be moved or removed, or the link cannot be made.
pub fn apply(link: &Link, backup: bool, dry_run: bool) -> Result<LinkOutcome> {
    if !link.source.exists() {
        return Ok(LinkOutcome::SourceMissing);
    }
    if link_status(&link.target, &link.source) == LinkStatus::Ok {
        return Ok(LinkOutcome::AlreadyLinked);
    }
    if dry_run {
        return Ok(LinkOutcome::WouldLink);
    }

    if let Some(parent) = link.target.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create parent: {}", parent.display()))?;
    }

    let mut moved = None;
    if link.target.symlink_metadata().is_ok() {
        if backup && !link.target.is_symlink() {
            let destination = backup_path(&link.target);
            std::fs::rename(&link.target, &destination).with_context(|| {
                format!(
                    "back up {} to {}",
                    link.target.display(),
                    destination.display()
                )
            })?;
            moved = Some(destination);
        } else {
            remove_entry(&link.target)
                .with_context(|| format!("remove existing: {}", link.target.display()))?;
        }
    }

    create_symlink(&link.source, &link.target)
        .with_context(|| format!("create link: {}", link.target.display()))?;
    Ok(LinkOutcome::Created { backup: moved })
}

/// First free `<name>.bak`, `<name>.bak.1`, ... next to `target`.
fn backup_path(target: &Path) -> PathBuf {
    let name = target
        .file_name()
        .map_or_else(|| OsString::from("dotfile"), std::ffi::OsStr::to_os_string);
    let candidate = |n: usize| {
        let mut file = name.clone();
        file.push(format!(".{BACKUP_SUFFIX}"));
        if n > 0 {
            file.push(format!(".{n}"));
        }
        target.with_file_name(file)
    };
    (0..usize::MAX)
        .map(&candidate)
        .find(|p| p.symlink_metadata().is_err())
        .unwrap_or_else(|| candidate(0))
}

#[cfg(unix)]
fn create_symlink(source: &Path, link: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(source, link)
}

#[cfg(windows)]
fn create_symlink(source: &Path, link: &Path) -> std::io::Result<()> {
    if source.is_dir() {
        std::os::windows::fs::symlink_dir(source, link)
    } else {
        std::os::windows::fs::symlink_file(source, link)
    }
}

/// Link every entry in `links`, logging and recording each result.
///
/// Returns `false` if any link could not be created. Missing sources are
/// skipped with a warning.
pub fn install_links(links: &[Link], backup: bool, dry_run: bool, log: &dyn Log) -> bool {
    let mut ok = true;
    let (mut changed, mut already, mut skipped) = (0_usize, 0_usize, 0_usize);

    for link in links {
        match apply(link, backup, dry_run) {
            Ok(LinkOutcome::Created { backup: moved }) => {
                if let Some(moved) = moved {
                    log.info(&format!(
                        "moved existing {} to {}",
                        link.target.display(),
                        moved.display()
                    ));
                }
                log.debug(&format!(
                    "linked {} -> {}",
                    link.target.display(),
                    link.source.display()
                ));
                log.record_task(&link.name, TaskStatus::Ok, None);
                changed += 1;
            }
            Ok(LinkOutcome::AlreadyLinked) => {
                log.debug(&format!("ok: {} (already linked)", link.target.display()));
                log.record_task(&link.name, TaskStatus::AlreadyInstalled, None);
                already += 1;
            }
            Ok(LinkOutcome::WouldLink) => {
                log.dry_run(&format!(
                    "would link {} -> {}",
                    link.target.display(),
                    link.source.display()
                ));
                log.record_task(&link.name, TaskStatus::DryRun, None);
                changed += 1;
            }
            Ok(LinkOutcome::SourceMissing) => {
                log.warn(&format!(
                    "source missing, skipping: {}",
                    link.source.display()
                ));
                skipped += 1;
            }
            Err(e) => {
                log.error(&format!("failed to link {}: {e:#}", link.name));
                log.record_task(&link.name, TaskStatus::Failed, Some(&format!("{e:#}")));
                ok = false;
            }
        }
    }

    let verb = if dry_run { "would change" } else { "changed" };
    log.info(&format!(
        "{changed} {verb}, {already} already ok, {skipped} skipped"
    ));
    ok
}
