//! Foundation system packages from `[packages.<manager>]`.
use std::collections::BTreeMap;

use crate::exec::{CommandEngine, RunOptions};
use crate::logging::{Log, TaskStatus};

use super::package::{PackageManager, parse_installed};

/// How many package names to show when listing what will be installed.
const PREVIEW_LIMIT: usize = 5;

/// Ensure the configured packages for `manager` are installed.
///
/// Managers that can be queried (apt, brew) only install what is missing;
/// the others are handed the full list. Returns `false` only when an
/// install command fails or the manager is not supported.
pub fn install_system_packages(
    engine: &CommandEngine,
    manager: Option<&str>,
    packages: &BTreeMap<String, Vec<String>>,
    log: &dyn Log,
) -> bool {
    let Some((name, wanted)) = manager.and_then(|m| packages.get_key_value(m)) else {
        log.debug(&format!(
            "no packages configured for {} package manager",
            manager.unwrap_or("unknown")
        ));
        return true;
    };
    let task = format!("system packages ({name})");
    if wanted.is_empty() {
        log.debug(&format!("no base packages configured for {name}"));
        return true;
    }

    log.info(&format!("ensuring {} {name} packages are installed", wanted.len()));
    if engine.is_dry_run() {
        log.dry_run(&format!("would check/install packages: {}", wanted.join(", ")));
        log.record_task(&task, TaskStatus::DryRun, None);
        return true;
    }

    let pm = match name.parse::<PackageManager>() {
        Ok(pm) => pm,
        Err(e) => {
            log.error(&e.to_string());
            log.record_task(&task, TaskStatus::Failed, Some(&e.to_string()));
            return false;
        }
    };

    let wanted: Vec<&str> = wanted.iter().map(String::as_str).collect();
    let to_install = match pm.installed_query(&wanted) {
        Some(query) => {
            log.debug(&format!("checking installed {pm} packages"));
            let installed = engine
                .run(&query, &RunOptions::captured())
                .map(|r| parse_installed(&r.stdout))
                .unwrap_or_default();
            wanted
                .iter()
                .copied()
                .filter(|p| !installed.contains(*p))
                .collect()
        }
        None => wanted.clone(),
    };

    if to_install.is_empty() {
        log.info(&format!("all {} {pm} packages are already installed", wanted.len()));
        log.record_task(&task, TaskStatus::AlreadyInstalled, None);
        return true;
    }

    let preview = to_install
        .iter()
        .take(PREVIEW_LIMIT)
        .copied()
        .collect::<Vec<_>>()
        .join(", ");
    let more = if to_install.len() > PREVIEW_LIMIT { "..." } else { "" };
    log.info(&format!(
        "installing {} {pm} packages: {preview}{more}",
        to_install.len()
    ));

    let command = pm.batch_install_command(&to_install);
    match engine.run(&command, &RunOptions::captured()) {
        Ok(result) if result.success => {
            log.record_task(&task, TaskStatus::Ok, None);
            true
        }
        Ok(result) => {
            log.error(&format!("failed to install {pm} packages"));
            let stderr = result.stderr.trim();
            if !stderr.is_empty() {
                log.error(&format!("error output:\n{stderr}"));
            }
            log.record_task(&task, TaskStatus::Failed, Some(&format!("exit {}", result.code)));
            false
        }
        Err(e) => {
            log.error(&format!("failed to install {pm} packages: {e}"));
            log.record_task(&task, TaskStatus::Failed, Some(&e.to_string()));
            false
        }
    }
}
