//! Command: remove unwanted files from the home directory.
use std::sync::Arc;

use anyhow::Result;

use crate::cli::{CleanupOpts, GlobalOpts};
use crate::home::cleanup::cleanup;
use crate::logging::Log;

use super::CommandSetup;

/// Run the cleanup command.
///
/// # Errors
///
/// Returns an error if configuration loading fails, a pattern is invalid,
/// or a match could not be removed.
pub fn run(global: &GlobalOpts, opts: &CleanupOpts, log: Arc<dyn Log>) -> Result<()> {
    let setup = CommandSetup::init(global, log)?;
    if !execute(&setup, &opts.patterns, global.dry_run) {
        anyhow::bail!("cleanup failed");
    }
    Ok(())
}

/// Remove matches of `patterns`, or of the configured patterns when none
/// are given.
#[must_use]
pub fn execute(setup: &CommandSetup, patterns: &[String], dry_run: bool) -> bool {
    let patterns = if patterns.is_empty() {
        &setup.config.cleanup
    } else {
        patterns
    };
    setup.log().stage("Cleaning up home directory");
    cleanup(&setup.platform.home, patterns, dry_run, setup.log().as_ref())
}
