//! Command: link the managed dotfiles into the home directory.
use std::sync::Arc;

use anyhow::Result;

use crate::cli::GlobalOpts;
use crate::home::links::{install_links, planned};
use crate::logging::{Log, Logger};

use super::CommandSetup;

/// Run the install command.
///
/// # Errors
///
/// Returns an error if configuration loading fails or any link could not be
/// created.
pub fn run(global: &GlobalOpts, log: &Arc<Logger>) -> Result<()> {
    let shared: Arc<dyn Log> = Arc::<Logger>::clone(log);
    let setup = CommandSetup::init(global, shared)?;
    let ok = execute(&setup, global.dry_run);

    log.print_summary();

    if !ok {
        anyhow::bail!("one or more dotfiles could not be linked");
    }
    Ok(())
}

/// Link `[home.files]` then `[home.dirs]`. Returns `true` when every link is
/// in place (or would be, in a dry run).
#[must_use]
pub fn execute(setup: &CommandSetup, dry_run: bool) -> bool {
    let log = setup.log();
    log.stage("Installing dotfiles");
    let links = planned(&setup.config, &setup.platform.home);
    if links.is_empty() {
        log.info("no dotfiles configured");
        return true;
    }
    install_links(&links, setup.config.backup, dry_run, log.as_ref())
}
