//! Command: install system packages and provisioners.
use std::sync::Arc;

use anyhow::Result;

use crate::cli::{GlobalOpts, ProvisionOpts};
use crate::config::provisioners::Category;
use crate::logging::{Log, Logger};
use crate::provision::system::install_system_packages;

use super::CommandSetup;

/// Run the provision command.
///
/// # Errors
///
/// Returns an error if configuration loading fails or any provisioner (or
/// the system package step) failed.
pub fn run(global: &GlobalOpts, opts: &ProvisionOpts, log: &Arc<Logger>) -> Result<()> {
    log.info(&format!("dot {}", super::version::version()));

    let shared: Arc<dyn Log> = Arc::<Logger>::clone(log);
    let setup = CommandSetup::init(global, shared)?;
    let ok = execute(&setup, opts.category, global.dry_run);

    log.print_summary();

    if !ok || log.has_failures() {
        anyhow::bail!("one or more provisioners failed");
    }
    Ok(())
}

/// Provision everything `setup` describes, optionally limited to `category`.
///
/// Foundation system packages go first when no filter or the foundation
/// filter is given; if they fail no provisioner runs. Returns `true` when
/// every step succeeded.
#[must_use]
pub fn execute(setup: &CommandSetup, category: Option<Category>, dry_run: bool) -> bool {
    let log = setup.log();

    if category.is_none_or(|c| c == Category::Foundation) {
        log.stage("Installing system packages");
        let installed = install_system_packages(
            &setup.engine(dry_run),
            setup.package_manager.as_deref(),
            &setup.config.packages,
            log.as_ref(),
        );
        if !installed {
            log.error("failed to install system packages");
            return false;
        }
    }

    match category {
        Some(c) => log.stage(&format!("Provisioning {c} tools")),
        None => log.stage("Provisioning tools"),
    }
    let results = setup.manager(dry_run).provision_all(category, dry_run);
    if results.is_empty() {
        log.info("nothing to provision");
    }

    let failed: Vec<&str> = results
        .iter()
        .filter(|(_, success)| !**success)
        .map(|(name, _)| name.as_str())
        .collect();
    if !failed.is_empty() {
        log.debug(&format!("failed: {}", failed.join(", ")));
    }

    failed.is_empty()
}
