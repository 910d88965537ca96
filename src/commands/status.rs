//! Command: print the status report as JSON.
use std::io::Write as _;
use std::sync::Arc;

use anyhow::Result;

use crate::cli::GlobalOpts;
use crate::logging::Log;
use crate::status::{self, StatusReport};

use super::CommandSetup;

/// Run the status command.
///
/// # Errors
///
/// Returns an error if configuration loading or serialization fails.
pub fn run(global: &GlobalOpts, log: Arc<dyn Log>) -> Result<()> {
    let setup = CommandSetup::init(global, log)?;
    let json = serde_json::to_string_pretty(&report(&setup))?;
    let mut out = std::io::stdout().lock();
    writeln!(out, "{json}")?;
    Ok(())
}

/// Build the report. Verify commands are read-only probes, so they always
/// run for real.
#[must_use]
pub fn report(setup: &CommandSetup) -> StatusReport {
    setup.log().stage("Checking status");
    status::collect(
        &setup.platform,
        setup.package_manager.clone(),
        &setup.config,
        &setup.manager(false),
    )
}
