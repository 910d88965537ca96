//! Command: print version information.
use std::io::Write as _;

use anyhow::Result;

/// The release version, or the crate version for local builds.
#[must_use]
pub fn version() -> &'static str {
    option_env!("DOT_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"))
}

/// Print the version to stdout.
///
/// # Errors
///
/// Returns an error if stdout is closed.
pub fn run() -> Result<()> {
    writeln!(std::io::stdout().lock(), "dot {}", version())?;
    Ok(())
}
