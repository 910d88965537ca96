//! Command: print staged shell initialization code.
use std::io::Write as _;

use anyhow::Result;

use crate::cli::{GlobalOpts, ShellOpts};
use crate::config::Config;
use crate::logging::Log;
use crate::platform::home_dir;
use crate::shell;

/// Run the shell command, writing the generated code to stdout.
///
/// Only the configuration is loaded; no platform probes run, since this is
/// evaluated on every shell start.
///
/// # Errors
///
/// Returns an error if the home directory cannot be determined, the
/// configuration fails to parse, or stdout is closed.
pub fn run(global: &GlobalOpts, opts: &ShellOpts, log: &dyn Log) -> Result<()> {
    let home = home_dir()?;
    let config = Config::load(&global.config, &home, log)?;
    let text = render(&config, opts);
    let mut out = std::io::stdout().lock();
    writeln!(out, "{text}")?;
    out.flush()?;
    Ok(())
}

/// Generate the shell code for `opts` from `config`'s snippets.
#[must_use]
pub fn render(config: &Config, opts: &ShellOpts) -> String {
    shell::generate(opts.dialect.dialect(), &config.snippets, opts.stage)
}
