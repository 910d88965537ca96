//! `dot` binary entry point.
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;

use dot_provision::cli::{Cli, Command};
use dot_provision::commands;
use dot_provision::logging::{self, Log, Logger};

/// Exit status after Ctrl-C, matching shells (128 + SIGINT).
const EXIT_SIGINT: i32 = 130;

fn main() -> ExitCode {
    let _ = enable_ansi_support::enable_ansi_support();
    let args = Cli::parse();

    let command = args.command.name();
    logging::init_subscriber(args.verbose, args.command.writes_stdout(), command);
    let log = Arc::new(Logger::new(command));

    if let Err(e) = ctrlc::set_handler(|| std::process::exit(EXIT_SIGINT)) {
        log.debug(&format!("could not install Ctrl-C handler: {e}"));
    }

    let shared: Arc<dyn Log> = Arc::<Logger>::clone(&log);
    let result = match &args.command {
        Command::Install => commands::install::run(&args.global, &log),
        Command::Provision(opts) => commands::provision::run(&args.global, opts, &log),
        Command::Shell(opts) => commands::shell::run(&args.global, opts, shared.as_ref()),
        Command::Status => commands::status::run(&args.global, shared),
        Command::Cleanup(opts) => commands::cleanup::run(&args.global, opts, shared),
        Command::Version => commands::version::run(),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log.error(&format!("{e:#}"));
            ExitCode::FAILURE
        }
    }
}
