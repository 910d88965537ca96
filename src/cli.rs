//! Command-line interface definitions.
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::config::provisioners::Category;
use crate::shell::{Dialect, ShellStage};

/// Top-level CLI entry point for the dotfiles provisioner.
#[derive(Parser, Debug)]
#[command(
    name = "dot",
    about = "Dotfiles provisioner with staged shell initialization",
    version
)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Options shared by every subcommand.
    #[command(flatten)]
    pub global: GlobalOpts,
}

/// Options shared across all subcommands.
#[derive(Parser, Debug, Clone)]
pub struct GlobalOpts {
    /// Preview changes without applying
    #[arg(short = 'd', long, global = true)]
    pub dry_run: bool,

    /// Path to the configuration file
    #[arg(
        short,
        long,
        global = true,
        env = "DOT_CONFIG",
        default_value = "dot.toml"
    )]
    pub config: PathBuf,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Link managed dotfiles into the home directory
    Install,
    /// Install tools in dependency order
    Provision(ProvisionOpts),
    /// Print staged shell initialization code
    Shell(ShellOpts),
    /// Print platform, provisioner and dotfile status as JSON
    Status,
    /// Remove unwanted files from the home directory
    Cleanup(CleanupOpts),
    /// Print version information
    Version,
}

impl Command {
    /// Subcommand name, used to name the log file.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Install => "install",
            Self::Provision(_) => "provision",
            Self::Shell(_) => "shell",
            Self::Status => "status",
            Self::Cleanup(_) => "cleanup",
            Self::Version => "version",
        }
    }

    /// Whether stdout carries machine-readable output that console logging
    /// must stay out of.
    #[must_use]
    pub const fn writes_stdout(&self) -> bool {
        matches!(self, Self::Shell(_) | Self::Status)
    }
}

/// Options for the `provision` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct ProvisionOpts {
    /// Only provision this category
    #[arg(long = "type", value_enum)]
    pub category: Option<Category>,
}

/// Options for the `cleanup` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct CleanupOpts {
    /// Home-relative glob patterns; replaces `[cleanup] patterns` when given
    pub patterns: Vec<String>,
}

/// Options for the `shell` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct ShellOpts {
    /// Target shell.
    #[command(flatten)]
    pub dialect: DialectFlag,

    /// Only emit this stage
    #[arg(long, value_enum)]
    pub stage: Option<ShellStage>,
}

/// Exactly one target shell.
#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct DialectFlag {
    /// Emit bash code
    #[arg(long)]
    pub bash: bool,
    /// Emit zsh code
    #[arg(long)]
    pub zsh: bool,
    /// Emit fish code
    #[arg(long)]
    pub fish: bool,
}

impl DialectFlag {
    /// The selected dialect.
    #[must_use]
    pub const fn dialect(&self) -> Dialect {
        if self.fish {
            Dialect::Fish
        } else if self.zsh {
            Dialect::Zsh
        } else {
            Dialect::Bash
        }
    }
}
