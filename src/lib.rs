//! Dotfiles provisioner with staged shell initialization.
//!
//! Reads a single `dot.toml`, installs the tools it declares in dependency
//! order, and generates shell startup code for bash, zsh and fish.
//!
//! The public API is organised into these layers:
//!
//! - **[`config`]**: parse `dot.toml` into typed descriptors
//! - **[`exec`]**: run shell commands singly or in bounded parallel batches
//! - **[`provision`]**: order provisioners, gate on requirements, install
//!   and publish new `PATH` entries
//! - **[`shell`]**: render staged, guarded shell initialization code
//! - **[`home`]**: dotfile symlinks and home directory cleanup
//! - **[`commands`]**: top-level subcommand orchestration (`install`,
//!   `provision`, `shell`, `status`, `cleanup`, `version`)
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod exec;
pub mod home;
pub mod logging;
pub mod platform;
pub mod provision;
pub mod shell;
pub mod status;
