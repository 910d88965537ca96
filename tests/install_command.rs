#![allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
//! Integration tests for the `install` command.
//!
//! These tests link `[home.files]` and `[home.dirs]` into a temporary home
//! directory and check that existing entries are replaced or backed up and
//! that a second run changes nothing.
#![cfg(unix)]

mod common;

use std::fs;
use std::sync::Arc;

use common::{FakeExecutor, IntegrationTestContext, MemoryLog};
use dot_provision::commands::{install, status};
use dot_provision::logging::TaskStatus;
use dot_provision::status::LinkStatus;

const CONFIG: &str = r#"
[config]
source = "~/dotfiles"

[home.files]
".zshrc" = "zsh/zshrc"
".config/git/config" = "git/config"

[home.dirs]
".config/nvim" = "nvim"
"#;

fn sources(ctx: &IntegrationTestContext) {
    ctx.touch("dotfiles/zsh/zshrc");
    ctx.touch("dotfiles/git/config");
    ctx.touch("dotfiles/nvim/init.lua");
}

fn run(ctx: &IntegrationTestContext, dry_run: bool) -> (bool, Arc<MemoryLog>) {
    let executor = Arc::new(FakeExecutor::new());
    let log = Arc::new(MemoryLog::default());
    let ok = install::execute(&ctx.setup(&executor, &log), dry_run);
    (ok, log)
}

#[test]
fn links_files_and_dirs_with_parents() {
    let ctx = IntegrationTestContext::with_config(CONFIG);
    sources(&ctx);

    let (ok, log) = run(&ctx, false);

    assert!(ok);
    let home = ctx.home_path();
    assert_eq!(
        fs::read_link(home.join(".zshrc")).unwrap(),
        home.join("dotfiles/zsh/zshrc")
    );
    assert_eq!(
        fs::read_link(home.join(".config/git/config")).unwrap(),
        home.join("dotfiles/git/config")
    );
    assert!(home.join(".config/nvim/init.lua").exists());
    assert_eq!(log.status_of(".config/nvim"), Some(TaskStatus::Ok));
}

#[test]
fn second_run_leaves_correct_links_alone() {
    let ctx = IntegrationTestContext::with_config(CONFIG);
    sources(&ctx);
    assert!(run(&ctx, false).0);

    let (ok, log) = run(&ctx, false);

    assert!(ok);
    assert!(
        log.tasks()
            .iter()
            .all(|(_, s)| *s == TaskStatus::AlreadyInstalled)
    );
    assert!(log.contains("0 changed, 3 already ok, 0 skipped"));
}

#[test]
fn existing_file_is_backed_up_by_default() {
    let ctx = IntegrationTestContext::with_config(CONFIG);
    sources(&ctx);
    fs::write(ctx.home_path().join(".zshrc"), "local edits").unwrap();

    assert!(run(&ctx, false).0);

    let home = ctx.home_path();
    assert!(home.join(".zshrc").is_symlink());
    assert_eq!(
        fs::read_to_string(home.join(".zshrc.bak")).unwrap(),
        "local edits"
    );
}

#[test]
fn backup_disabled_replaces_existing_file() {
    let ctx = IntegrationTestContext::with_config(&CONFIG.replace(
        "source = \"~/dotfiles\"",
        "source = \"~/dotfiles\"\nbackup = false",
    ));
    sources(&ctx);
    fs::write(ctx.home_path().join(".zshrc"), "local edits").unwrap();

    assert!(run(&ctx, false).0);

    assert!(ctx.home_path().join(".zshrc").is_symlink());
    assert!(!ctx.home_path().join(".zshrc.bak").exists());
}

#[test]
fn dry_run_creates_nothing() {
    let ctx = IntegrationTestContext::with_config(CONFIG);
    sources(&ctx);

    let (ok, log) = run(&ctx, true);

    assert!(ok);
    assert!(!ctx.home_path().join(".zshrc").exists());
    assert!(!ctx.home_path().join(".config").exists());
    assert_eq!(log.status_of(".zshrc"), Some(TaskStatus::DryRun));
}

#[test]
fn status_reports_installed_links() {
    let ctx = IntegrationTestContext::with_config(CONFIG);
    sources(&ctx);
    assert!(run(&ctx, false).0);

    let executor = Arc::new(FakeExecutor::new());
    let log = Arc::new(MemoryLog::default());
    let report = status::report(&ctx.setup(&executor, &log));

    assert_eq!(report.dotfiles[".zshrc"], LinkStatus::Ok);
    assert_eq!(report.dotfiles[".config/git/config"], LinkStatus::Ok);
}
