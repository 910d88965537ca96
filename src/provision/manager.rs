//! The sequential provisioning loop.
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::config::provisioners::{Category, Provisioner};
use crate::error::ProvisionError;
use crate::exec::{CommandEngine, Executor, RunOptions};
use crate::logging::{Log, TaskStatus};

use super::install::{self, InstallContext};
use super::{Environment, Resolver, paths};

/// Drives provisioners through verify, gate, install and PATH publication.
///
/// Provisioners run strictly one after another: each one may add
/// directories to the environment snapshot that the next one's verify or
/// install command relies on.
pub struct Manager {
    resolver: Resolver,
    engine: CommandEngine,
    executor: Arc<dyn Executor>,
    package_manager: Option<String>,
    home: PathBuf,
    log: Arc<dyn Log>,
}

impl std::fmt::Debug for Manager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Manager")
            .field("resolver", &self.resolver)
            .field("engine", &self.engine)
            .field("executor", &"<dyn Executor>")
            .field("package_manager", &self.package_manager)
            .field("home", &self.home)
            .field("log", &"<dyn Log>")
            .finish()
    }
}

impl Manager {
    /// Create a manager.
    ///
    /// `executor` answers search-path probes for the requirement gate;
    /// `package_manager` is the name of the active system package manager.
    #[must_use]
    pub fn new(
        resolver: Resolver,
        engine: CommandEngine,
        executor: Arc<dyn Executor>,
        package_manager: Option<String>,
        home: &Path,
        log: Arc<dyn Log>,
    ) -> Self {
        Self {
            resolver,
            engine,
            executor,
            package_manager,
            home: home.to_path_buf(),
            log,
        }
    }

    /// The resolver over this manager's provisioners.
    #[must_use]
    pub const fn resolver(&self) -> &Resolver {
        &self.resolver
    }

    /// Provision every provisioner (or those of `category`) in install order.
    ///
    /// Returns name to success for each attempted provisioner. Failures are
    /// logged and recorded, never propagated. With `dry_run` no command is
    /// spawned and every entry reports success; problems a real run would
    /// hit are logged as warnings.
    pub fn provision_all(&self, category: Option<Category>, dry_run: bool) -> BTreeMap<String, bool> {
        let engine = self.engine.with_dry_run(dry_run || self.engine.is_dry_run());
        let mut env = Environment::from_process();
        let mut results = BTreeMap::new();

        let selected = self
            .resolver
            .install_order()
            .into_iter()
            .filter_map(|name| self.resolver.get(name))
            .filter(|p| category.is_none_or(|c| p.category == c));

        for provisioner in selected {
            let ok = self.provision_one(provisioner, &engine, &mut env);
            results.insert(provisioner.name.clone(), ok);
        }
        results
    }

    fn provision_one(&self, p: &Provisioner, engine: &CommandEngine, env: &mut Environment) -> bool {
        let dry_run = engine.is_dry_run();

        if verify(engine, p, Some(&*env)) {
            self.log.info(&format!("{} already installed", p.name));
            if dry_run {
                self.log.record_task(&p.name, TaskStatus::DryRun, Some("already installed"));
            } else {
                self.log.record_task(&p.name, TaskStatus::AlreadyInstalled, None);
                self.publish_paths(p, env);
            }
            return true;
        }

        let check = self.resolver.check_requirements(p, self.executor.as_ref());
        if !check.is_satisfied() {
            let err = ProvisionError::UnmetRequirement {
                missing: check.missing,
            };
            return self.fail(p, &err, dry_run);
        }

        if p.description.is_empty() {
            self.log.info(&format!("installing {}", p.name));
        } else {
            self.log.info(&format!("installing {}: {}", p.name, p.description));
        }

        let ctx = InstallContext {
            engine,
            env: &*env,
            log: self.log.as_ref(),
            package_manager: self.package_manager.as_deref(),
        };
        match install::install(p, &ctx) {
            Ok(()) if dry_run => {
                self.log.record_task(&p.name, TaskStatus::DryRun, None);
                true
            }
            Ok(()) => {
                self.log.info(&format!("{} installed successfully", p.name));
                self.log.record_task(&p.name, TaskStatus::Ok, None);
                self.publish_paths(p, env);
                true
            }
            Err(e) => self.fail(p, &e, dry_run),
        }
    }

    /// Report a failure; in dry runs it is only a warning and counts as success.
    fn fail(&self, p: &Provisioner, err: &ProvisionError, dry_run: bool) -> bool {
        let message = err.to_string();
        if dry_run {
            self.log.warn(&format!("{} would fail: {message}", p.name));
            self.log.record_task(&p.name, TaskStatus::DryRun, Some(&message));
            true
        } else {
            self.log.error(&format!("{} {message}", p.name));
            self.log.record_task(&p.name, TaskStatus::Failed, Some(&message));
            false
        }
    }

    fn publish_paths(&self, p: &Provisioner, env: &mut Environment) {
        for dir in self.detect_path_additions(p) {
            if env.prepend_path(&dir) {
                self.log
                    .debug(&format!("added {} to PATH for subsequent installs", dir.display()));
            }
        }
    }

    /// Install state of every provisioner, probing verify commands as one
    /// batch with at most `max_concurrent` running at once.
    ///
    /// Verify commands run against the process environment. Provisioners
    /// without a verify command report `false` and spawn nothing.
    #[must_use]
    pub fn installed_states(&self, max_concurrent: usize) -> BTreeMap<String, bool> {
        let mut states: BTreeMap<String, bool> = self
            .resolver
            .provisioners()
            .iter()
            .map(|p| (p.name.clone(), false))
            .collect();

        let (names, commands): (Vec<&str>, Vec<&str>) = self
            .resolver
            .provisioners()
            .iter()
            .filter(|p| !p.verify_command.trim().is_empty())
            .map(|p| (p.name.as_str(), p.verify_command.as_str()))
            .unzip();

        let results = self.engine.run_many(&commands, max_concurrent, false);
        for (name, result) in names.into_iter().zip(results) {
            states.insert(name.to_string(), result.success);
        }
        states
    }

    /// Existing conventional install directories of the tools `p` provides.
    #[must_use]
    pub fn detect_path_additions(&self, p: &Provisioner) -> Vec<PathBuf> {
        paths::detect_path_additions(&p.provides, &self.home)
    }
}

fn verify(engine: &CommandEngine, p: &Provisioner, env: Option<&Environment>) -> bool {
    if p.verify_command.trim().is_empty() {
        return false;
    }
    let mut opts = RunOptions::captured();
    if let Some(env) = env {
        opts = opts.with_env(env.vars());
    }
    engine
        .run(&p.verify_command, &opts)
        .is_ok_and(|result| result.success)
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use crate::config::provisioners::InstallMethod;
    use crate::exec::MockExecutor;
    use crate::exec::test_helpers::ScriptedExecutor;
    use crate::logging::test_helpers::RecordingLog;

    fn prov(name: &str, priority: i64) -> Provisioner {
        Provisioner {
            priority,
            install_script: Some(format!("install-{name}")),
            ..Provisioner::new(name)
        }
    }

    fn tools(list: &[&str]) -> std::collections::BTreeSet<String> {
        list.iter().map(|t| (*t).to_string()).collect()
    }

    struct Harness {
        executor: Arc<ScriptedExecutor>,
        log: Arc<RecordingLog>,
        manager: Manager,
        _home: tempfile::TempDir,
    }

    fn harness(provisioners: Vec<Provisioner>, executor: ScriptedExecutor) -> Harness {
        harness_with(provisioners, executor, None, tempfile::tempdir().unwrap())
    }

    fn harness_with(
        provisioners: Vec<Provisioner>,
        executor: ScriptedExecutor,
        package_manager: Option<&str>,
        home: tempfile::TempDir,
    ) -> Harness {
        let executor = Arc::new(executor);
        let log = Arc::new(RecordingLog::new());
        let resolver = Resolver::new(provisioners, log.as_ref());
        let engine = CommandEngine::new(executor.clone(), log.clone(), false);
        let manager = Manager::new(
            resolver,
            engine,
            executor.clone(),
            package_manager.map(str::to_string),
            home.path(),
            log.clone(),
        );
        Harness {
            executor,
            log,
            manager,
            _home: home,
        }
    }

    // ------------------------------------------------------------------
    // Ordering and filtering
    // ------------------------------------------------------------------

    #[test]
    fn installs_in_priority_order() {
        let h = harness(vec![prov("b", 3), prov("a", 1), prov("c", 2)], ScriptedExecutor::new());
        let results = h.manager.provision_all(None, false);
        assert!(results.values().all(|ok| *ok));
        assert_eq!(h.executor.commands(), vec!["install-a", "install-c", "install-b"]);
    }

    #[test]
    fn category_filter_keeps_matching_only() {
        let enhancement = Provisioner {
            category: Category::Enhancement,
            ..prov("starship", 1)
        };
        let h = harness(vec![enhancement, prov("rust", 2)], ScriptedExecutor::new());
        let results = h.manager.provision_all(Some(Category::Enhancement), false);
        assert_eq!(results.keys().collect::<Vec<_>>(), vec!["starship"]);
        assert_eq!(h.executor.commands(), vec!["install-starship"]);
    }

    // ------------------------------------------------------------------
    // Verify / gate / install
    // ------------------------------------------------------------------

    #[test]
    fn verified_provisioner_is_not_reinstalled() {
        let p = Provisioner {
            verify_command: "rg --version".to_string(),
            ..prov("ripgrep", 1)
        };
        let h = harness(vec![p], ScriptedExecutor::new().succeed("rg --version", "ripgrep 14"));
        let results = h.manager.provision_all(None, false);
        assert!(results["ripgrep"]);
        assert_eq!(h.executor.commands(), vec!["rg --version"]);
        assert_eq!(h.log.tasks()[0].1, TaskStatus::AlreadyInstalled);
    }

    #[test]
    fn failing_verify_falls_through_to_install() {
        let p = Provisioner {
            verify_command: "fd --version".to_string(),
            ..prov("fd", 1)
        };
        let h = harness(vec![p], ScriptedExecutor::new().fail("fd --version", "not found"));
        h.manager.provision_all(None, false);
        assert_eq!(h.executor.commands(), vec!["fd --version", "install-fd"]);
    }

    #[test]
    fn unmet_requirement_records_failure_and_continues() {
        let blocked = Provisioner {
            requires: tools(&["zig"]),
            ..prov("zls", 1)
        };
        let h = harness(vec![blocked, prov("after", 2)], ScriptedExecutor::new());
        let results = h.manager.provision_all(None, false);
        assert!(!results["zls"]);
        assert!(results["after"]);
        assert_eq!(h.executor.commands(), vec!["install-after"]);
        assert!(h.log.contains("error: zls missing requirements: zig"));
        assert_eq!(h.log.tasks()[0].1, TaskStatus::Failed);
    }

    #[test]
    fn install_failure_records_failure_and_continues() {
        let h = harness(
            vec![prov("broken", 1), prov("fine", 2)],
            ScriptedExecutor::new().fail("install-broken", "boom"),
        );
        let results = h.manager.provision_all(None, false);
        assert!(!results["broken"]);
        assert!(results["fine"]);
    }

    #[test]
    fn package_method_uses_manager_context() {
        let p = Provisioner {
            method: InstallMethod::Package,
            ..Provisioner::new("jq")
        };
        let h = harness_with(
            vec![p],
            ScriptedExecutor::new(),
            Some("pacman"),
            tempfile::tempdir().unwrap(),
        );
        h.manager.provision_all(None, false);
        assert_eq!(h.executor.commands(), vec!["sudo pacman -S --noconfirm jq"]);
    }

    /// A (1, provides cc), B (3, requires curl), C (4, requires cargo + cc):
    /// C's requirement on `cc` is satisfied by A's declaration alone.
    #[test]
    fn provider_declaration_satisfies_later_requirement() {
        let a = Provisioner {
            provides: tools(&["cc"]),
            ..prov("a", 1)
        };
        let b = Provisioner {
            requires: tools(&["curl"]),
            ..prov("b", 3)
        };
        let c = Provisioner {
            requires: tools(&["cargo", "cc"]),
            ..prov("c", 4)
        };
        let h = harness(
            vec![c, b, a],
            ScriptedExecutor::new().with_on_path(&["curl", "cargo"]),
        );
        assert_eq!(h.manager.resolver().install_order(), vec!["a", "b", "c"]);
        let results = h.manager.provision_all(None, false);
        assert!(results.values().all(|ok| *ok));
        assert_eq!(h.executor.commands(), vec!["install-a", "install-b", "install-c"]);
    }

    // ------------------------------------------------------------------
    // PATH threading
    // ------------------------------------------------------------------

    #[test]
    fn installed_tool_dirs_reach_later_commands() {
        let home = tempfile::tempdir().unwrap();
        let cargo_bin = home.path().join(".cargo/bin");
        std::fs::create_dir_all(&cargo_bin).unwrap();

        let rust = Provisioner {
            provides: tools(&["cargo"]),
            ..prov("rust", 1)
        };
        let h = harness_with(
            vec![rust, prov("ripgrep", 2)],
            ScriptedExecutor::new(),
            None,
            home,
        );
        h.manager.provision_all(None, false);

        let seen = h.executor.paths_seen();
        let rust_path = seen[0].1.clone().unwrap_or_default();
        let rg_path = seen[1].1.clone().unwrap();
        assert!(!rust_path.starts_with(&*cargo_bin.to_string_lossy()));
        assert!(
            rg_path.starts_with(&*cargo_bin.to_string_lossy()),
            "ripgrep install should see ~/.cargo/bin first, got {rg_path}"
        );
    }

    #[test]
    fn already_installed_tool_still_publishes_paths() {
        let home = tempfile::tempdir().unwrap();
        let go_bin = home.path().join("go/bin");
        std::fs::create_dir_all(&go_bin).unwrap();

        let go = Provisioner {
            provides: tools(&["go"]),
            verify_command: "go version".to_string(),
            ..prov("go", 1)
        };
        let h = harness_with(vec![go, prov("gopls", 2)], ScriptedExecutor::new(), None, home);
        h.manager.provision_all(None, false);

        let seen = h.executor.paths_seen();
        assert_eq!(seen[1].0, "install-gopls");
        assert!(seen[1].1.as_deref().unwrap().starts_with(&*go_bin.to_string_lossy()));
    }

    #[test]
    fn failed_install_publishes_nothing() {
        let home = tempfile::tempdir().unwrap();
        let cargo_bin = home.path().join(".cargo/bin");
        std::fs::create_dir_all(&cargo_bin).unwrap();
        let rust = Provisioner {
            provides: tools(&["cargo"]),
            ..prov("rust", 1)
        };
        let h = harness_with(
            vec![rust, prov("next", 2)],
            ScriptedExecutor::new().fail("install-rust", "x"),
            None,
            home,
        );
        h.manager.provision_all(None, false);
        let seen = h.executor.paths_seen();
        assert!(!seen[1].1.as_deref().unwrap_or("").starts_with(&*cargo_bin.to_string_lossy()));
    }

    // ------------------------------------------------------------------
    // Dry run
    // ------------------------------------------------------------------

    #[test]
    fn dry_run_spawns_nothing_and_reports_success() {
        let mut mock = MockExecutor::new();
        mock.expect_execute().never();
        mock.expect_which().returning(|_| false);
        let log = Arc::new(RecordingLog::new());
        let executor: Arc<dyn Executor> = Arc::new(mock);
        let blocked = Provisioner {
            requires: tools(&["zig"]),
            ..prov("zls", 2)
        };
        let no_payload = Provisioner::new("empty");
        let verified = Provisioner {
            verify_command: "x --version".to_string(),
            ..prov("x", 1)
        };
        let resolver = Resolver::new(vec![blocked, no_payload, verified, prov("plain", 3)], log.as_ref());
        let engine = CommandEngine::new(executor.clone(), log.clone(), false);
        let home = tempfile::tempdir().unwrap();
        let manager = Manager::new(resolver, engine, executor, None, home.path(), log.clone());

        let results = manager.provision_all(None, true);

        assert_eq!(results.len(), 4);
        assert!(results.values().all(|ok| *ok));
        assert!(log.tasks().iter().all(|t| t.1 == TaskStatus::DryRun));
        assert!(log.contains("warn: zls would fail: missing requirements: zig"));
    }

    // ------------------------------------------------------------------
    // Installed state
    // ------------------------------------------------------------------

    #[test]
    fn installed_states_probe_only_verifiable_provisioners() {
        let rg = Provisioner {
            verify_command: "rg --version".to_string(),
            ..prov("ripgrep", 1)
        };
        let fd = Provisioner {
            verify_command: "fd --version".to_string(),
            ..prov("fd", 1)
        };
        let h = harness(
            vec![rg, fd, Provisioner::new("plain")],
            ScriptedExecutor::new().fail("fd --version", "not found"),
        );

        let states = h.manager.installed_states(4);

        assert_eq!(states.len(), 3);
        assert!(states["ripgrep"]);
        assert!(!states["fd"]);
        assert!(!states["plain"]);
        let mut commands = h.executor.commands();
        commands.sort();
        assert_eq!(commands, vec!["fd --version", "rg --version"]);
    }
}
