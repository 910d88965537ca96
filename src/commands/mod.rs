//! Top-level subcommand orchestration.
pub mod cleanup;
pub mod install;
pub mod provision;
pub mod shell;
pub mod status;
pub mod version;

use std::path::Path;
use std::sync::Arc;

use anyhow::Result;

use crate::cli::GlobalOpts;
use crate::config::Config;
use crate::exec::{CommandEngine, Executor, SystemExecutor};
use crate::logging::Log;
use crate::platform::Platform;
use crate::provision::{Manager, Resolver};

/// Shared state produced by the common command setup sequence.
///
/// Encapsulates platform detection and configuration loading so that each
/// command does not have to repeat the boilerplate.
pub struct CommandSetup {
    /// Detected (or injected) platform.
    pub platform: Platform,
    /// Loaded configuration.
    pub config: Config,
    /// Package manager to drive: the configured override, else the detected one.
    pub package_manager: Option<String>,
    executor: Arc<dyn Executor>,
    log: Arc<dyn Log>,
}

impl std::fmt::Debug for CommandSetup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommandSetup")
            .field("platform", &self.platform)
            .field("config", &self.config)
            .field("package_manager", &self.package_manager)
            .field("executor", &"<dyn Executor>")
            .field("log", &"<dyn Log>")
            .finish()
    }
}

impl CommandSetup {
    /// Detect the platform and load the configuration named by `global`.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined or the
    /// configuration file fails to parse.
    pub fn init(global: &GlobalOpts, log: Arc<dyn Log>) -> Result<Self> {
        let executor: Arc<dyn Executor> = Arc::new(SystemExecutor);
        let platform = Platform::detect(executor.as_ref())?;
        log.debug(&format!(
            "platform: {} (distro: {}, wsl: {})",
            platform.os,
            platform.distro.as_deref().unwrap_or("none"),
            platform.is_wsl
        ));
        Self::with_platform(&global.config, platform, executor, log)
    }

    /// Load the configuration at `config_path` for an already known
    /// platform, running commands through `executor`.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration file fails to parse.
    pub fn with_platform(
        config_path: &Path,
        platform: Platform,
        executor: Arc<dyn Executor>,
        log: Arc<dyn Log>,
    ) -> Result<Self> {
        log.stage("Loading configuration");
        let config = Config::load(config_path, &platform.home, log.as_ref())?;
        log.debug(&format!("{} provisioners", config.provisioners.len()));
        log.debug(&format!("{} shell snippets", config.snippets.len()));
        log.debug(&format!(
            "{} managed files, {} managed directories",
            config.files.len(),
            config.dirs.len()
        ));

        let package_manager = config.package_manager_or(platform.package_manager.as_deref());
        match &package_manager {
            Some(pm) => log.info(&format!("package manager: {pm}")),
            None => log.warn("no supported package manager detected"),
        }

        Ok(Self {
            platform,
            config,
            package_manager,
            executor,
            log,
        })
    }

    /// The logger every component of this invocation shares.
    #[must_use]
    pub const fn log(&self) -> &Arc<dyn Log> {
        &self.log
    }

    /// A command engine over this setup's executor.
    #[must_use]
    pub fn engine(&self, dry_run: bool) -> CommandEngine {
        CommandEngine::new(Arc::clone(&self.executor), Arc::clone(&self.log), dry_run)
    }

    /// A lifecycle manager over the configured provisioners.
    #[must_use]
    pub fn manager(&self, dry_run: bool) -> Manager {
        let resolver = Resolver::new(self.config.provisioners.clone(), self.log.as_ref());
        Manager::new(
            resolver,
            self.engine(dry_run),
            Arc::clone(&self.executor),
            self.package_manager.clone(),
            &self.platform.home,
            Arc::clone(&self.log),
        )
    }
}
