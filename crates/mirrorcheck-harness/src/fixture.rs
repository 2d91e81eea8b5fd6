//! Suite- and scenario-scoped fixtures.
//!
//! A [`SuiteFixture`] is built once per run and passed by reference to
//! every scenario. Each scenario gets its own [`ScenarioFixture`]: a fresh
//! registry and work dir, set up before and torn down after it.

use std::path::Path;

use mirrorcheck_common::config::HarnessConfig;
use mirrorcheck_registry::{OutputSink, RegistryOptions, RegistryProcess};
use mirrorcheck_runner::CommandRunner;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::Result;
use crate::workdir::WorkDir;

/// State shared by every scenario of a run.
#[derive(Debug)]
pub struct SuiteFixture {
    config: HarnessConfig,
    runner: CommandRunner,
    token: CancellationToken,
    deadline: JoinHandle<()>,
}

impl SuiteFixture {
    /// Builds the runner from `config` and arms the suite deadline.
    ///
    /// Must be called from within a Tokio runtime.
    #[must_use]
    pub fn new(config: HarnessConfig) -> Self {
        let runner = CommandRunner::new(&config.binary).with_env(config.runner_env());
        let token = CancellationToken::new();

        let timeout = config.suite_timeout;
        let expiry = token.clone();
        let deadline = tokio::spawn(async move {
            tokio::select! {
                () = tokio::time::sleep(timeout) => {
                    tracing::warn!(?timeout, "suite deadline reached, cancelling");
                    expiry.cancel();
                }
                () = expiry.cancelled() => {}
            }
        });

        tracing::info!(
            binary = %config.binary.display(),
            artifacts = %config.artifacts_dir.display(),
            "suite fixture ready"
        );
        Self {
            config,
            runner,
            token,
            deadline,
        }
    }

    /// Resolved configuration.
    #[must_use]
    pub const fn config(&self) -> &HarnessConfig {
        &self.config
    }

    /// Runner for the mirroring binary.
    #[must_use]
    pub const fn runner(&self) -> &CommandRunner {
        &self.runner
    }

    /// Suite-wide cancellation token; cancelled at the deadline or when
    /// the fixture is dropped.
    #[must_use]
    pub const fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Registry options derived from the configuration.
    #[must_use]
    pub fn registry_options(&self) -> RegistryOptions {
        RegistryOptions::new(&self.config.registry_config, self.config.registry_port)
            .binary(&self.config.registry_binary)
            .host(&self.config.registry_host)
            .storage_dir(&self.config.storage_dir)
            .sink(OutputSink::Discard)
    }
}

impl Drop for SuiteFixture {
    fn drop(&mut self) {
        self.token.cancel();
        self.deadline.abort();
    }
}

/// Per-scenario resources: a ready registry and a seeded work dir.
#[derive(Debug)]
pub struct ScenarioFixture {
    registry: RegistryProcess,
    work_dir: WorkDir,
}

impl ScenarioFixture {
    /// Starts a registry, waits for it, and creates a work dir.
    ///
    /// A registry that fails to become ready is stopped before returning.
    ///
    /// # Errors
    ///
    /// Returns the registry start or readiness error, or the work-dir
    /// setup error.
    pub async fn set_up(suite: &SuiteFixture) -> Result<Self> {
        let mut registry = RegistryProcess::start_with(suite.token(), suite.registry_options())?;
        if let Err(e) = registry.wait_ready(suite.config().ready_timeout).await {
            if let Err(stop) = registry.stop().await {
                tracing::warn!(error = %stop, "failed to stop registry after readiness failure");
            }
            return Err(e.into());
        }

        let work_dir = match WorkDir::create(&suite.config().keys_dir) {
            Ok(dir) => dir,
            Err(e) => {
                if let Err(stop) = registry.stop().await {
                    tracing::warn!(error = %stop, "failed to stop registry after work-dir failure");
                }
                return Err(e);
            }
        };

        Ok(Self { registry, work_dir })
    }

    /// The scenario's registry.
    #[must_use]
    pub const fn registry(&self) -> &RegistryProcess {
        &self.registry
    }

    /// Root of the scenario's work dir.
    #[must_use]
    pub fn work_dir(&self) -> &Path {
        self.work_dir.path()
    }

    /// Stops the registry and removes the work dir. Both are attempted even
    /// if the first fails; the registry error is reported first.
    ///
    /// # Errors
    ///
    /// Returns the registry stop error or the work-dir removal error.
    pub async fn tear_down(self) -> Result<()> {
        let Self {
            mut registry,
            work_dir,
        } = self;
        let stopped = registry.stop().await;
        let removed = work_dir.close();
        stopped?;
        removed
    }
}
