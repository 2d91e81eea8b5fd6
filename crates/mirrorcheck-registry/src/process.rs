//! Registry subprocess lifecycle.
//!
//! The child is owned by a supervisor task that waits for either the
//! child's exit or the handle's cancellation token. Cancelling the token
//! passed to [`RegistryProcess::start`], or any of its ancestors, tears the
//! registry down.

use std::io;
use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use mirrorcheck_common::constants;
use reqwest::StatusCode;
use tokio::process::{Child, Command};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::catalog::decode_catalog;
use crate::error::{RegistryError, Result};
use crate::sink::OutputSink;
use crate::state::RegistryState;

/// How long stop waits for capture tasks to flush after the child exited.
const OUTPUT_FLUSH_GRACE: Duration = Duration::from_millis(500);

/// How the supervised child ended.
#[derive(Debug)]
enum Exit {
    /// Exited on its own.
    Exited(ExitStatus),
    /// Terminated because the token was cancelled.
    Terminated,
}

/// Settings for launching a registry.
#[derive(Debug, Clone)]
pub struct RegistryOptions {
    /// Registry binary, invoked as `<binary> serve <config>`.
    pub binary: PathBuf,
    /// Registry configuration file.
    pub config_path: PathBuf,
    /// Host the registry is reached on.
    pub host: String,
    /// Port the registry listens on, as set in its configuration.
    pub port: u16,
    /// Storage directory removed when the registry is stopped. Not derived
    /// from the configuration; must match what the configuration uses.
    pub storage_dir: PathBuf,
    /// Destination for the registry's output.
    pub sink: OutputSink,
    /// Timeout for each HTTP request.
    pub request_timeout: Duration,
    /// Interval between readiness probes.
    pub poll_interval: Duration,
    /// Time between SIGTERM and SIGKILL on stop.
    pub stop_grace: Duration,
}

impl RegistryOptions {
    /// Options for `registry serve <config_path>` on `localhost:<port>`,
    /// storing under `/tmp/docker`, with output discarded.
    #[must_use]
    pub fn new(config_path: impl Into<PathBuf>, port: u16) -> Self {
        Self {
            binary: PathBuf::from(constants::DEFAULT_REGISTRY_BINARY),
            config_path: config_path.into(),
            host: constants::DEFAULT_REGISTRY_HOST.to_string(),
            port,
            storage_dir: PathBuf::from(constants::DEFAULT_REGISTRY_STORAGE_DIR),
            sink: OutputSink::Discard,
            request_timeout: constants::HTTP_REQUEST_TIMEOUT,
            poll_interval: constants::READY_POLL_INTERVAL,
            stop_grace: constants::REGISTRY_STOP_GRACE,
        }
    }

    /// Sets the registry binary.
    #[must_use]
    pub fn binary(mut self, binary: impl Into<PathBuf>) -> Self {
        self.binary = binary.into();
        self
    }

    /// Sets the host used for HTTP calls and the endpoint.
    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Sets the storage directory removed on stop.
    #[must_use]
    pub fn storage_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.storage_dir = dir.into();
        self
    }

    /// Sets the output sink.
    #[must_use]
    pub fn sink(mut self, sink: OutputSink) -> Self {
        self.sink = sink;
        self
    }

    /// Sets the SIGTERM grace period.
    #[must_use]
    pub const fn stop_grace(mut self, grace: Duration) -> Self {
        self.stop_grace = grace;
        self
    }
}

/// A running local registry, owned by a single caller.
///
/// Call [`wait_ready`](Self::wait_ready) before querying and
/// [`stop`](Self::stop) exactly once when done.
#[derive(Debug)]
pub struct RegistryProcess {
    supervisor: Option<JoinHandle<io::Result<Exit>>>,
    output: Vec<JoinHandle<()>>,
    pid: Option<u32>,
    config_path: PathBuf,
    host: String,
    port: u16,
    storage_dir: PathBuf,
    client: reqwest::Client,
    cancel: CancellationToken,
    poll_interval: Duration,
    state: RegistryState,
}

impl RegistryProcess {
    /// Starts `registry serve <config_path>` on `port` with default options.
    ///
    /// # Errors
    ///
    /// See [`start_with`](Self::start_with).
    pub fn start(parent: &CancellationToken, config_path: &Path, port: u16) -> Result<Self> {
        Self::start_with(parent, RegistryOptions::new(config_path, port))
    }

    /// Starts the registry described by `options`.
    ///
    /// Returns as soon as the process is spawned; the registry is not ready
    /// yet. Must be called from within a Tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns `ConfigNotFound` if the configuration file is missing,
    /// `RequestBuild` if the HTTP client cannot be built, or `ProcessStart`
    /// if the binary cannot be spawned.
    pub fn start_with(parent: &CancellationToken, options: RegistryOptions) -> Result<Self> {
        let _ = std::fs::metadata(&options.config_path).map_err(|source| {
            RegistryError::ConfigNotFound {
                path: options.config_path.clone(),
                source,
            }
        })?;

        let client = reqwest::Client::builder()
            .timeout(options.request_timeout)
            .build()
            .map_err(|source| RegistryError::RequestBuild {
                url: format!("http://{}:{}", options.host, options.port),
                source,
            })?;

        let cancel = parent.child_token();
        let program = options.binary.display().to_string();

        let mut cmd = Command::new(&options.binary);
        let _ = cmd
            .arg(constants::REGISTRY_SERVE_SUBCOMMAND)
            .arg(&options.config_path)
            .stdin(Stdio::null())
            .stdout(options.sink.stdio())
            .stderr(options.sink.stdio())
            .kill_on_drop(true);

        let mut child = cmd
            .spawn()
            .map_err(|source| RegistryError::ProcessStart {
                program: program.clone(),
                source,
            })?;
        let pid = child.id();
        let output = options.sink.attach(&mut child);
        let supervisor = tokio::spawn(supervise(child, cancel.clone(), options.stop_grace));

        tracing::info!(
            program = %program,
            pid = ?pid,
            config = %options.config_path.display(),
            port = options.port,
            "registry started"
        );

        Ok(Self {
            supervisor: Some(supervisor),
            output,
            pid,
            config_path: options.config_path,
            host: options.host,
            port: options.port,
            storage_dir: options.storage_dir,
            client,
            cancel,
            poll_interval: options.poll_interval,
            state: RegistryState::Starting,
        })
    }

    /// Polls the health endpoint until it answers 200 or `timeout` elapses.
    ///
    /// Connection failures and non-200 answers are retried silently.
    ///
    /// # Errors
    ///
    /// Returns `ReadinessTimeout` when the budget runs out, `RequestBuild`
    /// if a probe cannot be constructed, `RegistryExited` if the process
    /// died, or `Cancelled` if the token fired.
    pub async fn wait_ready(&mut self, timeout: Duration) -> Result<()> {
        let url = self.url(constants::HEALTH_PATH);
        let deadline = Instant::now() + timeout;
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let _ = ticker.tick().await;

        loop {
            let request = self
                .client
                .get(&url)
                .build()
                .map_err(|source| RegistryError::RequestBuild {
                    url: url.clone(),
                    source,
                })?;

            let ready = tokio::select! {
                () = self.cancel.cancelled() => {
                    return Err(RegistryError::Cancelled { operation: "readiness check" });
                }
                probe = tokio::time::timeout_at(deadline, self.client.execute(request)) => {
                    match probe {
                        Ok(Ok(response)) => {
                            tracing::debug!(status = %response.status(), "health probe answered");
                            response.status() == StatusCode::OK
                        }
                        Ok(Err(e)) => {
                            tracing::debug!(error = %e, "health probe failed");
                            false
                        }
                        Err(_) => false,
                    }
                }
            };

            if ready {
                self.state = RegistryState::Ready;
                tracing::info!(url = %url, "registry ready");
                return Ok(());
            }

            if self.has_exited() {
                return Err(RegistryError::RegistryExited {
                    status: "exited before becoming ready".into(),
                });
            }

            tokio::select! {
                () = self.cancel.cancelled() => {
                    return Err(RegistryError::Cancelled { operation: "readiness check" });
                }
                () = tokio::time::sleep_until(deadline) => {
                    tracing::warn!(url = %url, ?timeout, "registry readiness timed out");
                    return Err(RegistryError::ReadinessTimeout { url, timeout });
                }
                _ = ticker.tick() => {}
            }
        }
    }

    /// Lists the repositories in the registry's catalog, in catalog order.
    ///
    /// # Errors
    ///
    /// Returns `Query` on transport failure, `HttpStatus` on a non-200
    /// answer, `Decode` on a malformed body, or `Cancelled` if the token
    /// fired.
    pub async fn list_repositories(&self) -> Result<Vec<String>> {
        let url = self.url(constants::CATALOG_PATH);
        let query = async {
            let response = self
                .client
                .get(&url)
                .send()
                .await
                .map_err(|source| RegistryError::Query {
                    url: url.clone(),
                    source,
                })?;
            if response.status() != StatusCode::OK {
                return Err(RegistryError::HttpStatus {
                    status: response.status().as_u16(),
                });
            }
            let body = response
                .bytes()
                .await
                .map_err(|source| RegistryError::Query {
                    url: url.clone(),
                    source,
                })?;
            decode_catalog(&body)
        };

        let repositories = tokio::select! {
            () = self.cancel.cancelled() => {
                return Err(RegistryError::Cancelled { operation: "catalog query" });
            }
            result = query => result?,
        };
        tracing::debug!(count = repositories.len(), "catalog listed");
        Ok(repositories)
    }

    /// Terminates the registry, waits for it to exit, and removes its
    /// storage directory.
    ///
    /// Works from any state. Storage cleanup is attempted even if waiting
    /// failed; a cleanup failure takes precedence in the returned error.
    ///
    /// # Errors
    ///
    /// Returns `AlreadyStopped` on a second call, `Cleanup` if the storage
    /// directory cannot be removed, otherwise `Wait` or `RegistryExited`
    /// describing how the process ended.
    pub async fn stop(&mut self) -> Result<()> {
        if self.state == RegistryState::Stopped {
            return Err(RegistryError::AlreadyStopped);
        }
        self.state = RegistryState::Stopped;
        self.cancel.cancel();

        let waited = match self.supervisor.take() {
            Some(supervisor) => match supervisor.await {
                Ok(Ok(Exit::Terminated)) => Ok(()),
                Ok(Ok(Exit::Exited(status))) if status.success() => Ok(()),
                Ok(Ok(Exit::Exited(status))) => Err(RegistryError::RegistryExited {
                    status: status.to_string(),
                }),
                Ok(Err(source)) => Err(RegistryError::Wait { source }),
                Err(join) => Err(RegistryError::Wait {
                    source: io::Error::other(join),
                }),
            },
            None => Ok(()),
        };

        for mut task in self.output.drain(..) {
            if tokio::time::timeout(OUTPUT_FLUSH_GRACE, &mut task)
                .await
                .is_err()
            {
                task.abort();
            }
        }

        match remove_storage(&self.storage_dir).await {
            Ok(true) => {
                tracing::debug!(path = %self.storage_dir.display(), "registry storage removed");
            }
            Ok(false) => {}
            Err(source) => {
                tracing::warn!(
                    path = %self.storage_dir.display(),
                    error = %source,
                    "failed to remove registry storage"
                );
                return Err(RegistryError::Cleanup {
                    path: self.storage_dir.clone(),
                    source,
                });
            }
        }

        tracing::info!(port = self.port, "registry stopped");
        waited
    }

    /// `host:port` address to use as a registry destination.
    #[must_use]
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> RegistryState {
        self.state
    }

    /// OS process id, if the child reported one.
    #[must_use]
    pub const fn pid(&self) -> Option<u32> {
        self.pid
    }

    /// Configuration file the registry was started with.
    #[must_use]
    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    /// Storage directory removed on stop.
    #[must_use]
    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    /// Port the registry listens on.
    #[must_use]
    pub const fn port(&self) -> u16 {
        self.port
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}:{}{path}", self.host, self.port)
    }

    fn has_exited(&self) -> bool {
        !self.cancel.is_cancelled()
            && self
                .supervisor
                .as_ref()
                .is_some_and(JoinHandle::is_finished)
    }
}

impl Drop for RegistryProcess {
    fn drop(&mut self) {
        if self.state != RegistryState::Stopped {
            self.cancel.cancel();
        }
    }
}

/// Removes the storage path whether it is a directory or a plain file.
/// Returns `false` if nothing was there.
async fn remove_storage(path: &Path) -> io::Result<bool> {
    let metadata = match tokio::fs::symlink_metadata(path).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e),
    };
    let removed = if metadata.is_dir() {
        tokio::fs::remove_dir_all(path).await
    } else {
        tokio::fs::remove_file(path).await
    };
    match removed {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(e),
    }
}

async fn supervise(
    mut child: Child,
    cancel: CancellationToken,
    grace: Duration,
) -> io::Result<Exit> {
    tokio::select! {
        status = child.wait() => {
            let status = status?;
            if !cancel.is_cancelled() {
                tracing::warn!(%status, "registry exited on its own");
            }
            Ok(Exit::Exited(status))
        }
        () = cancel.cancelled() => terminate(&mut child, grace).await,
    }
}

/// Sends SIGTERM, then SIGKILL if the child outlives `grace`.
async fn terminate(child: &mut Child, grace: Duration) -> io::Result<Exit> {
    if let Some(pid) = child.id() {
        if send_sigterm(pid) {
            tracing::debug!(pid, "sent SIGTERM to registry");
            if let Ok(status) = tokio::time::timeout(grace, child.wait()).await {
                let _ = status?;
                return Ok(Exit::Terminated);
            }
        }
    }
    if let Err(e) = child.start_kill() {
        tracing::debug!(error = %e, "SIGKILL not delivered");
    }
    let _ = child.wait().await?;
    tracing::debug!("registry killed");
    Ok(Exit::Terminated)
}

#[cfg(unix)]
fn send_sigterm(pid: u32) -> bool {
    use nix::sys::signal::{Signal, kill};
    use nix::unistd::Pid;

    i32::try_from(pid).is_ok_and(|raw| kill(Pid::from_raw(raw), Signal::SIGTERM).is_ok())
}

#[cfg(not(unix))]
const fn send_sigterm(_pid: u32) -> bool {
    false
}
