//! Invocation of the mirroring binary.

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use mirrorcheck_common::constants;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::error::RunError;
use crate::mode::MirrorMode;
use crate::result::{ExecutionResult, Outcome};

/// How long output readers may keep draining after a cancelled child was
/// killed. Grandchildren can hold the pipes open indefinitely.
const CANCEL_DRAIN_GRACE: Duration = Duration::from_millis(500);

const READ_CHUNK_SIZE: usize = 8192;

type SharedBuf = Arc<Mutex<Vec<u8>>>;

/// Runs the mirroring binary and captures what it did.
#[derive(Debug, Clone)]
pub struct CommandRunner {
    binary: PathBuf,
    env: Vec<(String, String)>,
}

impl Default for CommandRunner {
    fn default() -> Self {
        Self::new(constants::DEFAULT_MIRROR_BINARY)
    }
}

impl CommandRunner {
    /// Creates a runner for `binary`. An empty path selects the default
    /// `oc-mirror`, looked up through `PATH`.
    #[must_use]
    pub fn new(binary: impl Into<PathBuf>) -> Self {
        let binary = binary.into();
        let binary = if binary.as_os_str().is_empty() {
            PathBuf::from(constants::DEFAULT_MIRROR_BINARY)
        } else {
            binary
        };
        Self {
            binary,
            env: Vec::new(),
        }
    }

    /// Creates a runner for the binary named by `OC_MIRROR_BINARY`, or the
    /// default when unset.
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(std::env::var_os(constants::ENV_MIRROR_BINARY).unwrap_or_default())
    }

    /// Adds environment assignments applied on top of the inherited
    /// environment of every child.
    #[must_use]
    pub fn with_env<K, V>(mut self, env: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.env
            .extend(env.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    /// Binary this runner invokes.
    #[must_use]
    pub fn binary(&self) -> &Path {
        &self.binary
    }

    /// Extra environment assignments passed to every child.
    #[must_use]
    pub fn env(&self) -> &[(String, String)] {
        &self.env
    }

    /// Runs the binary with `args` until it exits or `token` is cancelled.
    ///
    /// Never fails outright: spawn and wait failures, and cancellation,
    /// are reported through [`Outcome::FailedToExecute`] alongside whatever
    /// output was captured. A non-zero exit is [`Outcome::Completed`].
    pub async fn run<S: AsRef<OsStr>>(
        &self,
        token: &CancellationToken,
        args: &[S],
    ) -> ExecutionResult {
        let program = self.binary.display().to_string();
        let start = Instant::now();
        tracing::debug!(
            program = %program,
            args = ?args.iter().map(|a| a.as_ref().to_string_lossy()).collect::<Vec<_>>(),
            "running mirroring binary"
        );

        let mut cmd = Command::new(&self.binary);
        let _ = cmd
            .args(args)
            .envs(self.env.iter().map(|(k, v)| (k.as_str(), v.as_str())))
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let mut child = match cmd.spawn() {
            Ok(child) => child,
            Err(source) => {
                tracing::warn!(program = %program, error = %source, "failed to spawn");
                return ExecutionResult {
                    outcome: Outcome::FailedToExecute(RunError::Execution { program, source }),
                    stdout: String::new(),
                    stderr: String::new(),
                    duration: start.elapsed(),
                };
            }
        };

        let stdout_buf = SharedBuf::default();
        let stderr_buf = SharedBuf::default();
        let mut readers = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            readers.push(spawn_reader(stdout, Arc::clone(&stdout_buf)));
        }
        if let Some(stderr) = child.stderr.take() {
            readers.push(spawn_reader(stderr, Arc::clone(&stderr_buf)));
        }

        let outcome = tokio::select! {
            status = child.wait() => {
                if collect(&program, token, readers).await {
                    match status {
                        Ok(status) => Outcome::Completed {
                            exit_code: status.code().unwrap_or(-1),
                        },
                        Err(source) => Outcome::FailedToExecute(RunError::Execution {
                            program: program.clone(),
                            source,
                        }),
                    }
                } else {
                    Outcome::FailedToExecute(RunError::Cancelled { program: program.clone() })
                }
            }
            () = token.cancelled() => {
                if let Err(e) = child.kill().await {
                    tracing::warn!(program = %program, error = %e, "failed to kill cancelled child");
                }
                drain(readers).await;
                Outcome::FailedToExecute(RunError::Cancelled { program: program.clone() })
            }
        };

        let result = ExecutionResult {
            outcome,
            stdout: take_string(&stdout_buf),
            stderr: take_string(&stderr_buf),
            duration: start.elapsed(),
        };
        tracing::info!(
            program = %program,
            exit_code = ?result.exit_code(),
            duration_ms = u64::try_from(result.duration.as_millis()).unwrap_or(u64::MAX),
            "mirroring binary finished"
        );
        result
    }

    /// Runs the binary in `mode`, appending `extra` flags after the mode's
    /// fixed arguments.
    pub async fn run_mode<S: AsRef<str>>(
        &self,
        token: &CancellationToken,
        mode: &MirrorMode,
        extra: &[S],
    ) -> ExecutionResult {
        tracing::info!(mode = mode.name(), "starting mirror run");
        self.run(token, &mode.args(extra)).await
    }

    /// `--config <config> file://<dest_dir> --v2 [extra...]`
    pub async fn mirror_to_disk<S: AsRef<str>>(
        &self,
        token: &CancellationToken,
        config: &Path,
        dest_dir: &Path,
        extra: &[S],
    ) -> ExecutionResult {
        let mode = MirrorMode::MirrorToDisk {
            config: config.to_path_buf(),
            dest_dir: dest_dir.to_path_buf(),
        };
        self.run_mode(token, &mode, extra).await
    }

    /// `--config <config> --from file://<source_dir> docker://<dest_registry> --v2 [extra...]`
    pub async fn disk_to_mirror<S: AsRef<str>>(
        &self,
        token: &CancellationToken,
        config: &Path,
        source_dir: &Path,
        dest_registry: &str,
        extra: &[S],
    ) -> ExecutionResult {
        let mode = MirrorMode::DiskToMirror {
            config: config.to_path_buf(),
            source_dir: source_dir.to_path_buf(),
            dest_registry: dest_registry.to_string(),
        };
        self.run_mode(token, &mode, extra).await
    }

    /// `--config <config> --workspace file://<workspace> docker://<dest_registry> --v2 [extra...]`
    pub async fn mirror_to_mirror<S: AsRef<str>>(
        &self,
        token: &CancellationToken,
        config: &Path,
        workspace: &Path,
        dest_registry: &str,
        extra: &[S],
    ) -> ExecutionResult {
        let mode = MirrorMode::MirrorToMirror {
            config: config.to_path_buf(),
            workspace: workspace.to_path_buf(),
            dest_registry: dest_registry.to_string(),
        };
        self.run_mode(token, &mode, extra).await
    }
}

fn spawn_reader<R>(mut stream: R, buf: SharedBuf) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut chunk = vec![0u8; READ_CHUNK_SIZE];
        loop {
            match stream.read(&mut chunk).await {
                Ok(0) => break,
                Ok(n) => lock(&buf).extend_from_slice(&chunk[..n]),
                Err(e) => {
                    tracing::debug!(error = %e, "output stream closed with error");
                    break;
                }
            }
        }
    })
}

/// Waits for the readers after the child exited. Descendants may keep the
/// pipes open, so cancellation still applies; returns `false` if `token`
/// fired before every reader finished.
async fn collect(
    program: &str,
    token: &CancellationToken,
    mut readers: Vec<JoinHandle<()>>,
) -> bool {
    let joined = async {
        for reader in &mut readers {
            if let Err(e) = reader.await {
                tracing::warn!(program = %program, error = %e, "output reader failed");
            }
        }
    };
    let cancelled = tokio::select! {
        () = joined => false,
        () = token.cancelled() => true,
    };
    if cancelled {
        tracing::debug!(program = %program, "cancelled while output pipes were still open");
        readers.retain(|reader| !reader.is_finished());
        drain(readers).await;
    }
    !cancelled
}

/// Gives readers a short window to pick up remaining output, then stops them.
async fn drain(readers: Vec<JoinHandle<()>>) {
    for mut reader in readers {
        if tokio::time::timeout(CANCEL_DRAIN_GRACE, &mut reader)
            .await
            .is_err()
        {
            reader.abort();
        }
    }
}

fn lock(buf: &SharedBuf) -> MutexGuard<'_, Vec<u8>> {
    buf.lock().unwrap_or_else(PoisonError::into_inner)
}

fn take_string(buf: &SharedBuf) -> String {
    String::from_utf8_lossy(&std::mem::take(&mut *lock(buf))).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_binary_falls_back_to_default() {
        let runner = CommandRunner::new("");
        assert_eq!(runner.binary(), Path::new("oc-mirror"));
    }

    #[test]
    fn explicit_binary_is_kept() {
        let runner = CommandRunner::new("/opt/bin/oc-mirror");
        assert_eq!(runner.binary(), Path::new("/opt/bin/oc-mirror"));
    }

    #[test]
    fn with_env_accumulates() {
        let runner = CommandRunner::default()
            .with_env([("A", "1")])
            .with_env(vec![("B".to_string(), "2".to_string())]);
        assert_eq!(
            runner.env(),
            &[("A".into(), "1".into()), ("B".into(), "2".into())]
        );
    }
}
