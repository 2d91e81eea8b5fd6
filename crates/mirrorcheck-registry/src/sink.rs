//! Where the registry subprocess's output goes.

use std::process::Stdio;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Child;
use tokio::task::JoinHandle;

/// Destination for the registry's stdout and stderr.
///
/// The registry is chatty; suites use [`OutputSink::Discard`] to keep
/// their own logs readable. Tests that need to look at what the registry
/// printed use [`OutputSink::Capture`].
#[derive(Debug, Clone, Default)]
pub enum OutputSink {
    /// Drop all output.
    #[default]
    Discard,
    /// Share the harness's own stdout and stderr.
    Inherit,
    /// Collect both streams into a shared buffer.
    Capture(CaptureBuffer),
}

impl OutputSink {
    /// Creates a capturing sink and returns it with a handle to its buffer.
    #[must_use]
    pub fn capture() -> (Self, CaptureBuffer) {
        let buffer = CaptureBuffer::default();
        (Self::Capture(buffer.clone()), buffer)
    }

    /// Stdio configuration for one of the child's output streams.
    pub(crate) fn stdio(&self) -> Stdio {
        match self {
            Self::Discard => Stdio::null(),
            Self::Inherit => Stdio::inherit(),
            Self::Capture(_) => Stdio::piped(),
        }
    }

    /// Starts copying the child's piped streams into the sink, if it
    /// captures. Returns the copy tasks.
    pub(crate) fn attach(&self, child: &mut Child) -> Vec<JoinHandle<()>> {
        let Self::Capture(buffer) = self else {
            return Vec::new();
        };
        let mut tasks = Vec::with_capacity(2);
        if let Some(stdout) = child.stdout.take() {
            tasks.push(spawn_copy(stdout, buffer.clone()));
        }
        if let Some(stderr) = child.stderr.take() {
            tasks.push(spawn_copy(stderr, buffer.clone()));
        }
        tasks
    }
}

/// Shared, append-only byte buffer filled by a capturing sink.
#[derive(Debug, Clone, Default)]
pub struct CaptureBuffer(Arc<Mutex<Vec<u8>>>);

impl CaptureBuffer {
    /// Everything captured so far, lossily decoded as UTF-8.
    #[must_use]
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.lock()).into_owned()
    }

    /// Whether nothing has been captured yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    fn append(&self, bytes: &[u8]) {
        self.lock().extend_from_slice(bytes);
    }

    fn lock(&self) -> MutexGuard<'_, Vec<u8>> {
        self.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn spawn_copy<R>(mut stream: R, buffer: CaptureBuffer) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut chunk = [0u8; 4096];
        loop {
            match stream.read(&mut chunk).await {
                Ok(0) | Err(_) => break,
                Ok(n) => buffer.append(&chunk[..n]),
            }
        }
    })
}
