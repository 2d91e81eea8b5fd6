//! Lifecycle state of a registry handle.

use std::fmt;

/// Where a [`RegistryProcess`](crate::process::RegistryProcess) is in its
/// lifecycle. A registry that was never started has no handle at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegistryState {
    /// Spawned, readiness not yet confirmed.
    Starting,
    /// Health endpoint answered 200.
    Ready,
    /// Stopped; terminal.
    Stopped,
}

impl fmt::Display for RegistryState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Starting => write!(f, "starting"),
            Self::Ready => write!(f, "ready"),
            Self::Stopped => write!(f, "stopped"),
        }
    }
}
