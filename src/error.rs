//! Error taxonomy for endpoint setup and daemon lifecycle operations.
//!
//! Probe failures (filesystem or engine command errors while checking the
//! engine install or refreshing the tail hash) are `Fatal`: they mean the
//! environment is unusable for syncing. Everything else is a recoverable
//! condition the caller matches on. The decision to abort the process is
//! made by the outermost caller, never here.

use std::path::PathBuf;

use thiserror::Error;

/// All errors produced by the endpoint core.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The address string does not match `[[user@]host:]path`.
    #[error("could not parse sync address [{0}]")]
    MalformedAddress(String),

    /// Creating the pidfile directory or writing a pidfile failed.
    #[error("failed to persist pidfile at {path}: {cause}")]
    Persistence { path: PathBuf, cause: anyhow::Error },

    /// No pidfile exists for the requested daemon in the current scope.
    #[error("no pidfile for daemon {name} at {path}")]
    PidfileNotFound { name: String, path: PathBuf },

    /// Bulk daemon termination needs process-control primitives this
    /// platform does not provide.
    #[error("bulk daemon termination is not supported on this platform")]
    Unsupported,

    /// Unrecoverable transport or engine failure during a probe.
    #[error(transparent)]
    Fatal(#[from] anyhow::Error),
}

impl SyncError {
    /// Whether this error should halt the current sync-setup step.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SyncError::Fatal(_) | SyncError::Unsupported)
    }
}
