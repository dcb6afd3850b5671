//! Endpoint context: identity, naming, and compatibility probing for one
//! side of a sync relationship.
//!
//! An endpoint's identity (username, hostname, sync path) is fixed at
//! construction and is the sole input to its branch name, so per-endpoint
//! resources never collide across concurrent sync sessions sharing a host.
//! The two probe results (engine install, repository tail hash) are cached
//! per instance; operations on one endpoint are expected to be driven by a
//! single logical owner at a time.

use std::fmt;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, Weak};

use sha2::{Digest, Sha256};
use tracing::debug;

use crate::address::SyncAddress;
use crate::config::EngineConfig;
use crate::error::SyncError;
use crate::transport::{ExecOutput, Transport};

/// Cached result of the engine-install probe.
///
/// Explicitly distinguishes "not yet probed" from "probed and absent".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallState {
    Unknown,
    Installed,
    Missing,
}

/// One side (local or remote) of a synchronized path pair
pub struct Endpoint {
    username: String,
    hostname: String,
    sync_path: String,
    transport: Arc<dyn Transport>,
    engine: EngineConfig,
    engine_installed: Mutex<InstallState>,
    tail_hash: Mutex<String>,
}

impl Endpoint {
    pub fn new(address: SyncAddress, transport: Arc<dyn Transport>, engine: EngineConfig) -> Self {
        Self {
            username: address.username,
            hostname: address.hostname,
            sync_path: address.path,
            transport,
            engine,
            engine_installed: Mutex::new(InstallState::Unknown),
            tail_hash: Mutex::new(String::new()),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    pub fn sync_path(&self) -> &str {
        &self.sync_path
    }

    /// An empty hostname means this endpoint is the local machine
    pub fn is_local(&self) -> bool {
        self.hostname.is_empty()
    }

    pub fn transport(&self) -> &dyn Transport {
        self.transport.as_ref()
    }

    pub fn engine(&self) -> &EngineConfig {
        &self.engine
    }

    /// The sync path resolved against the endpoint's home directory
    pub fn abs_sync_path(&self) -> PathBuf {
        self.transport.resolve_absolute(&self.sync_path)
    }

    /// Canonical identity string; never includes cached probe results
    pub fn describe(&self) -> String {
        self.to_string()
    }

    /// Deterministic, stable name for this endpoint's sync branch.
    ///
    /// `<host>-<first 8 hex chars of SHA-256(describe())>`, with
    /// "localhost" standing in for the empty local hostname. The same
    /// identity always yields the same name across restarts; distinct
    /// sync paths on one host get distinct names.
    pub fn branch_name(&self) -> String {
        let hostname = if self.hostname.is_empty() {
            "localhost"
        } else {
            &self.hostname
        };
        let digest = format!("{:x}", Sha256::digest(self.describe().as_bytes()));
        format!("{}-{}", hostname, &digest[..8])
    }

    /// Absolute path of the engine binary on this endpoint
    pub fn engine_exe(&self) -> PathBuf {
        self.transport.resolve_absolute(&self.engine.exe_path)
    }

    /// Whether the expected engine binary is installed at the expected
    /// version on this endpoint. The probe result is cached; call
    /// [`Endpoint::reset_engine_installed_cache`] after changing the
    /// environment (e.g. an install step).
    pub async fn has_engine_installed(&self) -> Result<bool, SyncError> {
        let cached = *self.lock_install_state();
        match cached {
            InstallState::Installed => return Ok(true),
            InstallState::Missing => return Ok(false),
            InstallState::Unknown => {}
        }

        let installed = self.probe_engine_installed().await?;
        *self.lock_install_state() = if installed {
            InstallState::Installed
        } else {
            InstallState::Missing
        };
        Ok(installed)
    }

    /// Forget the cached engine-install probe result
    pub fn reset_engine_installed_cache(&self) {
        *self.lock_install_state() = InstallState::Unknown;
    }

    async fn probe_engine_installed(&self) -> Result<bool, SyncError> {
        let desired = if self.transport.is_windows() {
            &self.engine.win_version
        } else {
            &self.engine.version
        };
        let desired = desired.trim_start_matches('v');

        let exe = self.engine_exe();
        if !self.transport.path_exists(&exe).await? {
            debug!("no engine binary at {}", exe.display());
            return Ok(false);
        }
        let version_output = self
            .transport
            .output(&exe.to_string_lossy(), &["--version"])
            .await?;
        Ok(version_output.contains(desired))
    }

    /// Fingerprint of this endpoint's repository origin commit, as set by
    /// the last [`Endpoint::refresh_tail_hash`]. Empty means no repository
    /// exists at the sync path yet.
    pub fn tail_hash(&self) -> String {
        self.lock_tail_hash().clone()
    }

    /// Re-query the repository's root commit (the commit reachable from
    /// HEAD with zero parents). Sets the tail hash to empty when the
    /// repository marker directory is absent.
    pub async fn refresh_tail_hash(&self) -> Result<(), SyncError> {
        let marker = self.abs_sync_path().join(&self.engine.repo_marker);
        if self.transport.path_exists(&marker).await? {
            let output = self
                .engine_output(&["rev-list", "--max-parents=0", "HEAD"])
                .await?;
            *self.lock_tail_hash() = output.trim().to_string();
        } else {
            *self.lock_tail_hash() = String::new();
        }
        Ok(())
    }

    /// Two endpoints can merge iff both repositories are still to be
    /// initialized, or both grew from the same origin commit.
    pub fn is_compatible_with(&self, other: &Endpoint) -> bool {
        let ours = self.tail_hash();
        let theirs = other.tail_hash();
        ours == theirs
    }

    /// Run an engine command in the sync path
    pub async fn engine_run(&self, args: &[&str]) -> Result<ExecOutput, SyncError> {
        let exe = self.engine_exe();
        let output = self
            .transport
            .run_in(&self.abs_sync_path(), &exe.to_string_lossy(), args)
            .await?;
        Ok(output)
    }

    /// Run an engine command in the sync path and return its stdout,
    /// failing on non-zero exit
    pub async fn engine_output(&self, args: &[&str]) -> Result<String, SyncError> {
        let exe = self.engine_exe();
        let output = self
            .transport
            .output_in(&self.abs_sync_path(), &exe.to_string_lossy(), args)
            .await?;
        Ok(output)
    }

    fn lock_install_state(&self) -> std::sync::MutexGuard<'_, InstallState> {
        self.engine_installed
            .lock()
            .expect("endpoint cache lock poisoned")
    }

    fn lock_tail_hash(&self) -> std::sync::MutexGuard<'_, String> {
        self.tail_hash.lock().expect("endpoint cache lock poisoned")
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hostname.is_empty() {
            write!(f, "local:{}", self.sync_path)
        } else {
            write!(f, "{}@{}:{}", self.username, self.hostname, self.sync_path)
        }
    }
}

/// Append-only collection of every endpoint created for this process,
/// used for best-effort enumeration (e.g. shutdown sweeps).
///
/// Holds non-owning references; dropped endpoints simply stop appearing
/// in [`EndpointRegistry::endpoints`]. Owned by the top-level
/// orchestrator and passed down explicitly.
#[derive(Default)]
pub struct EndpointRegistry {
    entries: Mutex<Vec<Weak<Endpoint>>>,
}

impl EndpointRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, endpoint: &Arc<Endpoint>) {
        self.entries
            .lock()
            .expect("registry lock poisoned")
            .push(Arc::downgrade(endpoint));
    }

    /// All registered endpoints that are still alive
    pub fn endpoints(&self) -> Vec<Arc<Endpoint>> {
        self.entries
            .lock()
            .expect("registry lock poisoned")
            .iter()
            .filter_map(Weak::upgrade)
            .collect()
    }
}
