//! PID-file-based daemon lifecycle management.
//!
//! Daemons spawned for an endpoint (watchers, sync loops) outlive the
//! process that started them, so the only durable record of them is a
//! pidfile on the endpoint's own filesystem. Pidfiles are scoped by the
//! watched root path so that unrelated sync sessions sharing a host never
//! reap each other's daemons.
//!
//! A pidfile lives at `<pidfiles-dir>/<name>-<scope>.pid` and holds the
//! decimal pid. Daemon names must not contain `-`: the filename is split
//! on its first `-` to recover name and scope.

use tracing::{debug, info, warn};

use crate::endpoint::Endpoint;
use crate::error::SyncError;

pub const PIDFILE_SUFFIX: &str = ".pid";

impl Endpoint {
    /// Filesystem-safe encoding of the watched root path
    pub fn pidfile_scope(&self) -> String {
        self.abs_sync_path().to_string_lossy().replace('/', "_")
    }

    /// Absolute pidfile path for a daemon of this endpoint
    pub fn pidfile_path(&self, name: &str) -> std::path::PathBuf {
        let scoped_name = format!("{}-{}{}", name, self.pidfile_scope(), PIDFILE_SUFFIX);
        self.transport()
            .resolve_absolute(&self.engine().pidfiles_dir)
            .join(scoped_name)
    }

    /// Record a spawned daemon's pid, overwriting any prior record for
    /// the same name and scope
    pub async fn save_daemon_pid(&self, name: &str, pid: u32) -> Result<(), SyncError> {
        let dir = self
            .transport()
            .resolve_absolute(&self.engine().pidfiles_dir);
        self.transport()
            .mkdirp(&dir)
            .await
            .map_err(|cause| SyncError::Persistence {
                path: dir.clone(),
                cause,
            })?;

        let path = self.pidfile_path(name);
        self.transport()
            .write_file(&path, &pid.to_string())
            .await
            .map_err(|cause| SyncError::Persistence { path, cause })
    }

    /// Terminate the daemon recorded under `name` for this endpoint's
    /// scope, if it is still running, and remove its pidfile.
    ///
    /// A missing pidfile is an error; everything past that point is
    /// best-effort: corrupt contents and failed kill signals are logged,
    /// and the pidfile is removed regardless.
    pub async fn kill_via_pidfile(&self, name: &str) -> Result<(), SyncError> {
        let path = self.pidfile_path(name);
        if !self.transport().path_exists(&path).await? {
            return Err(SyncError::PidfileNotFound {
                name: name.to_string(),
                path,
            });
        }

        let contents = self.transport().read_file(&path).await?;
        match contents.trim().parse::<u32>() {
            Err(_) => {
                warn!("ignoring pidfile for {name} due to invalid contents [{contents}]");
            }
            Ok(pid) => {
                if self.transport().process_alive(pid, name).await? {
                    info!("killing {name} (pid {pid})");
                    if let Err(err) = self.transport().terminate_process(pid, name).await {
                        warn!("failed to kill {name} (pid {pid}): {err:#}");
                    }
                } else {
                    debug!("{name} (pid {pid}) is not running; removing stale pidfile");
                }
            }
        }

        if let Err(err) = self.transport().delete_file(&path).await {
            warn!("failed to remove pidfile {}: {err:#}", path.display());
        }
        Ok(())
    }

    /// Terminate every daemon recorded for this endpoint's scope.
    ///
    /// Pidfiles belonging to other scopes are left untouched, and a local
    /// endpoint never touches the shared engine daemon: other sync
    /// sessions on this machine may still depend on it. Per-entry
    /// failures are logged and do not abort the sweep.
    pub async fn kill_all_via_pidfiles(&self) -> Result<(), SyncError> {
        if self.transport().is_windows() {
            return Err(SyncError::Unsupported);
        }

        let dir = self
            .transport()
            .resolve_absolute(&self.engine().pidfiles_dir);
        let files = match self.transport().list_directory(&dir).await {
            Ok(files) => files,
            Err(err) => {
                warn!("encountered error while listing pidfiles: {err:#}");
                return Ok(());
            }
        };

        let scope = self.pidfile_scope();
        for filename in files {
            let Some(scoped_name) = filename.strip_suffix(PIDFILE_SUFFIX) else {
                continue;
            };
            let Some((name, file_scope)) = scoped_name.split_once('-') else {
                continue;
            };
            if name == self.engine().daemon_name && self.is_local() {
                // Only kill the engine daemon if it's on a different host
                continue;
            }
            if file_scope.is_empty() || file_scope != scope {
                continue;
            }
            info!("killing process via pidfile {scoped_name}");
            if let Err(err) = self.kill_via_pidfile(name).await {
                warn!("error killing {name} process via pidfile: {err}");
            }
        }
        Ok(())
    }
}
