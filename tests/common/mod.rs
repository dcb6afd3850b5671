/// Common test utilities and helpers for treesync tests
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;
use treesync::{Endpoint, EngineConfig, LocalTransport, SyncAddress};

/// One isolated endpoint home on disk
pub struct TestHome {
    pub temp_dir: TempDir,
    pub transport: Arc<LocalTransport>,
}

impl TestHome {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("failed to create temp dir");
        let transport = Arc::new(LocalTransport::with_home(temp_dir.path()));
        Self {
            temp_dir,
            transport,
        }
    }

    pub fn home(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Endpoint for a sync root addressed by `address`
    pub fn endpoint(&self, address: &str) -> Arc<Endpoint> {
        let address = SyncAddress::parse(address).expect("valid test address");
        Arc::new(Endpoint::new(
            address,
            self.transport.clone(),
            EngineConfig::default(),
        ))
    }

    /// Create a sync root directory inside this home and return its
    /// absolute path
    pub fn create_sync_root(&self, name: &str) -> PathBuf {
        let path = self.home().join(name);
        std::fs::create_dir_all(&path).expect("failed to create sync root");
        path
    }

    /// Install a fake engine executable that reports `version` and
    /// answers rev-list queries with `tail_hash`
    #[cfg(unix)]
    pub fn install_fake_engine(&self, version: &str, tail_hash: &str) {
        use std::os::unix::fs::PermissionsExt;

        let exe = self.home().join(".treesync/engine/bin/git");
        std::fs::create_dir_all(exe.parent().expect("engine path has a parent"))
            .expect("failed to create engine dir");
        let script = format!(
            "#!/bin/sh\ncase \"$1\" in\n  --version) echo \"git version {version}\" ;;\n  rev-list) echo \"{tail_hash}\" ;;\nesac\n"
        );
        std::fs::write(&exe, script).expect("failed to write fake engine");
        let mut perms = std::fs::metadata(&exe)
            .expect("failed to stat fake engine")
            .permissions();
        perms.set_mode(0o755);
        std::fs::set_permissions(&exe, perms).expect("failed to chmod fake engine");
    }
}
