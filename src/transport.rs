//! Execution capability consumed by endpoints.
//!
//! Every probe and daemon operation in this crate goes through the
//! [`Transport`] trait: file access, command execution, and process
//! control on whichever machine the endpoint addresses. The crate ships
//! [`LocalTransport`] for the local side; remote (SSH) transports are
//! provided by callers against the same trait.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command as AsyncCommand;

/// Captured output of a finished command
#[derive(Debug, Clone)]
pub struct ExecOutput {
    pub stdout: String,
    pub stderr: String,
    pub code: i32,
}

impl ExecOutput {
    pub fn success(&self) -> bool {
        self.code == 0
    }
}

/// Command-execution and file-access capability for one machine
///
/// All calls may block for a local process spawn or a full remote round
/// trip; failures propagate as errors for the caller to classify.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Whether this transport executes on the local machine
    fn is_local(&self) -> bool;

    /// Whether the endpoint's platform is Windows-like
    fn is_windows(&self) -> bool;

    /// Resolve a path against the endpoint's home directory if relative
    fn resolve_absolute(&self, path: &str) -> PathBuf;

    async fn path_exists(&self, path: &Path) -> Result<bool>;

    async fn read_file(&self, path: &Path) -> Result<String>;

    async fn write_file(&self, path: &Path, contents: &str) -> Result<()>;

    async fn delete_file(&self, path: &Path) -> Result<()>;

    /// List the file names (not paths) in a directory
    async fn list_directory(&self, path: &Path) -> Result<Vec<String>>;

    async fn mkdirp(&self, path: &Path) -> Result<()>;

    async fn run(&self, program: &str, args: &[&str]) -> Result<ExecOutput>;

    async fn run_in(&self, cwd: &Path, program: &str, args: &[&str]) -> Result<ExecOutput>;

    /// Run a command and return its stdout, failing on non-zero exit
    async fn output(&self, program: &str, args: &[&str]) -> Result<String> {
        let out = self.run(program, args).await?;
        if !out.success() {
            bail!("{program} exited with status {}: {}", out.code, out.stderr.trim());
        }
        Ok(out.stdout)
    }

    /// Like [`Transport::output`], with a working directory
    async fn output_in(&self, cwd: &Path, program: &str, args: &[&str]) -> Result<String> {
        let out = self.run_in(cwd, program, args).await?;
        if !out.success() {
            bail!("{program} exited with status {}: {}", out.code, out.stderr.trim());
        }
        Ok(out.stdout)
    }

    /// Whether a process with this pid still exists.
    ///
    /// `name` is the daemon name the pid was recorded under; transports
    /// that can match on process names use it to guard against pid reuse.
    async fn process_alive(&self, pid: u32, name: &str) -> Result<bool>;

    /// Request termination of the identified process
    async fn terminate_process(&self, pid: u32, name: &str) -> Result<()>;
}

/// Transport for the local machine, backed by tokio's fs and process APIs
pub struct LocalTransport {
    home: PathBuf,
}

impl LocalTransport {
    pub fn new() -> Result<Self> {
        let home = dirs::home_dir().context("could not determine home directory")?;
        Ok(Self { home })
    }

    /// Use an explicit home directory instead of the OS account's
    pub fn with_home(home: impl Into<PathBuf>) -> Self {
        Self { home: home.into() }
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    async fn run_command(
        &self,
        cwd: Option<&Path>,
        program: &str,
        args: &[&str],
    ) -> Result<ExecOutput> {
        let mut command = AsyncCommand::new(program);
        command.args(args);
        if let Some(cwd) = cwd {
            command.current_dir(cwd);
        }
        let output = command
            .output()
            .await
            .with_context(|| format!("failed to execute {program}"))?;

        Ok(ExecOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            code: output.status.code().unwrap_or(-1),
        })
    }
}

#[async_trait]
impl Transport for LocalTransport {
    fn is_local(&self) -> bool {
        true
    }

    fn is_windows(&self) -> bool {
        cfg!(windows)
    }

    fn resolve_absolute(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.home.join(path)
        }
    }

    async fn path_exists(&self, path: &Path) -> Result<bool> {
        Ok(tokio::fs::try_exists(path)
            .await
            .with_context(|| format!("failed to stat {}", path.display()))?)
    }

    async fn read_file(&self, path: &Path) -> Result<String> {
        tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("failed to read {}", path.display()))
    }

    async fn write_file(&self, path: &Path, contents: &str) -> Result<()> {
        tokio::fs::write(path, contents)
            .await
            .with_context(|| format!("failed to write {}", path.display()))
    }

    async fn delete_file(&self, path: &Path) -> Result<()> {
        tokio::fs::remove_file(path)
            .await
            .with_context(|| format!("failed to delete {}", path.display()))
    }

    async fn list_directory(&self, path: &Path) -> Result<Vec<String>> {
        let mut entries = tokio::fs::read_dir(path)
            .await
            .with_context(|| format!("failed to list {}", path.display()))?;
        let mut names = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .with_context(|| format!("failed to list {}", path.display()))?
        {
            names.push(entry.file_name().to_string_lossy().to_string());
        }
        Ok(names)
    }

    async fn mkdirp(&self, path: &Path) -> Result<()> {
        tokio::fs::create_dir_all(path)
            .await
            .with_context(|| format!("failed to create directory {}", path.display()))
    }

    async fn run(&self, program: &str, args: &[&str]) -> Result<ExecOutput> {
        self.run_command(None, program, args).await
    }

    async fn run_in(&self, cwd: &Path, program: &str, args: &[&str]) -> Result<ExecOutput> {
        self.run_command(Some(cwd), program, args).await
    }

    async fn process_alive(&self, pid: u32, _name: &str) -> Result<bool> {
        #[cfg(unix)]
        {
            use nix::errno::Errno;
            use nix::sys::signal;
            use nix::unistd::Pid;

            match signal::kill(Pid::from_raw(pid as i32), None) {
                Ok(()) => Ok(true),
                Err(Errno::ESRCH) => Ok(false),
                // Assume running if we can't check (e.g. EPERM)
                Err(_) => Ok(true),
            }
        }

        #[cfg(not(unix))]
        {
            let _ = pid;
            Err(anyhow::anyhow!(
                "process liveness checks are not available on this platform"
            ))
        }
    }

    async fn terminate_process(&self, pid: u32, name: &str) -> Result<()> {
        #[cfg(unix)]
        {
            use nix::sys::signal::{self, Signal};
            use nix::unistd::Pid;

            signal::kill(Pid::from_raw(pid as i32), Signal::SIGTERM)
                .with_context(|| format!("failed to send SIGTERM to {name} (pid {pid})"))
        }

        #[cfg(not(unix))]
        {
            let _ = pid;
            Err(anyhow::anyhow!(
                "cannot terminate {name}: process control is not available on this platform"
            ))
        }
    }
}
