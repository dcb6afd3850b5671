use anyhow::{Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure for treesync
#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    /// Sync engine location and version expectations
    #[serde(default)]
    pub engine: EngineConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Sync engine configuration
///
/// Paths are interpreted relative to the endpoint's home directory unless
/// absolute, so one configuration works for local and remote sides alike.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct EngineConfig {
    /// Path to the engine binary on each endpoint
    #[serde(default = "default_exe_path")]
    pub exe_path: String,

    /// Expected engine version
    #[serde(default = "default_version")]
    pub version: String,

    /// Expected engine version on Windows-like endpoints
    #[serde(default = "default_win_version")]
    pub win_version: String,

    /// Directory marker that identifies an initialized repository
    #[serde(default = "default_repo_marker")]
    pub repo_marker: String,

    /// Directory holding daemon pidfiles
    #[serde(default = "default_pidfiles_dir")]
    pub pidfiles_dir: String,

    /// Pidfile name under which the shared engine daemon records itself.
    /// Daemon names must not contain `-`; pidfile names split on it.
    #[serde(default = "default_daemon_name")]
    pub daemon_name: String,
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String, // "info"

    /// Log format
    #[serde(default = "default_log_format")]
    pub format: String, // "compact"
}

// Default value functions
fn default_exe_path() -> String {
    ".treesync/engine/bin/git".to_string()
}
fn default_version() -> String {
    "v2.43.0".to_string()
}
fn default_win_version() -> String {
    "v2.43.0.windows.1".to_string()
}
fn default_repo_marker() -> String {
    ".git".to_string()
}
fn default_pidfiles_dir() -> String {
    ".treesync/pidfiles".to_string()
}
fn default_daemon_name() -> String {
    "git".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}
fn default_log_format() -> String {
    "compact".to_string()
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            exe_path: default_exe_path(),
            version: default_version(),
            win_version: default_win_version(),
            repo_marker: default_repo_marker(),
            pidfiles_dir: default_pidfiles_dir(),
            daemon_name: default_daemon_name(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from the default location, falling back to the
    /// built-in defaults when no config file exists yet.
    pub fn load_or_default() -> Result<Self> {
        let config_path = Self::default_config_path()?;
        if config_path.exists() {
            Self::load(&config_path)
        } else {
            Ok(Config::default())
        }
    }

    /// Load configuration from a specific file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file {}", path.display()))?;
        let config: Config = serde_yaml::from_str(&contents)
            .with_context(|| format!("failed to parse config file {}", path.display()))?;
        Ok(config)
    }

    /// Default configuration file location (XDG compliant)
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = config_dir().context("could not determine config directory")?;
        Ok(config_dir.join("treesync").join("config.yml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_home_relative() {
        let config = Config::default();
        assert!(!config.engine.exe_path.starts_with('/'));
        assert!(!config.engine.pidfiles_dir.starts_with('/'));
        assert_eq!(config.engine.repo_marker, ".git");
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn daemon_name_contains_no_separator() {
        let config = Config::default();
        assert!(!config.engine.daemon_name.contains('-'));
    }

    #[test]
    fn partial_yaml_fills_in_defaults() {
        let config: Config = serde_yaml::from_str("engine:\n  version: v2.50.0\n").unwrap();
        assert_eq!(config.engine.version, "v2.50.0");
        assert_eq!(config.engine.exe_path, default_exe_path());
        assert_eq!(config.logging.format, "compact");
    }

    #[test]
    fn empty_yaml_is_all_defaults() {
        let config: Config = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config.engine.daemon_name, "git");
        assert_eq!(config.engine.pidfiles_dir, ".treesync/pidfiles");
    }
}
