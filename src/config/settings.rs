//! Application settings and paths.
//!
//! Manages XDG-compliant paths for configuration and data.

use crate::error::{ConfigError, ConfigResult};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::Duration;

/// Global paths singleton.
static PATHS: OnceLock<Paths> = OnceLock::new();

/// Application directory paths following the XDG Base Directory Specification.
#[derive(Debug, Clone)]
pub struct Paths {
    /// Configuration directory (~/.config/infraprobe)
    pub config_dir: PathBuf,
    /// Data directory (~/.local/share/infraprobe)
    pub data_dir: PathBuf,
}

impl Paths {
    /// Get the global paths instance, creating the directories on first use.
    pub fn get() -> ConfigResult<&'static Paths> {
        if let Some(paths) = PATHS.get() {
            return Ok(paths);
        }
        let paths = Self::new()?;
        Ok(PATHS.get_or_init(|| paths))
    }

    /// Initialize paths using XDG directories.
    fn new() -> ConfigResult<Self> {
        let project = ProjectDirs::from("com", "infraprobe", "infraprobe")
            .ok_or(ConfigError::DirectoryNotFound)?;

        let paths = Self {
            config_dir: project.config_dir().to_path_buf(),
            data_dir: project.data_dir().to_path_buf(),
        };

        fs::create_dir_all(&paths.config_dir)?;
        fs::create_dir_all(&paths.data_dir)?;

        Ok(paths)
    }

    /// Get the path to the settings file.
    pub fn settings_file(&self) -> PathBuf {
        self.config_dir.join("settings.json")
    }

    /// Get the path to the run history directory.
    pub fn runs_dir(&self) -> PathBuf {
        self.data_dir.join("runs")
    }
}

/// Application-wide settings, used where a suite file or flag is silent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppSettings {
    /// Cloud region instances are looked up in.
    pub default_region: String,
    /// Probe timeout in milliseconds.
    pub default_timeout_ms: u64,
    /// Port probed when none is given.
    pub default_port: String,
    /// Provisioning binary (`terraform` or `terragrunt`).
    pub provision_binary: String,
    /// AWS command line binary.
    pub aws_binary: String,
    /// Named AWS profile, if any.
    pub aws_profile: Option<String>,
    /// Auto-save suite runs to the history.
    pub auto_save_runs: bool,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            default_region: "eu-north-1".to_string(),
            default_timeout_ms: 2000,
            default_port: "5432".to_string(),
            provision_binary: "terragrunt".to_string(),
            aws_binary: "aws".to_string(),
            aws_profile: None,
            auto_save_runs: true,
        }
    }
}

impl AppSettings {
    /// Load settings from the default location, falling back to defaults.
    pub fn load() -> ConfigResult<Self> {
        let file = Paths::get()?.settings_file();

        if !file.exists() {
            return Ok(Self::default());
        }

        Self::load_from(&file)
    }

    /// Load settings from a specific file.
    pub fn load_from(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::ReadFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;

        serde_json::from_str(&content).map_err(|e| ConfigError::InvalidFormat(e.to_string()))
    }

    /// Save settings to a specific file.
    pub fn save_to(&self, path: &Path) -> ConfigResult<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content).map_err(|e| ConfigError::WriteFailed {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    pub fn default_timeout(&self) -> Duration {
        Duration::from_millis(self.default_timeout_ms)
    }
}
