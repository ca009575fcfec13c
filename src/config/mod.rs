//! Configuration management for Sound Menu
//!
//! Handles loading the optional YAML configuration file. Every
//! field has a default so a missing file is a valid configuration.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tokio::fs;
use tracing::{debug, warn};

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct AppConfig {
    #[serde(default)]
    pub tool: ToolConfig,
    #[serde(default = "default_refresh_interval_secs")]
    pub refresh_interval_secs: u64,
    /// Favorites file; relative paths resolve against the config directory
    pub favorites_file: Option<PathBuf>,
    #[serde(default)]
    pub tray: TrayConfig,
}

/// External audio tool location
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ToolConfig {
    #[serde(default = "default_tool_path")]
    pub path: PathBuf,
    /// Run through `cmd /c` so the dump reaches our stdout pipe
    #[serde(default = "default_use_shell")]
    pub use_shell: bool,
}

/// System tray UI configuration
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct TrayConfig {
    #[serde(default = "default_tooltip")]
    pub tooltip: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            tool: ToolConfig::default(),
            refresh_interval_secs: default_refresh_interval_secs(),
            favorites_file: None,
            tray: TrayConfig::default(),
        }
    }
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            path: default_tool_path(),
            use_shell: default_use_shell(),
        }
    }
}

impl Default for TrayConfig {
    fn default() -> Self {
        Self {
            tooltip: default_tooltip(),
        }
    }
}

impl AppConfig {
    /// Load configuration from file
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: AppConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("Failed to parse YAML config: {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Load configuration, falling back to defaults when the file is
    /// missing or invalid
    pub async fn load_or_default(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        if !path.exists() {
            debug!("No config file at {}, using defaults", path.display());
            return Self::default();
        }
        match Self::load(path).await {
            Ok(config) => config,
            Err(e) => {
                warn!("Invalid config, using defaults: {:#}", e);
                Self::default()
            }
        }
    }

    /// Validate configuration for correctness and consistency
    pub fn validate(&self) -> Result<()> {
        if self.refresh_interval_secs == 0 {
            anyhow::bail!("refresh_interval_secs must be at least 1");
        }
        if self.tool.path.as_os_str().is_empty() {
            anyhow::bail!("tool.path cannot be empty");
        }
        Ok(())
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    /// Favorites file location, relative paths taken from `base_dir`
    pub fn favorites_path(&self, base_dir: &Path) -> PathBuf {
        match &self.favorites_file {
            Some(path) if path.is_absolute() => path.clone(),
            Some(path) => base_dir.join(path),
            None => base_dir.join(DEFAULT_FAVORITES_FILE),
        }
    }
}

/// Favorites file name used by every release so far
pub const DEFAULT_FAVORITES_FILE: &str = "config.properties";

// Default value functions
fn default_refresh_interval_secs() -> u64 { 30 }
fn default_tool_path() -> PathBuf { PathBuf::from("SoundVolumeView.exe") }
fn default_use_shell() -> bool { cfg!(windows) }
fn default_tooltip() -> String { "Sound Menu".to_string() }

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults_from_empty_yaml() {
        let config: AppConfig = serde_yaml::from_str("{}").unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.refresh_interval(), Duration::from_secs(30));
        assert_eq!(config.tool.path, PathBuf::from("SoundVolumeView.exe"));
    }

    #[test]
    fn test_partial_yaml() {
        let yaml = "tool:\n  path: C:/Tools/SoundVolumeView.exe\nrefresh_interval_secs: 10\n";
        let config: AppConfig = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.tool.path, PathBuf::from("C:/Tools/SoundVolumeView.exe"));
        assert_eq!(config.tool.use_shell, cfg!(windows));
        assert_eq!(config.refresh_interval_secs, 10);
        assert_eq!(config.tray.tooltip, "Sound Menu");
    }

    #[test]
    fn test_validate_rejects_zero_interval() {
        let config = AppConfig {
            refresh_interval_secs: 0,
            ..AppConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_favorites_path_resolution() {
        let base = Path::new("base");
        let mut config = AppConfig::default();
        assert_eq!(config.favorites_path(base), base.join("config.properties"));

        config.favorites_file = Some(PathBuf::from("favs.properties"));
        assert_eq!(config.favorites_path(base), base.join("favs.properties"));
    }

    #[tokio::test]
    async fn test_load_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sound-menu.yaml");
        fs::write(&path, "refresh_interval_secs: 5\nfavorites_file: favs.properties\n")
            .await
            .unwrap();

        let config = AppConfig::load(&path).await.unwrap();
        assert_eq!(config.refresh_interval_secs, 5);
        assert_eq!(config.favorites_file, Some(PathBuf::from("favs.properties")));
        assert_eq!(config.tool, ToolConfig::default());
    }

    #[tokio::test]
    async fn test_load_or_default_on_invalid_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("sound-menu.yaml");
        fs::write(&path, "refresh_interval_secs: [not a number]").await.unwrap();

        assert_eq!(AppConfig::load_or_default(&path).await, AppConfig::default());
    }
}
