//! Configuration management for Itamae.
//!
//! Handles loading configuration from TOML files.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

/// Name of the project-local config file.
pub const LOCAL_CONFIG_FILE: &str = ".itamae.toml";

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Plugin script location
    pub plugins: PluginsConfig,

    /// Run log settings
    pub logging: LoggingConfig,

    /// Dashboard settings
    pub ui: UiConfig,
}

/// General application settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Prefix package-manager commands with sudo and request it up front
    pub use_sudo: bool,

    /// `auto`, `nala`, `apt-get`, or a path to a compatible program
    pub package_manager: String,

    /// Interpreter used to run plugin scripts
    pub shell: String,

    /// Categories installed without a selection prompt
    pub auto_install_categories: Vec<String>,
}

/// Where plugin scripts are read from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PluginsConfig {
    /// Directory replacing the bundled scripts (`~` and `$VARS` are expanded)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scripts_dir: Option<String>,
}

/// Run log settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log directory override
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dir: Option<PathBuf>,

    /// Number of logs kept by `itamae logs --clean`
    pub keep: usize,
}

/// Dashboard settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UiConfig {
    /// Color theme name (built-in: tokyo-night, default)
    pub theme: String,

    /// Whether to use the interactive dashboard when a terminal is attached
    pub dashboard: bool,

    /// Event poll interval in milliseconds
    pub tick_rate_ms: u64,
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// Looks for config in:
    /// 1. `.itamae.toml` in current directory
    /// 2. `~/.config/itamae/config.toml`
    /// 3. Falls back to defaults
    pub fn load() -> anyhow::Result<Self> {
        match Self::locate() {
            Some(path) => Self::load_from_file(&path),
            None => Ok(Self::default()),
        }
    }

    /// The config file `load` would read, if any exists.
    pub fn locate() -> Option<PathBuf> {
        let local_config = PathBuf::from(LOCAL_CONFIG_FILE);
        if local_config.exists() {
            return Some(local_config);
        }

        Self::global_path().filter(|p| p.exists())
    }

    /// Load configuration from a specific file.
    pub fn load_from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Invalid config file {}", path.display()))?;
        tracing::debug!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Render as TOML.
    pub fn to_toml(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Get the config directory path.
    pub fn config_dir() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("itamae"))
    }

    /// Path of the global config file.
    pub fn global_path() -> Option<PathBuf> {
        Self::config_dir().map(|d| d.join("config.toml"))
    }

    /// Configured scripts directory with `~` and environment variables expanded.
    pub fn scripts_dir(&self) -> Option<PathBuf> {
        let raw = self.plugins.scripts_dir.as_deref()?;
        let expanded = shellexpand::full(raw).map_or_else(
            |e| {
                tracing::warn!(error = %e, "Could not expand scripts_dir, using it verbatim");
                raw.to_string()
            },
            |s| s.into_owned(),
        );
        Some(PathBuf::from(expanded))
    }

    /// Directory holding run logs.
    pub fn log_dir(&self) -> PathBuf {
        self.logging.dir.clone().unwrap_or_else(|| std::env::temp_dir().join("itamae-logs"))
    }

    /// Whether a category installs all of its plugins without a prompt.
    pub fn is_auto_install(&self, category: &str) -> bool {
        self.general.auto_install_categories.iter().any(|c| c == category)
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            use_sudo: true,
            package_manager: "auto".to_string(),
            shell: "bash".to_string(),
            auto_install_categories: vec!["core".to_string(), "essentials".to_string()],
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { dir: None, keep: 20 }
    }
}

impl Default for UiConfig {
    fn default() -> Self {
        Self { theme: "tokyo-night".to_string(), dashboard: true, tick_rate_ms: 100 }
    }
}
