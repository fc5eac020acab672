//! Core functionality for Itamae.
//!
//! Configuration, subprocess execution, and the system package manager.

mod config;
mod executor;
mod package_manager;

pub use config::{Config, GeneralConfig, LoggingConfig, PluginsConfig, UiConfig, LOCAL_CONFIG_FILE};
pub use executor::{capture, probe, stream, ExecutionResult, ScriptExecutor};
pub use package_manager::{ensure_privileges, find_in_path, PackageManager, PackageManagerKind};
