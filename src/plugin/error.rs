//! Plugin loading error types.

use std::path::PathBuf;
use thiserror::Error;

/// Result type for plugin operations.
pub type PluginResult<T> = Result<T, PluginError>;

/// Errors that can occur while loading the plugin catalog.
///
/// Every variant aborts the whole load.
#[derive(Debug, Error)]
pub enum PluginError {
    /// The staging directory could not be created.
    #[error("Failed to create staging directory: {0}")]
    StagingDir(#[source] std::io::Error),

    /// Requested category does not exist in the source.
    #[error("Plugin category not found: {0}")]
    CategoryNotFound(String),

    /// The category directory could not be listed.
    #[error("Failed to read plugin directory {path}: {source}")]
    Enumerate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A script could not be read or is not valid UTF-8.
    #[error("Failed to read plugin script {name}: {message}")]
    Read { name: String, message: String },

    /// A script could not be written to the staging directory.
    #[error("Failed to stage plugin script {name}: {source}")]
    Stage {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// A descriptor violates a load-time rule.
    #[error("Invalid plugin '{id}': {reason}")]
    Validation { id: String, reason: String },

    /// Two scripts map to the same id.
    #[error("Duplicate plugin id '{0}'")]
    DuplicateId(String),
}
