//! Plugin system for Itamae.
//!
//! A plugin is a shell script whose leading comment block declares what it
//! installs and how. The script itself accepts one sub-command
//! (`check`, `install`, `remove`, `post_install`, `setup_repo`) and reports
//! its outcome through the exit status.
//!
//! # Example Header
//!
//! ```text
//! #!/bin/bash
//! # NAME: ripgrep
//! # DESCRIPTION: Recursive grep that respects .gitignore
//! # OMAKASE: true
//! # INSTALL_METHOD: package-manager
//! # PACKAGE_NAME: ripgrep
//! ```

mod error;
mod parser;
mod registry;
mod source;
mod types;

pub use error::{PluginError, PluginResult};
pub use parser::{parse_header, parse_header_from, ParsedHeader};
pub use registry::{
    descriptor_from_header, load_plugins, plugin_id, validate, LoadedCatalog, STAGING_PREFIX,
};
pub use source::{BundledScripts, DirectorySource, ScriptEntry, ScriptSource};
pub use types::{InstallMethod, PluginDescriptor, RequiredInput, SubCommand, SCRIPT_EXTENSION};
