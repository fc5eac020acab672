#![allow(clippy::needless_pass_by_value)]
#![allow(clippy::trivially_copy_pass_by_ref)]
#![allow(clippy::cast_possible_truncation)]

//! # Itamae
//!
//! Workstation provisioning from shell-script plugins.
//!
//! Each tool is a self-describing shell script whose leading comment lines
//! declare its name, install method, package name, hooks, and the inputs it
//! needs. Itamae loads a category of scripts, lets the user pick what to
//! install, batches package-manager installs into one transaction, runs the
//! rest individually, and reports progress on a live dashboard.
//!
//! ## Features
//!
//! - **Script plugins**: metadata lives in the script header, no manifest files
//! - **Batched installs**: repository setup, one index update, one package transaction
//! - **Shared inputs**: each required input is asked for once per run
//! - **Dashboard**: checklist, live log, and error pane in the terminal
//!
//! ## Quick Start
//!
//! ```bash
//! # Install the core category
//! itamae install --category core
//!
//! # Pick from every category
//! itamae custom
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
// Allow common patterns that are intentional in this codebase
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::doc_markdown)]
#![allow(clippy::manual_let_else)]
#![allow(clippy::return_self_not_must_use)]
#![allow(clippy::struct_excessive_bools)]
#![allow(clippy::option_if_let_else)]
#![allow(clippy::significant_drop_tightening)]
#![allow(clippy::missing_fields_in_debug)]
#![allow(clippy::too_many_lines)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::redundant_closure_for_method_calls)]

pub mod app;
pub mod core;
pub mod forms;
pub mod install;
pub mod plugin;
pub mod tui;

// Re-export commonly used types
pub use app::{InstallOptions, InstallOutcome, Session};
pub use core::Config;
pub use install::{InstallPlan, InstallSummary, Orchestrator, ProgressEvent};
pub use plugin::{load_plugins, PluginDescriptor, PluginError, PluginResult};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name
pub const APP_NAME: &str = "itamae";
