//! Plugin catalog loading.
//!
//! Loading parses every script from a [`ScriptSource`], stages each one as an
//! executable file in a private temporary directory, and hands back a
//! [`LoadedCatalog`] that owns that directory. Dropping the catalog (or
//! calling [`LoadedCatalog::cleanup`]) removes the directory.

use std::collections::HashSet;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::{Builder, TempDir};

use super::error::{PluginError, PluginResult};
use super::parser::parse_header;
use super::source::{ScriptEntry, ScriptSource};
use super::types::{InstallMethod, PluginDescriptor, SCRIPT_EXTENSION};

/// Prefix of the staging directory created for each load.
pub const STAGING_PREFIX: &str = "itamae-scripts-";

/// Plugins staged for one run.
#[derive(Debug)]
pub struct LoadedCatalog {
    plugins: Vec<PluginDescriptor>,
    staging: TempDir,
}

impl LoadedCatalog {
    /// Loaded plugins in source order.
    pub fn plugins(&self) -> &[PluginDescriptor] {
        &self.plugins
    }

    /// Directory holding the staged scripts.
    pub fn staging_dir(&self) -> &Path {
        self.staging.path()
    }

    /// Find a plugin by id.
    pub fn get(&self, id: &str) -> Option<&PluginDescriptor> {
        self.plugins.iter().find(|p| p.id == id)
    }

    /// Remove the staged scripts now, reporting failures.
    pub fn cleanup(self) -> std::io::Result<()> {
        let path = self.staging.path().to_path_buf();
        self.staging.close()?;
        tracing::debug!(path = ?path, "Removed plugin staging directory");
        Ok(())
    }
}

/// Load plugins from `source`, optionally scoped to one category.
///
/// Any read, stage, or validation failure aborts the load; the partially
/// populated staging directory is removed before the error is returned.
pub fn load_plugins(
    source: &dyn ScriptSource,
    category: Option<&str>,
) -> PluginResult<LoadedCatalog> {
    let staging =
        Builder::new().prefix(STAGING_PREFIX).tempdir().map_err(PluginError::StagingDir)?;

    let entries = source.entries(category)?;
    let mut plugins = Vec::with_capacity(entries.len());
    let mut seen = HashSet::new();

    for entry in &entries {
        let id = plugin_id(&entry.file_name);
        if !seen.insert(id.clone()) {
            return Err(PluginError::DuplicateId(id));
        }
        plugins.push(process_entry(entry, staging.path())?);
    }

    tracing::debug!(
        count = plugins.len(),
        category = category.unwrap_or("*"),
        staging = ?staging.path(),
        "Loaded plugins"
    );

    Ok(LoadedCatalog { plugins, staging })
}

/// Parse, validate, and stage one script.
fn process_entry(entry: &ScriptEntry, staging_dir: &Path) -> PluginResult<PluginDescriptor> {
    let content = std::str::from_utf8(&entry.content).map_err(|e| PluginError::Read {
        name: entry.file_name.clone(),
        message: e.to_string(),
    })?;

    let id = plugin_id(&entry.file_name);
    let mut plugin = descriptor_from_header(&id, content)?;
    plugin.category = Some(entry.category.clone());

    let dest = staging_dir.join(&entry.file_name);
    stage_script(&dest, &entry.content)
        .map_err(|source| PluginError::Stage { name: entry.file_name.clone(), source })?;
    plugin.script_path = dest;

    Ok(plugin)
}

/// Build a validated descriptor from script text. `script_path` is left empty.
pub fn descriptor_from_header(id: &str, content: &str) -> PluginResult<PluginDescriptor> {
    let header = parse_header(content);
    let install_method = header.install_method.unwrap_or_default();

    let mut package_name = header.package_name;
    if !install_method.is_batchable() && package_name.is_some() {
        tracing::warn!(id, method = install_method.display_name(), "Ignoring PACKAGE_NAME");
        package_name = None;
    }

    let plugin = PluginDescriptor {
        id: id.to_string(),
        name: header.name,
        description: header.description,
        is_core: header.is_core,
        install_method,
        package_name,
        post_install_hook: header.post_install_hook,
        repo_setup_hook: header.repo_setup_hook,
        required_inputs: header.required_inputs,
        category: None,
        script_path: PathBuf::new(),
    };

    validate(&plugin)?;
    Ok(plugin)
}

/// Load-time rules a descriptor must satisfy.
pub fn validate(plugin: &PluginDescriptor) -> PluginResult<()> {
    let invalid = |reason: &str| PluginError::Validation {
        id: plugin.id.clone(),
        reason: reason.to_string(),
    };

    if plugin.id.is_empty() {
        return Err(invalid("empty id"));
    }

    match (plugin.install_method, &plugin.package_name) {
        (InstallMethod::PackageManager, None) => {
            Err(invalid("package-manager plugins must declare PACKAGE_NAME"))
        }
        (InstallMethod::PackageManager, Some(_)) => Ok(()),
        (_, Some(_)) => Err(invalid("PACKAGE_NAME is only valid for package-manager plugins")),
        (_, None) => {
            if plugin.has_repo_setup() {
                Err(invalid("REPO_SETUP is only valid for package-manager plugins"))
            } else {
                Ok(())
            }
        }
    }
}

/// Plugin id for a script file name: the name with its extension stripped.
pub fn plugin_id(file_name: &str) -> String {
    let suffix = format!(".{SCRIPT_EXTENSION}");
    file_name.strip_suffix(&suffix).unwrap_or(file_name).to_string()
}

#[cfg(unix)]
fn stage_script(dest: &Path, content: &[u8]) -> std::io::Result<()> {
    use std::os::unix::fs::OpenOptionsExt;

    let mut file =
        fs::OpenOptions::new().write(true).create_new(true).mode(0o755).open(dest)?;
    file.write_all(content)?;
    file.sync_all()
}

#[cfg(not(unix))]
fn stage_script(dest: &Path, content: &[u8]) -> std::io::Result<()> {
    let mut file = fs::OpenOptions::new().write(true).create_new(true).open(dest)?;
    file.write_all(content)?;
    file.sync_all()
}
