//! Core plugin types.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Extension of bundled plugin scripts.
pub const SCRIPT_EXTENSION: &str = "sh";

/// How a plugin gets its tool onto the machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InstallMethod {
    /// Installed through the system package manager, batched with the others.
    PackageManager,
    /// Downloads and installs a binary on its own.
    Binary,
    /// Anything else the script does by itself.
    #[default]
    Manual,
}

impl InstallMethod {
    /// Parse an `INSTALL_METHOD` header value.
    ///
    /// `apt` is accepted as an alias of `package-manager`.
    pub fn from_header(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "package-manager" | "package_manager" | "apt" => Some(Self::PackageManager),
            "binary" => Some(Self::Binary),
            "manual" => Some(Self::Manual),
            _ => None,
        }
    }

    /// Whether plugins with this method are installed in the batch.
    pub fn is_batchable(self) -> bool {
        matches!(self, Self::PackageManager)
    }

    /// Get the display name for this install method.
    pub fn display_name(self) -> &'static str {
        match self {
            Self::PackageManager => "package-manager",
            Self::Binary => "binary",
            Self::Manual => "manual",
        }
    }
}

impl std::fmt::Display for InstallMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Sub-command passed as the single positional argument to a plugin script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubCommand {
    Check,
    Install,
    Remove,
    PostInstall,
    SetupRepo,
}

impl SubCommand {
    /// The argument string the script receives.
    pub fn as_arg(self) -> &'static str {
        match self {
            Self::Check => "check",
            Self::Install => "install",
            Self::Remove => "remove",
            Self::PostInstall => "post_install",
            Self::SetupRepo => "setup_repo",
        }
    }
}

impl std::fmt::Display for SubCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_arg())
    }
}

/// A value a plugin needs from the user, declared with a `REQUIRES` header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequiredInput {
    /// Environment variable name; the dedup key across a run.
    pub name: String,
    /// Text shown when prompting.
    pub prompt: String,
    /// Shell command whose trimmed stdout pre-fills the prompt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_probe: Option<String>,
}

/// Identity and install recipe for one tool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginDescriptor {
    /// Stable slug derived from the script file name.
    pub id: String,
    /// Display name.
    pub name: String,
    /// One-line description.
    pub description: String,
    /// Core plugins install without being selected.
    pub is_core: bool,
    /// Install method.
    pub install_method: InstallMethod,
    /// Package to hand to the package manager. Present iff the method is
    /// [`InstallMethod::PackageManager`] once the descriptor is loaded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_name: Option<String>,
    /// Named step run after install.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub post_install_hook: Option<String>,
    /// Named step registering a package source before the index refresh.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repo_setup_hook: Option<String>,
    /// Inputs in declaration order.
    #[serde(default)]
    pub required_inputs: Vec<RequiredInput>,
    /// Category the script was loaded from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Staged, executable copy of the script.
    pub script_path: PathBuf,
}

impl PluginDescriptor {
    /// Label used in the plugin multi-select.
    pub fn label(&self) -> String {
        if self.description.is_empty() {
            self.display_name().to_string()
        } else {
            format!("{} - {}", self.display_name(), self.description)
        }
    }

    /// Whether the plugin declares a post-install step.
    pub fn has_post_install(&self) -> bool {
        self.post_install_hook.is_some()
    }

    /// Whether the plugin declares a repository setup step.
    pub fn has_repo_setup(&self) -> bool {
        self.repo_setup_hook.is_some()
    }

    /// Display name, falling back to the id for scripts without a `NAME` header.
    pub fn display_name(&self) -> &str {
        if self.name.is_empty() {
            &self.id
        } else {
            &self.name
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_install_method_from_header() {
        assert_eq!(InstallMethod::from_header("package-manager"), Some(InstallMethod::PackageManager));
        assert_eq!(InstallMethod::from_header("apt"), Some(InstallMethod::PackageManager));
        assert_eq!(InstallMethod::from_header(" Binary "), Some(InstallMethod::Binary));
        assert_eq!(InstallMethod::from_header("manual"), Some(InstallMethod::Manual));
        assert_eq!(InstallMethod::from_header("flatpak"), None);
    }

    #[test]
    fn test_only_package_manager_is_batchable() {
        assert!(InstallMethod::PackageManager.is_batchable());
        assert!(!InstallMethod::Binary.is_batchable());
        assert!(!InstallMethod::Manual.is_batchable());
    }

    #[test]
    fn test_subcommand_args() {
        assert_eq!(SubCommand::SetupRepo.as_arg(), "setup_repo");
        assert_eq!(SubCommand::PostInstall.to_string(), "post_install");
    }

    #[test]
    fn test_display_name_falls_back_to_id() {
        let plugin = PluginDescriptor {
            id: "jq".to_string(),
            name: String::new(),
            description: String::new(),
            is_core: false,
            install_method: InstallMethod::Manual,
            package_name: None,
            post_install_hook: None,
            repo_setup_hook: None,
            required_inputs: Vec::new(),
            category: None,
            script_path: PathBuf::from("/tmp/jq.sh"),
        };
        assert_eq!(plugin.display_name(), "jq");
        assert_eq!(plugin.label(), "jq");
    }
}
