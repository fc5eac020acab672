//! System package manager backend.
//!
//! Batch installs and index refreshes go through `nala` when it is available
//! and `apt-get` otherwise. A custom program with the same
//! `update` / `install -y <pkgs>` interface can be configured instead.

use std::path::{Path, PathBuf};
use std::process::Command as ProcessCommand;

use super::executor::{capture, ExecutionResult};

/// Which package manager program to drive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PackageManagerKind {
    Nala,
    AptGet,
    /// Any program accepting `update` and `install -y <pkgs>`.
    Custom(PathBuf),
}

impl PackageManagerKind {
    /// Resolve a configured value (`auto`, `nala`, `apt-get`, or a path).
    ///
    /// `auto` picks `nala` when it can be found on `PATH`.
    pub fn resolve(configured: &str) -> Self {
        match configured.trim() {
            "" | "auto" => {
                if find_in_path("nala").is_some() {
                    Self::Nala
                } else {
                    Self::AptGet
                }
            }
            "nala" => Self::Nala,
            "apt-get" | "apt" => Self::AptGet,
            other => Self::Custom(PathBuf::from(other)),
        }
    }

    /// Program to invoke.
    pub fn program(&self) -> &Path {
        match self {
            Self::Nala => Path::new("nala"),
            Self::AptGet => Path::new("apt-get"),
            Self::Custom(path) => path,
        }
    }

    /// Get the display name.
    pub fn display_name(&self) -> String {
        match self {
            Self::Nala => "nala".to_string(),
            Self::AptGet => "apt-get".to_string(),
            Self::Custom(path) => path.display().to_string(),
        }
    }
}

/// Runs package-manager commands, optionally through sudo.
#[derive(Debug, Clone)]
pub struct PackageManager {
    kind: PackageManagerKind,
    use_sudo: bool,
}

impl PackageManager {
    /// Create a package manager backend.
    pub fn new(kind: PackageManagerKind, use_sudo: bool) -> Self {
        Self { kind, use_sudo }
    }

    /// The resolved program.
    pub fn kind(&self) -> &PackageManagerKind {
        &self.kind
    }

    /// Whether commands are prefixed with sudo.
    pub fn uses_sudo(&self) -> bool {
        self.use_sudo
    }

    /// Build the process for `[sudo] <program> <args..>`.
    pub fn command<I, S>(&self, args: I) -> ProcessCommand
    where
        I: IntoIterator<Item = S>,
        S: AsRef<std::ffi::OsStr>,
    {
        let mut cmd = if self.use_sudo {
            let mut cmd = ProcessCommand::new("sudo");
            cmd.arg(self.kind.program());
            cmd
        } else {
            ProcessCommand::new(self.kind.program())
        };
        cmd.args(args);
        cmd
    }

    /// Refresh the package index.
    pub fn update(&self) -> std::io::Result<ExecutionResult> {
        tracing::debug!(manager = %self.kind.display_name(), "Updating package index");
        capture(&mut self.command(["update"]))
    }

    /// Install all `packages` in one invocation.
    pub fn install(&self, packages: &[String]) -> std::io::Result<ExecutionResult> {
        tracing::debug!(manager = %self.kind.display_name(), ?packages, "Batch install");
        let mut cmd = self.command(["install", "-y"]);
        cmd.args(packages);
        capture(&mut cmd)
    }

    /// The command line `install` would run, for plan display.
    pub fn install_command_line(&self, packages: &[String]) -> String {
        let mut parts = Vec::new();
        if self.use_sudo {
            parts.push("sudo".to_string());
        }
        parts.push(self.kind.display_name());
        parts.push("install".to_string());
        parts.push("-y".to_string());
        parts.extend(packages.iter().cloned());
        parts.join(" ")
    }
}

/// Make sure sudo credentials are cached before any plugin work starts.
///
/// A no-op when `use_sudo` is off or the process already runs as root.
/// `sudo -v` inherits the terminal so the password prompt is visible.
pub fn ensure_privileges(use_sudo: bool) -> anyhow::Result<()> {
    if !use_sudo || is_root() {
        return Ok(());
    }

    tracing::info!("Requesting sudo privileges");
    let status = ProcessCommand::new("sudo")
        .arg("-v")
        .status()
        .map_err(|e| anyhow::anyhow!("Failed to run sudo: {e}"))?;

    if !status.success() {
        anyhow::bail!("sudo authentication failed");
    }
    Ok(())
}

fn is_root() -> bool {
    capture(ProcessCommand::new("id").arg("-u"))
        .map(|r| r.success() && r.stdout.trim() == "0")
        .unwrap_or(false)
}

/// Locate an executable on `PATH`.
pub fn find_in_path(program: &str) -> Option<PathBuf> {
    let path = std::env::var_os("PATH")?;
    std::env::split_paths(&path).map(|dir| dir.join(program)).find(|candidate| is_executable(candidate))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;
    path.metadata().map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0).unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
