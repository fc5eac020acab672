//! The seam between the orchestrator and the processes it starts.

use thiserror::Error;

use super::inputs::InputValues;
use crate::core::{ExecutionResult, PackageManager, ScriptExecutor};
use crate::plugin::{PluginDescriptor, SubCommand};

/// A step that did not succeed, with its captured error text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct StepFailure(pub String);

impl StepFailure {
    /// Create a failure from any message.
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Outcome of one step.
pub type StepResult = Result<(), StepFailure>;

/// Line callback for streamed steps: `(line, is_stderr)`.
pub type LineCallback<'a> = &'a (dyn Fn(&str, bool) + Sync);

/// Runs the individual steps of an installation.
pub trait StepRunner {
    /// Run a plugin sub-command with buffered output.
    fn run_captured(
        &self,
        plugin: &PluginDescriptor,
        sub: SubCommand,
        env: &InputValues,
    ) -> StepResult;

    /// Run a plugin sub-command, reporting output lines as they arrive.
    fn run_streamed(
        &self,
        plugin: &PluginDescriptor,
        sub: SubCommand,
        env: &InputValues,
        on_line: LineCallback<'_>,
    ) -> StepResult;

    /// Refresh the package index.
    fn update_index(&self) -> StepResult;

    /// Install `packages` in a single package-manager invocation.
    fn batch_install(&self, packages: &[String]) -> StepResult;

    /// Whether the plugin reports its tool as installed.
    fn check(&self, plugin: &PluginDescriptor) -> bool {
        self.run_captured(plugin, SubCommand::Check, &InputValues::new()).is_ok()
    }
}

/// Runs steps as real subprocesses.
#[derive(Debug, Clone)]
pub struct SystemRunner {
    executor: ScriptExecutor,
    package_manager: PackageManager,
}

impl SystemRunner {
    /// Create a runner from its two backends.
    pub fn new(executor: ScriptExecutor, package_manager: PackageManager) -> Self {
        Self { executor, package_manager }
    }

    /// The package manager backend.
    pub fn package_manager(&self) -> &PackageManager {
        &self.package_manager
    }
}

fn outcome(what: &str, result: std::io::Result<ExecutionResult>) -> StepResult {
    match result {
        Ok(result) if result.success() => Ok(()),
        Ok(result) => Err(StepFailure(result.failure_message())),
        Err(e) => Err(StepFailure(format!("Failed to start {what}: {e}"))),
    }
}

impl StepRunner for SystemRunner {
    fn run_captured(
        &self,
        plugin: &PluginDescriptor,
        sub: SubCommand,
        env: &InputValues,
    ) -> StepResult {
        outcome(&plugin.id, self.executor.run_captured(&plugin.script_path, sub, env))
    }

    fn run_streamed(
        &self,
        plugin: &PluginDescriptor,
        sub: SubCommand,
        env: &InputValues,
        on_line: LineCallback<'_>,
    ) -> StepResult {
        outcome(
            &plugin.id,
            self.executor.run_streamed(&plugin.script_path, sub, env, |line, is_stderr| {
                on_line(line, is_stderr);
            }),
        )
    }

    fn update_index(&self) -> StepResult {
        outcome(&self.package_manager.kind().display_name(), self.package_manager.update())
    }

    fn batch_install(&self, packages: &[String]) -> StepResult {
        outcome(&self.package_manager.kind().display_name(), self.package_manager.install(packages))
    }
}
