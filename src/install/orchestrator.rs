//! Installation orchestrator.
//!
//! Drives a plan through its phases on one thread:
//!
//! ```text
//! repo_setup -> package_manager_update -> batch_install -> individual_install -> summary
//! ```
//!
//! Repository setup and index update failures skip straight to the summary.
//! A failed batch fails its members but the individual phase still runs.
//! Post-install failures are warnings and never flip a plugin to failed.

use std::collections::HashSet;
use std::thread::{self, JoinHandle};

use super::events::{EventEmitter, InstallSummary, LogLevel, Phase, ProgressEvent};
use super::inputs::InputValues;
use super::planner::InstallPlan;
use super::runner::{StepFailure, StepRunner};
use crate::plugin::{PluginDescriptor, SubCommand};

/// Runs an [`InstallPlan`], emitting progress events.
#[derive(Debug)]
pub struct Orchestrator<R> {
    runner: R,
    emitter: EventEmitter,
    inputs: InputValues,
}

/// Bookkeeping for one run.
#[derive(Debug, Default)]
struct RunState {
    summary: InstallSummary,
    started: HashSet<String>,
}

impl RunState {
    fn is_started(&self, plugin: &PluginDescriptor) -> bool {
        self.started.contains(&plugin.id)
    }
}

impl<R: StepRunner> Orchestrator<R> {
    /// Create an orchestrator.
    pub fn new(runner: R, emitter: EventEmitter, inputs: InputValues) -> Self {
        Self { runner, emitter, inputs }
    }

    /// Run every phase of `plan` and return the summary.
    ///
    /// The last event emitted is always `Summary`.
    pub fn run(&self, plan: &InstallPlan) -> InstallSummary {
        tracing::info!(
            package_manager = plan.package_manager.len(),
            individual = plan.individual.len(),
            "Starting installation"
        );

        let mut state = RunState::default();

        if self.prepare_repositories(plan, &mut state) {
            self.install_batch(plan, &mut state);
            self.install_individual(plan, &mut state);
        }

        let summary = state.summary;
        tracing::info!(
            succeeded = summary.successful.len(),
            failed = summary.failed.len(),
            "Installation finished"
        );
        self.emitter.emit(ProgressEvent::Summary(summary.clone()));
        summary
    }

    /// Repository setup and index refresh. Returns `false` when the run
    /// must skip to the summary.
    fn prepare_repositories(&self, plan: &InstallPlan, state: &mut RunState) -> bool {
        let hooks: Vec<&PluginDescriptor> = plan.repo_setup().collect();
        if hooks.is_empty() {
            return true;
        }

        self.phase_start(Phase::RepoSetup, hooks.len());
        for plugin in hooks {
            self.start(plugin, Phase::RepoSetup, state);
            match self.runner.run_captured(plugin, SubCommand::SetupRepo, &self.inputs) {
                Ok(()) => self.emitter.log(
                    LogLevel::Success,
                    Some(&plugin.id),
                    format!("Repository configured for {}", plugin.display_name()),
                ),
                Err(StepFailure(message)) => {
                    self.error(Some(plugin), Phase::RepoSetup, &message);
                    self.fail(plugin, &message, state);
                    let reason =
                        format!("aborted: repository setup for {} failed", plugin.display_name());
                    self.abort_package_manager(plan, &reason, state);
                    return false;
                }
            }
        }
        self.phase_complete(Phase::RepoSetup);

        self.phase_start(Phase::PackageManagerUpdate, 1);
        if let Err(StepFailure(message)) = self.runner.update_index() {
            self.error(None, Phase::PackageManagerUpdate, &message);
            let reason = format!("aborted: package index update failed: {message}");
            self.abort_package_manager(plan, &reason, state);
            return false;
        }
        self.emitter.log(LogLevel::Success, None, "Package index updated");
        self.phase_complete(Phase::PackageManagerUpdate);

        true
    }

    /// Fail every package-manager plugin that has no outcome yet.
    ///
    /// Plugins that were started get a `PackageComplete`; the rest appear
    /// only in the summary.
    fn abort_package_manager(&self, plan: &InstallPlan, reason: &str, state: &mut RunState) {
        for plugin in &plan.package_manager {
            if state.summary.contains(&plugin.id) {
                continue;
            }
            if state.is_started(plugin) {
                self.fail(plugin, reason, state);
            } else {
                state.summary.record_failure(plugin, reason);
            }
        }
    }

    fn install_batch(&self, plan: &InstallPlan, state: &mut RunState) {
        if plan.package_manager.is_empty() {
            return;
        }

        self.phase_start(Phase::BatchInstall, plan.package_manager.len());
        for plugin in &plan.package_manager {
            if !state.is_started(plugin) {
                self.start(plugin, Phase::BatchInstall, state);
            }
        }

        let packages = plan.package_names();
        self.emitter.log(
            LogLevel::Info,
            None,
            format!("Installing {} package(s): {}", packages.len(), packages.join(" ")),
        );

        match self.runner.batch_install(&packages) {
            Ok(()) => {
                for plugin in &plan.package_manager {
                    if plugin.has_post_install() {
                        self.post_install(plugin);
                    }
                    self.succeed(plugin, state);
                }
            }
            Err(StepFailure(message)) => {
                self.error(None, Phase::BatchInstall, &message);
                for plugin in &plan.package_manager {
                    self.fail(plugin, &message, state);
                }
            }
        }

        self.phase_complete(Phase::BatchInstall);
    }

    fn install_individual(&self, plan: &InstallPlan, state: &mut RunState) {
        if plan.individual.is_empty() {
            return;
        }

        self.phase_start(Phase::IndividualInstall, plan.individual.len());
        for plugin in &plan.individual {
            self.start(plugin, Phase::IndividualInstall, state);

            let emitter = &self.emitter;
            let id = plugin.id.as_str();
            let on_line = move |line: &str, is_stderr: bool| {
                let level = if is_stderr { LogLevel::Warning } else { LogLevel::Info };
                emitter.log(level, Some(id), line);
            };

            match self.runner.run_streamed(plugin, SubCommand::Install, &self.inputs, &on_line) {
                Ok(()) => {
                    if plugin.has_post_install() {
                        self.post_install(plugin);
                    }
                    self.succeed(plugin, state);
                }
                Err(StepFailure(message)) => {
                    self.error(Some(plugin), Phase::IndividualInstall, &message);
                    self.fail(plugin, &message, state);
                }
            }
        }
        self.phase_complete(Phase::IndividualInstall);
    }

    /// Best-effort post-install step.
    fn post_install(&self, plugin: &PluginDescriptor) {
        match self.runner.run_captured(plugin, SubCommand::PostInstall, &self.inputs) {
            Ok(()) => self.emitter.log(
                LogLevel::Success,
                Some(&plugin.id),
                format!("Post-install complete for {}", plugin.display_name()),
            ),
            Err(StepFailure(message)) => {
                tracing::warn!(plugin = %plugin.id, error = %message, "Post-install failed");
                self.emitter.log(
                    LogLevel::Warning,
                    Some(&plugin.id),
                    format!("Post-install for {} failed: {message}", plugin.display_name()),
                );
            }
        }
    }

    fn phase_start(&self, phase: Phase, count: usize) {
        tracing::debug!(%phase, count, "Phase started");
        self.emitter.emit(ProgressEvent::PhaseStart { phase, count });
    }

    fn phase_complete(&self, phase: Phase) {
        tracing::debug!(%phase, "Phase complete");
        self.emitter.emit(ProgressEvent::PhaseComplete { phase });
    }

    fn start(&self, plugin: &PluginDescriptor, phase: Phase, state: &mut RunState) {
        state.started.insert(plugin.id.clone());
        self.emitter.emit(ProgressEvent::PackageStart { id: plugin.id.clone(), phase });
    }

    fn succeed(&self, plugin: &PluginDescriptor, state: &mut RunState) {
        state.summary.record_success(plugin);
        self.emitter.emit(ProgressEvent::PackageComplete {
            id: plugin.id.clone(),
            success: true,
            error: None,
        });
    }

    fn fail(&self, plugin: &PluginDescriptor, message: &str, state: &mut RunState) {
        state.summary.record_failure(plugin, message);
        self.emitter.emit(ProgressEvent::PackageComplete {
            id: plugin.id.clone(),
            success: false,
            error: Some(message.to_string()),
        });
    }

    fn error(&self, plugin: Option<&PluginDescriptor>, phase: Phase, message: &str) {
        self.emitter.emit(ProgressEvent::Error {
            package_id: plugin.map(|p| p.id.clone()),
            phase,
            message: message.to_string(),
        });
    }
}

impl<R: StepRunner + Send + 'static> Orchestrator<R> {
    /// Run `plan` on a background thread.
    ///
    /// Events keep flowing to the receiver while the caller renders them.
    pub fn spawn(self, plan: InstallPlan) -> std::io::Result<JoinHandle<InstallSummary>> {
        thread::Builder::new().name("itamae-install".to_string()).spawn(move || self.run(&plan))
    }
}
