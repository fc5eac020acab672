//! Uninstall flow.
//!
//! Each plugin is asked whether its tool is installed (`check`). Only those
//! answering yes are removed; the rest are skipped without counting as errors.

use serde::Serialize;

use super::inputs::InputValues;
use super::runner::{StepFailure, StepRunner};
use crate::plugin::{PluginDescriptor, SubCommand};

/// What happened to one plugin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UninstallOutcome {
    NotInstalled,
    Removed,
    Failed(String),
}

/// Aggregate result of an uninstall run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UninstallReport {
    pub removed: Vec<String>,
    pub failed: Vec<(String, String)>,
    pub skipped: Vec<String>,
}

impl UninstallReport {
    /// Whether every attempted removal succeeded.
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Remove every installed plugin in `plugins`, in order.
///
/// `on_outcome` is called after each plugin is handled.
pub fn uninstall<R, F>(
    runner: &R,
    plugins: &[PluginDescriptor],
    mut on_outcome: F,
) -> UninstallReport
where
    R: StepRunner + ?Sized,
    F: FnMut(&PluginDescriptor, &UninstallOutcome),
{
    let mut report = UninstallReport::default();

    for plugin in plugins {
        let outcome = if !runner.check(plugin) {
            tracing::debug!(plugin = %plugin.id, "Not installed, skipping");
            report.skipped.push(plugin.id.clone());
            UninstallOutcome::NotInstalled
        } else {
            match runner.run_captured(plugin, SubCommand::Remove, &InputValues::new()) {
                Ok(()) => {
                    report.removed.push(plugin.id.clone());
                    UninstallOutcome::Removed
                }
                Err(StepFailure(message)) => {
                    tracing::warn!(plugin = %plugin.id, error = %message, "Removal failed");
                    report.failed.push((plugin.id.clone(), message.clone()));
                    UninstallOutcome::Failed(message)
                }
            }
        };
        on_outcome(plugin, &outcome);
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::install::runner::LineCallback;
    use crate::plugin::descriptor_from_header;
    use parking_lot::Mutex;
    use std::collections::HashSet;

    struct Machine {
        installed: HashSet<&'static str>,
        broken: HashSet<&'static str>,
        calls: Mutex<Vec<String>>,
    }

    impl StepRunner for Machine {
        fn run_captured(
            &self,
            plugin: &PluginDescriptor,
            sub: SubCommand,
            _env: &InputValues,
        ) -> Result<(), StepFailure> {
            self.calls.lock().push(format!("{}:{sub}", plugin.id));
            match sub {
                SubCommand::Check if self.installed.contains(plugin.id.as_str()) => Ok(()),
                SubCommand::Check => Err(StepFailure::new("not installed")),
                SubCommand::Remove if self.broken.contains(plugin.id.as_str()) => {
                    Err(StepFailure::new("dpkg lock held"))
                }
                _ => Ok(()),
            }
        }

        fn run_streamed(
            &self,
            plugin: &PluginDescriptor,
            sub: SubCommand,
            env: &InputValues,
            _on_line: LineCallback<'_>,
        ) -> Result<(), StepFailure> {
            self.run_captured(plugin, sub, env)
        }

        fn update_index(&self) -> Result<(), StepFailure> {
            Ok(())
        }

        fn batch_install(&self, _packages: &[String]) -> Result<(), StepFailure> {
            Ok(())
        }
    }

    fn plugin(id: &str) -> PluginDescriptor {
        descriptor_from_header(id, &format!("# NAME: {id}\n")).unwrap()
    }

    #[test]
    fn test_not_installed_is_skipped_not_failed() {
        let machine = Machine {
            installed: HashSet::from(["bat"]),
            broken: HashSet::new(),
            calls: Mutex::new(Vec::new()),
        };
        let mut outcomes = Vec::new();

        let report = uninstall(&machine, &[plugin("bat"), plugin("yq")], |p, o| {
            outcomes.push((p.id.clone(), o.clone()));
        });

        assert_eq!(report.removed, vec!["bat"]);
        assert_eq!(report.skipped, vec!["yq"]);
        assert!(report.failed.is_empty());
        assert_eq!(machine.calls.lock().as_slice(), ["bat:check", "bat:remove", "yq:check"]);
        assert_eq!(outcomes[1], ("yq".to_string(), UninstallOutcome::NotInstalled));
    }

    #[test]
    fn test_remove_failure_is_reported() {
        let machine = Machine {
            installed: HashSet::from(["bat", "fzf"]),
            broken: HashSet::from(["bat"]),
            calls: Mutex::new(Vec::new()),
        };

        let report = uninstall(&machine, &[plugin("bat"), plugin("fzf")], |_, _| {});

        assert!(!report.is_success());
        assert_eq!(report.failed, vec![("bat".to_string(), "dpkg lock held".to_string())]);
        assert_eq!(report.removed, vec!["fzf"]);
    }
}
