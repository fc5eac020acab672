//! Session flows.
//!
//! Ties loading, selection, input collection, planning, and execution
//! together for the `install`, `custom`, `uninstall`, and `list` commands.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::core::{
    ensure_privileges, Config, PackageManager, PackageManagerKind, ScriptExecutor,
};
use crate::forms::{self, DialoguerPrompter};
use crate::install::{
    collect_inputs, uninstall, AcceptDefaults, EventEmitter, InputValues, InstallPlan,
    InstallSummary, LineSink, Orchestrator, Prompter, RunLog, ShellProbe, SystemRunner,
    UninstallOutcome, UninstallReport,
};
use crate::plugin::{
    load_plugins, BundledScripts, DirectorySource, InstallMethod, LoadedCatalog, PluginDescriptor,
    ScriptSource,
};
use crate::tui::{plain, run_dashboard, DashboardModel, Theme};

/// Options shared by `install` and `custom`.
#[derive(Debug, Clone, Default)]
pub struct InstallOptions {
    /// Category to install; prompted for when `None`.
    pub category: Option<String>,
    /// Skip confirmation and accept probed defaults without a terminal.
    pub yes: bool,
    /// Force the plain reporter.
    pub no_tui: bool,
    /// Pre-resolved required inputs.
    pub presets: InputValues,
    /// Print debug-level events in plain mode.
    pub verbose: bool,
}

/// How plugins are chosen from the loaded catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Selection {
    /// Every plugin in the catalog.
    All,
    /// Core plugins plus those picked in a multi-select.
    CorePlusChosen,
}

/// Outcome of an install run.
#[derive(Debug)]
pub enum InstallOutcome {
    /// The user backed out before anything ran.
    Cancelled,
    /// Nothing was selected.
    NothingSelected,
    /// The run finished.
    Finished(InstallSummary),
}

/// One row of `itamae list`.
#[derive(Debug, Clone, Serialize)]
pub struct PluginListing {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: Option<String>,
    pub core: bool,
    pub install_method: InstallMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub package_name: Option<String>,
    pub post_install: bool,
    pub repo_setup: bool,
    pub inputs: Vec<String>,
}

impl From<&PluginDescriptor> for PluginListing {
    fn from(p: &PluginDescriptor) -> Self {
        Self {
            id: p.id.clone(),
            name: p.display_name().to_string(),
            description: p.description.clone(),
            category: p.category.clone(),
            core: p.is_core,
            install_method: p.install_method,
            package_name: p.package_name.clone(),
            post_install: p.has_post_install(),
            repo_setup: p.has_repo_setup(),
            inputs: p.required_inputs.iter().map(|i| i.name.clone()).collect(),
        }
    }
}

/// A configured session.
#[derive(Debug, Clone)]
pub struct Session {
    config: Config,
}

impl Session {
    /// Create a session from configuration.
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// The active configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Script source: the configured directory, or the bundled scripts.
    pub fn source(&self) -> Box<dyn ScriptSource> {
        match self.config.scripts_dir() {
            Some(dir) => {
                tracing::debug!(dir = %dir.display(), "Using scripts directory");
                Box::new(DirectorySource::new(dir))
            }
            None => Box::new(BundledScripts),
        }
    }

    fn package_manager(&self) -> PackageManager {
        let kind = PackageManagerKind::resolve(&self.config.general.package_manager);
        PackageManager::new(kind, self.config.general.use_sudo)
    }

    fn runner(&self) -> SystemRunner {
        SystemRunner::new(ScriptExecutor::new(&self.config.general.shell), self.package_manager())
    }

    fn load(&self, category: Option<&str>) -> Result<LoadedCatalog> {
        let source = self.source();
        load_plugins(source.as_ref(), category).context("Failed to load plugins")
    }

    /// `itamae install`: one category, auto-installed or multi-selected.
    pub fn install(&self, opts: &InstallOptions) -> Result<InstallOutcome> {
        ensure_privileges(self.config.general.use_sudo)?;

        let category = match &opts.category {
            Some(category) => category.clone(),
            None => match self.prompt_category()? {
                Some(category) => category,
                None => return Ok(InstallOutcome::Cancelled),
            },
        };

        let catalog = self.load(Some(&category))?;
        let selection = if self.config.is_auto_install(&category) {
            Selection::All
        } else {
            Selection::CorePlusChosen
        };
        let title = format!("Select {category} plugins");
        let outcome = self.run_selection(&catalog, selection, &title, opts);
        release(catalog);
        outcome
    }

    /// `itamae custom`: the whole catalog, core plugins always included.
    pub fn custom(&self, opts: &InstallOptions) -> Result<InstallOutcome> {
        ensure_privileges(self.config.general.use_sudo)?;
        let catalog = self.load(None)?;
        let outcome =
            self.run_selection(&catalog, Selection::CorePlusChosen, "Select optional plugins", opts);
        release(catalog);
        outcome
    }

    fn prompt_category(&self) -> Result<Option<String>> {
        let categories = self.source().categories()?;
        if !forms::is_interactive() {
            anyhow::bail!(
                "No category given and no terminal to ask on; pass --category ({})",
                categories.join(", ")
            );
        }
        forms::select_category(&categories)
    }

    fn run_selection(
        &self,
        catalog: &LoadedCatalog,
        selection: Selection,
        title: &str,
        opts: &InstallOptions,
    ) -> Result<InstallOutcome> {
        let Some(selected) = choose(catalog.plugins(), selection, title)? else {
            return Ok(InstallOutcome::Cancelled);
        };
        if selected.is_empty() {
            return Ok(InstallOutcome::NothingSelected);
        }

        let plan = InstallPlan::new(selected.clone());
        let pm = self.package_manager();
        let batch_command = (!plan.package_manager.is_empty())
            .then(|| pm.install_command_line(&plan.package_names()));
        println!("{}", plan.render(batch_command.as_deref()));

        if !opts.yes {
            if !forms::is_interactive() {
                anyhow::bail!("Confirmation required but no terminal is attached; pass --yes");
            }
            if !forms::confirm("Proceed with installation?")? {
                return Ok(InstallOutcome::Cancelled);
            }
        }

        let mut prompter: Box<dyn Prompter> = if forms::is_interactive() {
            Box::new(DialoguerPrompter::default())
        } else {
            Box::new(AcceptDefaults)
        };
        let inputs = collect_inputs(&selected, &opts.presets, prompter.as_mut(), &ShellProbe)?;

        let summary = self.execute(plan, inputs, opts)?;
        Ok(InstallOutcome::Finished(summary))
    }

    /// Run the orchestrator on its own thread and render its events here.
    fn execute(
        &self,
        plan: InstallPlan,
        inputs: InputValues,
        opts: &InstallOptions,
    ) -> Result<InstallSummary> {
        let run_log = match RunLog::create(&self.config.log_dir()) {
            Ok(log) => Some(Arc::new(log)),
            Err(e) => {
                tracing::warn!(error = %e, "Could not create run log, continuing without it");
                None
            }
        };

        let (mut emitter, rx) = EventEmitter::channel();
        if let Some(log) = &run_log {
            emitter = emitter.with_sink(Arc::clone(log) as Arc<dyn LineSink>);
        }

        let model = DashboardModel::new(plan.plugins());
        let handle = Orchestrator::new(self.runner(), emitter, inputs)
            .spawn(plan)
            .context("Failed to start installer thread")?;

        let use_dashboard = self.config.ui.dashboard && !opts.no_tui && forms::is_interactive();
        if use_dashboard {
            let theme = Theme::from_config(&self.config.ui.theme);
            let tick = Duration::from_millis(self.config.ui.tick_rate_ms.max(10));
            if let Err(e) = run_dashboard(model, &rx, &theme, tick) {
                tracing::warn!(error = %e, "Dashboard failed, falling back to plain output");
                plain::report(&rx, &mut std::io::stdout(), opts.verbose)?;
            }
        } else {
            plain::report(&rx, &mut std::io::stdout(), opts.verbose)?;
        }

        let summary =
            handle.join().map_err(|_| anyhow::anyhow!("Installer thread panicked"))?;

        if let Some(log) = run_log {
            finish_run_log(log);
        }

        Ok(summary)
    }

    /// `itamae uninstall`: remove every plugin whose `check` reports it installed.
    pub fn uninstall(&self, category: Option<&str>) -> Result<UninstallReport> {
        let catalog = self.load(category)?;
        let runner = self.runner();

        let report = uninstall(&runner, catalog.plugins(), |plugin, outcome| match outcome {
            UninstallOutcome::NotInstalled => {
                println!("  - {} not installed, skipping", plugin.display_name());
            }
            UninstallOutcome::Removed => println!("  ✓ {} removed", plugin.display_name()),
            UninstallOutcome::Failed(error) => {
                println!("  ✗ {} failed: {error}", plugin.display_name());
            }
        });

        release(catalog);
        Ok(report)
    }

    /// Catalog rows for `itamae list`.
    pub fn list(&self, category: Option<&str>) -> Result<Vec<PluginListing>> {
        let catalog = self.load(category)?;
        let rows = catalog.plugins().iter().map(PluginListing::from).collect();
        release(catalog);
        Ok(rows)
    }
}

/// Write the run log footer and print its path.
///
/// The footer needs sole ownership; if another handle is still alive the
/// log keeps its lines but goes without one.
fn finish_run_log(log: Arc<RunLog>) -> Option<PathBuf> {
    let log = match Arc::try_unwrap(log) {
        Ok(log) => log,
        Err(shared) => {
            tracing::warn!(
                path = %shared.path().display(),
                "Run log still shared, skipping footer"
            );
            return None;
        }
    };

    match log.close() {
        Ok(path) => {
            println!("Log: {}", path.display());
            Some(path)
        }
        Err(e) => {
            tracing::warn!(error = %e, "Failed to finalize run log");
            None
        }
    }
}

/// Remove a catalog's staged scripts, logging failures.
fn release(catalog: LoadedCatalog) {
    if let Err(e) = catalog.cleanup() {
        tracing::warn!(error = %e, "Failed to remove staged plugin scripts");
    }
}

/// Pick plugins from `plugins`. `None` when the user backs out.
fn choose(
    plugins: &[PluginDescriptor],
    selection: Selection,
    title: &str,
) -> Result<Option<Vec<PluginDescriptor>>> {
    if selection == Selection::All {
        return Ok(Some(plugins.to_vec()));
    }

    let (core, optional): (Vec<&PluginDescriptor>, Vec<&PluginDescriptor>) =
        plugins.iter().partition(|p| p.is_core);

    let mut selected: Vec<PluginDescriptor> = core.into_iter().cloned().collect();
    if optional.is_empty() {
        return Ok(Some(selected));
    }

    if !forms::is_interactive() {
        tracing::warn!(count = optional.len(), "No terminal, skipping optional plugins");
        return Ok(Some(selected));
    }

    let Some(chosen) = forms::select_plugins(title, &optional)? else {
        return Ok(None);
    };
    selected.extend(chosen.into_iter().map(|idx| optional[idx].clone()));
    Ok(Some(selected))
}

/// Print the end-of-run summary.
pub fn print_summary<W: Write>(out: &mut W, summary: &InstallSummary) -> std::io::Result<()> {
    writeln!(out)?;
    writeln!(out, "Installation summary")?;
    if !summary.successful.is_empty() {
        writeln!(out, "  ✓ Successful ({}):", summary.successful.len())?;
        for entry in &summary.successful {
            writeln!(out, "      {}", entry.name)?;
        }
    }
    if !summary.failed.is_empty() {
        writeln!(out, "  ✗ Failed ({}):", summary.failed.len())?;
        for entry in &summary.failed {
            match &entry.error {
                Some(error) => writeln!(out, "      {}: {error}", entry.name)?,
                None => writeln!(out, "      {}", entry.name)?,
            }
        }
    }
    if summary.total() == 0 {
        writeln!(out, "  Nothing was installed")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::install::SummaryEntry;
    use crate::plugin::descriptor_from_header;

    fn plugin(id: &str, core: bool) -> PluginDescriptor {
        descriptor_from_header(id, &format!("# NAME: {id}\n# OMAKASE: {core}\n")).unwrap()
    }

    #[test]
    fn test_choose_all() {
        let plugins = vec![plugin("a", false), plugin("b", true)];
        let chosen = choose(&plugins, Selection::All, "t").unwrap().unwrap();
        assert_eq!(chosen, plugins);
    }

    #[test]
    fn test_choose_core_only_when_no_optional() {
        let plugins = vec![plugin("a", true), plugin("b", true)];
        let chosen = choose(&plugins, Selection::CorePlusChosen, "t").unwrap().unwrap();
        assert_eq!(chosen.len(), 2);
    }

    #[test]
    fn test_listing_from_descriptor() {
        let p = descriptor_from_header(
            "git",
            "# NAME: Git\n# INSTALL_METHOD: package-manager\n# PACKAGE_NAME: git\n# REQUIRES: GIT_USER_NAME|Name|\n",
        )
        .unwrap();
        let listing = PluginListing::from(&p);
        assert_eq!(listing.install_method, InstallMethod::PackageManager);
        assert_eq!(listing.inputs, vec!["GIT_USER_NAME"]);

        let json = serde_json::to_string(&listing).unwrap();
        assert!(json.contains(r#""install_method":"package-manager""#));
    }

    #[test]
    fn test_print_summary_includes_errors() {
        let summary = InstallSummary {
            successful: vec![SummaryEntry { id: "git".into(), name: "Git".into(), error: None }],
            failed: vec![SummaryEntry {
                id: "code".into(),
                name: "Visual Studio Code".into(),
                error: Some("gpg failed".into()),
            }],
        };
        let mut out = Vec::new();
        print_summary(&mut out, &summary).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Successful (1)"));
        assert!(text.contains("Visual Studio Code: gpg failed"));
    }

    #[test]
    fn test_finish_run_log_writes_footer() {
        let dir = tempfile::TempDir::new().unwrap();
        let log = Arc::new(RunLog::create(dir.path()).unwrap());

        let path = finish_run_log(log).unwrap();
        let content = std::fs::read_to_string(path).unwrap();
        assert!(content.contains("=== Finished"));
    }

    #[test]
    fn test_finish_run_log_shared_skips_footer() {
        let dir = tempfile::TempDir::new().unwrap();
        let log = Arc::new(RunLog::create(dir.path()).unwrap());
        let other = Arc::clone(&log);

        assert!(finish_run_log(log).is_none());
        let content = std::fs::read_to_string(other.path()).unwrap();
        assert!(!content.contains("=== Finished"));
    }

    #[test]
    fn test_session_lists_bundled_catalog() {
        let session = Session::new(Config::default());
        let rows = session.list(Some("core")).unwrap();
        assert!(rows.iter().any(|r| r.id == "git" && r.core));
    }
}
