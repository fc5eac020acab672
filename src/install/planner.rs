//! Installation planning.
//!
//! Splits a selection into the package-manager batch and the plugins that
//! install one at a time, keeping selection order within each group.

use super::events::Phase;
use crate::plugin::PluginDescriptor;

/// What a run will install, grouped by how.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallPlan {
    /// Installed together through the package manager.
    pub package_manager: Vec<PluginDescriptor>,
    /// Installed one by one by their own scripts.
    pub individual: Vec<PluginDescriptor>,
}

impl InstallPlan {
    /// Partition `selected` by install method.
    pub fn new(selected: Vec<PluginDescriptor>) -> Self {
        let (package_manager, individual) =
            selected.into_iter().partition(|p| p.install_method.is_batchable());
        Self { package_manager, individual }
    }

    /// Package-manager plugins with a repository setup step, in order.
    pub fn repo_setup(&self) -> impl Iterator<Item = &PluginDescriptor> {
        self.package_manager.iter().filter(|p| p.has_repo_setup())
    }

    /// Packages handed to the batch install.
    pub fn package_names(&self) -> Vec<String> {
        self.package_manager.iter().filter_map(|p| p.package_name.clone()).collect()
    }

    /// Every planned plugin, batch first.
    pub fn plugins(&self) -> impl Iterator<Item = &PluginDescriptor> {
        self.package_manager.iter().chain(&self.individual)
    }

    /// Number of planned plugins.
    pub fn len(&self) -> usize {
        self.package_manager.len() + self.individual.len()
    }

    /// Whether nothing is planned.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Phases a fully successful run passes through.
    pub fn phases(&self) -> Vec<Phase> {
        let mut phases = Vec::new();
        if self.repo_setup().next().is_some() {
            phases.push(Phase::RepoSetup);
            phases.push(Phase::PackageManagerUpdate);
        }
        if !self.package_manager.is_empty() {
            phases.push(Phase::BatchInstall);
        }
        if !self.individual.is_empty() {
            phases.push(Phase::IndividualInstall);
        }
        phases.push(Phase::Summary);
        phases
    }

    /// Human-readable plan shown before confirmation.
    ///
    /// `batch_command` is the package-manager command line, when known.
    pub fn render(&self, batch_command: Option<&str>) -> String {
        let mut out = String::from("Installation plan\n");

        if !self.package_manager.is_empty() {
            out.push_str(&format!("\nPackage manager ({}):\n", self.package_manager.len()));
            for plugin in &self.package_manager {
                out.push_str(&format!(
                    "  • {} [{}]{}{}\n",
                    plugin.display_name(),
                    plugin.package_name.as_deref().unwrap_or("?"),
                    if plugin.is_core { " (core)" } else { "" },
                    if plugin.has_repo_setup() { " +repo" } else { "" },
                ));
            }
            if let Some(cmd) = batch_command {
                out.push_str(&format!("  → {cmd}\n"));
            }
        }

        if !self.individual.is_empty() {
            out.push_str(&format!("\nIndividual ({}):\n", self.individual.len()));
            for plugin in &self.individual {
                out.push_str(&format!(
                    "  • {} ({}){}\n",
                    plugin.display_name(),
                    plugin.install_method,
                    if plugin.is_core { " (core)" } else { "" },
                ));
            }
        }

        out.push_str(&format!("\nTotal: {} plugin(s)\n", self.len()));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::descriptor_from_header;

    fn pm(id: &str, repo: bool) -> PluginDescriptor {
        let repo = if repo { "# REPO_SETUP: setup\n" } else { "" };
        descriptor_from_header(
            id,
            &format!("# NAME: {id}\n# INSTALL_METHOD: package-manager\n# PACKAGE_NAME: {id}-pkg\n{repo}"),
        )
        .unwrap()
    }

    fn binary(id: &str) -> PluginDescriptor {
        descriptor_from_header(id, &format!("# NAME: {id}\n# INSTALL_METHOD: binary\n")).unwrap()
    }

    fn ids(plugins: &[PluginDescriptor]) -> Vec<&str> {
        plugins.iter().map(|p| p.id.as_str()).collect()
    }

    #[test]
    fn test_partition_is_disjoint_cover_preserving_order() {
        let selected = vec![pm("a", false), binary("x"), pm("b", true), binary("y"), pm("c", false)];
        let plan = InstallPlan::new(selected.clone());

        assert_eq!(ids(&plan.package_manager), vec!["a", "b", "c"]);
        assert_eq!(ids(&plan.individual), vec!["x", "y"]);
        assert_eq!(plan.len(), selected.len());
        for plugin in &selected {
            let in_pm = plan.package_manager.contains(plugin);
            let in_ind = plan.individual.contains(plugin);
            assert!(in_pm ^ in_ind, "{} must be in exactly one group", plugin.id);
        }
    }

    #[test]
    fn test_repo_setup_subset_in_order() {
        let plan = InstallPlan::new(vec![pm("a", true), pm("b", false), pm("c", true)]);
        let repo: Vec<_> = plan.repo_setup().map(|p| p.id.as_str()).collect();
        assert_eq!(repo, vec!["a", "c"]);
    }

    #[test]
    fn test_package_names() {
        let plan = InstallPlan::new(vec![pm("git", false), binary("x"), pm("zsh", false)]);
        assert_eq!(plan.package_names(), vec!["git-pkg", "zsh-pkg"]);
    }

    #[test]
    fn test_phases() {
        let plan = InstallPlan::new(vec![pm("a", true), binary("x")]);
        assert_eq!(
            plan.phases(),
            vec![
                Phase::RepoSetup,
                Phase::PackageManagerUpdate,
                Phase::BatchInstall,
                Phase::IndividualInstall,
                Phase::Summary
            ]
        );

        let plan = InstallPlan::new(vec![binary("x")]);
        assert_eq!(plan.phases(), vec![Phase::IndividualInstall, Phase::Summary]);

        assert_eq!(InstallPlan::default().phases(), vec![Phase::Summary]);
    }

    #[test]
    fn test_render_lists_groups_and_total() {
        let plan = InstallPlan::new(vec![pm("git", false), binary("starship")]);
        let text = plan.render(Some("sudo apt-get install -y git-pkg"));

        assert!(text.contains("Package manager (1):"));
        assert!(text.contains("git [git-pkg]"));
        assert!(text.contains("→ sudo apt-get install -y git-pkg"));
        assert!(text.contains("Individual (1):"));
        assert!(text.contains("starship (binary)"));
        assert!(text.contains("Total: 2 plugin(s)"));
    }
}
