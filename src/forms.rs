//! Interactive prompts.
//!
//! Category and plugin selection, required inputs, and confirmation, all
//! through dialoguer on the attached terminal.

use std::io::IsTerminal;

use anyhow::Result;
use dialoguer::{theme::ColorfulTheme, Confirm, Input, MultiSelect, Select};

use crate::install::{InputError, Prompter};
use crate::plugin::{PluginDescriptor, RequiredInput};

/// Whether both stdin and stdout are attached to a terminal.
pub fn is_interactive() -> bool {
    std::io::stdin().is_terminal() && std::io::stdout().is_terminal()
}

/// Prompts for required inputs on the terminal.
#[derive(Default)]
pub struct DialoguerPrompter {
    theme: ColorfulTheme,
}

impl Prompter for DialoguerPrompter {
    fn prompt(
        &mut self,
        input: &RequiredInput,
        default: Option<&str>,
    ) -> Result<String, InputError> {
        let mut field = Input::<String>::with_theme(&self.theme).with_prompt(&input.prompt);
        if let Some(default) = default {
            field = field.default(default.to_string());
        }
        field.interact_text().map_err(|e| match e {
            dialoguer::Error::IO(io) if io.kind() == std::io::ErrorKind::Interrupted => {
                InputError::Cancelled
            }
            other => InputError::Prompt(other.to_string()),
        })
    }
}

/// Ask which category to install. `None` when the user backs out.
pub fn select_category(categories: &[String]) -> Result<Option<String>> {
    let choice = Select::with_theme(&ColorfulTheme::default())
        .with_prompt("Select a category to install")
        .items(categories)
        .default(0)
        .interact_opt()?;
    Ok(choice.map(|idx| categories[idx].clone()))
}

/// Let the user pick plugins. `None` when the user backs out.
pub fn select_plugins(title: &str, plugins: &[&PluginDescriptor]) -> Result<Option<Vec<usize>>> {
    let labels: Vec<String> = plugins.iter().map(|p| p.label()).collect();
    Ok(MultiSelect::with_theme(&ColorfulTheme::default())
        .with_prompt(format!("{title} (space to toggle, enter to confirm)"))
        .items(&labels)
        .interact_opt()?)
}

/// Yes/no confirmation, defaulting to yes.
pub fn confirm(prompt: &str) -> Result<bool> {
    Ok(Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .default(true)
        .interact()?)
}
