//! Required input collection.
//!
//! Every distinct `REQUIRES` name across the selected plugins is resolved
//! once per run. The first plugin (in selection order) declaring a name
//! supplies its prompt text and default probe.

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::core::probe;
use crate::plugin::{PluginDescriptor, RequiredInput};

/// Resolved `name -> value` pairs, injected into script environments.
pub type InputValues = HashMap<String, String>;

/// Errors that abort input collection.
#[derive(Debug, Error)]
pub enum InputError {
    /// The user cancelled the prompt.
    #[error("Input cancelled")]
    Cancelled,

    /// No preset, default, or terminal was available for an input.
    #[error("No value for required input {0} (pass --set {0}=VALUE)")]
    Missing(String),

    /// The prompt itself failed.
    #[error("Prompt failed: {0}")]
    Prompt(String),
}

/// Asks the user for one value.
pub trait Prompter {
    fn prompt(&mut self, input: &RequiredInput, default: Option<&str>)
        -> Result<String, InputError>;
}

/// Resolves default values from probe commands.
pub trait DefaultProbe {
    fn probe(&self, command: &str) -> Option<String>;
}

/// Runs probes through the shell.
#[derive(Debug, Default, Clone, Copy)]
pub struct ShellProbe;

impl DefaultProbe for ShellProbe {
    fn probe(&self, command: &str) -> Option<String> {
        probe(command)
    }
}

/// Accepts the probed default without asking, failing when there is none.
#[derive(Debug, Default, Clone, Copy)]
pub struct AcceptDefaults;

impl Prompter for AcceptDefaults {
    fn prompt(
        &mut self,
        input: &RequiredInput,
        default: Option<&str>,
    ) -> Result<String, InputError> {
        default.map(str::to_string).ok_or_else(|| InputError::Missing(input.name.clone()))
    }
}

/// Distinct inputs across `plugins`, first occurrence wins.
pub fn pending_inputs(plugins: &[PluginDescriptor]) -> Vec<&RequiredInput> {
    let mut seen = HashSet::new();
    plugins
        .iter()
        .flat_map(|p| &p.required_inputs)
        .filter(|input| seen.insert(input.name.as_str()))
        .collect()
}

/// Resolve every distinct input, prompting once per name.
///
/// Names present in `presets` are taken as-is without probing or prompting.
pub fn collect_inputs(
    plugins: &[PluginDescriptor],
    presets: &InputValues,
    prompter: &mut dyn Prompter,
    probe: &dyn DefaultProbe,
) -> Result<InputValues, InputError> {
    let mut values = InputValues::new();

    for input in pending_inputs(plugins) {
        if let Some(value) = presets.get(&input.name) {
            values.insert(input.name.clone(), value.clone());
            continue;
        }

        let default = input.default_probe.as_deref().and_then(|cmd| probe.probe(cmd));
        let value = prompter.prompt(input, default.as_deref())?;
        tracing::debug!(name = %input.name, "Collected input");
        values.insert(input.name.clone(), value);
    }

    Ok(values)
}

/// Parse `NAME=VALUE` presets from the command line.
pub fn parse_presets<S: AsRef<str>>(pairs: &[S]) -> anyhow::Result<InputValues> {
    let mut presets = InputValues::new();
    for pair in pairs {
        let pair = pair.as_ref();
        let (name, value) = pair
            .split_once('=')
            .ok_or_else(|| anyhow::anyhow!("Invalid --set value '{pair}', expected NAME=VALUE"))?;
        let name = name.trim();
        if name.is_empty() {
            anyhow::bail!("Invalid --set value '{pair}', name is empty");
        }
        presets.insert(name.to_string(), value.to_string());
    }
    Ok(presets)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plugin::descriptor_from_header;

    /// Records prompts and answers from a fixed list.
    #[derive(Default)]
    struct Scripted {
        asked: Vec<(String, String, Option<String>)>,
    }

    impl Prompter for Scripted {
        fn prompt(
            &mut self,
            input: &RequiredInput,
            default: Option<&str>,
        ) -> Result<String, InputError> {
            self.asked.push((
                input.name.clone(),
                input.prompt.clone(),
                default.map(str::to_string),
            ));
            Ok(format!("value-of-{}", input.name))
        }
    }

    struct FixedProbe;

    impl DefaultProbe for FixedProbe {
        fn probe(&self, command: &str) -> Option<String> {
            (command == "whoami").then(|| "ada".to_string())
        }
    }

    fn plugin(id: &str, header: &str) -> PluginDescriptor {
        descriptor_from_header(id, header).unwrap()
    }

    #[test]
    fn test_duplicate_names_prompt_once_first_wins() {
        let p1 = plugin("p1", "# REQUIRES: X|First prompt|\n");
        let p2 = plugin("p2", "# REQUIRES: X|Second prompt|\n# REQUIRES: Y|Why?|\n");

        let mut prompter = Scripted::default();
        let values =
            collect_inputs(&[p1, p2], &InputValues::new(), &mut prompter, &FixedProbe).unwrap();

        assert_eq!(values.len(), 2);
        assert_eq!(prompter.asked.len(), 2);
        assert_eq!(prompter.asked[0].0, "X");
        assert_eq!(prompter.asked[0].1, "First prompt");
        assert_eq!(prompter.asked[1].0, "Y");
    }

    #[test]
    fn test_single_plugin_two_inputs() {
        let p = plugin("p", "# REQUIRES: NAME|Enter name|\n# REQUIRES: EMAIL|Enter email|\n");

        let mut prompter = Scripted::default();
        let values =
            collect_inputs(&[p], &InputValues::new(), &mut prompter, &FixedProbe).unwrap();

        let mut keys: Vec<_> = values.keys().cloned().collect();
        keys.sort();
        assert_eq!(keys, vec!["EMAIL", "NAME"]);
        assert_eq!(prompter.asked.len(), 2);
    }

    #[test]
    fn test_probe_prefills_default() {
        let p = plugin("p", "# REQUIRES: USER|Who?|whoami\n# REQUIRES: HOST|Host?|hostname\n");

        let mut prompter = Scripted::default();
        collect_inputs(&[p], &InputValues::new(), &mut prompter, &FixedProbe).unwrap();

        assert_eq!(prompter.asked[0].2.as_deref(), Some("ada"));
        assert_eq!(prompter.asked[1].2, None);
    }

    #[test]
    fn test_presets_skip_prompt() {
        let p = plugin("p", "# REQUIRES: NAME|Enter name|\n# REQUIRES: EMAIL|Enter email|\n");
        let presets = InputValues::from([("NAME".to_string(), "Ada".to_string())]);

        let mut prompter = Scripted::default();
        let values = collect_inputs(&[p], &presets, &mut prompter, &FixedProbe).unwrap();

        assert_eq!(values["NAME"], "Ada");
        assert_eq!(prompter.asked.len(), 1);
        assert_eq!(prompter.asked[0].0, "EMAIL");
    }

    #[test]
    fn test_accept_defaults_requires_default() {
        let p = plugin("p", "# REQUIRES: USER|Who?|whoami\n");
        let values =
            collect_inputs(&[p], &InputValues::new(), &mut AcceptDefaults, &FixedProbe).unwrap();
        assert_eq!(values["USER"], "ada");

        let p = plugin("p", "# REQUIRES: TOKEN|Token?|\n");
        let result = collect_inputs(&[p], &InputValues::new(), &mut AcceptDefaults, &FixedProbe);
        assert!(matches!(result, Err(InputError::Missing(ref name)) if name == "TOKEN"));
    }

    #[test]
    fn test_shell_probe_failure_is_no_default() {
        assert_eq!(ShellProbe.probe("exit 3"), None);
        assert_eq!(ShellProbe.probe("echo hi"), Some("hi".to_string()));
    }

    #[test]
    fn test_no_inputs_no_prompts() {
        let p = plugin("p", "# NAME: Plain\n");
        let mut prompter = Scripted::default();
        let values =
            collect_inputs(&[p], &InputValues::new(), &mut prompter, &FixedProbe).unwrap();
        assert!(values.is_empty());
        assert!(prompter.asked.is_empty());
    }

    #[test]
    fn test_parse_presets() {
        let presets = parse_presets(&["A=1", "B=x=y", "C="]).unwrap();
        assert_eq!(presets["A"], "1");
        assert_eq!(presets["B"], "x=y");
        assert_eq!(presets["C"], "");

        assert!(parse_presets(&["novalue"]).is_err());
        assert!(parse_presets(&["=v"]).is_err());
    }
}
