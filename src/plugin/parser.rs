//! Plugin header parser.
//!
//! Metadata lives in the leading comment block of each script:
//!
//! ```text
//! #!/bin/bash
//! # NAME: Visual Studio Code
//! # DESCRIPTION: Code editor
//! # OMAKASE: true
//! # INSTALL_METHOD: package-manager
//! # PACKAGE_NAME: code
//! # REPO_SETUP: setup_repo
//! # REQUIRES: GIT_USER_NAME|Enter your Git user name|git config --global user.name
//! ```
//!
//! Scanning stops at the first line that is not a comment. Lines without a
//! `KEY: value` shape and unknown keys are skipped.

use std::io::BufRead;

use super::types::{InstallMethod, RequiredInput};

/// Metadata extracted from a script header, before the loader assigns identity.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedHeader {
    pub name: String,
    pub description: String,
    pub is_core: bool,
    /// `None` when the header is missing or names an unknown method.
    pub install_method: Option<InstallMethod>,
    pub package_name: Option<String>,
    pub post_install_hook: Option<String>,
    pub repo_setup_hook: Option<String>,
    pub required_inputs: Vec<RequiredInput>,
}

/// Parse a header from script text.
pub fn parse_header(content: &str) -> ParsedHeader {
    let mut header = ParsedHeader::default();
    for line in content.lines() {
        if !apply_line(&mut header, line) {
            break;
        }
    }
    header
}

/// Parse a header from a reader.
///
/// Only a failing read is an error.
pub fn parse_header_from<R: BufRead>(reader: R) -> std::io::Result<ParsedHeader> {
    let mut header = ParsedHeader::default();
    for line in reader.lines() {
        if !apply_line(&mut header, &line?) {
            break;
        }
    }
    Ok(header)
}

/// Fold one line into the header. Returns `false` once the comment block ends.
fn apply_line(header: &mut ParsedHeader, line: &str) -> bool {
    let Some(comment) = line.strip_prefix('#') else {
        return false;
    };

    let Some((key, value)) = comment.split_once(':') else {
        return true;
    };

    let key = key.trim();
    let value = value.trim();

    match key {
        "NAME" => header.name = value.to_string(),
        "DESCRIPTION" => header.description = value.to_string(),
        "OMAKASE" => header.is_core = value == "true",
        "INSTALL_METHOD" => {
            header.install_method = InstallMethod::from_header(value);
            if header.install_method.is_none() {
                tracing::warn!(value, "Unknown INSTALL_METHOD, treating as manual");
            }
        }
        "PACKAGE_NAME" => header.package_name = non_empty(value),
        "POST_INSTALL" => header.post_install_hook = non_empty(value),
        "REPO_SETUP" => header.repo_setup_hook = non_empty(value),
        "REQUIRES" => {
            if let Some(input) = parse_requires(value) {
                header.required_inputs.push(input);
            } else {
                tracing::warn!(value, "Skipping malformed REQUIRES line");
            }
        }
        _ => {}
    }

    true
}

/// Parse `NAME|Prompt text|optional-default-probe-command`.
///
/// The probe is everything after the second `|`, so it may contain pipes.
fn parse_requires(value: &str) -> Option<RequiredInput> {
    let mut parts = value.splitn(3, '|');
    let name = parts.next()?.trim();
    if name.is_empty() {
        return None;
    }

    let prompt = parts.next().map(str::trim).filter(|p| !p.is_empty()).unwrap_or(name);
    let default_probe = parts.next().and_then(non_empty);

    Some(RequiredInput { name: name.to_string(), prompt: prompt.to_string(), default_probe })
}

fn non_empty(value: &str) -> Option<String> {
    let value = value.trim();
    (!value.is_empty()).then(|| value.to_string())
}
