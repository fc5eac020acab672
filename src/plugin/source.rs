//! Where plugin scripts come from.
//!
//! The binary ships its scripts compiled in ([`BundledScripts`]). A scripts
//! directory laid out the same way (`<dir>/<category>/<id>.sh`) can replace
//! them through configuration ([`DirectorySource`]).

use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use super::error::{PluginError, PluginResult};
use super::types::SCRIPT_EXTENSION;

/// One script as found in a source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptEntry {
    /// Category (sub-directory) the script belongs to.
    pub category: String,
    /// File name including extension.
    pub file_name: String,
    /// Raw script bytes.
    pub content: Vec<u8>,
}

/// A catalog of plugin scripts grouped by category.
pub trait ScriptSource {
    /// Category names in a stable order.
    fn categories(&self) -> PluginResult<Vec<String>>;

    /// Scripts of one category, or of every category when `None`.
    ///
    /// Entries are ordered by category, then file name.
    fn entries(&self, category: Option<&str>) -> PluginResult<Vec<ScriptEntry>>;
}

struct BundledScript {
    category: &'static str,
    file_name: &'static str,
    content: &'static str,
}

macro_rules! bundled {
    ($category:literal, $file:literal) => {
        BundledScript {
            category: $category,
            file_name: $file,
            content: include_str!(concat!("../../scripts/", $category, "/", $file)),
        }
    };
}

const BUNDLED: &[BundledScript] = &[
    bundled!("core", "curl.sh"),
    bundled!("core", "git.sh"),
    bundled!("core", "ripgrep.sh"),
    bundled!("core", "zsh.sh"),
    bundled!("essentials", "bat.sh"),
    bundled!("essentials", "fzf.sh"),
    bundled!("essentials", "starship.sh"),
    bundled!("essentials", "vscode.sh"),
    bundled!("unverified", "ghostty.sh"),
    bundled!("unverified", "yq.sh"),
];

/// Scripts compiled into the binary.
#[derive(Debug, Default, Clone, Copy)]
pub struct BundledScripts;

impl ScriptSource for BundledScripts {
    fn categories(&self) -> PluginResult<Vec<String>> {
        let mut categories: Vec<String> = Vec::new();
        for script in BUNDLED {
            if !categories.iter().any(|c| c == script.category) {
                categories.push(script.category.to_string());
            }
        }
        Ok(categories)
    }

    fn entries(&self, category: Option<&str>) -> PluginResult<Vec<ScriptEntry>> {
        if let Some(name) = category {
            if !BUNDLED.iter().any(|s| s.category == name) {
                return Err(PluginError::CategoryNotFound(name.to_string()));
            }
        }

        let mut entries: Vec<ScriptEntry> = BUNDLED
            .iter()
            .filter(|s| category.map_or(true, |c| s.category == c))
            .map(|s| ScriptEntry {
                category: s.category.to_string(),
                file_name: s.file_name.to_string(),
                content: s.content.as_bytes().to_vec(),
            })
            .collect();
        entries.sort_by(|a, b| (&a.category, &a.file_name).cmp(&(&b.category, &b.file_name)));
        Ok(entries)
    }
}

/// Scripts read from a directory tree on disk.
#[derive(Debug, Clone)]
pub struct DirectorySource {
    root: PathBuf,
}

impl DirectorySource {
    /// Create a source rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Root directory of this source.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn read_category(&self, category: &str) -> PluginResult<Vec<ScriptEntry>> {
        let dir = self.root.join(category);
        if !dir.is_dir() {
            return Err(PluginError::CategoryNotFound(category.to_string()));
        }

        let mut entries = Vec::new();
        for entry in WalkDir::new(&dir).min_depth(1).max_depth(1).sort_by_file_name() {
            let entry = entry.map_err(|e| PluginError::Enumerate {
                path: dir.clone(),
                source: e.into_io_error().unwrap_or_else(|| std::io::Error::other("walk error")),
            })?;

            let path = entry.path();
            if !entry.file_type().is_file()
                || path.extension().and_then(|e| e.to_str()) != Some(SCRIPT_EXTENSION)
            {
                continue;
            }

            let file_name = entry.file_name().to_string_lossy().to_string();
            let content = std::fs::read(path).map_err(|e| PluginError::Read {
                name: file_name.clone(),
                message: e.to_string(),
            })?;

            entries.push(ScriptEntry { category: category.to_string(), file_name, content });
        }

        Ok(entries)
    }
}

impl ScriptSource for DirectorySource {
    fn categories(&self) -> PluginResult<Vec<String>> {
        let read_dir = std::fs::read_dir(&self.root)
            .map_err(|source| PluginError::Enumerate { path: self.root.clone(), source })?;

        let mut categories = Vec::new();
        for entry in read_dir {
            let entry = entry
                .map_err(|source| PluginError::Enumerate { path: self.root.clone(), source })?;
            if entry.path().is_dir() {
                categories.push(entry.file_name().to_string_lossy().to_string());
            }
        }
        categories.sort();
        Ok(categories)
    }

    fn entries(&self, category: Option<&str>) -> PluginResult<Vec<ScriptEntry>> {
        match category {
            Some(name) => self.read_category(name),
            None => {
                let mut entries = Vec::new();
                for name in self.categories()? {
                    entries.extend(self.read_category(&name)?);
                }
                Ok(entries)
            }
        }
    }
}
