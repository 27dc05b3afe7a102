//! Locations of locally stored Unholyfiles

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

/// File name of the per-machine Unholyfile, and of the one inside a repository.
pub const UNHOLYFILE: &str = "Unholyfile";

/// Suffix of per-project records: `<name>.Unholyfile`.
const PROJECT_SUFFIX: &str = ".Unholyfile";

/// The configuration directory and the files within it.
///
/// Uses the platform-appropriate directory by default:
/// - Linux: `~/.config/unholy/`
/// - macOS: `~/Library/Application Support/unholy/`
/// - Windows: `%APPDATA%\unholy\`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigPaths {
    root: PathBuf,
}

impl ConfigPaths {
    /// Use an explicit configuration directory.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Use the platform configuration directory.
    pub fn from_env() -> Result<Self> {
        dirs::config_dir()
            .map(|d| Self::new(d.join("unholy")))
            .ok_or(Error::NoConfigDir)
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// The per-machine Unholyfile.
    pub fn user_config(&self) -> PathBuf {
        self.root.join(UNHOLYFILE)
    }

    /// The local record for a project.
    pub fn project_config(&self, name: &str) -> PathBuf {
        self.root.join(format!("{}{}", name, PROJECT_SUFFIX))
    }

    pub fn project_exists(&self, name: &str) -> bool {
        self.project_config(name).is_file()
    }

    /// Names of all locally known projects, sorted.
    pub fn list_projects(&self) -> Result<Vec<String>> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Error::io(&self.root, e)),
        };

        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|e| Error::io(&self.root, e))?;
            if !entry.path().is_file() {
                continue;
            }
            let file_name = entry.file_name();
            let Some(file_name) = file_name.to_str() else {
                continue;
            };
            if let Some(name) = file_name.strip_suffix(PROJECT_SUFFIX)
                && !name.is_empty()
            {
                names.push(name.to_string());
            }
        }

        names.sort();
        Ok(names)
    }
}
