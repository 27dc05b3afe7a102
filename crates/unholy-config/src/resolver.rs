//! Configuration and script resolution across Unholyfile layers
//!
//! The `ConfigResolver` gathers Unholyfiles from up to four sources, lowest
//! precedence first:
//!
//! 1. **core** - built into the tool
//! 2. **user** - `<config dir>/Unholyfile`, if it exists
//! 3. **project** - `<config dir>/<name>.Unholyfile`, if a name is given and it exists
//! 4. **repo** - the Unholyfile fetched from the project repository, if supplied
//!
//! Both halves of each file come from the same enumeration: the TOML blocks
//! become a [`ConfigStack`] (highest precedence first, plus a `defaults`
//! layer at the bottom), and the scripts become a [`ScriptStack`] (lowest
//! precedence first, so general setup runs before project setup).

use std::fs;

use toml_edit::{Item, Table, value};

use crate::document::ConfigDocument;
use crate::error::{Error, Result};
use crate::headmatter;
use crate::paths::ConfigPaths;
use crate::scripts::{Script, ScriptStack};
use crate::stack::{ConfigLayer, ConfigStack, LayerSource};

/// The Unholyfile shipped with the tool.
pub const CORE_UNHOLYFILE: &str = include_str!("core.Unholyfile");

/// A repository-supplied Unholyfile.
#[derive(Debug, Clone, Copy)]
pub enum RepoUnholyfile<'a> {
    /// Raw text, headmatter and script
    Text(&'a str),
    /// An already-parsed document; contributes an empty script
    Document(&'a ConfigDocument),
}

impl<'a> From<&'a str> for RepoUnholyfile<'a> {
    fn from(text: &'a str) -> Self {
        Self::Text(text)
    }
}

impl<'a> From<&'a ConfigDocument> for RepoUnholyfile<'a> {
    fn from(document: &'a ConfigDocument) -> Self {
        Self::Document(document)
    }
}

/// One parsed source, before it is split into config and script.
#[derive(Debug)]
struct SourceEntry {
    source: LayerSource,
    document: ConfigDocument,
    script: String,
}

/// Resolves configuration and script stacks from the layered Unholyfiles.
#[derive(Debug, Clone)]
pub struct ConfigResolver {
    paths: ConfigPaths,
    core: String,
}

impl ConfigResolver {
    /// Create a resolver over the given configuration directory.
    pub fn new(paths: ConfigPaths) -> Self {
        Self {
            paths,
            core: CORE_UNHOLYFILE.to_string(),
        }
    }

    /// Replace the built-in core Unholyfile.
    ///
    /// Mostly useful for tests that need precise control over the lowest layer.
    pub fn with_core(mut self, core: impl Into<String>) -> Self {
        self.core = core.into();
        self
    }

    pub fn paths(&self) -> &ConfigPaths {
        &self.paths
    }

    /// Resolve the configuration stack.
    ///
    /// Invalid TOML in any layer fails the whole resolution.
    pub fn resolve(
        &self,
        project_name: Option<&str>,
        repo: Option<RepoUnholyfile<'_>>,
    ) -> Result<ConfigStack> {
        Ok(self.resolve_all(project_name, repo)?.0)
    }

    /// Resolve the script stack, general scripts first.
    pub fn resolve_scripts(
        &self,
        project_name: Option<&str>,
        repo: Option<RepoUnholyfile<'_>>,
    ) -> Result<ScriptStack> {
        Ok(self.resolve_all(project_name, repo)?.1)
    }

    /// Resolve both stacks from a single pass over the sources.
    pub fn resolve_all(
        &self,
        project_name: Option<&str>,
        repo: Option<RepoUnholyfile<'_>>,
    ) -> Result<(ConfigStack, ScriptStack)> {
        let entries = self.gather(project_name, repo)?;

        let mut layers = Vec::with_capacity(entries.len() + 1);
        let mut scripts = Vec::with_capacity(entries.len());
        for entry in entries {
            layers.push(ConfigLayer::new(entry.source.clone(), entry.document));
            scripts.push(Script::new(entry.source, entry.script));
        }
        // Most specific layer first
        layers.reverse();
        layers.push(ConfigLayer::new(
            LayerSource::Defaults,
            defaults_document(project_name),
        ));

        tracing::debug!(
            layers = ?layers.iter().map(|l| l.source.to_string()).collect::<Vec<_>>(),
            "Resolved config stack"
        );
        Ok((ConfigStack::new(layers), ScriptStack::new(scripts)))
    }

    /// Enumerate the sources that exist, lowest precedence first.
    fn gather(
        &self,
        project_name: Option<&str>,
        repo: Option<RepoUnholyfile<'_>>,
    ) -> Result<Vec<SourceEntry>> {
        let mut entries = Vec::with_capacity(4);

        // Layer 1 - core
        entries.push(parse_entry(LayerSource::Core, &self.core, "core Unholyfile")?);

        // Layer 2 - user
        let user_path = self.paths.user_config();
        if user_path.is_file() {
            tracing::debug!(path = %user_path.display(), "Loading user Unholyfile");
            let text = fs::read_to_string(&user_path).map_err(|e| Error::io(&user_path, e))?;
            let origin = format!("user Unholyfile ({})", user_path.display());
            entries.push(parse_entry(LayerSource::User, &text, &origin)?);
        } else {
            tracing::debug!(path = %user_path.display(), "No user Unholyfile - skipping");
        }

        // Layer 3 - project
        if let Some(name) = project_name {
            let project_path = self.paths.project_config(name);
            if project_path.is_file() {
                tracing::debug!(path = %project_path.display(), "Loading project Unholyfile");
                let text = fs::read_to_string(&project_path)
                    .map_err(|e| Error::io(&project_path, e))?;
                let origin = format!("project '{}' Unholyfile ({})", name, project_path.display());
                entries.push(parse_entry(
                    LayerSource::Project(name.to_string()),
                    &text,
                    &origin,
                )?);
            } else {
                tracing::debug!(path = %project_path.display(), "No project Unholyfile - skipping");
            }
        }

        // Layer 4 - repo
        match repo {
            Some(RepoUnholyfile::Text(text)) => {
                entries.push(parse_entry(LayerSource::Repo, text, "repo Unholyfile")?);
            }
            Some(RepoUnholyfile::Document(document)) => entries.push(SourceEntry {
                source: LayerSource::Repo,
                document: document.clone(),
                script: String::new(),
            }),
            None => {}
        }

        Ok(entries)
    }
}

fn parse_entry(source: LayerSource, text: &str, origin: &str) -> Result<SourceEntry> {
    let (document, tail) = headmatter::parse(text, origin)?;
    Ok(SourceEntry {
        source,
        document,
        script: tail.to_string(),
    })
}

/// The zero-priority layer: `compose.project` defaults to the project name.
fn defaults_document(project_name: Option<&str>) -> ConfigDocument {
    let mut document = ConfigDocument::new();
    if let Some(name) = project_name {
        let mut compose = Table::new();
        compose.insert("project", value(name));
        document.insert("compose", Item::Table(compose));
    }
    document
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_core_unholyfile_parses() {
        let (document, script) = headmatter::parse(CORE_UNHOLYFILE, "core").unwrap();
        assert!(document.contains_key("dev"));
        assert!(script.starts_with("#!/bin/sh"));
    }

    #[test]
    fn test_resolve_without_project_has_no_compose_project() {
        let temp = TempDir::new().unwrap();
        let resolver = ConfigResolver::new(ConfigPaths::new(temp.path()));
        let stack = resolver.resolve(None, None).unwrap();
        assert_eq!(stack.find_str("compose.project").unwrap(), None);
        assert_eq!(stack.get_str("compose.file").unwrap(), "docker-compose.yml");
    }

    #[test]
    fn test_defaults_layer_sets_compose_project() {
        let temp = TempDir::new().unwrap();
        let resolver = ConfigResolver::new(ConfigPaths::new(temp.path()));
        let stack = resolver.resolve(Some("demo"), None).unwrap();
        let resolved = stack.get("compose.project").unwrap();
        assert_eq!(resolved.as_str(), Some("demo"));
        assert_eq!(resolved.source(), Some(&LayerSource::Defaults));
    }

    #[test]
    fn test_parsed_repo_document_contributes_empty_script() {
        let temp = TempDir::new().unwrap();
        let resolver = ConfigResolver::new(ConfigPaths::new(temp.path())).with_core("core\n");
        let document: ConfigDocument = "[dev]\nimage = \"x\"\n".parse().unwrap();

        let (stack, scripts) = resolver
            .resolve_all(None, Some(RepoUnholyfile::from(&document)))
            .unwrap();

        assert_eq!(stack.get_str("dev.image").unwrap(), "x");
        assert_eq!(scripts.texts(), vec!["core\n", ""]);
    }
}
