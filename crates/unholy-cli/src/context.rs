//! Per-invocation state shared by the commands

use std::path::PathBuf;

use unholy_config::{ConfigPaths, ConfigResolver};
use unholy_core::platform_context;
use unholy_platform::DockerCli;

use crate::error::Result;

/// Where configuration lives, and how to reach the platform for a project.
#[derive(Debug, Clone)]
pub struct CliContext {
    paths: ConfigPaths,
}

impl CliContext {
    /// Use `config_dir` when given, else the platform configuration directory.
    pub fn new(config_dir: Option<PathBuf>) -> Result<Self> {
        let paths = match config_dir {
            Some(dir) => ConfigPaths::new(dir),
            None => ConfigPaths::from_env()?,
        };
        tracing::debug!(root = %paths.root().display(), "Using configuration directory");
        Ok(Self { paths })
    }

    pub fn paths(&self) -> &ConfigPaths {
        &self.paths
    }

    pub fn resolver(&self) -> ConfigResolver {
        ConfigResolver::new(self.paths.clone())
    }

    /// Platform client for a project, honouring its recorded `context`.
    pub fn platform(&self, project: &str) -> Result<DockerCli> {
        let context = platform_context(&self.resolver(), project)?;
        Ok(DockerCli::new().with_context(context))
    }
}
