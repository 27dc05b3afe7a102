//! Project-level operations: create, load, remake, attach
//!
//! These compose the config resolver, the remote fetch and the platform into
//! the user-facing workflows. User interaction (confirmations and progress)
//! goes through [`Interaction`] so the workflows stay free of terminal code.

use std::fmt;

use unholy_config::{
    ConfigResolver, ConfigStack, RepoUnholyfile, ScriptStack, UNHOLYFILE, document,
};
use unholy_git::{RemoteFiles, guess_project_from_url};
use unholy_platform::{Container, ContainerPlatform, ExecOptions};

use crate::compose::UnholyCompose;
use crate::labels::WORKSPACE_MOUNTPOINT;
use crate::{Error, Result};

/// Shell used by [`shell`] when `dev.shell` is not configured.
pub const DEFAULT_SHELL: &str = "/bin/bash";

/// A question that must be answered before a destructive step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Confirmation {
    /// A local project record with this name already exists
    OverwriteProject { name: String },
    /// The project's workspace volume exists and would be destroyed
    DestroyWorkspace { name: String, volume: String },
}

impl fmt::Display for Confirmation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OverwriteProject { name } => write!(
                f,
                "Project '{name}' exists locally. Are you sure you want to overwrite it?"
            ),
            Self::DestroyWorkspace { volume, .. } => write!(
                f,
                "Workspace volume '{volume}' already exists. Are you sure you want to blow it away?"
            ),
        }
    }
}

/// Milestones reported while a workflow runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    FetchUnholyfile { repository: String },
    WriteProject { name: String },
    RemoveDevenv,
    DeleteWorkspace { volume: String },
    CreateWorkspace,
    Clone { repository: String },
    ComposeUp,
    CreateDevenv,
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::FetchUnholyfile { repository } => write!(f, "Fetching Unholyfile from {repository}"),
            Self::WriteProject { name } => write!(f, "Writing project '{name}'"),
            Self::RemoveDevenv => write!(f, "Removing old devenv"),
            Self::DeleteWorkspace { volume } => write!(f, "Deleting workspace {volume}"),
            Self::CreateWorkspace => write!(f, "Creating workspace"),
            Self::Clone { repository } => write!(f, "Cloning {repository}"),
            Self::ComposeUp => write!(f, "Starting compose project"),
            Self::CreateDevenv => write!(f, "Creating devenv"),
        }
    }
}

/// The user-facing side of a workflow.
pub trait Interaction {
    /// Ask before a destructive step; `false` aborts the workflow.
    fn confirm(&mut self, confirmation: &Confirmation) -> Result<bool>;

    fn progress(&mut self, _step: &Step) {}
}

/// Parameters for [`new_project`].
#[derive(Debug, Clone, Default)]
pub struct NewProject {
    pub repository: String,
    /// Project name; guessed from the repository URL when absent
    pub name: Option<String>,
    /// Name for the cloned remote (git's default when absent)
    pub remote: Option<String>,
    /// Branch to check out (the remote's HEAD when absent)
    pub branch: Option<String>,
    /// Platform context to record for the project
    pub context: Option<String>,
}

impl NewProject {
    pub fn new(repository: impl Into<String>) -> Self {
        Self {
            repository: repository.into(),
            ..Default::default()
        }
    }

    /// The explicit name, or the one derived from the repository URL.
    pub fn project_name(&self) -> Result<String> {
        match &self.name {
            Some(name) => Ok(name.clone()),
            None => Ok(guess_project_from_url(&self.repository)?),
        }
    }

    /// The platform context `new` runs against.
    ///
    /// An explicit `context` wins; otherwise it is whatever later commands
    /// will resolve for the project, so the environment lands on the same
    /// daemon they talk to.
    pub fn platform_context(&self, resolver: &ConfigResolver) -> Result<Option<String>> {
        match &self.context {
            Some(context) => Ok(Some(context.clone())),
            None => platform_context(resolver, &self.project_name()?),
        }
    }
}

/// Everything resolved for a project, including its repository layer.
#[derive(Debug, Clone)]
pub struct ProjectContext {
    pub name: String,
    /// The repository's Unholyfile, verbatim
    pub unholyfile: String,
    pub config: ConfigStack,
    pub scripts: ScriptStack,
}

impl ProjectContext {
    fn resolve(resolver: &ConfigResolver, name: &str, unholyfile: String) -> Result<Self> {
        let (config, scripts) =
            resolver.resolve_all(Some(name), Some(RepoUnholyfile::Text(&unholyfile)))?;
        Ok(Self {
            name: name.to_string(),
            unholyfile,
            config,
            scripts,
        })
    }

    pub fn compose<'a>(&'a self, platform: &'a dyn ContainerPlatform) -> Result<UnholyCompose<'a>> {
        UnholyCompose::new(platform, &self.config, &self.name)
    }
}

/// The platform context recorded for a project, from its local layers.
pub fn platform_context(resolver: &ConfigResolver, name: &str) -> Result<Option<String>> {
    let config = resolver.resolve(Some(name), None)?;
    Ok(config.find_str("context")?.map(str::to_string))
}

/// Create a project from a repository and bring up its environment.
///
/// Writes the project record, (re)creates the workspace, clones the
/// repository and runs the compose project in a bootstrap container, then
/// creates the devenv with the full script stack.
///
/// # Errors
///
/// Returns [`Error::Aborted`] when a confirmation is declined. Nothing is
/// rolled back on failure; running `new` again is the recovery path.
pub fn new_project(
    platform: &dyn ContainerPlatform,
    remote: &dyn RemoteFiles,
    resolver: &ConfigResolver,
    request: &NewProject,
    ui: &mut dyn Interaction,
) -> Result<ProjectContext> {
    let name = request.project_name()?;
    let record_path = resolver.paths().project_config(&name);

    if record_path.is_file() && !ui.confirm(&Confirmation::OverwriteProject { name: name.clone() })? {
        return Err(Error::Aborted);
    }

    ui.progress(&Step::FetchUnholyfile {
        repository: request.repository.clone(),
    });
    let raw = remote.fetch_file(&request.repository, UNHOLYFILE, request.branch.as_deref())?;
    let unholyfile = String::from_utf8(raw).map_err(|_| Error::Encoding {
        path: format!("{}:{UNHOLYFILE}", request.repository),
    })?;

    // The workspace tag is snapshotted from the projectless stack so later
    // changes to the defaults don't orphan the volume.
    let vanilla = resolver.resolve(None, None)?;
    let volume = vanilla.get_str("dev.volume")?;

    ui.progress(&Step::WriteProject { name: name.clone() });
    document::edit(&record_path, true, |doc| {
        document::set_path(doc, "repository", toml_edit::value(&request.repository))?;
        if let Some(context) = &request.context {
            document::set_path(doc, "context", toml_edit::value(context))?;
        }
        document::set_path(doc, "dev.volume", toml_edit::value(volume))?;
        Ok::<_, Error>(())
    })?;
    tracing::info!(project = %name, path = %record_path.display(), "Wrote project record");

    let project = ProjectContext::resolve(resolver, &name, unholyfile)?;
    let compose = project.compose(platform)?;

    ui.progress(&Step::RemoveDevenv);
    compose.devenv_remove()?;

    if let Some(existing) = compose.workspace_get()? {
        let question = Confirmation::DestroyWorkspace {
            name: name.clone(),
            volume: existing.name.clone(),
        };
        if !ui.confirm(&question)? {
            return Err(Error::Aborted);
        }
        // git wants an empty directory; recreating the volume is simplest.
        ui.progress(&Step::DeleteWorkspace {
            volume: existing.name,
        });
        compose.workspace_delete()?;
    }
    ui.progress(&Step::CreateWorkspace);
    compose.workspace_create()?;

    let bootstrap = compose.bootstrap_spawn()?;
    ui.progress(&Step::Clone {
        repository: request.repository.clone(),
    });
    compose.clone_repository(
        &bootstrap,
        &request.repository,
        request.remote.as_deref(),
        request.branch.as_deref(),
    )?;
    ui.progress(&Step::ComposeUp);
    compose.compose_up(&bootstrap)?;
    bootstrap.release()?;

    ui.progress(&Step::CreateDevenv);
    compose.devenv_create(&project.scripts)?;

    Ok(project)
}

/// Resolve a project's full configuration, reading its Unholyfile from the
/// workspace.
pub fn load_project(
    platform: &dyn ContainerPlatform,
    resolver: &ConfigResolver,
    name: &str,
) -> Result<ProjectContext> {
    if !resolver.paths().project_exists(name) {
        return Err(Error::UnknownProject {
            name: name.to_string(),
        });
    }

    // Resolve without the repository layer first: enough to find the
    // workspace and read the Unholyfile out of it.
    let local = resolver.resolve(Some(name), None)?;
    let unholyfile = UnholyCompose::new(platform, &local, name)?.fetch_unholyfile()?;

    ProjectContext::resolve(resolver, name, unholyfile)
}

/// Recreate the devenv from fresh configuration. The workspace is untouched.
pub fn remake(
    platform: &dyn ContainerPlatform,
    resolver: &ConfigResolver,
    name: &str,
    ui: &mut dyn Interaction,
) -> Result<Container> {
    let project = load_project(platform, resolver, name)?;
    let compose = project.compose(platform)?;

    ui.progress(&Step::RemoveDevenv);
    compose.devenv_remove()?;

    let bootstrap = compose.bootstrap_spawn()?;
    ui.progress(&Step::ComposeUp);
    compose.compose_up(&bootstrap)?;
    bootstrap.release()?;

    ui.progress(&Step::CreateDevenv);
    compose.devenv_create(&project.scripts)
}

/// The running devenv of a loaded project.
pub fn require_devenv(project: &ProjectContext, platform: &dyn ContainerPlatform) -> Result<Container> {
    let compose = project.compose(platform)?;
    compose
        .devenv_get()?
        .filter(Container::is_running)
        .ok_or_else(|| Error::NoDevenv {
            project: project.name.clone(),
        })
}

/// Open an interactive shell in the devenv. Returns the shell's exit code.
pub fn shell(platform: &dyn ContainerPlatform, resolver: &ConfigResolver, name: &str) -> Result<i32> {
    let project = load_project(platform, resolver, name)?;
    let devenv = require_devenv(&project, platform)?;
    let shell = project
        .config
        .find_str("dev.shell")?
        .unwrap_or(DEFAULT_SHELL)
        .to_string();

    let options = ExecOptions {
        working_dir: Some(WORKSPACE_MOUNTPOINT.to_string()),
        tty: true,
        interactive: true,
        ..Default::default()
    };
    let output = platform.exec(&devenv.id, &[shell], &options)?;
    Ok(output.exit_code)
}

/// Host command line that runs `nvim` attached to the devenv.
pub fn editor_argv(
    platform: &dyn ContainerPlatform,
    resolver: &ConfigResolver,
    name: &str,
) -> Result<Vec<String>> {
    let project = load_project(platform, resolver, name)?;
    let devenv = require_devenv(&project, platform)?;

    let options = ExecOptions {
        working_dir: Some(WORKSPACE_MOUNTPOINT.to_string()),
        interactive: true,
        ..Default::default()
    };
    Ok(platform.exec_argv(&devenv.id, &["nvim".to_string()], &options))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_project_name_prefers_explicit_name() {
        let mut request = NewProject::new("https://example.com/org/My-Repo.git");
        assert_eq!(request.project_name().unwrap(), "My-Repo");

        request.name = Some("custom".into());
        assert_eq!(request.project_name().unwrap(), "custom");
    }

    #[test]
    fn test_confirmation_messages() {
        let overwrite = Confirmation::OverwriteProject { name: "demo".into() };
        assert!(overwrite.to_string().contains("'demo'"));

        let destroy = Confirmation::DestroyWorkspace {
            name: "demo".into(),
            volume: "demo_workspace".into(),
        };
        assert!(destroy.to_string().contains("demo_workspace"));
    }
}
