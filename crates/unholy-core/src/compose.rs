//! Project resources on the container platform
//!
//! [`UnholyCompose`] ties a resolved configuration to the platform and
//! manages the three resources of a project:
//!
//! - **workspace**: a persistent volume holding the cloned repository
//! - **bootstrap**: a one-off container for setup work, see [`BootstrapContainer`]
//! - **devenv**: the long-lived container the user works in
//!
//! Resources are found by label on every call. Nothing is cached, so a
//! lookup followed by a create can race with another invocation; the
//! platform's duplicate-name error surfaces in that case.

use unholy_config::{ConfigStack, ScriptStack, UNHOLYFILE};
use unholy_platform::{
    Container, ContainerPlatform, ContainerSpec, ExecOptions, Labels, Mount, Volume, archive,
    labels as label_map,
};

use crate::bootstrap::BootstrapContainer;
use crate::labels::{
    BOOTSTRAP_IMAGE, BOOTSTRAP_SERVICE, DEVENV_SERVICE, ONE_OFF, PROJECT, SCRIPT_DIR, SERVICE,
    SLUG, SOCKET_MOUNTPOINT, VOLUME, WORKSPACE_MOUNTPOINT,
};
use crate::processes;
use crate::{Error, Result};

/// A project's view of the container platform.
pub struct UnholyCompose<'a> {
    platform: &'a dyn ContainerPlatform,
    config: &'a ConfigStack,
    /// Compose project name: `compose.project`, or the project name
    project: String,
}

impl<'a> UnholyCompose<'a> {
    pub fn new(
        platform: &'a dyn ContainerPlatform,
        config: &'a ConfigStack,
        name: &str,
    ) -> Result<Self> {
        let project = config
            .find_str("compose.project")?
            .unwrap_or(name)
            .to_string();
        Ok(Self {
            platform,
            config,
            project,
        })
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    pub fn config(&self) -> &'a ConfigStack {
        self.config
    }

    pub fn platform(&self) -> &'a dyn ContainerPlatform {
        self.platform
    }

    fn project_labels(&self) -> Labels {
        label_map([(PROJECT, self.project.as_str())])
    }

    fn service_labels(&self, service: &str) -> Labels {
        label_map([(PROJECT, self.project.as_str()), (SERVICE, service)])
    }

    // ------------------------------------------------------------------
    // Workspace
    // ------------------------------------------------------------------

    /// The workspace tag, `dev.volume`.
    pub fn workspace_tag(&self) -> Result<&'a str> {
        Ok(self.config.get_str("dev.volume")?)
    }

    /// Name the workspace volume gets when created.
    pub fn workspace_name(&self) -> Result<String> {
        Ok(format!("{}_{}", self.project, self.workspace_tag()?))
    }

    pub fn workspace_get(&self) -> Result<Option<Volume>> {
        let tag = self.workspace_tag()?;
        let volumes = self.platform.list_volumes(&self.project_labels())?;
        Ok(volumes
            .into_iter()
            .find(|v| v.labels.get(VOLUME).map(String::as_str) == Some(tag)))
    }

    /// Create the workspace volume. It must not exist yet.
    pub fn workspace_create(&self) -> Result<Volume> {
        if let Some(existing) = self.workspace_get()? {
            return Err(Error::invariant(format!(
                "workspace volume '{}' already exists for project '{}'",
                existing.name, self.project
            )));
        }

        let tag = self.workspace_tag()?;
        let labels = label_map([(PROJECT, self.project.as_str()), (VOLUME, tag)]);
        Ok(self
            .platform
            .create_volume(&self.workspace_name()?, &labels)?)
    }

    /// Remove the workspace volume if there is one. Returns whether it existed.
    pub fn workspace_delete(&self) -> Result<bool> {
        match self.workspace_get()? {
            Some(volume) => {
                self.platform.remove_volume(&volume.name)?;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    fn require_workspace(&self, purpose: &str) -> Result<Volume> {
        self.workspace_get()?.ok_or_else(|| {
            Error::invariant(format!(
                "{purpose} requires the workspace, but project '{}' has none",
                self.project
            ))
        })
    }

    fn mounts(&self, workspace: &Volume) -> Result<Vec<Mount>> {
        let mut mounts = vec![Mount::Volume {
            source: workspace.name.clone(),
            target: WORKSPACE_MOUNTPOINT.to_string(),
        }];
        match self.platform.socket_path()? {
            Some(socket) => mounts.push(Mount::Bind {
                source: socket.display().to_string(),
                target: SOCKET_MOUNTPOINT.to_string(),
            }),
            None => tracing::debug!("Platform socket is not local - not mounting it"),
        }
        Ok(mounts)
    }

    // ------------------------------------------------------------------
    // Bootstrap
    // ------------------------------------------------------------------

    /// Start a one-off bootstrap container with the workspace mounted.
    ///
    /// The container is stopped and removed when the returned guard is
    /// dropped or released.
    pub fn bootstrap_spawn(&self) -> Result<BootstrapContainer<'a>> {
        let image = self
            .config
            .find_str("bootstrap.image")?
            .unwrap_or(BOOTSTRAP_IMAGE);
        self.platform.pull_image(image)?;
        let workspace = self.require_workspace("a bootstrap container")?;

        let slug = uuid::Uuid::new_v4().simple().to_string();
        let mut labels = self.service_labels(BOOTSTRAP_SERVICE);
        labels.insert(ONE_OFF.to_string(), "True".to_string());
        labels.insert(SLUG.to_string(), slug.clone());

        let spec = ContainerSpec {
            name: Some(format!("{}-{}-run-{}", self.project, BOOTSTRAP_SERVICE, &slug[..12])),
            image: image.to_string(),
            command: vec!["sleep".into(), "infinity".into()],
            labels,
            mounts: self.mounts(&workspace)?,
            working_dir: Some(WORKSPACE_MOUNTPOINT.to_string()),
            init: true,
            auto_remove: true,
            ..Default::default()
        };

        let container = self.platform.create_container(&spec)?;
        let guard = BootstrapContainer::new(self.platform, container);
        self.platform.start_container(guard.id())?;
        tracing::info!(project = %self.project, container = %guard.container().name, "Started bootstrap container");
        Ok(guard)
    }

    /// Clone `repository` into the workspace from a bootstrap container.
    pub fn clone_repository(
        &self,
        container: &BootstrapContainer<'_>,
        repository: &str,
        remote: Option<&str>,
        branch: Option<&str>,
    ) -> Result<()> {
        let command = processes::clone_command(repository, remote, branch);
        processes::run_checked(self.platform, container.id(), &command)?;
        Ok(())
    }

    /// Bring up the project's compose stack from a bootstrap container.
    pub fn compose_up(&self, container: &BootstrapContainer<'_>) -> Result<()> {
        let command = processes::compose_command(self.config, &self.project, &["up", "--detach"])?;
        processes::run_checked(self.platform, container.id(), &command)?;
        Ok(())
    }

    // ------------------------------------------------------------------
    // Devenv
    // ------------------------------------------------------------------

    pub fn devenv_get(&self) -> Result<Option<Container>> {
        let mut containers = self
            .platform
            .list_containers(&self.service_labels(DEVENV_SERVICE))?;
        if containers.len() > 1 {
            tracing::warn!(project = %self.project, count = containers.len(), "Multiple devenv containers found");
        }
        Ok(if containers.is_empty() {
            None
        } else {
            Some(containers.swap_remove(0))
        })
    }

    /// Force-remove every devenv container. Returns how many were removed.
    pub fn devenv_remove(&self) -> Result<usize> {
        let containers = self
            .platform
            .list_containers(&self.service_labels(DEVENV_SERVICE))?;
        let mut removed = 0;
        for container in containers {
            match self.platform.remove_container(&container.id, true) {
                Ok(()) => {
                    tracing::info!(container = %container.name, "Removed devenv");
                    removed += 1;
                }
                Err(e) if e.is_gone() => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(removed)
    }

    /// Create and start the devenv, then run the script stack in it.
    ///
    /// A failing script aborts with [`Error::ScriptFailed`]; the container is
    /// left running for inspection.
    pub fn devenv_create(&self, scripts: &ScriptStack) -> Result<Container> {
        let workspace = self.require_workspace("the devenv")?;
        let image = self.config.get_str("dev.image")?;
        self.platform.pull_image(image)?;

        let mut labels = self.service_labels(DEVENV_SERVICE);
        labels.insert(ONE_OFF.to_string(), "False".to_string());

        let mut mounts = self.mounts(&workspace)?;
        mounts.push(Mount::Tmpfs {
            target: "/tmp".to_string(),
        });

        let spec = ContainerSpec {
            name: Some(format!("{}-{}-1", self.project, DEVENV_SERVICE)),
            image: image.to_string(),
            command: vec!["sleep".into(), "infinity".into()],
            labels,
            mounts,
            working_dir: Some(WORKSPACE_MOUNTPOINT.to_string()),
            init: true,
            ..Default::default()
        };

        let mut container = self.platform.create_container(&spec)?;
        self.platform.start_container(&container.id)?;
        container.state = "running".to_string();
        tracing::info!(project = %self.project, container = %container.name, "Started devenv");

        self.connect_networks(&container)?;
        self.run_scripts(&container, scripts)?;
        Ok(container)
    }

    /// Attach the container to every network of the compose project.
    fn connect_networks(&self, container: &Container) -> Result<()> {
        for network in self.platform.list_networks(&self.project_labels())? {
            self.platform.connect_network(&network.name, &container.id)?;
        }
        Ok(())
    }

    fn run_scripts(&self, container: &Container, scripts: &ScriptStack) -> Result<()> {
        let options = ExecOptions {
            working_dir: Some(WORKSPACE_MOUNTPOINT.to_string()),
            ..Default::default()
        };

        for (index, script) in scripts.runnable() {
            let path = script_path(index);
            self.platform
                .put_file(&container.id, &path, script.text.as_bytes(), 0o755)?;

            tracing::info!(index, layer = %script.source, "Running script");
            let output = self
                .platform
                .exec(&container.id, &script_command(&path, &script.text), &options)?;
            if !output.success() {
                return Err(Error::ScriptFailed {
                    index,
                    layer: script.source.to_string(),
                    exit_code: output.exit_code,
                });
            }
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Repository Unholyfile
    // ------------------------------------------------------------------

    /// Read the Unholyfile out of the workspace.
    ///
    /// Uses the devenv when it is running, otherwise a bootstrap container.
    pub fn fetch_unholyfile(&self) -> Result<String> {
        let path = format!("{WORKSPACE_MOUNTPOINT}/{UNHOLYFILE}");

        let contents = match self.devenv_get()?.filter(Container::is_running) {
            Some(devenv) => self.read_file(&devenv.id, &path)?,
            None => {
                let bootstrap = self.bootstrap_spawn()?;
                let contents = self.read_file(bootstrap.id(), &path);
                bootstrap.release()?;
                contents?
            }
        };

        String::from_utf8(contents).map_err(|_| Error::Encoding { path })
    }

    fn read_file(&self, container: &str, path: &str) -> Result<Vec<u8>> {
        let not_found = || Error::FileNotFound {
            container: container.to_string(),
            path: path.to_string(),
        };

        let tarball = match self.platform.get_archive(container, path) {
            Ok(tarball) => tarball,
            Err(e) if e.is_not_found() => return Err(not_found()),
            Err(e) => return Err(e.into()),
        };
        archive::read_single_file(&tarball)?.ok_or_else(not_found)
    }
}

/// Where the script at `index` of the stack is written.
pub fn script_path(index: usize) -> String {
    format!("{SCRIPT_DIR}/stack-{index}.sh")
}

/// Scripts without an interpreter line run under `/bin/sh`.
fn script_command(path: &str, text: &str) -> Vec<String> {
    if text.starts_with("#!") {
        vec![path.to_string()]
    } else {
        vec!["/bin/sh".to_string(), path.to_string()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[test]
    fn test_script_path_carries_index() {
        assert_eq!(script_path(0), "/opt/unholy/stack-0.sh");
        assert_eq!(script_path(3), "/opt/unholy/stack-3.sh");
    }

    #[rstest]
    #[case("#!/bin/bash\necho", &["/s"])]
    #[case("#!/usr/bin/env python3\nprint()", &["/s"])]
    #[case("echo hi", &["/bin/sh", "/s"])]
    #[case("\n#!/bin/bash\n", &["/bin/sh", "/s"])]
    fn test_script_command_respects_shebang(#[case] text: &str, #[case] expected: &[&str]) {
        assert_eq!(script_command("/s", text), expected);
    }
}
