//! In-memory container platform.
//!
//! [`FakePlatform`] keeps volumes, containers and networks in a `RefCell`
//! and mimics the platform behaviours the orchestrator depends on:
//!
//! - auto-removing containers disappear when stopped
//! - removing something that is gone reports `NotFound`
//! - exec requires a running container and records every call
//! - files written into a container under a volume mount land in the volume

use std::cell::{Ref, RefCell};
use std::collections::BTreeMap;
use std::path::PathBuf;

use unholy_platform::{
    Container, ContainerPlatform, ContainerSpec, Error, ExecOptions, ExecOutput, Labels, Mount,
    Network, OutputChunk, Result, Stream, Volume, archive, matches_labels,
};

/// One recorded `exec`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecRecord {
    pub container: String,
    pub command: Vec<String>,
    pub options: ExecOptions,
}

impl ExecRecord {
    pub fn command_line(&self) -> String {
        self.command.join(" ")
    }
}

#[derive(Debug, Clone)]
pub struct FakeVolume {
    pub volume: Volume,
    /// Files keyed by path relative to the volume root
    pub files: BTreeMap<String, Vec<u8>>,
}

#[derive(Debug, Clone)]
pub struct FakeContainer {
    pub container: Container,
    pub spec: ContainerSpec,
    /// Files written outside any volume, keyed by absolute path
    pub files: BTreeMap<String, (Vec<u8>, u32)>,
}

#[derive(Debug)]
pub struct FakeState {
    pub volumes: BTreeMap<String, FakeVolume>,
    pub containers: Vec<FakeContainer>,
    pub networks: Vec<Network>,
    pub pulled: Vec<String>,
    pub execs: Vec<ExecRecord>,
    pub connections: Vec<(String, String)>,
    pub socket: Option<PathBuf>,
    responses: Vec<(String, ExecOutput)>,
    next_id: u64,
}

impl Default for FakeState {
    fn default() -> Self {
        Self {
            volumes: BTreeMap::new(),
            containers: Vec::new(),
            networks: Vec::new(),
            pulled: Vec::new(),
            execs: Vec::new(),
            connections: Vec::new(),
            socket: Some(PathBuf::from("/var/run/docker.sock")),
            responses: Vec::new(),
            next_id: 1,
        }
    }
}

impl FakeState {
    fn container(&self, id: &str) -> Result<&FakeContainer> {
        self.containers
            .iter()
            .find(|c| c.container.id == id || c.container.name == id)
            .ok_or_else(|| not_found("container", id))
    }

    fn container_mut(&mut self, id: &str) -> Result<&mut FakeContainer> {
        self.containers
            .iter_mut()
            .find(|c| c.container.id == id || c.container.name == id)
            .ok_or_else(|| not_found("container", id))
    }

    /// The volume and relative path backing `path` in a container, if any.
    fn volume_path(&self, container: &FakeContainer, path: &str) -> Option<(String, String)> {
        container.spec.mounts.iter().find_map(|mount| match mount {
            Mount::Volume { source, target } => path
                .strip_prefix(target.as_str())
                .and_then(|rest| rest.strip_prefix('/'))
                .map(|rel| (source.clone(), rel.to_string())),
            _ => None,
        })
    }
}

fn not_found(kind: &'static str, name: &str) -> Error {
    Error::NotFound {
        kind,
        name: name.to_string(),
    }
}

fn rejected(command: String, stderr: &str) -> Error {
    Error::Command {
        command,
        status: "exit status: 1".to_string(),
        stderr: stderr.to_string(),
    }
}

/// An in-memory [`ContainerPlatform`].
#[derive(Debug, Default)]
pub struct FakePlatform {
    state: RefCell<FakeState>,
}

impl FakePlatform {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inspect the recorded state.
    pub fn state(&self) -> Ref<'_, FakeState> {
        self.state.borrow()
    }

    /// Report no local socket, like a remote context.
    pub fn without_socket(self) -> Self {
        self.state.borrow_mut().socket = None;
        self
    }

    pub fn add_network(&self, name: &str, labels: Labels) {
        let mut state = self.state.borrow_mut();
        let id = format!("net{:04}", state.next_id);
        state.next_id += 1;
        state.networks.push(Network {
            id,
            name: name.to_string(),
            labels,
        });
    }

    /// Put a file straight into a volume.
    pub fn set_volume_file(&self, volume: &str, path: &str, contents: impl Into<Vec<u8>>) {
        let mut state = self.state.borrow_mut();
        let volume = state
            .volumes
            .get_mut(volume)
            .unwrap_or_else(|| panic!("set_volume_file: no volume '{volume}'"));
        volume.files.insert(path.to_string(), contents.into());
    }

    /// Execs whose command line starts with `prefix` exit with `exit_code`
    /// and print `stdout`. Later registrations win.
    pub fn respond_to(&self, prefix: &str, exit_code: i32, stdout: &str) {
        let chunks = if stdout.is_empty() {
            Vec::new()
        } else {
            vec![OutputChunk {
                stream: Stream::Stdout,
                data: stdout.as_bytes().to_vec(),
            }]
        };
        self.state
            .borrow_mut()
            .responses
            .insert(0, (prefix.to_string(), ExecOutput { exit_code, chunks }));
    }

    /// Containers carrying every label in `filter`.
    pub fn containers_with(&self, filter: &Labels) -> Vec<Container> {
        self.state
            .borrow()
            .containers
            .iter()
            .filter(|c| matches_labels(&c.container.labels, filter))
            .map(|c| c.container.clone())
            .collect()
    }

    pub fn volume_names(&self) -> Vec<String> {
        self.state.borrow().volumes.keys().cloned().collect()
    }

    /// Command lines of every exec so far.
    pub fn exec_lines(&self) -> Vec<String> {
        self.state
            .borrow()
            .execs
            .iter()
            .map(ExecRecord::command_line)
            .collect()
    }

    /// Contents of a file written into a container outside any volume.
    pub fn container_file(&self, container: &str, path: &str) -> Option<Vec<u8>> {
        let state = self.state.borrow();
        state
            .container(container)
            .ok()?
            .files
            .get(path)
            .map(|(data, _)| data.clone())
    }
}

impl ContainerPlatform for FakePlatform {
    fn list_volumes(&self, filter: &Labels) -> Result<Vec<Volume>> {
        Ok(self
            .state
            .borrow()
            .volumes
            .values()
            .filter(|v| matches_labels(&v.volume.labels, filter))
            .map(|v| v.volume.clone())
            .collect())
    }

    fn create_volume(&self, name: &str, labels: &Labels) -> Result<Volume> {
        let mut state = self.state.borrow_mut();
        let entry = state
            .volumes
            .entry(name.to_string())
            .or_insert_with(|| FakeVolume {
                volume: Volume {
                    name: name.to_string(),
                    labels: labels.clone(),
                },
                files: BTreeMap::new(),
            });
        Ok(entry.volume.clone())
    }

    fn remove_volume(&self, name: &str) -> Result<()> {
        let mut state = self.state.borrow_mut();
        let in_use = state.containers.iter().any(|c| {
            c.spec
                .mounts
                .iter()
                .any(|m| matches!(m, Mount::Volume { source, .. } if source == name))
        });
        if in_use {
            return Err(rejected(format!("volume rm {name}"), "volume is in use"));
        }
        state
            .volumes
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| not_found("volume", name))
    }

    fn list_containers(&self, filter: &Labels) -> Result<Vec<Container>> {
        Ok(self.containers_with(filter))
    }

    fn create_container(&self, spec: &ContainerSpec) -> Result<Container> {
        let mut state = self.state.borrow_mut();
        let taken = spec
            .name
            .as_ref()
            .is_some_and(|name| state.containers.iter().any(|c| &c.container.name == name));
        if taken {
            let name = spec.name.as_deref().unwrap_or_default();
            return Err(rejected(
                format!("container create --name {name}"),
                "Conflict. The container name is already in use",
            ));
        }
        for mount in &spec.mounts {
            if let Mount::Volume { source, .. } = mount {
                if !state.volumes.contains_key(source) {
                    return Err(not_found("volume", source));
                }
            }
        }

        let id = format!("fake{:04}", state.next_id);
        state.next_id += 1;
        let container = Container {
            name: spec.name.clone().unwrap_or_else(|| id.clone()),
            id,
            labels: spec.labels.clone(),
            state: "created".to_string(),
        };
        state.containers.push(FakeContainer {
            container: container.clone(),
            spec: spec.clone(),
            files: BTreeMap::new(),
        });
        Ok(container)
    }

    fn start_container(&self, id: &str) -> Result<()> {
        let mut state = self.state.borrow_mut();
        state.container_mut(id)?.container.state = "running".to_string();
        Ok(())
    }

    fn stop_container(&self, id: &str) -> Result<()> {
        let mut state = self.state.borrow_mut();
        let fake = state.container_mut(id)?;
        if fake.spec.auto_remove {
            let real_id = fake.container.id.clone();
            state.containers.retain(|c| c.container.id != real_id);
        } else {
            fake.container.state = "exited".to_string();
        }
        Ok(())
    }

    fn remove_container(&self, id: &str, force: bool) -> Result<()> {
        let mut state = self.state.borrow_mut();
        let fake = state.container(id)?;
        if fake.container.is_running() && !force {
            return Err(rejected(
                format!("container rm {id}"),
                "cannot remove a running container",
            ));
        }
        let real_id = fake.container.id.clone();
        state.containers.retain(|c| c.container.id != real_id);
        Ok(())
    }

    fn pull_image(&self, image: &str) -> Result<()> {
        self.state.borrow_mut().pulled.push(image.to_string());
        Ok(())
    }

    fn exec(&self, container: &str, command: &[String], options: &ExecOptions) -> Result<ExecOutput> {
        let mut state = self.state.borrow_mut();
        let fake = state.container(container)?;
        if !fake.container.is_running() {
            return Err(rejected(
                format!("exec {container}"),
                "container is not running",
            ));
        }
        let id = fake.container.id.clone();

        state.execs.push(ExecRecord {
            container: id,
            command: command.to_vec(),
            options: options.clone(),
        });

        let line = command.join(" ");
        let mut output = state
            .responses
            .iter()
            .find(|(prefix, _)| line.starts_with(prefix.as_str()))
            .map(|(_, output)| output.clone())
            .unwrap_or_default();
        if !options.capture {
            output.chunks.clear();
        }
        Ok(output)
    }

    fn exec_argv(&self, container: &str, command: &[String], _options: &ExecOptions) -> Vec<String> {
        let mut argv = vec!["docker".to_string(), "exec".to_string(), container.to_string()];
        argv.extend(command.iter().cloned());
        argv
    }

    fn put_file(&self, container: &str, path: &str, contents: &[u8], mode: u32) -> Result<()> {
        let mut state = self.state.borrow_mut();
        let fake = state.container(container)?;
        match state.volume_path(fake, path) {
            Some((volume, rel)) => {
                state
                    .volumes
                    .get_mut(&volume)
                    .ok_or_else(|| not_found("volume", &volume))?
                    .files
                    .insert(rel, contents.to_vec());
            }
            None => {
                state
                    .container_mut(container)?
                    .files
                    .insert(path.to_string(), (contents.to_vec(), mode));
            }
        }
        Ok(())
    }

    fn get_archive(&self, container: &str, path: &str) -> Result<Vec<u8>> {
        let state = self.state.borrow();
        let fake = state.container(container)?;
        let contents = match state.volume_path(fake, path) {
            Some((volume, rel)) => state
                .volumes
                .get(&volume)
                .and_then(|v| v.files.get(&rel))
                .cloned(),
            None => fake.files.get(path).map(|(data, _)| data.clone()),
        }
        .ok_or_else(|| not_found("path", &format!("{container}:{path}")))?;

        let name = path.rsplit('/').next().unwrap_or(path);
        archive::single_file(name, &contents, 0o644)
    }

    fn list_networks(&self, filter: &Labels) -> Result<Vec<Network>> {
        Ok(self
            .state
            .borrow()
            .networks
            .iter()
            .filter(|n| matches_labels(&n.labels, filter))
            .cloned()
            .collect())
    }

    fn connect_network(&self, network: &str, container: &str) -> Result<()> {
        let mut state = self.state.borrow_mut();
        if !state.networks.iter().any(|n| n.name == network || n.id == network) {
            return Err(not_found("network", network));
        }
        let id = state.container(container)?.container.id.clone();
        state.connections.push((network.to_string(), id));
        Ok(())
    }

    fn socket_path(&self) -> Result<Option<PathBuf>> {
        Ok(self.state.borrow().socket.clone())
    }
}
