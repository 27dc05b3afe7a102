//! [`ContainerPlatform`] implemented by driving the `docker` CLI
//!
//! Every call shells out to `docker`, optionally pinned to a named context.
//! Listings are two-step: `ls --quiet` with label filters to find ids, then
//! `inspect` for labels and state, parsed from JSON.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Output, Stdio};

use serde::Deserialize;

use crate::archive;
use crate::error::{Error, Result};
use crate::platform::ContainerPlatform;
use crate::types::{
    Container, ContainerSpec, ExecOptions, ExecOutput, Labels, Mount, Network, OutputChunk,
    Stream, Volume,
};

const DEFAULT_SOCKET: &str = "/var/run/docker.sock";

/// Docker, through its command-line client.
#[derive(Debug, Clone)]
pub struct DockerCli {
    program: PathBuf,
    context: Option<String>,
}

impl Default for DockerCli {
    fn default() -> Self {
        Self {
            program: PathBuf::from("docker"),
            context: None,
        }
    }
}

impl DockerCli {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different client binary.
    pub fn with_program(mut self, program: impl Into<PathBuf>) -> Self {
        self.program = program.into();
        self
    }

    /// Pin every call to a docker context.
    pub fn with_context(mut self, context: Option<String>) -> Self {
        self.context = context;
        self
    }

    pub fn context(&self) -> Option<&str> {
        self.context.as_deref()
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn command(&self, args: &[String]) -> Command {
        let mut cmd = Command::new(&self.program);
        if let Some(context) = &self.context {
            cmd.arg("--context").arg(context);
        }
        cmd.args(args);
        cmd
    }

    fn describe(&self, args: &[String]) -> String {
        let mut words = vec![self.program.display().to_string()];
        if let Some(context) = &self.context {
            words.push("--context".into());
            words.push(context.clone());
        }
        words.extend(args.iter().cloned());
        words.join(" ")
    }

    fn spawn_error(&self, source: std::io::Error) -> Error {
        Error::Spawn {
            program: self.program.clone(),
            source,
        }
    }

    /// Run to completion with captured output; fail on a non-zero exit.
    fn run(&self, kind: &'static str, subject: &str, args: Vec<String>) -> Result<Vec<u8>> {
        tracing::debug!(command = %self.describe(&args), "Running docker");
        let output = self
            .command(&args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| self.spawn_error(e))?;
        self.check(kind, subject, &args, output)
    }

    /// Like [`run`](Self::run), feeding `input` on stdin.
    fn run_with_input(
        &self,
        kind: &'static str,
        subject: &str,
        args: Vec<String>,
        input: &[u8],
    ) -> Result<Vec<u8>> {
        tracing::debug!(command = %self.describe(&args), bytes = input.len(), "Running docker with input");
        let mut child = self
            .command(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(input).map_err(|e| self.spawn_error(e))?;
        }
        let output = child.wait_with_output().map_err(|e| self.spawn_error(e))?;
        self.check(kind, subject, &args, output)
    }

    /// Run with the terminal attached.
    fn run_inherited(&self, args: &[String], stdin: Stdio) -> Result<ExitStatus> {
        tracing::debug!(command = %self.describe(args), "Running docker attached");
        self.command(args)
            .stdin(stdin)
            .status()
            .map_err(|e| self.spawn_error(e))
    }

    fn check(
        &self,
        kind: &'static str,
        subject: &str,
        args: &[String],
        output: Output,
    ) -> Result<Vec<u8>> {
        if output.status.success() {
            return Ok(output.stdout);
        }
        let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
        Err(classify(
            kind,
            subject,
            self.describe(args),
            output.status.to_string(),
            stderr,
        ))
    }

    /// Ids from an `ls --quiet` listing.
    fn list_ids(&self, kind: &'static str, mut args: Vec<String>, filter: &Labels) -> Result<Vec<String>> {
        args.extend(filter_args(filter));
        let stdout = self.run(kind, "listing", args)?;
        Ok(String::from_utf8_lossy(&stdout)
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect())
    }

    fn inspect(&self, kind: &'static str, object: &str, ids: Vec<String>) -> Result<Vec<u8>> {
        let subject = ids.join(" ");
        let mut args = vec![object.to_string(), "inspect".to_string()];
        args.extend(ids);
        self.run(kind, &subject, args)
    }
}

impl ContainerPlatform for DockerCli {
    fn list_volumes(&self, filter: &Labels) -> Result<Vec<Volume>> {
        let ids = self.list_ids("volume", strings(["volume", "ls", "--quiet"]), filter)?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        parse_volumes(&self.inspect("volume", "volume", ids)?)
    }

    fn create_volume(&self, name: &str, labels: &Labels) -> Result<Volume> {
        let mut args = strings(["volume", "create"]);
        args.extend(label_args(labels));
        args.push(name.to_string());
        self.run("volume", name, args)?;
        tracing::info!(volume = name, "Created volume");
        Ok(Volume {
            name: name.to_string(),
            labels: labels.clone(),
        })
    }

    fn remove_volume(&self, name: &str) -> Result<()> {
        self.run("volume", name, strings(["volume", "rm", name]))?;
        tracing::info!(volume = name, "Removed volume");
        Ok(())
    }

    fn list_containers(&self, filter: &Labels) -> Result<Vec<Container>> {
        let ids = self.list_ids(
            "container",
            strings(["container", "ls", "--all", "--quiet", "--no-trunc"]),
            filter,
        )?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        parse_containers(&self.inspect("container", "container", ids)?)
    }

    fn create_container(&self, spec: &ContainerSpec) -> Result<Container> {
        let subject = spec.name.as_deref().unwrap_or(&spec.image);
        let stdout = self.run("container", subject, create_args(spec))?;
        let id = String::from_utf8_lossy(&stdout).trim().to_string();
        tracing::info!(%id, name = ?spec.name, image = %spec.image, "Created container");
        Ok(Container {
            name: spec.name.clone().unwrap_or_else(|| id.clone()),
            id,
            labels: spec.labels.clone(),
            state: "created".to_string(),
        })
    }

    fn start_container(&self, id: &str) -> Result<()> {
        self.run("container", id, strings(["container", "start", id]))?;
        Ok(())
    }

    fn stop_container(&self, id: &str) -> Result<()> {
        self.run("container", id, strings(["container", "stop", id]))?;
        Ok(())
    }

    fn remove_container(&self, id: &str, force: bool) -> Result<()> {
        let mut args = strings(["container", "rm"]);
        if force {
            args.push("--force".into());
        }
        args.push(id.to_string());
        self.run("container", id, args)?;
        Ok(())
    }

    fn pull_image(&self, image: &str) -> Result<()> {
        let args = strings(["image", "pull", image]);
        let status = self.run_inherited(&args, Stdio::null())?;
        if !status.success() {
            return Err(Error::Command {
                command: self.describe(&args),
                status: status.to_string(),
                stderr: String::new(),
            });
        }
        Ok(())
    }

    fn exec(&self, container: &str, command: &[String], options: &ExecOptions) -> Result<ExecOutput> {
        let args = exec_args(container, command, options);

        if !options.capture {
            let stdin = if options.interactive {
                Stdio::inherit()
            } else {
                Stdio::null()
            };
            let status = self.run_inherited(&args, stdin)?;
            return Ok(ExecOutput {
                exit_code: status.code().unwrap_or(-1),
                chunks: Vec::new(),
            });
        }

        tracing::debug!(command = %self.describe(&args), "Running docker exec");
        let output = self
            .command(&args)
            .stdin(Stdio::null())
            .output()
            .map_err(|e| self.spawn_error(e))?;

        // The CLI separates the streams, so their interleaving is lost.
        let chunks = [(Stream::Stdout, output.stdout), (Stream::Stderr, output.stderr)]
            .into_iter()
            .filter(|(_, data)| !data.is_empty())
            .map(|(stream, data)| OutputChunk { stream, data })
            .collect();

        Ok(ExecOutput {
            exit_code: output.status.code().unwrap_or(-1),
            chunks,
        })
    }

    fn exec_argv(&self, container: &str, command: &[String], options: &ExecOptions) -> Vec<String> {
        let mut argv = vec![self.program.display().to_string()];
        if let Some(context) = &self.context {
            argv.push("--context".into());
            argv.push(context.clone());
        }
        argv.extend(exec_args(container, command, options));
        argv
    }

    fn put_file(&self, container: &str, path: &str, contents: &[u8], mode: u32) -> Result<()> {
        let tarball = archive::single_file(path, contents, mode)?;
        let target = format!("{container}:/");
        self.run_with_input("container", container, strings(["cp", "-", &target]), &tarball)?;
        tracing::debug!(container, path, "Copied file into container");
        Ok(())
    }

    fn get_archive(&self, container: &str, path: &str) -> Result<Vec<u8>> {
        let source = format!("{container}:{path}");
        self.run("path", &source, strings(["cp", &source, "-"]))
    }

    fn list_networks(&self, filter: &Labels) -> Result<Vec<Network>> {
        let ids = self.list_ids("network", strings(["network", "ls", "--quiet", "--no-trunc"]), filter)?;
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        parse_networks(&self.inspect("network", "network", ids)?)
    }

    fn connect_network(&self, network: &str, container: &str) -> Result<()> {
        self.run("network", network, strings(["network", "connect", network, container]))?;
        tracing::info!(network, container, "Connected container to network");
        Ok(())
    }

    fn socket_path(&self) -> Result<Option<PathBuf>> {
        if self.context.is_none()
            && let Ok(host) = std::env::var("DOCKER_HOST")
        {
            return Ok(socket_from_host(&host));
        }

        let mut args = strings(["context", "inspect"]);
        if let Some(context) = &self.context {
            args.push(context.clone());
        }
        args.push("--format".into());
        args.push("{{.Endpoints.docker.Host}}".into());

        match self.run("context", self.context.as_deref().unwrap_or("current"), args) {
            Ok(stdout) => Ok(socket_from_host(String::from_utf8_lossy(&stdout).trim())),
            Err(e @ Error::Spawn { .. }) => Err(e),
            Err(e) => {
                tracing::debug!(error = %e, "Could not inspect context - assuming default socket");
                Ok(Some(PathBuf::from(DEFAULT_SOCKET)))
            }
        }
    }
}

fn strings<const N: usize>(words: [&str; N]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

/// Map a failed call to the most specific error.
fn classify(kind: &'static str, subject: &str, command: String, status: String, stderr: String) -> Error {
    let lower = stderr.to_lowercase();
    if lower.contains("no such") || lower.contains("could not find") {
        Error::NotFound {
            kind,
            name: subject.to_string(),
        }
    } else if lower.contains("already in progress") {
        Error::RemovalInProgress {
            kind,
            name: subject.to_string(),
        }
    } else {
        Error::Command {
            command,
            status,
            stderr,
        }
    }
}

/// `unix://` endpoints map to a socket path; anything else has none.
pub fn socket_from_host(host: &str) -> Option<PathBuf> {
    if host.is_empty() {
        return Some(PathBuf::from(DEFAULT_SOCKET));
    }
    host.strip_prefix("unix://").map(PathBuf::from)
}

fn filter_args(filter: &Labels) -> Vec<String> {
    filter
        .iter()
        .flat_map(|(k, v)| ["--filter".to_string(), format!("label={k}={v}")])
        .collect()
}

fn label_args(labels: &Labels) -> Vec<String> {
    labels
        .iter()
        .flat_map(|(k, v)| ["--label".to_string(), format!("{k}={v}")])
        .collect()
}

fn mount_args(mount: &Mount) -> [String; 2] {
    match mount {
        Mount::Volume { source, target } => [
            "--mount".into(),
            format!("type=volume,source={source},target={target}"),
        ],
        Mount::Bind { source, target } => [
            "--mount".into(),
            format!("type=bind,source={source},target={target}"),
        ],
        Mount::Tmpfs { target } => ["--tmpfs".into(), target.clone()],
    }
}

pub(crate) fn create_args(spec: &ContainerSpec) -> Vec<String> {
    let mut args = strings(["container", "create"]);
    if let Some(name) = &spec.name {
        args.push("--name".into());
        args.push(name.clone());
    }
    args.extend(label_args(&spec.labels));
    for mount in &spec.mounts {
        args.extend(mount_args(mount));
    }
    if let Some(dir) = &spec.working_dir {
        args.push("--workdir".into());
        args.push(dir.clone());
    }
    for (key, value) in &spec.env {
        args.push("--env".into());
        args.push(format!("{key}={value}"));
    }
    if spec.init {
        args.push("--init".into());
    }
    if spec.auto_remove {
        args.push("--rm".into());
    }
    args.push(spec.image.clone());
    args.extend(spec.command.iter().cloned());
    args
}

pub(crate) fn exec_args(container: &str, command: &[String], options: &ExecOptions) -> Vec<String> {
    let mut args = vec!["exec".to_string()];
    if options.interactive {
        args.push("--interactive".into());
    }
    if options.tty {
        args.push("--tty".into());
    }
    if let Some(dir) = &options.working_dir {
        args.push("--workdir".into());
        args.push(dir.clone());
    }
    if let Some(user) = &options.user {
        args.push("--user".into());
        args.push(user.clone());
    }
    for (key, value) in &options.env {
        args.push("--env".into());
        args.push(format!("{key}={value}"));
    }
    args.push(container.to_string());
    args.extend(command.iter().cloned());
    args
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct VolumeInspect {
    name: String,
    #[serde(default)]
    labels: Option<Labels>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ContainerInspect {
    id: String,
    name: String,
    config: ContainerConfig,
    state: ContainerState,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ContainerConfig {
    #[serde(default)]
    labels: Option<Labels>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ContainerState {
    status: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct NetworkInspect {
    id: String,
    name: String,
    #[serde(default)]
    labels: Option<Labels>,
}

pub(crate) fn parse_volumes(json: &[u8]) -> Result<Vec<Volume>> {
    let raw: Vec<VolumeInspect> = serde_json::from_slice(json)?;
    Ok(raw
        .into_iter()
        .map(|v| Volume {
            name: v.name,
            labels: v.labels.unwrap_or_default(),
        })
        .collect())
}

pub(crate) fn parse_containers(json: &[u8]) -> Result<Vec<Container>> {
    let raw: Vec<ContainerInspect> = serde_json::from_slice(json)?;
    Ok(raw
        .into_iter()
        .map(|c| Container {
            id: c.id,
            name: c.name.trim_start_matches('/').to_string(),
            labels: c.config.labels.unwrap_or_default(),
            state: c.state.status,
        })
        .collect())
}

pub(crate) fn parse_networks(json: &[u8]) -> Result<Vec<Network>> {
    let raw: Vec<NetworkInspect> = serde_json::from_slice(json)?;
    Ok(raw
        .into_iter()
        .map(|n| Network {
            id: n.id,
            name: n.name,
            labels: n.labels.unwrap_or_default(),
        })
        .collect())
}
