//! The container platform trait

use std::path::PathBuf;

use crate::error::Result;
use crate::types::{
    Container, ContainerSpec, ExecOptions, ExecOutput, Labels, Network, Volume,
};

/// Capability surface of a container platform.
///
/// Resources are found by label on every call; nothing is cached, and no
/// atomicity is assumed between a lookup and a following create. Implementors
/// report a missing resource as [`Error::NotFound`](crate::Error::NotFound)
/// so that cleanup paths can treat it as success.
pub trait ContainerPlatform {
    /// Volumes carrying every label in `filter`.
    fn list_volumes(&self, filter: &Labels) -> Result<Vec<Volume>>;

    fn create_volume(&self, name: &str, labels: &Labels) -> Result<Volume>;

    fn remove_volume(&self, name: &str) -> Result<()>;

    /// Containers, running or not, carrying every label in `filter`.
    fn list_containers(&self, filter: &Labels) -> Result<Vec<Container>>;

    fn create_container(&self, spec: &ContainerSpec) -> Result<Container>;

    fn start_container(&self, id: &str) -> Result<()>;

    fn stop_container(&self, id: &str) -> Result<()>;

    /// Remove a container; `force` kills it first if it is running.
    fn remove_container(&self, id: &str, force: bool) -> Result<()>;

    /// Pull an image, reporting progress to the user.
    fn pull_image(&self, image: &str) -> Result<()>;

    /// Run a command in a running container and wait for it to exit.
    ///
    /// A non-zero exit is not an error at this level; it is reported through
    /// [`ExecOutput::exit_code`].
    fn exec(&self, container: &str, command: &[String], options: &ExecOptions)
    -> Result<ExecOutput>;

    /// The host command line that would perform [`exec`](Self::exec).
    ///
    /// Used to hand a container process to an external program.
    fn exec_argv(&self, container: &str, command: &[String], options: &ExecOptions)
    -> Vec<String>;

    /// Write a single file at an absolute `path`, creating parent directories.
    fn put_file(&self, container: &str, path: &str, contents: &[u8], mode: u32) -> Result<()>;

    /// Read `path` out of a container as a tar stream.
    fn get_archive(&self, container: &str, path: &str) -> Result<Vec<u8>>;

    /// Networks carrying every label in `filter`.
    fn list_networks(&self, filter: &Labels) -> Result<Vec<Network>>;

    fn connect_network(&self, network: &str, container: &str) -> Result<()>;

    /// Host path of the platform's control socket, when it is a local socket.
    fn socket_path(&self) -> Result<Option<PathBuf>>;
}
