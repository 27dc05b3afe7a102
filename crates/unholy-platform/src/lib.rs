//! Container platform abstraction for Unholy
//!
//! [`ContainerPlatform`] is the narrow interface the orchestrator needs:
//! label-filtered volumes, containers and networks, image pulls, exec, and
//! single-file transfer. [`DockerCli`] implements it on top of the `docker`
//! command-line client.

pub mod archive;
pub mod docker;
pub mod error;
pub mod platform;
pub mod types;

pub use docker::DockerCli;
pub use error::{Error, Result};
pub use platform::ContainerPlatform;
pub use types::{
    Container, ContainerSpec, ExecOptions, ExecOutput, Labels, Mount, Network, OutputChunk,
    Stream, Volume, labels, matches_labels,
};
