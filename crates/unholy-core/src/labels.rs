//! Resource labels and fixed names
//!
//! Resources are labelled with the compose vocabulary so they group under
//! the project in compose tooling.

/// The compose project a resource belongs to
pub const PROJECT: &str = "com.docker.compose.project";
/// The compose service a container runs
pub const SERVICE: &str = "com.docker.compose.service";
/// The logical name of a volume within its project
pub const VOLUME: &str = "com.docker.compose.volume";
/// `True` for one-off containers
pub const ONE_OFF: &str = "com.docker.compose.oneoff";
/// Unique identity of a one-off container
pub const SLUG: &str = "com.docker.compose.slug";

/// Service label of the long-lived development container
pub const DEVENV_SERVICE: &str = "devenv";
/// Service label of the ephemeral bootstrap container
pub const BOOTSTRAP_SERVICE: &str = "bootstrap";

/// Where the workspace volume is mounted in every container
pub const WORKSPACE_MOUNTPOINT: &str = "/workspace";
/// Where the platform socket is mounted in every container
pub const SOCKET_MOUNTPOINT: &str = "/var/run/docker.sock";
/// Where injected scripts are written in the devenv
pub const SCRIPT_DIR: &str = "/opt/unholy";

/// Image for bootstrap containers, unless `bootstrap.image` overrides it
pub const BOOTSTRAP_IMAGE: &str = "ghcr.io/astraluma/unholy/bootstrap:nightly";
