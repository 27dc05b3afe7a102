//! Development environment orchestration for Unholy
//!
//! Turns a resolved configuration into a coherent set of platform resources
//! for a project:
//!
//! - **Workspace**: persistent volume holding the repository
//! - **Bootstrap**: short-lived container for cloning and compose setup
//! - **Devenv**: long-lived container the scripts are run in
//!
//! # Architecture
//!
//! ```text
//!                  unholy-cli
//!                      |
//!                 unholy-core
//!                      |
//!       +--------------+--------------+
//!       |              |              |
//! unholy-config   unholy-git   unholy-platform
//! ```

pub mod bootstrap;
pub mod compose;
pub mod error;
pub mod labels;
pub mod processes;
pub mod project;

pub use bootstrap::BootstrapContainer;
pub use compose::UnholyCompose;
pub use error::{Error, Result};
pub use project::{
    Confirmation, Interaction, NewProject, ProjectContext, Step, editor_argv, load_project,
    new_project, platform_context, remake, require_devenv, shell,
};
