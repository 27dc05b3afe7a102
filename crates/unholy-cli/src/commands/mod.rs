//! Command implementations for unholy-cli

pub mod attach;
pub mod config;
pub mod list;
pub mod project;

pub use attach::{run_neovide, run_shell};
pub use config::{run_config_set, run_config_show};
pub use list::run_ls;
pub use project::{run_new, run_remake};
