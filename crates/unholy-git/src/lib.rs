//! Remote repository access for Unholy
//!
//! Fetches single files (the repository's Unholyfile) without a checkout,
//! and derives project names from repository URLs.

pub mod error;
pub mod fetch;
pub mod naming;

pub use error::{Error, Result};
pub use fetch::{GitRemote, RemoteFiles};
pub use naming::guess_project_from_url;
