//! Shared test utilities for the Unholy workspace.
//!
//! Dev-dependency only, never published. Integration tests use these in
//! place of a real container platform and a real git remote.
//!
//! # Modules
//!
//! - [`config`]: [`TestConfigDir`], an isolated configuration directory
//! - [`platform`]: [`FakePlatform`], an in-memory container platform
//! - [`remote`]: [`FakeRemote`], canned remote files
//! - [`interaction`]: [`ScriptedInteraction`], pre-answered prompts

pub mod config;
pub mod interaction;
pub mod platform;
pub mod remote;

pub use config::{TEST_CORE, TestConfigDir};
pub use interaction::ScriptedInteraction;
pub use platform::{ExecRecord, FakePlatform};
pub use remote::FakeRemote;
