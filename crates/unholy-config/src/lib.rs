//! Unholyfile parsing, editing, and layered configuration resolution
//!
//! An Unholyfile is an optional TOML headmatter block followed by a shell
//! script. This crate provides:
//!
//! - **Headmatter splitting**: verbatim separation of dividers, TOML and script
//! - **Document store**: format-preserving in-place edits of the TOML block
//! - **Config stack**: layered lookup with recursive merge of nested tables
//! - **Script stack**: the matching scripts, in execution order
//!
//! # Example
//!
//! ```ignore
//! use unholy_config::{ConfigPaths, ConfigResolver};
//!
//! let resolver = ConfigResolver::new(ConfigPaths::from_env()?);
//! let config = resolver.resolve(Some("demo"), None)?;
//! println!("image: {}", config.get_str("dev.image")?);
//! ```

pub mod document;
pub mod error;
pub mod headmatter;
pub mod paths;
pub mod resolver;
pub mod scripts;
pub mod stack;

pub use document::ConfigDocument;
pub use error::{Error, Result};
pub use headmatter::Headmatter;
pub use paths::{ConfigPaths, UNHOLYFILE};
pub use resolver::{CORE_UNHOLYFILE, ConfigResolver, RepoUnholyfile};
pub use scripts::{Script, ScriptStack};
pub use stack::{ConfigLayer, ConfigStack, LayerSource, Resolved, StackView};
