//! CLI argument parsing using clap derive

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use clap_complete::Shell;

/// Unholy - container-backed development environments
#[derive(Parser, Debug)]
#[command(name = "unholy")]
#[command(author, version, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Directory holding the user Unholyfile and project records
    #[arg(long, global = true, env = "UNHOLY_CONFIG_DIR", value_name = "DIR")]
    pub config_dir: Option<PathBuf>,

    /// The command to run
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Commands {
    /// Create a new project from a git repository
    ///
    /// Fetches the repository's Unholyfile, records the project locally,
    /// clones it into a fresh workspace volume, starts its compose stack and
    /// builds the devenv.
    ///
    /// Examples:
    ///   unholy new https://github.com/org/app.git
    ///   unholy new git@example.com:org/app.git --name app -b develop
    New {
        /// Repository URL
        repository: String,

        /// Project name (default: guessed from the repository URL)
        #[arg(long)]
        name: Option<String>,

        /// Name of the remote (default: origin)
        #[arg(short = 'o', long, visible_alias = "origin")]
        remote: Option<String>,

        /// Branch to check out (default: the remote's HEAD)
        #[arg(short, long)]
        branch: Option<String>,

        /// Docker context to use for this project (default: unset)
        #[arg(short, long)]
        context: Option<String>,
    },

    /// Recreate the devenv from fresh configuration
    Remake {
        /// Project name
        name: String,
    },

    /// Open a shell inside the devenv
    Shell {
        /// Project name
        name: String,
    },

    /// Open neovide attached to neovim inside the devenv
    Neovide {
        /// Project name
        name: String,
    },

    /// List projects in the local configuration
    Ls,

    /// Inspect or edit the local configuration
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Configuration actions
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum ConfigAction {
    /// Show resolved configuration values and the layer each comes from
    Show {
        /// Project to resolve (default: core and user layers only)
        name: Option<String>,

        /// Include the repository Unholyfile, read from the workspace
        #[arg(long, requires = "name")]
        repo: bool,
    },

    /// Set a value in the user Unholyfile or a project record
    ///
    /// VALUE is parsed as TOML when possible (numbers, booleans, arrays),
    /// otherwise stored as a string.
    ///
    /// Examples:
    ///   unholy config set dev.shell /bin/zsh
    ///   unholy config set --project app dev.image example.com/app-dev:latest
    Set {
        /// Edit this project's record instead of the user Unholyfile
        #[arg(long)]
        project: Option<String>,

        /// Dotted key, e.g. `dev.image`
        key: String,

        value: String,
    },
}
