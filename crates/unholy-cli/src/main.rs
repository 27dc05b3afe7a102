//! Unholy CLI
//!
//! Creates, rebuilds and attaches to container-backed development
//! environments described by layered Unholyfiles.

mod cli;
mod commands;
mod context;
mod error;
mod interactive;

use std::io;
use std::process::ExitCode;

use clap::{CommandFactory, Parser};
use colored::Colorize;
use tracing_subscriber::EnvFilter;
use unholy_core::NewProject;

use cli::{Cli, Commands, ConfigAction};
use context::CliContext;
use error::{CliError, Result};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(0) => ExitCode::SUCCESS,
        Ok(code) => exit_code(code),
        Err(e) => {
            report(&e);
            exit_code(e.exit_code())
        }
    }
}

/// `RUST_LOG` when set, else warnings only; `--verbose` forces debug.
fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(verbose)
        .with_writer(io::stderr)
        .init();
    tracing::debug!("Verbose mode enabled");
}

fn exit_code(code: i32) -> ExitCode {
    ExitCode::from(failure_status(code))
}

/// Codes outside 1..=255 still have to read as failure.
fn failure_status(code: i32) -> u8 {
    u8::try_from(code).ok().filter(|c| *c != 0).unwrap_or(1)
}

fn report(error: &CliError) {
    if let Some((command, output)) = error.process_details() {
        eprint!("{output}");
        if !output.is_empty() && !output.ends_with('\n') {
            eprintln!();
        }
        eprintln!("Call to `{command}` failed");
    }
    eprintln!("{}: {}", "error".red().bold(), error);
}

/// Run the parsed command. Returns the exit code to finish with.
fn run(cli: Cli) -> Result<i32> {
    let Some(command) = cli.command else {
        println!(
            "{} container-backed development environments",
            "unholy".green().bold()
        );
        println!();
        println!("Run {} for available commands.", "unholy --help".cyan());
        return Ok(0);
    };

    let ctx = CliContext::new(cli.config_dir)?;
    execute_command(&ctx, command)
}

fn execute_command(ctx: &CliContext, command: Commands) -> Result<i32> {
    match command {
        Commands::New {
            repository,
            name,
            remote,
            branch,
            context,
        } => {
            let request = NewProject {
                repository,
                name,
                remote,
                branch,
                context,
            };
            commands::run_new(ctx, &request)?;
        }
        Commands::Remake { name } => commands::run_remake(ctx, &name)?,
        Commands::Shell { name } => return commands::run_shell(ctx, &name),
        Commands::Neovide { name } => commands::run_neovide(ctx, &name)?,
        Commands::Ls => commands::run_ls(ctx)?,
        Commands::Config { action } => match action {
            ConfigAction::Show { name, repo } => {
                commands::run_config_show(ctx, name.as_deref(), repo)?
            }
            ConfigAction::Set {
                project,
                key,
                value,
            } => commands::run_config_set(ctx, project.as_deref(), &key, &value)?,
        },
        Commands::Completions { shell } => {
            clap_complete::generate(shell, &mut Cli::command(), "unholy", &mut io::stdout());
        }
    }
    Ok(0)
}
