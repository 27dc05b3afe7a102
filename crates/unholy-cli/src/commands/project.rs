//! Project creation and devenv rebuilds

use colored::Colorize;
use unholy_core::{NewProject, new_project, remake};
use unholy_git::GitRemote;
use unholy_platform::DockerCli;

use crate::context::CliContext;
use crate::error::Result;
use crate::interactive::TerminalInteraction;

/// Run the new command
pub fn run_new(ctx: &CliContext, request: &NewProject) -> Result<()> {
    let resolver = ctx.resolver();
    let context = request.platform_context(&resolver)?;
    let platform = DockerCli::new().with_context(context.clone());
    let remote = GitRemote::new();
    let mut ui = TerminalInteraction;

    let project = new_project(&platform, &remote, &resolver, request, &mut ui)?;

    println!();
    println!(
        "{} Project {} created in {}",
        "OK".green().bold(),
        project.name.cyan(),
        context.as_deref().unwrap_or("Docker")
    );
    Ok(())
}

/// Run the remake command
pub fn run_remake(ctx: &CliContext, name: &str) -> Result<()> {
    let platform = ctx.platform(name)?;
    let mut ui = TerminalInteraction;

    let devenv = remake(&platform, &ctx.resolver(), name, &mut ui)?;

    println!(
        "{} Devenv {} rebuilt",
        "OK".green().bold(),
        devenv.name.cyan()
    );
    Ok(())
}
