//! Project listing

use crate::context::CliContext;
use crate::error::Result;

/// Run the ls command: one project name per line, sorted.
pub fn run_ls(ctx: &CliContext) -> Result<()> {
    for name in ctx.paths().list_projects()? {
        println!("{name}");
    }
    Ok(())
}
