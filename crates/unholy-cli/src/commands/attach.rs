//! Attaching to a running devenv: interactive shell and neovide

use std::io::Write;
use std::process::Command;
use std::thread;
use std::time::Duration;

use tempfile::NamedTempFile;
use unholy_core::{editor_argv, shell};

use crate::context::CliContext;
use crate::error::{CliError, Result};

/// Run the shell command. Returns the shell's exit code.
pub fn run_shell(ctx: &CliContext, name: &str) -> Result<i32> {
    let platform = ctx.platform(name)?;
    Ok(shell(&platform, &ctx.resolver(), name)?)
}

/// Run the neovide command
///
/// neovide wants a single executable for `--neovim-bin`, so the exec into
/// the devenv is wrapped in a temporary launcher script.
pub fn run_neovide(ctx: &CliContext, name: &str) -> Result<()> {
    let platform = ctx.platform(name)?;
    let argv = editor_argv(&platform, &ctx.resolver(), name)?;
    let launcher = write_launcher(&argv)?;
    tracing::debug!(path = %launcher.path().display(), "Wrote neovim launcher");

    let status = Command::new("neovide")
        .arg("--neovim-bin")
        .arg(launcher.path())
        .status()
        .map_err(|e| CliError::user(format!("Failed to launch neovide: {e}")))?;

    // neovide may fork before it execs the launcher; keep the file around
    // long enough for that.
    thread::sleep(Duration::from_secs(1));

    if !status.success() {
        return Err(CliError::Process {
            command: format!("neovide --neovim-bin {}", launcher.path().display()),
            code: status.code().unwrap_or(1),
        });
    }
    Ok(())
}

fn write_launcher(argv: &[String]) -> Result<NamedTempFile> {
    let mut file = tempfile::Builder::new()
        .prefix("unholy-nvim-")
        .suffix(".sh")
        .tempfile()?;
    file.write_all(launcher_script(argv).as_bytes())?;
    file.flush()?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(file.path(), std::fs::Permissions::from_mode(0o755))?;
    }
    Ok(file)
}

/// A `/bin/sh` script that execs `argv`, forwarding its own arguments.
fn launcher_script(argv: &[String]) -> String {
    let command: Vec<String> = argv.iter().map(|arg| shell_quote(arg)).collect();
    format!("#!/bin/sh\nexec {} \"$@\"\n", command.join(" "))
}

fn shell_quote(arg: &str) -> String {
    let plain = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "-_./:=@%+,".contains(c));
    if plain {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}
