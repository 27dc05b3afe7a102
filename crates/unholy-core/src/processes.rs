//! Processes run inside project containers

use unholy_config::ConfigStack;
use unholy_platform::{ContainerPlatform, ExecOptions, ExecOutput};

use crate::labels::WORKSPACE_MOUNTPOINT;
use crate::{Error, Result};

/// `git clone` of the project repository into the workspace.
pub fn clone_command(repository: &str, remote: Option<&str>, branch: Option<&str>) -> Vec<String> {
    let mut command = vec!["git".to_string(), "clone".to_string()];
    if let Some(remote) = remote {
        command.push("--origin".into());
        command.push(remote.to_string());
    }
    if let Some(branch) = branch {
        command.push("--branch".into());
        command.push(branch.to_string());
    }
    command.push(repository.to_string());
    command.push(WORKSPACE_MOUNTPOINT.to_string());
    command
}

/// The project's `docker compose` invocation followed by `args`.
///
/// Requires `compose.file`.
pub fn compose_command(config: &ConfigStack, project: &str, args: &[&str]) -> Result<Vec<String>> {
    let file = config.get_str("compose.file")?;
    let mut command: Vec<String> = [
        "docker",
        "compose",
        "--file",
        file,
        "--project-name",
        project,
        "--project-directory",
        WORKSPACE_MOUNTPOINT,
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    command.extend(args.iter().map(|s| s.to_string()));
    Ok(command)
}

/// Run a command in the workspace, capturing output, and fail on a non-zero
/// exit.
pub fn run_checked(
    platform: &dyn ContainerPlatform,
    container: &str,
    command: &[String],
) -> Result<ExecOutput> {
    let options = ExecOptions {
        working_dir: Some(WORKSPACE_MOUNTPOINT.to_string()),
        capture: true,
        ..Default::default()
    };

    tracing::info!(container, command = %command.join(" "), "Running");
    let output = platform.exec(container, command, &options)?;
    if !output.success() {
        return Err(Error::ProcessFailed {
            command: command.join(" "),
            exit_code: output.exit_code,
            output: output.text(),
        });
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_clone_command_plain() {
        assert_eq!(
            clone_command("https://example.com/demo.git", None, None),
            vec!["git", "clone", "https://example.com/demo.git", "/workspace"]
        );
    }

    #[test]
    fn test_clone_command_with_remote_and_branch() {
        assert_eq!(
            clone_command("https://example.com/demo.git", Some("upstream"), Some("dev")),
            vec![
                "git",
                "clone",
                "--origin",
                "upstream",
                "--branch",
                "dev",
                "https://example.com/demo.git",
                "/workspace"
            ]
        );
    }
}
