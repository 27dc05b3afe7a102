//! End-to-end tests for the unholy binary.
//!
//! Only commands that stay off the container platform are exercised here;
//! the platform-facing workflows are covered in unholy-core against the
//! in-memory platform.

use assert_cmd::Command;
use predicates::prelude::*;
use unholy_test_utils::TestConfigDir;

fn unholy(dir: &TestConfigDir) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("unholy"));
    cmd.env("UNHOLY_CONFIG_DIR", dir.root())
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG");
    cmd
}

// ============================================================================
// Help and Version
// ============================================================================

#[test]
fn test_help_output() {
    let dir = TestConfigDir::new();
    unholy(&dir)
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("container-backed development environments"))
        .stdout(predicate::str::contains("remake"));
}

#[test]
fn test_version_output() {
    let dir = TestConfigDir::new();
    unholy(&dir)
        .arg("--version")
        .assert()
        .success()
        .stdout(predicate::str::contains("unholy"));
}

#[test]
fn test_no_command_prints_hint() {
    let dir = TestConfigDir::new();
    unholy(&dir)
        .assert()
        .success()
        .stdout(predicate::str::contains("unholy --help"));
}

#[test]
fn test_completions() {
    let dir = TestConfigDir::new();
    unholy(&dir)
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("unholy"));
}

// ============================================================================
// ls
// ============================================================================

#[test]
fn test_ls_empty() {
    let dir = TestConfigDir::new();
    unholy(&dir).arg("ls").assert().success().stdout("");
}

#[test]
fn test_ls_lists_projects_sorted() {
    let dir = TestConfigDir::new();
    dir.write_project("zeta", "---\n---\n");
    dir.write_project("alpha", "---\n---\n");
    dir.write_user("---\n---\n");

    unholy(&dir)
        .arg("ls")
        .assert()
        .success()
        .stdout("alpha\nzeta\n");
}

#[test]
fn test_config_dir_flag_overrides_env() {
    let dir = TestConfigDir::new();
    let other = TestConfigDir::new();
    other.write_project("elsewhere", "---\n---\n");

    unholy(&dir)
        .arg("--config-dir")
        .arg(other.root())
        .arg("ls")
        .assert()
        .success()
        .stdout("elsewhere\n");
}

// ============================================================================
// config
// ============================================================================

#[test]
fn test_config_show_defaults() {
    let dir = TestConfigDir::new();
    unholy(&dir)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::contains("dev.volume"))
        .stdout(predicate::str::contains("\"workspace\""))
        .stdout(predicate::str::contains("(core)"));
}

#[test]
fn test_config_set_creates_user_unholyfile() {
    let dir = TestConfigDir::new();

    unholy(&dir)
        .args(["config", "set", "dev.shell", "/bin/zsh"])
        .assert()
        .success();

    let text = std::fs::read_to_string(dir.paths().user_config()).unwrap();
    assert!(text.starts_with("---\n"), "{text}");
    assert!(text.contains("shell = \"/bin/zsh\""), "{text}");

    unholy(&dir)
        .args(["config", "show"])
        .assert()
        .success()
        .stdout(predicate::str::is_match(r#"dev\.shell\s+"/bin/zsh"\s+\(user\)"#).unwrap());
}

#[test]
fn test_config_set_parses_toml_values() {
    let dir = TestConfigDir::new();

    unholy(&dir)
        .args(["config", "set", "dev.ports", "[8000, 8001]"])
        .assert()
        .success();

    let text = std::fs::read_to_string(dir.paths().user_config()).unwrap();
    assert!(text.contains("ports = [8000, 8001]"), "{text}");
}

#[test]
fn test_config_set_project_preserves_script() {
    let dir = TestConfigDir::new();
    dir.write_project(
        "demo",
        "---\n# origin\nrepository = \"https://example.test/demo.git\"\n---\necho hi\n",
    );

    unholy(&dir)
        .args(["config", "set", "--project", "demo", "dev.image", "example.test/img:2"])
        .assert()
        .success();

    let text = dir.read_project("demo");
    assert!(text.contains("# origin"), "{text}");
    assert!(text.contains("image = \"example.test/img:2\""), "{text}");
    assert!(text.ends_with("---\necho hi\n"), "{text}");

    unholy(&dir)
        .args(["config", "show", "demo"])
        .assert()
        .success()
        .stdout(predicate::str::contains("(project:demo)"))
        .stdout(predicate::str::contains("compose.project"));
}

#[test]
fn test_config_set_through_scalar_fails() {
    let dir = TestConfigDir::new();
    dir.write_user("---\ndev = \"flat\"\n---\n");

    unholy(&dir)
        .args(["config", "set", "dev.shell", "/bin/zsh"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("dev"));

    assert_eq!(
        std::fs::read_to_string(dir.paths().user_config()).unwrap(),
        "---\ndev = \"flat\"\n---\n"
    );
}

#[test]
fn test_config_set_unknown_project() {
    let dir = TestConfigDir::new();

    unholy(&dir)
        .args(["config", "set", "--project", "ghost", "dev.image", "x"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Project 'ghost' does not exist"));

    assert!(!dir.paths().project_exists("ghost"));
}

#[test]
fn test_config_show_malformed_user_file() {
    let dir = TestConfigDir::new();
    dir.write_user("---\nthis is not toml\n---\n");

    unholy(&dir)
        .args(["config", "show"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("user Unholyfile"));
}

// ============================================================================
// Project commands that fail before reaching the platform
// ============================================================================

#[test]
fn test_remake_unknown_project() {
    let dir = TestConfigDir::new();
    unholy(&dir)
        .args(["remake", "ghost"])
        .assert()
        .failure()
        .code(1)
        .stderr(predicate::str::contains("Project 'ghost' does not exist"));
}

#[test]
fn test_shell_unknown_project() {
    let dir = TestConfigDir::new();
    unholy(&dir)
        .args(["shell", "ghost"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("ghost"));
}

#[test]
fn test_new_requires_repository() {
    let dir = TestConfigDir::new();
    unholy(&dir)
        .arg("new")
        .assert()
        .failure()
        .stderr(predicate::str::contains("REPOSITORY"));
}
