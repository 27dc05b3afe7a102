//! End-to-end tests for the project workflows

use pretty_assertions::assert_eq;
use unholy_core::labels::{DEVENV_SERVICE, SERVICE};
use unholy_core::{
    Confirmation, Error, NewProject, Step, editor_argv, load_project, new_project,
    platform_context, remake, shell,
};
use unholy_platform::labels;
use unholy_test_utils::{FakePlatform, FakeRemote, ScriptedInteraction, TestConfigDir};

const REPO: &str = "https://example.test/org/demo.git";
const REPO_UNHOLYFILE: &str = "---\n[dev]\nshell = \"/bin/zsh\"\n---\necho repo\n";

fn remote() -> FakeRemote {
    FakeRemote::new().with_file(REPO, "Unholyfile", REPO_UNHOLYFILE)
}

fn devenvs(platform: &FakePlatform) -> usize {
    platform
        .containers_with(&labels([(SERVICE, DEVENV_SERVICE)]))
        .len()
}

/// Create `demo` and put the Unholyfile where the clone would have.
fn create_demo(dir: &TestConfigDir, platform: &FakePlatform) {
    let mut ui = ScriptedInteraction::approving();
    new_project(platform, &remote(), &dir.resolver(), &NewProject::new(REPO), &mut ui).unwrap();
    platform.set_volume_file("demo_workspace", "Unholyfile", REPO_UNHOLYFILE);
}

#[test]
fn test_new_project_end_to_end() {
    let dir = TestConfigDir::new();
    let platform = FakePlatform::new();
    let remote = remote();
    let mut ui = ScriptedInteraction::declining();
    let mut request = NewProject::new(REPO);
    request.branch = Some("main".into());
    request.context = Some("remote-box".into());

    let project = new_project(&platform, &remote, &dir.resolver(), &request, &mut ui).unwrap();

    assert_eq!(project.name, "demo");
    assert_eq!(project.unholyfile, REPO_UNHOLYFILE);
    assert_eq!(project.config.get_str("dev.shell").unwrap(), "/bin/zsh");
    assert!(ui.asked.is_empty());
    assert_eq!(
        remote.requests(),
        vec![(REPO.to_string(), "Unholyfile".to_string(), Some("main".to_string()))]
    );

    let record = dir.read_project("demo");
    assert!(record.contains("repository = \"https://example.test/org/demo.git\""));
    assert!(record.contains("context = \"remote-box\""));
    assert!(record.contains("volume = \"workspace\""));

    assert_eq!(platform.volume_names(), vec!["demo_workspace"]);
    let lines = platform.exec_lines();
    assert_eq!(lines[0], format!("git clone --branch main {REPO} /workspace"));
    assert!(lines[1].starts_with("docker compose --file docker-compose.yml"));
    assert_eq!(
        &lines[2..],
        ["/opt/unholy/stack-0.sh", "/bin/sh /opt/unholy/stack-2.sh"]
    );
    assert_eq!(devenvs(&platform), 1);
    // Only the devenv survives; the bootstrap is gone
    assert_eq!(platform.state().containers.len(), 1);

    assert_eq!(
        ui.steps,
        vec![
            Step::FetchUnholyfile { repository: REPO.into() },
            Step::WriteProject { name: "demo".into() },
            Step::RemoveDevenv,
            Step::CreateWorkspace,
            Step::Clone { repository: REPO.into() },
            Step::ComposeUp,
            Step::CreateDevenv,
        ]
    );
}

#[test]
fn test_new_project_with_explicit_name() {
    let dir = TestConfigDir::new();
    let platform = FakePlatform::new();
    let mut ui = ScriptedInteraction::approving();
    let mut request = NewProject::new(REPO);
    request.name = Some("custom".into());

    new_project(&platform, &remote(), &dir.resolver(), &request, &mut ui).unwrap();

    assert!(dir.paths().project_exists("custom"));
    assert_eq!(platform.volume_names(), vec!["custom_workspace"]);
}

#[test]
fn test_new_project_declined_overwrite_aborts_before_fetch() {
    let dir = TestConfigDir::new();
    dir.write_project("demo", "---\nrepository = \"old\"\n---\n");
    let platform = FakePlatform::new();
    let remote = remote();
    let mut ui = ScriptedInteraction::declining();

    let err = new_project(&platform, &remote, &dir.resolver(), &NewProject::new(REPO), &mut ui)
        .unwrap_err();

    assert!(matches!(err, Error::Aborted));
    assert_eq!(
        ui.asked,
        vec![Confirmation::OverwriteProject { name: "demo".into() }]
    );
    assert!(remote.requests().is_empty());
    assert_eq!(dir.read_project("demo"), "---\nrepository = \"old\"\n---\n");
}

#[test]
fn test_new_project_overwrite_keeps_record_tail() {
    let dir = TestConfigDir::new();
    dir.write_project(
        "demo",
        "---\nrepository = \"old\"\n# keep me\nnote = 1\n---\necho local\n",
    );
    let platform = FakePlatform::new();
    let mut ui = ScriptedInteraction::approving();

    new_project(&platform, &remote(), &dir.resolver(), &NewProject::new(REPO), &mut ui).unwrap();

    let record = dir.read_project("demo");
    assert!(record.contains("# keep me"));
    assert!(record.contains(REPO));
    assert!(record.ends_with("---\necho local\n"));
}

#[test]
fn test_new_project_declined_workspace_destroy_keeps_volume() {
    let dir = TestConfigDir::new();
    let platform = FakePlatform::new();
    create_demo(&dir, &platform);

    let mut ui = ScriptedInteraction::with_answers([true, false]);
    let err = new_project(&platform, &remote(), &dir.resolver(), &NewProject::new(REPO), &mut ui)
        .unwrap_err();

    assert!(matches!(err, Error::Aborted));
    assert_eq!(
        ui.asked[1],
        Confirmation::DestroyWorkspace {
            name: "demo".into(),
            volume: "demo_workspace".into(),
        }
    );
    assert_eq!(platform.volume_names(), vec!["demo_workspace"]);
    // The old devenv was already removed before the question
    assert_eq!(devenvs(&platform), 0);
}

#[test]
fn test_new_project_recreates_existing_workspace() {
    let dir = TestConfigDir::new();
    let platform = FakePlatform::new();
    create_demo(&dir, &platform);

    let mut ui = ScriptedInteraction::approving();
    new_project(&platform, &remote(), &dir.resolver(), &NewProject::new(REPO), &mut ui).unwrap();

    assert!(ui.steps.contains(&Step::DeleteWorkspace {
        volume: "demo_workspace".into()
    }));
    assert_eq!(platform.volume_names(), vec!["demo_workspace"]);
    assert_eq!(devenvs(&platform), 1);
}

#[test]
fn test_new_project_missing_remote_unholyfile() {
    let dir = TestConfigDir::new();
    let platform = FakePlatform::new();
    let mut ui = ScriptedInteraction::approving();

    let err = new_project(
        &platform,
        &FakeRemote::new(),
        &dir.resolver(),
        &NewProject::new(REPO),
        &mut ui,
    )
    .unwrap_err();

    assert!(err.is_not_found(), "{err:?}");
    assert!(!dir.paths().project_exists("demo"));
}

#[test]
fn test_new_project_clone_failure_propagates_exit_code() {
    let dir = TestConfigDir::new();
    let platform = FakePlatform::new();
    platform.respond_to("git clone", 128, "fatal: could not read from remote\n");
    let mut ui = ScriptedInteraction::approving();

    let err = new_project(&platform, &remote(), &dir.resolver(), &NewProject::new(REPO), &mut ui)
        .unwrap_err();

    assert_eq!(err.exit_code(), Some(128));
    assert_eq!(devenvs(&platform), 0);
    // The bootstrap guard cleaned up after the failure
    assert!(platform.state().containers.is_empty());
}

#[test]
fn test_load_project_reads_unholyfile_from_workspace() {
    let dir = TestConfigDir::new();
    let platform = FakePlatform::new();
    create_demo(&dir, &platform);
    platform.set_volume_file("demo_workspace", "Unholyfile", "---\n[dev]\nshell = \"/bin/fish\"\n---\n");

    let project = load_project(&platform, &dir.resolver(), "demo").unwrap();

    assert_eq!(project.config.get_str("dev.shell").unwrap(), "/bin/fish");
    assert_eq!(project.config.get_str("repository").unwrap(), REPO);
}

#[test]
fn test_load_unknown_project() {
    let dir = TestConfigDir::new();
    let platform = FakePlatform::new();

    let err = load_project(&platform, &dir.resolver(), "ghost").unwrap_err();

    assert!(matches!(err, Error::UnknownProject { ref name } if name == "ghost"));
}

#[test]
fn test_remake_leaves_exactly_one_devenv() {
    let dir = TestConfigDir::new();
    let platform = FakePlatform::new();
    create_demo(&dir, &platform);
    let before = platform.state().execs.len();

    let mut ui = ScriptedInteraction::declining();
    let devenv = remake(&platform, &dir.resolver(), "demo", &mut ui).unwrap();

    assert_eq!(devenvs(&platform), 1);
    assert_eq!(devenv.name, "demo-devenv-1");
    assert!(ui.asked.is_empty());
    let lines = platform.exec_lines();
    assert!(lines[before].starts_with("docker compose"));
    assert!(!lines[before..].iter().any(|l| l.starts_with("git clone")));
    assert_eq!(platform.volume_names(), vec!["demo_workspace"]);
}

#[test]
fn test_shell_uses_configured_shell() {
    let dir = TestConfigDir::new();
    let platform = FakePlatform::new();
    create_demo(&dir, &platform);
    platform.respond_to("/bin/zsh", 7, "");

    let code = shell(&platform, &dir.resolver(), "demo").unwrap();

    assert_eq!(code, 7);
    let state = platform.state();
    let record = state.execs.last().unwrap();
    assert_eq!(record.command, vec!["/bin/zsh"]);
    assert!(record.options.tty && record.options.interactive);
}

#[test]
fn test_shell_without_devenv() {
    let dir = TestConfigDir::new();
    let platform = FakePlatform::new();
    create_demo(&dir, &platform);
    let devenv = platform.containers_with(&labels([(SERVICE, DEVENV_SERVICE)]))[0].clone();
    unholy_platform::ContainerPlatform::remove_container(&platform, &devenv.id, true).unwrap();

    let err = shell(&platform, &dir.resolver(), "demo").unwrap_err();

    assert!(matches!(err, Error::NoDevenv { ref project } if project == "demo"));
}

#[test]
fn test_editor_argv_targets_devenv() {
    let dir = TestConfigDir::new();
    let platform = FakePlatform::new();
    create_demo(&dir, &platform);

    let argv = editor_argv(&platform, &dir.resolver(), "demo").unwrap();

    assert_eq!(argv[..2], ["docker", "exec"]);
    assert_eq!(argv.last().unwrap(), "nvim");
}

#[test]
fn test_platform_context_comes_from_project_record() {
    let dir = TestConfigDir::new();
    dir.write_project("demo", "---\ncontext = \"remote-box\"\n---\n");
    dir.write_project("plain", "---\n---\n");

    let resolver = dir.resolver();

    assert_eq!(
        platform_context(&resolver, "demo").unwrap().as_deref(),
        Some("remote-box")
    );
    assert_eq!(platform_context(&resolver, "plain").unwrap(), None);
}

#[test]
fn test_new_project_context_follows_later_commands() {
    let dir = TestConfigDir::new();
    dir.write_user("---\ncontext = \"remote-box\"\n---\n");
    let platform = FakePlatform::new();
    let request = NewProject::new(REPO);
    let resolver = dir.resolver();

    let context = request.platform_context(&resolver).unwrap();
    assert_eq!(context.as_deref(), Some("remote-box"));

    let mut ui = ScriptedInteraction::approving();
    new_project(&platform, &remote(), &resolver, &request, &mut ui).unwrap();

    assert_eq!(platform_context(&resolver, "demo").unwrap(), context);
}

#[test]
fn test_new_project_context_reuses_recorded_one() {
    let dir = TestConfigDir::new();
    dir.write_project("demo", "---\ncontext = \"recorded\"\n---\n");
    let resolver = dir.resolver();

    let implicit = NewProject::new(REPO);
    assert_eq!(
        implicit.platform_context(&resolver).unwrap().as_deref(),
        Some("recorded")
    );

    let mut explicit = NewProject::new(REPO);
    explicit.context = Some("other".into());
    assert_eq!(
        explicit.platform_context(&resolver).unwrap().as_deref(),
        Some("other")
    );
}
