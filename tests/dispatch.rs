// tests/dispatch.rs

use std::path::Path;
use std::sync::Arc;

use taskvisor::App;
use taskvisor::cli::{Command, ServiceTarget, SystemCommand, TaskCommand};
use taskvisor::config::Settings;
use taskvisor::errors::{ErrorKind, TaskvisorError};
use taskvisor::fs::RealFileSystem;
use taskvisor::task::{SqliteTaskRepository, TaskRepository};
use taskvisor::types::Service;
use taskvisor_test_utils::{
    FakeProcessBackend, FakeToolRunner, SettingsBuilder, TaskBuilder, init_tracing,
};

type TestApp = App<FakeProcessBackend, FakeToolRunner>;

fn app(root: &Path) -> (Settings, FakeToolRunner, TestApp) {
    init_tracing();
    // Nothing listens on port 1; reaching the bus would fail the command.
    let settings = SettingsBuilder::new(root)
        .with_bus_address("127.0.0.1:1")
        .build();
    let bin_dir = settings.layout.bin_dir.clone();
    let tools = FakeToolRunner::new().with_effect(move |invocation| {
        if invocation.program == "cargo" && invocation.args.first().is_some_and(|a| a == "install")
        {
            if let Some(source) = invocation.args.last() {
                std::fs::create_dir_all(&bin_dir).unwrap();
                std::fs::write(bin_dir.join(source), "#!fake").unwrap();
            }
        }
    });
    let app = App::new(
        settings.clone(),
        Arc::new(RealFileSystem),
        FakeProcessBackend::new(),
        tools.clone(),
    );
    (settings, tools, app)
}

#[tokio::test]
async fn workspace_commands_require_init() {
    let root = tempfile::tempdir().unwrap();
    let (settings, tools, app) = app(root.path());
    let layout = &settings.layout;

    let err = app
        .dispatch(Command::System(SystemCommand::Status))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::WorkspaceUninitialized);
    let err = app
        .dispatch(Command::Task(TaskCommand::Get { name: None }))
        .await
        .unwrap_err();
    assert!(matches!(err, TaskvisorError::WorkspaceUninitialized));

    app.dispatch(Command::Init).await.unwrap();
    assert!(layout.workspace_marker().is_file());
    assert!(layout.tasks_dir().is_dir());
    assert!(layout.database_path().is_file());
    assert!(layout.log_path(Service::Scheduler).is_file());
    for service in Service::ALL {
        assert!(app.supervisor().is_installed(service));
    }
    assert_eq!(tools.invocations().len(), 2);

    // Second init installs nothing new.
    app.dispatch(Command::Init).await.unwrap();
    assert_eq!(tools.invocations().len(), 2);

    app.dispatch(Command::System(SystemCommand::Start {
        target: ServiceTarget {
            scheduler: false,
            bus: true,
        },
    }))
    .await
    .unwrap();
    assert!(app.supervisor().is_running(Service::Bus));
    assert!(!app.supervisor().is_running(Service::Scheduler));
}

#[tokio::test]
async fn task_commands_go_through_the_task_database() {
    let root = tempfile::tempdir().unwrap();
    let (settings, tools, app) = app(root.path());
    let layout = &settings.layout;
    app.dispatch(Command::Init).await.unwrap();

    app.dispatch(Command::Task(TaskCommand::Create {
        name: "digest".into(),
        desc: "daily digest".into(),
        force: false,
    }))
    .await
    .unwrap();
    let env = std::fs::read_to_string(layout.task_dir("digest").join(".env")).unwrap();
    assert_eq!(env, "TASK_NAME='digest'\nTASK_DESCRIPTION='daily digest'\n");

    app.dispatch(Command::Task(TaskCommand::Build {
        name: "digest".into(),
        restart: false,
    }))
    .await
    .unwrap();
    let build = tools.invocations().pop().unwrap();
    assert_eq!(build.cwd.as_deref(), Some(layout.task_dir("digest").as_path()));
    assert_eq!(build.args, ["run", "--release", "--", "--schedule"]);

    // A disabled task is purged locally; the bus is never dialled.
    let old = TaskBuilder::new("old").files_under(root.path()).build_new();
    std::fs::create_dir_all(old.executable.parent().unwrap()).unwrap();
    std::fs::create_dir_all(old.log_path.parent().unwrap()).unwrap();
    std::fs::write(&old.executable, "bin").unwrap();
    std::fs::write(&old.log_path, "ran\n").unwrap();
    {
        let repo = SqliteTaskRepository::open(&layout.database_path()).unwrap();
        repo.insert_task(&old).unwrap();
        repo.set_is_disabled("old", true).unwrap();
        repo.close().unwrap();
    }

    app.dispatch(Command::Task(TaskCommand::Delete { name: "old".into() }))
        .await
        .unwrap();
    assert!(!old.executable.exists());
    assert!(!old.log_path.exists());
    let repo = SqliteTaskRepository::open(&layout.database_path()).unwrap();
    assert!(matches!(
        repo.get_task_by_name("old"),
        Err(TaskvisorError::TaskNotFound(_))
    ));
    repo.close().unwrap();

    let err = app
        .dispatch(Command::Task(TaskCommand::Resolve {
            name: "missing".into(),
        }))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
}

#[tokio::test]
async fn uninstall_skips_the_workspace_check() {
    let root = tempfile::tempdir().unwrap();
    let (_settings, _tools, app) = app(root.path());

    let err = app
        .dispatch(Command::System(SystemCommand::Uninstall))
        .await
        .unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PermissionDenied);
}
