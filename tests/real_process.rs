// tests/real_process.rs
//
// Runs a shell script as the bus service through the real process backend.
// Linux only: the stopped script stays a zombie child of the test process,
// which only /proc reveals as gone.
#![cfg(target_os = "linux")]

use std::os::unix::fs::PermissionsExt;
use std::sync::Arc;
use std::time::Duration;

use taskvisor::exec::CommandRunner;
use taskvisor::fs::RealFileSystem;
use taskvisor::process::UnixProcessBackend;
use taskvisor::service::{StopPolicy, Supervisor};
use taskvisor::types::{Service, ServiceStatus};
use taskvisor_test_utils::{SettingsBuilder, init_tracing};

const SERVICE_SCRIPT: &str = "#!/bin/sh
trap 'echo interrupted; exit 0' INT
echo started
while true; do sleep 0.1; done
";

#[tokio::test]
async fn script_service_starts_logs_and_stops() {
    init_tracing();
    let root = tempfile::tempdir().unwrap();
    let settings = SettingsBuilder::new(root.path()).build();
    let layout = settings.layout.clone();

    let executable = layout.executable(Service::Bus);
    std::fs::create_dir_all(&layout.bin_dir).unwrap();
    std::fs::write(&executable, SERVICE_SCRIPT).unwrap();
    std::fs::set_permissions(&executable, std::fs::Permissions::from_mode(0o755)).unwrap();

    let supervisor = Supervisor::new(
        &settings,
        Arc::new(RealFileSystem),
        UnixProcessBackend::new(),
        CommandRunner::new(),
    )
    .with_stop_policy(StopPolicy {
        attempts: 50,
        interval: Duration::from_millis(100),
    });

    let pid = supervisor.start(Service::Bus).unwrap().pid();
    let recorded = std::fs::read_to_string(layout.pid_path(Service::Bus)).unwrap();
    assert_eq!(recorded, format!("{pid}\n"));
    assert_eq!(
        supervisor.status().status_of(Service::Bus),
        Some(ServiceStatus::Online)
    );

    // Give the script time to install its trap and write to the log.
    tokio::time::sleep(Duration::from_millis(300)).await;

    let report = supervisor.stop(Service::Bus).await.unwrap();
    assert_eq!(report.pid, pid);
    assert_eq!(
        supervisor.status().status_of(Service::Bus),
        Some(ServiceStatus::Offline)
    );

    let log = std::fs::read_to_string(layout.log_path(Service::Bus)).unwrap();
    assert!(log.contains("started"), "log was: {log:?}");
}
