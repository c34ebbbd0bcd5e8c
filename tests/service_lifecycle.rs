// tests/service_lifecycle.rs

mod common;
use crate::common::harness;

use taskvisor::errors::{ErrorKind, TaskvisorError};
use taskvisor::fs::FileSystem;
use taskvisor::service::{InstallOutcome, Liveness, RestartOutcome, StartOutcome};
use taskvisor::types::{Service, ServiceStatus};

#[tokio::test(start_paused = true)]
async fn start_then_stop_flips_status() {
    let h = harness();
    h.install_all().await;

    let outcome = h.supervisor.start(Service::Bus).unwrap();
    let pid = outcome.pid();
    assert_eq!(outcome, StartOutcome::Started(pid));
    assert!(h.fs.is_file(&h.settings.layout.pid_path(Service::Bus)));
    assert_eq!(h.recorded_pid(Service::Bus), pid);
    assert_eq!(
        h.supervisor.status().status_of(Service::Bus),
        Some(ServiceStatus::Online)
    );

    let report = h.supervisor.stop(Service::Bus).await.unwrap();
    assert_eq!(report.pid, pid);
    assert_eq!(
        h.supervisor.status().status_of(Service::Bus),
        Some(ServiceStatus::Offline)
    );
}

#[tokio::test]
async fn start_is_idempotent() {
    let h = harness();
    h.install_all().await;

    let first = h.supervisor.start(Service::Scheduler).unwrap();
    let second = h.supervisor.start(Service::Scheduler).unwrap();

    assert_eq!(second, StartOutcome::AlreadyRunning(first.pid()));
    assert_eq!(h.process.spawns().len(), 1);
    assert_eq!(h.recorded_pid(Service::Scheduler), first.pid());
}

#[tokio::test]
async fn stop_of_stopped_service_sends_no_signal() {
    let h = harness();
    h.install_all().await;

    let err = h.supervisor.stop(Service::Scheduler).await.unwrap_err();
    assert!(matches!(err, TaskvisorError::NotRunning(Service::Scheduler)));
    assert!(h.process.signals().is_empty());
}

#[tokio::test]
async fn start_requires_installed_executable() {
    let h = harness();
    let err = h.supervisor.start(Service::Bus).unwrap_err();

    assert!(matches!(err, TaskvisorError::ServiceNotInstalled(Service::Bus)));
    assert!(h.process.spawns().is_empty());
    assert!(!h.fs.exists(&h.settings.layout.pid_path(Service::Bus)));
}

#[tokio::test]
async fn crashed_service_reports_offline_and_can_start_again() {
    let h = harness();
    h.install_all().await;

    let pid = h.supervisor.start(Service::Bus).unwrap().pid();
    h.process.kill(pid);

    assert_eq!(h.supervisor.liveness(Service::Bus), Liveness::Stale(pid));
    assert_eq!(
        h.supervisor.status().status_of(Service::Bus),
        Some(ServiceStatus::Offline)
    );

    let again = h.supervisor.start(Service::Bus).unwrap();
    assert!(matches!(again, StartOutcome::Started(new_pid) if new_pid != pid));
}

#[tokio::test]
async fn foreign_process_counts_as_not_running() {
    let h = harness();
    h.install_all().await;
    h.fs
        .write(&h.settings.layout.pid_path(Service::Scheduler), b"1\n")
        .unwrap();
    h.process.add_foreign(1);

    assert!(!h.supervisor.is_running(Service::Scheduler));
    let err = h.supervisor.stop(Service::Scheduler).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::PermissionDenied);
}

#[tokio::test]
async fn status_omits_uninstalled_services() {
    let h = harness();
    h.supervisor.install(Service::Scheduler, false, false).await.unwrap();

    let report = h.supervisor.status();
    assert_eq!(report.rows.len(), 1);
    assert_eq!(
        report.status_of(Service::Scheduler),
        Some(ServiceStatus::Offline)
    );
    assert_eq!(report.status_of(Service::Bus), None);
}

#[tokio::test(start_paused = true)]
async fn restart_only_touches_running_services() {
    let h = harness();
    h.install_all().await;

    let outcome = h.supervisor.restart(Service::Bus).await.unwrap();
    assert_eq!(outcome, RestartOutcome::NotRunning);
    assert!(h.process.spawns().is_empty());

    let old = h.supervisor.start(Service::Bus).unwrap().pid();
    let outcome = h.supervisor.restart(Service::Bus).await.unwrap();
    let RestartOutcome::Restarted(new) = outcome else {
        panic!("expected a restart, got {outcome:?}");
    };
    assert_ne!(old, new);
    assert!(!h.process.is_alive(old));
    assert_eq!(h.recorded_pid(Service::Bus), new);
}

#[tokio::test]
async fn install_skips_installed_services_unless_updating() {
    let h = harness();
    assert_eq!(
        h.supervisor.install(Service::Bus, false, false).await.unwrap(),
        InstallOutcome::Installed
    );
    assert_eq!(
        h.supervisor.install(Service::Bus, false, false).await.unwrap(),
        InstallOutcome::AlreadyInstalled
    );
    assert_eq!(h.tools.invocations().len(), 1);

    let invocation = &h.tools.invocations()[0];
    assert_eq!(invocation.program, "cargo");
    assert_eq!(invocation.args, ["install", "--force", "taskvisor-bus"]);
}

#[tokio::test(start_paused = true)]
async fn update_reinstalls_and_restarts_running_service() {
    let h = harness();
    h.install_all().await;
    let old = h.supervisor.start(Service::Scheduler).unwrap().pid();

    let outcome = h
        .supervisor
        .install(Service::Scheduler, true, false)
        .await
        .unwrap();

    assert_eq!(outcome, InstallOutcome::Updated);
    assert_eq!(h.tools.invocations().len(), 3);
    assert_ne!(h.recorded_pid(Service::Scheduler), old);
    assert!(h.supervisor.is_running(Service::Scheduler));
}

#[tokio::test]
async fn failing_installer_surfaces_tool_output() {
    let h = harness();
    h.tools.fail_program("cargo");

    let err = h.supervisor.install_all(false, false).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::ExternalToolFailure);
    assert!(err.to_string().contains("scripted failure"));
    // Aborted on the first service.
    assert_eq!(h.tools.invocations().len(), 1);
}

#[tokio::test]
async fn update_with_cache_clearing_wipes_cache_once() {
    let h = harness();
    let cache = h.settings.layout.package_cache.clone();
    h.fs.add_file(cache.join("index/serde-1.0.0.crate"), "x");

    h.supervisor.install_all(true, true).await.unwrap();

    assert!(!h.fs.exists(&cache));
    assert_eq!(h.tools.invocations().len(), 2);
}

#[tokio::test]
async fn start_all_aborts_on_first_failure() {
    let h = harness();
    h.install_all().await;
    h.process.fail_spawns(true);

    let err = h.supervisor.start_all();
    assert!(matches!(
        err,
        Err(TaskvisorError::Launch {
            service: Service::Scheduler,
            ..
        })
    ));
    assert!(!h.fs.exists(&h.settings.layout.pid_path(Service::Bus)));
}
