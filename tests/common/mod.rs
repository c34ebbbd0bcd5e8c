#![allow(dead_code)]

use std::sync::Arc;

use taskvisor::config::Settings;
use taskvisor::fs::FileSystem;
use taskvisor::fs::mock::MockFileSystem;
use taskvisor::service::{StopPolicy, Supervisor};
use taskvisor::types::Service;
use taskvisor_test_utils::{FakeProcessBackend, FakeToolRunner, SettingsBuilder, init_tracing};

pub const ROOT: &str = "/sandbox";

/// A supervisor wired to in-memory fakes, plus handles to inspect them.
pub struct Harness {
    pub fs: MockFileSystem,
    pub process: FakeProcessBackend,
    pub tools: FakeToolRunner,
    pub settings: Settings,
    pub supervisor: Supervisor<FakeProcessBackend, FakeToolRunner>,
}

pub fn harness() -> Harness {
    harness_with(StopPolicy::default())
}

pub fn harness_with(policy: StopPolicy) -> Harness {
    init_tracing();
    let settings = SettingsBuilder::new(ROOT).build();
    let fs = MockFileSystem::new();

    // "Installing" drops an executable named after the source into bin_dir.
    let bin_dir = settings.layout.bin_dir.clone();
    let installed = fs.clone();
    let tools = FakeToolRunner::new().with_effect(move |invocation| {
        if let Some(source) = invocation.args.last() {
            installed.add_file(bin_dir.join(source), "#!fake");
        }
    });

    let process = FakeProcessBackend::new();
    let supervisor = Supervisor::new(
        &settings,
        Arc::new(fs.clone()),
        process.clone(),
        tools.clone(),
    )
    .with_stop_policy(policy);

    Harness {
        fs,
        process,
        tools,
        settings,
        supervisor,
    }
}

impl Harness {
    pub async fn install_all(&self) {
        self.supervisor.install_all(false, false).await.unwrap();
    }

    /// PID currently recorded for `service`.
    pub fn recorded_pid(&self, service: Service) -> u32 {
        let path = self.settings.layout.pid_path(service);
        self.fs.read_to_string(&path).unwrap().trim().parse().unwrap()
    }
}
