pub mod builders;
pub mod fake_bus;
pub mod fake_process;
pub mod fake_tools;
pub mod memory_repo;

pub use builders::{SettingsBuilder, TaskBuilder};
pub use fake_bus::FakeBus;
pub use fake_process::FakeProcessBackend;
pub use fake_tools::FakeToolRunner;
pub use memory_repo::InMemoryTaskRepository;

use std::sync::Once;
use tracing_subscriber::{EnvFilter, fmt};

static INIT: Once = Once::new();

/// Initialise tracing once per test binary.
///
/// Output goes through the test writer, so it only shows up for failing
/// tests. `RUST_LOG=debug cargo test` turns on probe and state-transition
/// logs from the supervisor.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .init();
    });
}
