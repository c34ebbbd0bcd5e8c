use std::sync::Arc;

use tracing::{error, info, warn};

use crate::errors::{Result, TaskvisorError};
use crate::fs::FileSystem;
use crate::process::{LaunchSpec, ProcessBackend, Signal};
use crate::service::pid::PidStore;
use crate::service::registry::ServiceSpec;

/// Starts service executables in the background and records their PIDs.
#[derive(Debug)]
pub struct Launcher<P> {
    fs: Arc<dyn FileSystem>,
    pids: PidStore,
    process: Arc<P>,
}

impl<P: ProcessBackend> Launcher<P> {
    pub fn new(fs: Arc<dyn FileSystem>, pids: PidStore, process: Arc<P>) -> Self {
        Self { fs, pids, process }
    }

    /// Spawn the service and persist its PID before returning it.
    ///
    /// On error the service must be treated as not started, whatever the
    /// PID file says.
    pub fn launch(&self, spec: &ServiceSpec) -> Result<u32> {
        if !self.fs.is_file(&spec.executable) {
            return Err(TaskvisorError::ServiceNotInstalled(spec.service));
        }
        if let Some(parent) = spec.pid_path.parent() {
            self.fs.create_dir_all(parent)?;
        }
        if let Some(parent) = spec.log_path.parent() {
            self.fs.create_dir_all(parent)?;
        }

        let launch = LaunchSpec {
            program: spec.executable.clone(),
            log_path: spec.log_path.clone(),
        };
        let pid = self
            .process
            .spawn_detached(&launch)
            .map_err(|e| TaskvisorError::Launch {
                service: spec.service,
                reason: e.to_string(),
            })?;

        if let Err(err) = self.pids.write(&spec.pid_path, pid) {
            // Without a record nothing could ever stop it again.
            warn!(service = %spec.service, pid, "recording pid failed, interrupting new process");
            if let Err(signal_err) = self.process.signal(pid, Signal::Interrupt) {
                error!(service = %spec.service, pid, error = %signal_err, "interrupting new process failed");
            }
            // A partial record could name an unrelated process.
            if let Err(remove_err) = self.fs.remove_file(&spec.pid_path) {
                error!(
                    service = %spec.service,
                    path = %spec.pid_path.display(),
                    error = %remove_err,
                    "removing partial pid record failed"
                );
            }
            return Err(TaskvisorError::Launch {
                service: spec.service,
                reason: format!("recording pid {pid}: {err}"),
            });
        }

        info!(service = %spec.service, pid, log = %spec.log_path.display(), "service launched");
        Ok(pid)
    }
}
