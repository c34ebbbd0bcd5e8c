use std::sync::Arc;

use tracing::{debug, error, warn};

use crate::process::{Probe, ProcessBackend};
use crate::service::pid::PidStore;
use crate::service::registry::ServiceSpec;

/// Detailed liveness, for diagnostics. Only [`Liveness::Running`] counts as up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Liveness {
    Running(u32),
    /// No usable PID record.
    NoRecord,
    /// The record points at a process that no longer exists.
    Stale(u32),
    /// The process exists but is owned by someone else.
    Foreign(u32),
    /// Any other probe outcome.
    Unknown(u32, String),
}

impl Liveness {
    pub fn is_running(&self) -> bool {
        matches!(self, Liveness::Running(_))
    }
}

/// Answers "is this service up?" from its PID record and a zero-signal probe.
#[derive(Debug)]
pub struct LivenessChecker<P> {
    pids: PidStore,
    process: Arc<P>,
}

impl<P> Clone for LivenessChecker<P> {
    fn clone(&self) -> Self {
        Self {
            pids: self.pids.clone(),
            process: Arc::clone(&self.process),
        }
    }
}

impl<P: ProcessBackend> LivenessChecker<P> {
    pub fn new(pids: PidStore, process: Arc<P>) -> Self {
        Self { pids, process }
    }

    /// Never fails: unreadable records and probe errors degrade to "not running".
    pub fn check(&self, spec: &ServiceSpec) -> Liveness {
        let pid = match self.pids.read(&spec.pid_path) {
            Ok(pid) => pid,
            Err(err) => {
                warn!(service = %spec.service, error = %err, "no usable pid record");
                return Liveness::NoRecord;
            }
        };

        match self.process.probe(pid) {
            Probe::Alive => Liveness::Running(pid),
            Probe::Gone => {
                debug!(service = %spec.service, pid, "pid record is stale");
                Liveness::Stale(pid)
            }
            Probe::PermissionDenied => {
                warn!(service = %spec.service, pid, "permission denied probing process");
                Liveness::Foreign(pid)
            }
            Probe::Failed(reason) => {
                error!(service = %spec.service, pid, %reason, "probing process failed");
                Liveness::Unknown(pid, reason)
            }
        }
    }

    pub fn is_running(&self, spec: &ServiceSpec) -> bool {
        self.check(spec).is_running()
    }
}
