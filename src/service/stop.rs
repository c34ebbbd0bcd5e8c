//! Graceful stop: interrupt, then poll until the process is gone.
//!
//! ```text
//! Running --signal--> SignalSent --poll: gone--> Confirmed
//!                                \--budget spent--> TimedOut
//! ```
//!
//! There is no exit notification for a process we did not spawn, so polling
//! is the mechanism. `TimedOut` is terminal: nothing is force-killed, the
//! operator has to look at the process.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::errors::{Result, TaskvisorError};
use crate::process::{ProcessBackend, Signal, SignalError};
use crate::service::liveness::LivenessChecker;
use crate::service::pid::PidStore;
use crate::service::registry::ServiceSpec;

pub const STOP_ATTEMPTS: u32 = 10;
pub const STOP_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopState {
    Running,
    SignalSent,
    Confirmed,
    TimedOut,
}

/// Poll budget for confirming termination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StopPolicy {
    pub attempts: u32,
    pub interval: Duration,
}

impl Default for StopPolicy {
    fn default() -> Self {
        Self {
            attempts: STOP_ATTEMPTS,
            interval: STOP_INTERVAL,
        }
    }
}

/// Result of a confirmed stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StopReport {
    pub pid: u32,
    /// Number of liveness polls it took to observe the exit.
    pub polls: u32,
}

#[derive(Debug)]
pub struct StopProtocol<P> {
    pids: PidStore,
    liveness: LivenessChecker<P>,
    process: Arc<P>,
    policy: StopPolicy,
}

impl<P: ProcessBackend> StopProtocol<P> {
    pub fn new(
        pids: PidStore,
        liveness: LivenessChecker<P>,
        process: Arc<P>,
        policy: StopPolicy,
    ) -> Self {
        Self {
            pids,
            liveness,
            process,
            policy,
        }
    }

    pub async fn run(&self, spec: &ServiceSpec) -> Result<StopReport> {
        let pid = self.pids.read(&spec.pid_path)?;
        let mut state = StopState::Running;
        debug!(service = %spec.service, pid, ?state, "stopping");

        self.process
            .signal(pid, Signal::Interrupt)
            .map_err(|err| signal_error(pid, err))?;
        state = StopState::SignalSent;
        debug!(service = %spec.service, pid, ?state, "interrupt delivered");

        for poll in 1..=self.policy.attempts {
            if !self.liveness.is_running(spec) {
                state = StopState::Confirmed;
                debug!(service = %spec.service, pid, poll, ?state, "exit observed");
                info!(service = %spec.service, "stopped successfully");
                return Ok(StopReport { pid, polls: poll });
            }
            tokio::time::sleep(self.policy.interval).await;
        }

        state = StopState::TimedOut;
        debug!(service = %spec.service, pid, ?state, "poll budget exhausted");
        Err(TaskvisorError::StopTimedOut {
            service: spec.service,
            attempts: self.policy.attempts,
        })
    }
}

fn signal_error(pid: u32, err: SignalError) -> TaskvisorError {
    match err {
        SignalError::PermissionDenied => {
            TaskvisorError::PermissionDenied(format!("cannot signal process {pid}"))
        }
        other => TaskvisorError::Signal {
            pid,
            reason: other.to_string(),
        },
    }
}
