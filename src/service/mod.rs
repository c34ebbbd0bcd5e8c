// src/service/mod.rs

//! Service lifecycle.
//!
//! - [`registry`] maps each [`Service`](crate::types::Service) to its install
//!   source and paths.
//! - [`pid`] persists one-line PID records.
//! - [`liveness`] turns a PID record into "running or not".
//! - [`launcher`] spawns detached service processes.
//! - [`stop`] interrupts a process and confirms its exit by polling.
//! - [`supervisor`] orchestrates all of the above per command.

pub mod launcher;
pub mod liveness;
pub mod pid;
pub mod registry;
pub mod stop;
pub mod supervisor;

pub use liveness::Liveness;
pub use pid::PidStore;
pub use registry::{ServiceRegistry, ServiceSpec};
pub use stop::{StopPolicy, StopReport, StopState};
pub use supervisor::{
    InstallOutcome, RestartOutcome, StartOutcome, StatusReport, StatusRow, Supervisor,
};
