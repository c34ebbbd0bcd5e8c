// src/process/mod.rs

//! OS process layer.
//!
//! The supervisor never touches processes directly; it goes through a
//! [`ProcessBackend`]. Production code uses [`UnixProcessBackend`]; tests
//! provide a fake that keeps an in-memory process table.

use std::fmt::{self, Debug};
use std::io;
use std::path::PathBuf;

pub mod unix;

pub use unix::UnixProcessBackend;

/// Outcome of a zero-signal existence probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Probe {
    /// The process exists and we may signal it.
    Alive,
    /// No such process (or only a zombie is left).
    Gone,
    /// The process exists but belongs to another user.
    PermissionDenied,
    /// Any other delivery outcome.
    Failed(String),
}

/// Signals the supervisor sends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    /// Graceful interrupt (SIGINT); the process is expected to shut down cleanly.
    Interrupt,
}

#[derive(Debug)]
pub enum SignalError {
    NoSuchProcess,
    PermissionDenied,
    Other(io::Error),
}

impl fmt::Display for SignalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SignalError::NoSuchProcess => f.write_str("no such process"),
            SignalError::PermissionDenied => f.write_str("operation not permitted"),
            SignalError::Other(e) => write!(f, "{e}"),
        }
    }
}

/// What to run and where its output goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpec {
    pub program: PathBuf,
    pub log_path: PathBuf,
}

pub trait ProcessBackend: Send + Sync + Debug {
    /// Test whether `pid` exists without affecting it.
    fn probe(&self, pid: u32) -> Probe;

    fn signal(&self, pid: u32, signal: Signal) -> Result<(), SignalError>;

    /// Start `spec.program` detached from the caller, with stdout and stderr
    /// going to `spec.log_path`. Returns the new PID once the exec succeeded.
    fn spawn_detached(&self, spec: &LaunchSpec) -> io::Result<u32>;

    /// Whether the current process runs with root privileges.
    fn is_elevated(&self) -> bool;
}
