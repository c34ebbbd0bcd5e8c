use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use serde::Deserialize;

/// Background services managed by the supervisor.
///
/// The set is closed: services are never created or destroyed at runtime,
/// only their running state changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Service {
    Scheduler,
    Bus,
}

impl Service {
    /// Every registered service, in reporting order.
    pub const ALL: [Service; 2] = [Service::Scheduler, Service::Bus];

    pub fn as_str(&self) -> &'static str {
        match self {
            Service::Scheduler => "scheduler",
            Service::Bus => "bus",
        }
    }
}

impl fmt::Display for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Service {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduler" => Ok(Service::Scheduler),
            "bus" => Ok(Service::Bus),
            other => Err(format!(
                "invalid service: {other} (expected \"scheduler\" or \"bus\")"
            )),
        }
    }
}

/// Derived liveness of a service. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ServiceStatus {
    Online,
    Offline,
}

impl fmt::Display for ServiceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceStatus::Online => f.write_str("ONLINE"),
            ServiceStatus::Offline => f.write_str("OFFLINE"),
        }
    }
}

/// Editors that log files can be opened in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Editor {
    Vim,
    Nano,
    Code,
}

impl Editor {
    pub fn program(&self) -> &'static str {
        match self {
            Editor::Vim => "vim",
            Editor::Nano => "nano",
            Editor::Code => "code",
        }
    }
}

impl fmt::Display for Editor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.program())
    }
}
