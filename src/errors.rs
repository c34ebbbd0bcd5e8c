// src/errors.rs

//! Crate-wide error type and the coarse taxonomy used when reporting.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::Service;

#[derive(Error, Debug)]
pub enum TaskvisorError {
    #[error("Unknown service: {0}")]
    ServiceNotFound(String),

    #[error("Service {0} is not installed")]
    ServiceNotInstalled(Service),

    #[error("PID file not found: {}", .0.display())]
    PidNotFound(PathBuf),

    #[error("Service {0} is not running")]
    NotRunning(Service),

    #[error("Task not found: {0}")]
    TaskNotFound(String),

    #[error("Path not found: {}", .0.display())]
    PathNotFound(PathBuf),

    #[error("Workspace is not initialized, run `taskvisor init` to continue")]
    WorkspaceUninitialized,

    #[error(
        "Failed to stop {service} after {attempts} attempts, run `ps aux` to inspect the process"
    )]
    StopTimedOut { service: Service, attempts: u32 },

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Failed to signal process {pid}: {reason}")]
    Signal { pid: u32, reason: String },

    #[error("Failed to launch {service}: {reason}")]
    Launch { service: Service, reason: String },

    #[error("`{program}` failed ({status}), output: {output}")]
    ExternalTool {
        program: String,
        status: String,
        output: String,
    },

    #[error("Invalid task name: {0:?}")]
    InvalidTaskName(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Bus error: {0}")]
    Bus(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Coarse classification used for log output and by callers that only care
/// about the category of a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    WorkspaceUninitialized,
    TimedOut,
    PermissionDenied,
    ExternalToolFailure,
    Invalid,
    Internal,
}

impl TaskvisorError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            TaskvisorError::ServiceNotFound(_)
            | TaskvisorError::ServiceNotInstalled(_)
            | TaskvisorError::PidNotFound(_)
            | TaskvisorError::NotRunning(_)
            | TaskvisorError::TaskNotFound(_)
            | TaskvisorError::PathNotFound(_) => ErrorKind::NotFound,
            TaskvisorError::WorkspaceUninitialized => ErrorKind::WorkspaceUninitialized,
            TaskvisorError::StopTimedOut { .. } => ErrorKind::TimedOut,
            TaskvisorError::PermissionDenied(_) => ErrorKind::PermissionDenied,
            TaskvisorError::ExternalTool { .. } | TaskvisorError::Launch { .. } => {
                ErrorKind::ExternalToolFailure
            }
            TaskvisorError::InvalidTaskName(_)
            | TaskvisorError::ConfigError(_)
            | TaskvisorError::TomlError(_) => ErrorKind::Invalid,
            TaskvisorError::Signal { .. }
            | TaskvisorError::Bus(_)
            | TaskvisorError::IoError(_)
            | TaskvisorError::Database(_)
            | TaskvisorError::Other(_) => ErrorKind::Internal,
        }
    }
}

pub type Result<T> = std::result::Result<T, TaskvisorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn timeout_message_points_at_manual_inspection() {
        let err = TaskvisorError::StopTimedOut {
            service: Service::Bus,
            attempts: 10,
        };
        assert_eq!(err.kind(), ErrorKind::TimedOut);
        assert!(err.to_string().contains("ps aux"));
    }

    #[test]
    fn lookups_are_not_found() {
        assert_eq!(
            TaskvisorError::TaskNotFound("x".into()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            TaskvisorError::PidNotFound(PathBuf::from("/tmp/x.pid")).kind(),
            ErrorKind::NotFound
        );
    }
}
