// src/exec/runner.rs

//! Pluggable runner for external tools.
//!
//! - `CommandRunner` is the default implementation used by `taskvisor`.
//!   It runs the program with `tokio::process::Command` and turns a non-zero
//!   exit status into [`TaskvisorError::ExternalTool`] carrying the captured
//!   output.
//! - Tests provide their own `ToolRunner` that records invocations and
//!   returns scripted results.

use std::future::Future;
use std::path::PathBuf;
use std::pin::Pin;
use std::process::Stdio;

use tokio::process::Command;
use tracing::debug;

use crate::errors::{Result, TaskvisorError};

/// How the tool's output is handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Capture output; it is only surfaced when the tool fails.
    Captured,
    /// Capture output and echo it to stdout once the tool finishes.
    Streamed,
    /// Inherit the terminal (editors).
    Interactive,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolInvocation {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub mode: OutputMode,
}

impl ToolInvocation {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
            cwd: None,
            mode: OutputMode::Captured,
        }
    }

    pub fn in_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn with_mode(mut self, mode: OutputMode) -> Self {
        self.mode = mode;
        self
    }

    /// `program arg1 arg2 ...`, for log lines.
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Combined stdout + stderr of a finished tool.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    pub output: String,
}

/// Trait abstracting how external tools are run.
///
/// Production code uses [`CommandRunner`]; tests can provide their own
/// implementation that doesn't spawn real processes.
pub trait ToolRunner: Send + Sync {
    fn run(
        &self,
        invocation: ToolInvocation,
    ) -> Pin<Box<dyn Future<Output = Result<ToolOutput>> + Send + '_>>;
}

/// Real tool runner used in production.
#[derive(Debug, Clone, Default)]
pub struct CommandRunner;

impl CommandRunner {
    pub fn new() -> Self {
        Self
    }
}

impl ToolRunner for CommandRunner {
    fn run(
        &self,
        invocation: ToolInvocation,
    ) -> Pin<Box<dyn Future<Output = Result<ToolOutput>> + Send + '_>> {
        Box::pin(async move {
            debug!(cmd = %invocation.command_line(), cwd = ?invocation.cwd, "running tool");

            let mut cmd = Command::new(&invocation.program);
            cmd.args(&invocation.args);
            if let Some(dir) = &invocation.cwd {
                cmd.current_dir(dir);
            }

            if invocation.mode == OutputMode::Interactive {
                let status = cmd
                    .stdin(Stdio::inherit())
                    .stdout(Stdio::inherit())
                    .stderr(Stdio::inherit())
                    .status()
                    .await?;
                if !status.success() {
                    return Err(TaskvisorError::ExternalTool {
                        program: invocation.program,
                        status: status.to_string(),
                        output: String::new(),
                    });
                }
                return Ok(ToolOutput::default());
            }

            let out = cmd.stdin(Stdio::null()).output().await?;
            let mut output = String::from_utf8_lossy(&out.stdout).into_owned();
            output.push_str(&String::from_utf8_lossy(&out.stderr));

            if invocation.mode == OutputMode::Streamed && !output.trim().is_empty() {
                println!("{}", output.trim_end());
            }

            if !out.status.success() {
                return Err(TaskvisorError::ExternalTool {
                    program: invocation.command_line(),
                    status: out.status.to_string(),
                    output: output.trim_end().to_string(),
                });
            }

            Ok(ToolOutput { output })
        })
    }
}
