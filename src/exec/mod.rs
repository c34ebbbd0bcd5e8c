// src/exec/mod.rs

//! External tool execution layer.
//!
//! Installing services, building tasks and opening editors all shell out to
//! other programs. The supervisor talks to a [`ToolRunner`] instead of
//! `tokio::process::Command` directly, so tests can record invocations
//! without spawning anything.
//!
//! - [`runner`] provides the `ToolRunner` trait and the production
//!   `CommandRunner`.

pub mod runner;

pub use runner::{CommandRunner, OutputMode, ToolInvocation, ToolOutput, ToolRunner};
