// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::types::{Editor, Service};

/// Command-line arguments for `taskvisor`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "taskvisor",
    version,
    about = "Supervise the taskvisor services and manage scheduled tasks.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the settings file (TOML).
    ///
    /// Default: `TASKVISOR_CONFIG`, then `~/.taskvisor/config.toml`.
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `TASKVISOR_LOG` or a default level will be used.
    #[arg(long, global = true, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Create the workspace, the task database and install the services.
    Init,

    /// Manage the background services.
    #[command(subcommand)]
    System(SystemCommand),

    /// Manage scheduled tasks.
    #[command(subcommand)]
    Task(TaskCommand),
}

/// Optional service selector; no flag means every service.
#[derive(Debug, Clone, Copy, Default, Args)]
#[group(multiple = false)]
pub struct ServiceTarget {
    #[arg(long)]
    pub scheduler: bool,
    #[arg(long)]
    pub bus: bool,
}

impl ServiceTarget {
    pub fn selected(&self) -> Option<Service> {
        if self.scheduler {
            Some(Service::Scheduler)
        } else if self.bus {
            Some(Service::Bus)
        } else {
            None
        }
    }
}

/// Exactly one service, for commands that cannot apply to all of them.
#[derive(Debug, Clone, Copy, Args)]
#[group(required = true, multiple = false)]
pub struct SingleService {
    #[arg(long)]
    pub scheduler: bool,
    #[arg(long)]
    pub bus: bool,
}

impl SingleService {
    pub fn service(&self) -> Service {
        if self.scheduler {
            Service::Scheduler
        } else {
            Service::Bus
        }
    }
}

/// How to show a log file.
#[derive(Debug, Clone, Copy, Default, Args)]
pub struct LogView {
    /// Open the whole file in an editor instead of printing it.
    #[arg(long, value_enum)]
    pub editor: Option<Editor>,

    /// Number of trailing lines to print.
    #[arg(long, value_name = "N")]
    pub lines: Option<usize>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum SystemCommand {
    Start {
        #[command(flatten)]
        target: ServiceTarget,
    },
    Stop {
        #[command(flatten)]
        target: ServiceTarget,
    },
    Restart {
        #[command(flatten)]
        target: ServiceTarget,
    },
    /// Print the online/offline table.
    Status,
    /// Reinstall services from their sources and restart the running ones.
    Update {
        #[command(flatten)]
        target: ServiceTarget,
        /// Clear the package cache first.
        #[arg(long)]
        cc: bool,
    },
    /// Remove services, workspace and system files. Requires root.
    Uninstall,
    Logs {
        #[command(flatten)]
        target: SingleService,
        #[command(flatten)]
        view: LogView,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum TaskCommand {
    /// Scaffold a new task project.
    Create {
        #[arg(long)]
        name: String,
        #[arg(long, default_value = "")]
        desc: String,
        /// Overwrite an existing task.
        #[arg(long)]
        force: bool,
    },
    /// Build the task and register it with the scheduler.
    Build {
        #[arg(long)]
        name: String,
        /// Ask the scheduler to restart the task afterwards.
        #[arg(long)]
        restart: bool,
    },
    Enable {
        #[arg(long)]
        name: String,
    },
    Disable {
        #[arg(long)]
        name: String,
    },
    Delete {
        #[arg(long)]
        name: String,
    },
    /// Clear the task's error state.
    Resolve {
        #[arg(long)]
        name: String,
    },
    /// Show one task, or all of them.
    Get {
        #[arg(long)]
        name: Option<String>,
    },
    Logs {
        #[arg(long)]
        name: String,
        #[command(flatten)]
        view: LogView,
    },
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_from(args: &[&str]) -> Result<CliArgs, clap::Error> {
        CliArgs::try_parse_from(std::iter::once("taskvisor").chain(args.iter().copied()))
    }

    #[test]
    fn system_target_is_optional_and_exclusive() {
        let args = parse_from(&["system", "start"]).unwrap();
        assert!(matches!(
            args.command,
            Command::System(SystemCommand::Start { target }) if target.selected().is_none()
        ));

        let args = parse_from(&["system", "update", "--bus", "--cc"]).unwrap();
        assert!(matches!(
            args.command,
            Command::System(SystemCommand::Update { target, cc: true })
                if target.selected() == Some(Service::Bus)
        ));

        assert!(parse_from(&["system", "stop", "--bus", "--scheduler"]).is_err());
    }

    #[test]
    fn system_logs_requires_a_service() {
        assert!(parse_from(&["system", "logs"]).is_err());

        let args = parse_from(&["system", "logs", "--scheduler", "--editor", "vim"]).unwrap();
        match args.command {
            Command::System(SystemCommand::Logs { target, view }) => {
                assert_eq!(target.service(), Service::Scheduler);
                assert_eq!(view.editor, Some(Editor::Vim));
                assert_eq!(view.lines, None);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn task_commands_take_named_flags() {
        let args = parse_from(&["task", "create", "--name", "sync", "--desc", "nightly"]).unwrap();
        assert!(matches!(
            args.command,
            Command::Task(TaskCommand::Create { ref name, ref desc, force: false })
                if name == "sync" && desc == "nightly"
        ));

        let args = parse_from(&["task", "get"]).unwrap();
        assert!(matches!(args.command, Command::Task(TaskCommand::Get { name: None })));

        assert!(parse_from(&["task", "delete"]).is_err());
    }

    #[test]
    fn global_flags_follow_subcommands() {
        let args = parse_from(&["system", "status", "--log-level", "debug", "--config", "/x.toml"])
            .unwrap();
        assert!(matches!(args.log_level, Some(LogLevel::Debug)));
        assert_eq!(args.config, Some(PathBuf::from("/x.toml")));
    }
}
