// src/lib.rs

pub mod cli;
pub mod config;
pub mod errors;
pub mod exec;
pub mod fs;
pub mod logging;
pub mod logs;
pub mod process;
pub mod service;
pub mod task;
pub mod types;
pub mod workspace;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tracing::{error, info};

use crate::cli::{CliArgs, Command, LogView, SystemCommand, TaskCommand};
use crate::config::{Settings, load_settings};
use crate::errors::Result;
use crate::exec::{CommandRunner, ToolRunner};
use crate::fs::{FileSystem, RealFileSystem};
use crate::process::{ProcessBackend, UnixProcessBackend};
use crate::service::Supervisor;
use crate::task::{BusClient, SqliteTaskRepository, TaskForwarder, TaskRepository, TcpBusClient};
use crate::types::Service;
use crate::workspace::Workspace;

/// High-level entry point used by `main.rs`.
///
/// Settings problems are returned and end the process. Failures of the
/// command itself are logged with their kind and swallowed.
pub async fn run(args: CliArgs) -> anyhow::Result<()> {
    let settings = load_settings(args.config.as_deref())?;
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    let app = App::new(settings, fs, UnixProcessBackend::new(), CommandRunner::new());

    if let Err(err) = app.dispatch(args.command).await {
        error!(kind = ?err.kind(), "{err}");
    }
    Ok(())
}

/// Everything one command needs, wired from settings.
pub struct App<P, T> {
    settings: Settings,
    fs: Arc<dyn FileSystem>,
    supervisor: Supervisor<P, T>,
    workspace: Workspace,
}

impl<P: ProcessBackend, T: ToolRunner> App<P, T> {
    pub fn new(settings: Settings, fs: Arc<dyn FileSystem>, process: P, tools: T) -> Self {
        let supervisor = Supervisor::new(&settings, Arc::clone(&fs), process, tools);
        Self::with_supervisor(settings, fs, supervisor)
    }

    pub fn with_supervisor(
        settings: Settings,
        fs: Arc<dyn FileSystem>,
        supervisor: Supervisor<P, T>,
    ) -> Self {
        let workspace = Workspace::new(&settings, Arc::clone(&fs));
        Self {
            settings,
            fs,
            supervisor,
            workspace,
        }
    }

    pub fn supervisor(&self) -> &Supervisor<P, T> {
        &self.supervisor
    }

    pub async fn dispatch(&self, command: Command) -> Result<()> {
        match command {
            Command::Init => self.init().await,
            Command::System(cmd) => self.system(cmd).await,
            Command::Task(cmd) => {
                self.workspace.check()?;
                let repo = SqliteTaskRepository::open(&self.settings.layout.database_path())?;
                let bus = TcpBusClient::new(
                    self.settings.bus_address.clone(),
                    Duration::from_millis(self.settings.bus_connect_timeout_ms),
                );
                let forwarder = TaskForwarder::new(repo, bus, Arc::clone(&self.fs));
                let result = self.task(&forwarder, cmd).await;
                if let Err(err) = forwarder.close() {
                    error!(error = %err, "closing task database failed");
                }
                result
            }
        }
    }

    async fn init(&self) -> Result<()> {
        self.workspace.prepare()?;
        SqliteTaskRepository::open(&self.settings.layout.database_path())?.close()?;
        for service in Service::ALL {
            if !self.supervisor.is_installed(service) {
                self.supervisor.install(service, false, false).await?;
            }
        }
        info!(path = %self.settings.layout.workspace.display(), "workspace initialized");
        Ok(())
    }

    async fn system(&self, cmd: SystemCommand) -> Result<()> {
        // Uninstall must work on a half-initialised machine.
        if !matches!(cmd, SystemCommand::Uninstall) {
            self.workspace.check()?;
        }
        match cmd {
            SystemCommand::Start { target } => match target.selected() {
                Some(service) => self.supervisor.start(service).map(drop),
                None => self.supervisor.start_all(),
            },
            SystemCommand::Stop { target } => match target.selected() {
                Some(service) => self.supervisor.stop(service).await.map(drop),
                None => self.supervisor.stop_all().await,
            },
            SystemCommand::Restart { target } => match target.selected() {
                Some(service) => self.supervisor.restart(service).await.map(drop),
                None => self.supervisor.restart_all().await,
            },
            SystemCommand::Status => {
                println!("{}", self.supervisor.status());
                Ok(())
            }
            SystemCommand::Update { target, cc } => match target.selected() {
                Some(service) => self.supervisor.install(service, true, cc).await.map(drop),
                None => self.supervisor.install_all(true, cc).await,
            },
            SystemCommand::Uninstall => self.supervisor.uninstall_all().await,
            SystemCommand::Logs { target, view } => {
                let path = self.settings.layout.log_path(target.service());
                self.show_log(&path, view).await
            }
        }
    }

    async fn task<R: TaskRepository, B: BusClient>(
        &self,
        forwarder: &TaskForwarder<R, B>,
        cmd: TaskCommand,
    ) -> Result<()> {
        match cmd {
            TaskCommand::Create { name, desc, force } => {
                self.workspace.create_task(&name, &desc, force).map(drop)
            }
            TaskCommand::Build { name, restart } => {
                self.workspace
                    .build_task(self.supervisor.tools(), &name)
                    .await?;
                if restart {
                    forwarder.restart(&name).await?;
                }
                Ok(())
            }
            TaskCommand::Enable { name } => forwarder.enable(&name).map(drop),
            TaskCommand::Disable { name } => forwarder.disable(&name).await,
            TaskCommand::Delete { name } => forwarder.delete(&name).await.map(drop),
            TaskCommand::Resolve { name } => forwarder.resolve_error(&name).map(drop),
            TaskCommand::Get { name } => {
                let tasks = forwarder.get(name.as_deref())?;
                if tasks.is_empty() {
                    info!("no tasks registered");
                }
                for task in tasks {
                    println!("{task}");
                }
                Ok(())
            }
            TaskCommand::Logs { name, view } => {
                let path = forwarder.log_path(&name)?;
                self.show_log(&path, view).await
            }
        }
    }

    async fn show_log(&self, path: &Path, view: LogView) -> Result<()> {
        if let Some(editor) = view.editor {
            return logs::open_in_editor(self.fs.as_ref(), self.supervisor.tools(), editor, path)
                .await;
        }
        let lines = view.lines.unwrap_or(self.settings.tail_lines);
        for line in logs::tail(self.fs.as_ref(), path, lines)? {
            println!("{line}");
        }
        Ok(())
    }
}
