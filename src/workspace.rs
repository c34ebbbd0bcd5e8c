// src/workspace.rs

//! The user workspace: marker file, task scaffolding and task builds.

use std::path::{Component, Path};
use std::sync::Arc;

use tracing::{info, warn};

use crate::config::{Layout, Settings, ToolTemplate};
use crate::errors::{Result, TaskvisorError};
use crate::exec::{OutputMode, ToolInvocation, ToolRunner};
use crate::fs::FileSystem;
use crate::types::Service;

const MARKER_CONTENTS: &str = "# taskvisor workspace\nversion = 1\n";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    Created,
    /// The task directory already existed and `force` was not given.
    Kept,
}

#[derive(Debug, Clone)]
pub struct Workspace {
    layout: Layout,
    task_builder: ToolTemplate,
    fs: Arc<dyn FileSystem>,
}

impl Workspace {
    pub fn new(settings: &Settings, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            layout: settings.layout.clone(),
            task_builder: settings.task_builder.clone(),
            fs,
        }
    }

    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    pub fn is_initialized(&self) -> bool {
        self.fs.is_file(&self.layout.workspace_marker())
    }

    /// Precondition of every workspace-scoped command.
    pub fn check(&self) -> Result<()> {
        if self.is_initialized() {
            Ok(())
        } else {
            Err(TaskvisorError::WorkspaceUninitialized)
        }
    }

    /// Create the directory skeleton, the marker file and empty service logs.
    ///
    /// Existing files are left untouched, so running it twice is harmless.
    pub fn prepare(&self) -> Result<()> {
        self.fs.create_dir_all(&self.layout.tasks_dir())?;
        self.fs.create_dir_all(&self.layout.system_root)?;

        let marker = self.layout.workspace_marker();
        if self.fs.is_file(&marker) {
            warn!(path = %marker.display(), "workspace already initialized");
        } else {
            self.fs.write(&marker, MARKER_CONTENTS.as_bytes())?;
            info!(path = %self.layout.workspace.display(), "workspace created");
        }

        for service in Service::ALL {
            let log = self.layout.log_path(service);
            if !self.fs.exists(&log) {
                self.fs.write(&log, b"")?;
            }
        }
        Ok(())
    }

    /// Scaffold a new task project under `tasks/<name>`.
    pub fn create_task(&self, name: &str, description: &str, force: bool) -> Result<CreateOutcome> {
        validate_task_name(name)?;
        let dir = self.layout.task_dir(name);
        if self.fs.exists(&dir) {
            if !force {
                warn!(task = name, "task already exists, pass force to overwrite it");
                return Ok(CreateOutcome::Kept);
            }
            warn!(task = name, "overwriting existing task");
            self.fs.remove_dir_all(&dir)?;
        }

        self.fs
            .write(&dir.join("Cargo.toml"), cargo_manifest(name).as_bytes())?;
        self.fs
            .write(&dir.join("src").join("main.rs"), main_source(name).as_bytes())?;
        self.fs
            .write(&dir.join(".env"), env_descriptor(name, description).as_bytes())?;

        info!(task = name, path = %dir.display(), "task created");
        Ok(CreateOutcome::Created)
    }

    /// Build and register the task with the configured build tool.
    pub async fn build_task<T: ToolRunner>(&self, tools: &T, name: &str) -> Result<()> {
        validate_task_name(name)?;
        let dir = self.layout.task_dir(name);
        if !self.fs.is_dir(&dir) {
            return Err(TaskvisorError::TaskNotFound(name.to_string()));
        }

        info!(task = name, "building task");
        let invocation = ToolInvocation::new(
            self.task_builder.program.clone(),
            self.task_builder.args.clone(),
        )
        .in_dir(dir)
        .with_mode(OutputMode::Streamed);
        tools.run(invocation).await?;
        info!(task = name, "ok");
        Ok(())
    }
}

/// Task names become directory and package names: one plain path component.
pub fn validate_task_name(name: &str) -> Result<()> {
    let invalid = || TaskvisorError::InvalidTaskName(name.to_string());
    if name.trim().is_empty() || name.contains(['/', '\\']) || name.contains("..") {
        return Err(invalid());
    }
    let mut components = Path::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(()),
        _ => Err(invalid()),
    }
}

fn cargo_manifest(name: &str) -> String {
    format!(
        r#"[package]
name = "{name}"
version = "0.1.0"
edition = "2021"

[dependencies]
"#
    )
}

fn main_source(name: &str) -> String {
    format!(
        r#"fn main() {{
    let scheduled = std::env::args().any(|arg| arg == "--schedule");
    println!("{name}: running (scheduled: {{scheduled}})");
}}
"#
    )
}

fn env_descriptor(name: &str, description: &str) -> String {
    format!("TASK_NAME='{name}'\nTASK_DESCRIPTION='{description}'\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RawSettings;
    use crate::fs::mock::MockFileSystem;

    fn workspace(fs: &MockFileSystem) -> Workspace {
        let mut settings = Settings::from_raw(RawSettings::default(), Path::new("/home/op")).unwrap();
        settings.layout = Layout::rooted_at("/sandbox");
        Workspace::new(&settings, Arc::new(fs.clone()))
    }

    #[test]
    fn check_requires_marker() {
        let fs = MockFileSystem::new();
        let ws = workspace(&fs);
        assert!(matches!(
            ws.check(),
            Err(TaskvisorError::WorkspaceUninitialized)
        ));

        ws.prepare().unwrap();
        ws.check().unwrap();
        assert!(fs.is_dir(&ws.layout().tasks_dir()));
        assert!(fs.is_file(&ws.layout().log_path(Service::Bus)));
    }

    #[test]
    fn prepare_keeps_existing_logs() {
        let fs = MockFileSystem::new();
        let ws = workspace(&fs);
        let log = ws.layout().log_path(Service::Scheduler);
        fs.add_file(&log, "previous run\n");

        ws.prepare().unwrap();
        assert_eq!(fs.read_to_string(&log).unwrap(), "previous run\n");
    }

    #[test]
    fn create_task_writes_project_and_env() {
        let fs = MockFileSystem::new();
        let ws = workspace(&fs);
        assert_eq!(
            ws.create_task("digest", "daily digest", false).unwrap(),
            CreateOutcome::Created
        );

        let dir = ws.layout().task_dir("digest");
        let env = fs.read_to_string(&dir.join(".env")).unwrap();
        assert_eq!(env, "TASK_NAME='digest'\nTASK_DESCRIPTION='daily digest'\n");
        assert!(fs.read_to_string(&dir.join("Cargo.toml")).unwrap().contains("name = \"digest\""));
        assert!(fs.is_file(&dir.join("src/main.rs")));
    }

    #[test]
    fn existing_task_is_kept_without_force() {
        let fs = MockFileSystem::new();
        let ws = workspace(&fs);
        ws.create_task("digest", "first", false).unwrap();
        assert_eq!(
            ws.create_task("digest", "second", false).unwrap(),
            CreateOutcome::Kept
        );
        let env_path = ws.layout().task_dir("digest").join(".env");
        assert!(fs.read_to_string(&env_path).unwrap().contains("first"));

        ws.create_task("digest", "second", true).unwrap();
        assert!(fs.read_to_string(&env_path).unwrap().contains("second"));
    }

    #[test]
    fn task_names_are_single_components() {
        for bad in ["", "  ", "a/b", "..", "x..y", "a\\b", "/abs"] {
            assert!(
                matches!(validate_task_name(bad), Err(TaskvisorError::InvalidTaskName(_))),
                "{bad:?} should be rejected"
            );
        }
        validate_task_name("report-2").unwrap();
        validate_task_name("nightly_sync").unwrap();
    }
}
