#![allow(dead_code)]

use std::path::{Path, PathBuf};

use taskvisor::config::{Layout, RawSettings, Settings};
use taskvisor::task::{NewTask, Task};

/// Builder for `Settings` with every path under one sandbox root.
pub struct SettingsBuilder {
    root: PathBuf,
    raw: RawSettings,
}

impl SettingsBuilder {
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            raw: RawSettings::default(),
        }
    }

    pub fn with_tail_lines(mut self, lines: usize) -> Self {
        self.raw.logs.tail_lines = lines;
        self
    }

    pub fn with_bus_address(mut self, address: &str) -> Self {
        self.raw.bus.address = address.to_string();
        self
    }

    pub fn with_installer(mut self, program: &str, args: &[&str]) -> Self {
        self.raw.installer.program = program.to_string();
        self.raw.installer.args = args.iter().map(|a| a.to_string()).collect();
        self
    }

    pub fn build(self) -> Settings {
        let mut settings = Settings::from_raw(self.raw, &self.root)
            .expect("Failed to build valid settings from builder");
        settings.layout = Layout::rooted_at(&self.root);
        settings
    }
}

/// Builder for task records.
pub struct TaskBuilder {
    task: Task,
}

impl TaskBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            task: Task {
                task_id: 1,
                name: name.to_string(),
                description: format!("{name} task"),
                schedule: Some("*/10 * * * *".to_string()),
                executable: PathBuf::from(format!("/tasks/{name}/target/release/{name}")),
                log_path: PathBuf::from(format!("/logs/{name}.log")),
                is_disabled: false,
                is_error: false,
                error_txt: String::new(),
            },
        }
    }

    pub fn id(mut self, task_id: i64) -> Self {
        self.task.task_id = task_id;
        self
    }

    pub fn files_under(mut self, root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        let name = &self.task.name;
        self.task.executable = root.join("tasks").join(name).join("bin");
        self.task.log_path = root.join("logs").join(format!("{name}.log"));
        self
    }

    pub fn disabled(mut self) -> Self {
        self.task.is_disabled = true;
        self
    }

    pub fn errored(mut self, message: &str) -> Self {
        self.task.is_error = true;
        self.task.error_txt = message.to_string();
        self
    }

    pub fn build(self) -> Task {
        self.task
    }

    pub fn build_new(self) -> NewTask {
        NewTask {
            name: self.task.name,
            description: self.task.description,
            schedule: self.task.schedule,
            executable: self.task.executable,
            log_path: self.task.log_path,
        }
    }
}
