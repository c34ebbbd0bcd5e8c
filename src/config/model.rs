// src/config/model.rs

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::types::Service;

/// Name every installed artifact, package and directory is derived from.
pub const PRODUCT: &str = "taskvisor";

/// Placeholder substituted with a service's install source in installer args.
pub const SOURCE_PLACEHOLDER: &str = "{source}";

/// Settings as read from the TOML file, before validation and `~` expansion.
///
/// ```toml
/// [paths]
/// system_root = "~/.taskvisor"
/// workspace = "~/taskvisor"
///
/// [services.scheduler]
/// source = "taskvisor-scheduler"
///
/// [installer]
/// program = "cargo"
/// args = ["install", "--force", "{source}"]
/// ```
///
/// All sections are optional and have defaults.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawSettings {
    #[serde(default)]
    pub paths: PathsSection,

    #[serde(default)]
    pub services: ServicesSection,

    #[serde(default)]
    pub installer: InstallerSection,

    #[serde(default)]
    pub tasks: TasksSection,

    #[serde(default)]
    pub bus: BusSection,

    #[serde(default)]
    pub logs: LogsSection,
}

/// `[paths]` section. Values may start with `~/`.
#[derive(Debug, Clone, Deserialize)]
pub struct PathsSection {
    /// PID files, service logs and the task database live here.
    #[serde(default = "default_system_root")]
    pub system_root: String,

    /// User workspace holding task sources.
    #[serde(default = "default_workspace")]
    pub workspace: String,

    /// Directory the installer puts service executables in.
    #[serde(default = "default_bin_dir")]
    pub bin_dir: String,

    /// Package cache; cleared by `--cc` and purged of product entries on uninstall.
    #[serde(default = "default_package_cache")]
    pub package_cache: String,
}

fn default_system_root() -> String {
    format!("~/.{PRODUCT}")
}

fn default_workspace() -> String {
    format!("~/{PRODUCT}")
}

fn default_bin_dir() -> String {
    "~/.cargo/bin".to_string()
}

fn default_package_cache() -> String {
    "~/.cargo/registry".to_string()
}

impl Default for PathsSection {
    fn default() -> Self {
        Self {
            system_root: default_system_root(),
            workspace: default_workspace(),
            bin_dir: default_bin_dir(),
            package_cache: default_package_cache(),
        }
    }
}

/// `[services.<name>]` sections.
#[derive(Debug, Clone, Deserialize)]
pub struct ServicesSection {
    #[serde(default = "default_scheduler")]
    pub scheduler: ServiceSection,

    #[serde(default = "default_bus_service")]
    pub bus: ServiceSection,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceSection {
    /// Install source handed to the installer (package name or git URL).
    pub source: String,
}

fn default_scheduler() -> ServiceSection {
    ServiceSection {
        source: format!("{PRODUCT}-scheduler"),
    }
}

fn default_bus_service() -> ServiceSection {
    ServiceSection {
        source: format!("{PRODUCT}-bus"),
    }
}

impl Default for ServicesSection {
    fn default() -> Self {
        Self {
            scheduler: default_scheduler(),
            bus: default_bus_service(),
        }
    }
}

/// `[installer]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct InstallerSection {
    #[serde(default = "default_installer_program")]
    pub program: String,

    /// Must contain `{source}`.
    #[serde(default = "default_installer_args")]
    pub args: Vec<String>,
}

fn default_installer_program() -> String {
    "cargo".to_string()
}

fn default_installer_args() -> Vec<String> {
    vec![
        "install".to_string(),
        "--force".to_string(),
        SOURCE_PLACEHOLDER.to_string(),
    ]
}

impl Default for InstallerSection {
    fn default() -> Self {
        Self {
            program: default_installer_program(),
            args: default_installer_args(),
        }
    }
}

/// `[tasks]` section: how a task's sources are built (and registered).
#[derive(Debug, Clone, Deserialize)]
pub struct TasksSection {
    #[serde(default = "default_build_program")]
    pub build_program: String,

    #[serde(default = "default_build_args")]
    pub build_args: Vec<String>,
}

fn default_build_program() -> String {
    "cargo".to_string()
}

fn default_build_args() -> Vec<String> {
    ["run", "--release", "--", "--schedule"]
        .iter()
        .map(|s| s.to_string())
        .collect()
}

impl Default for TasksSection {
    fn default() -> Self {
        Self {
            build_program: default_build_program(),
            build_args: default_build_args(),
        }
    }
}

/// `[bus]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct BusSection {
    #[serde(default = "default_bus_address")]
    pub address: String,

    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,
}

fn default_bus_address() -> String {
    "127.0.0.1:8005".to_string()
}

fn default_connect_timeout_ms() -> u64 {
    3000
}

impl Default for BusSection {
    fn default() -> Self {
        Self {
            address: default_bus_address(),
            connect_timeout_ms: default_connect_timeout_ms(),
        }
    }
}

/// `[logs]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct LogsSection {
    #[serde(default = "default_tail_lines")]
    pub tail_lines: usize,
}

fn default_tail_lines() -> usize {
    100
}

impl Default for LogsSection {
    fn default() -> Self {
        Self {
            tail_lines: default_tail_lines(),
        }
    }
}

/// Absolute locations of everything the supervisor reads or writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Layout {
    pub system_root: PathBuf,
    pub workspace: PathBuf,
    pub bin_dir: PathBuf,
    pub package_cache: PathBuf,
}

impl Layout {
    /// Lay everything out under a single root. Used for sandboxes and tests.
    pub fn rooted_at(root: impl AsRef<Path>) -> Self {
        let root = root.as_ref();
        Self {
            system_root: root.join(format!(".{PRODUCT}")),
            workspace: root.join(PRODUCT),
            bin_dir: root.join("bin"),
            package_cache: root.join("registry"),
        }
    }

    pub fn pid_path(&self, service: Service) -> PathBuf {
        self.system_root
            .join("pids")
            .join(format!("{}.pid", service.as_str()))
    }

    pub fn log_path(&self, service: Service) -> PathBuf {
        self.system_root
            .join("logs")
            .join(format!("{}.log", service.as_str()))
    }

    pub fn database_path(&self) -> PathBuf {
        self.system_root.join("tasks.db")
    }

    pub fn tasks_dir(&self) -> PathBuf {
        self.workspace.join("tasks")
    }

    pub fn task_dir(&self, name: &str) -> PathBuf {
        self.tasks_dir().join(name)
    }

    pub fn workspace_marker(&self) -> PathBuf {
        self.workspace.join("workspace.toml")
    }

    pub fn executable(&self, service: Service) -> PathBuf {
        self.bin_dir
            .join(format!("{PRODUCT}-{}", service.as_str()))
    }

    pub fn cli_binary(&self) -> PathBuf {
        self.bin_dir.join(PRODUCT)
    }
}

/// External program invocation template (installer, task builder).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolTemplate {
    pub program: String,
    pub args: Vec<String>,
}

impl ToolTemplate {
    /// Arguments with `{source}` substituted.
    pub fn args_for(&self, source: &str) -> Vec<String> {
        self.args
            .iter()
            .map(|a| a.replace(SOURCE_PLACEHOLDER, source))
            .collect()
    }
}

/// Validated settings used by the rest of the application.
#[derive(Debug, Clone)]
pub struct Settings {
    pub layout: Layout,
    pub scheduler_source: String,
    pub bus_source: String,
    pub installer: ToolTemplate,
    pub task_builder: ToolTemplate,
    pub bus_address: String,
    pub bus_connect_timeout_ms: u64,
    pub tail_lines: usize,
}

impl Settings {
    pub fn install_source(&self, service: Service) -> &str {
        match service {
            Service::Scheduler => &self.scheduler_source,
            Service::Bus => &self.bus_source,
        }
    }
}
