// src/config/validate.rs

use std::path::{Path, PathBuf};

use crate::config::model::{Layout, RawSettings, SOURCE_PLACEHOLDER, Settings, ToolTemplate};
use crate::errors::{Result, TaskvisorError};

impl Settings {
    /// Validate raw settings and expand `~/` against `home`.
    pub fn from_raw(raw: RawSettings, home: &Path) -> Result<Self> {
        validate_raw_settings(&raw)?;

        let layout = Layout {
            system_root: expand_home(&raw.paths.system_root, home),
            workspace: expand_home(&raw.paths.workspace, home),
            bin_dir: expand_home(&raw.paths.bin_dir, home),
            package_cache: expand_home(&raw.paths.package_cache, home),
        };

        Ok(Settings {
            layout,
            scheduler_source: raw.services.scheduler.source,
            bus_source: raw.services.bus.source,
            installer: ToolTemplate {
                program: raw.installer.program,
                args: raw.installer.args,
            },
            task_builder: ToolTemplate {
                program: raw.tasks.build_program,
                args: raw.tasks.build_args,
            },
            bus_address: raw.bus.address,
            bus_connect_timeout_ms: raw.bus.connect_timeout_ms,
            tail_lines: raw.logs.tail_lines,
        })
    }
}

fn validate_raw_settings(raw: &RawSettings) -> Result<()> {
    validate_paths(raw)?;
    validate_services(raw)?;
    validate_tools(raw)?;
    validate_limits(raw)?;
    Ok(())
}

fn validate_paths(raw: &RawSettings) -> Result<()> {
    let paths = [
        ("system_root", &raw.paths.system_root),
        ("workspace", &raw.paths.workspace),
        ("bin_dir", &raw.paths.bin_dir),
        ("package_cache", &raw.paths.package_cache),
    ];
    for (key, value) in paths {
        if value.trim().is_empty() {
            return Err(TaskvisorError::ConfigError(format!(
                "[paths].{key} must not be empty"
            )));
        }
    }
    if raw.paths.system_root == raw.paths.workspace {
        return Err(TaskvisorError::ConfigError(
            "[paths].system_root and [paths].workspace must differ".to_string(),
        ));
    }
    Ok(())
}

fn validate_services(raw: &RawSettings) -> Result<()> {
    for (name, section) in [
        ("scheduler", &raw.services.scheduler),
        ("bus", &raw.services.bus),
    ] {
        if section.source.trim().is_empty() {
            return Err(TaskvisorError::ConfigError(format!(
                "[services.{name}].source must not be empty"
            )));
        }
    }
    Ok(())
}

fn validate_tools(raw: &RawSettings) -> Result<()> {
    if raw.installer.program.trim().is_empty() {
        return Err(TaskvisorError::ConfigError(
            "[installer].program must not be empty".to_string(),
        ));
    }
    if !raw
        .installer
        .args
        .iter()
        .any(|a| a.contains(SOURCE_PLACEHOLDER))
    {
        return Err(TaskvisorError::ConfigError(format!(
            "[installer].args must reference {SOURCE_PLACEHOLDER}"
        )));
    }
    if raw.tasks.build_program.trim().is_empty() {
        return Err(TaskvisorError::ConfigError(
            "[tasks].build_program must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_limits(raw: &RawSettings) -> Result<()> {
    if raw.logs.tail_lines == 0 {
        return Err(TaskvisorError::ConfigError(
            "[logs].tail_lines must be >= 1 (got 0)".to_string(),
        ));
    }
    if raw.bus.connect_timeout_ms == 0 {
        return Err(TaskvisorError::ConfigError(
            "[bus].connect_timeout_ms must be >= 1 (got 0)".to_string(),
        ));
    }
    if raw.bus.address.trim().is_empty() {
        return Err(TaskvisorError::ConfigError(
            "[bus].address must not be empty".to_string(),
        ));
    }
    Ok(())
}

/// Expand a leading `~` to `home`. Other paths are returned unchanged.
pub fn expand_home(value: &str, home: &Path) -> PathBuf {
    let value = value.trim();
    if value == "~" {
        return home.to_path_buf();
    }
    match value.strip_prefix("~/") {
        Some(rest) => home.join(rest),
        None => PathBuf::from(value),
    }
}
