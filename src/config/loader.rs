// src/config/loader.rs

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::model::{PRODUCT, RawSettings, Settings};
use crate::errors::{Result, TaskvisorError};

/// Environment variable overriding the settings file location.
pub const CONFIG_ENV: &str = "TASKVISOR_CONFIG";

/// Load raw settings from a TOML file.
///
/// A missing file yields the defaults; a present file must parse.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawSettings> {
    let path = path.as_ref();
    if !path.exists() {
        return Ok(RawSettings::default());
    }
    let contents = fs::read_to_string(path)?;
    let raw: RawSettings = toml::from_str(&contents)?;
    Ok(raw)
}

/// Load settings from `path` (or the default location) and validate them.
///
/// This is the entry point for the rest of the application.
pub fn load_settings(path: Option<&Path>) -> Result<Settings> {
    let home = home_dir()?;
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => default_config_path(&home),
    };
    let raw = load_from_path(&path)?;
    Settings::from_raw(raw, &home)
}

/// `TASKVISOR_CONFIG` if set, otherwise `~/.taskvisor/config.toml`.
pub fn default_config_path(home: &Path) -> PathBuf {
    match std::env::var_os(CONFIG_ENV) {
        Some(p) if !p.is_empty() => PathBuf::from(p),
        _ => home.join(format!(".{PRODUCT}")).join("config.toml"),
    }
}

fn home_dir() -> Result<PathBuf> {
    std::env::var_os("HOME")
        .filter(|h| !h.is_empty())
        .map(PathBuf::from)
        .ok_or_else(|| TaskvisorError::ConfigError("HOME is not set".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn missing_file_yields_defaults() {
        let raw = load_from_path("/definitely/not/here/config.toml").unwrap();
        assert_eq!(raw.logs.tail_lines, 100);
        assert_eq!(raw.bus.address, "127.0.0.1:8005");
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"
[paths]
system_root = "/srv/tv"

[services.bus]
source = "https://example.invalid/bus.git"

[logs]
tail_lines = 20
"#
        )
        .unwrap();

        let raw = load_from_path(file.path()).unwrap();
        assert_eq!(raw.paths.system_root, "/srv/tv");
        assert_eq!(raw.paths.workspace, "~/taskvisor");
        assert_eq!(raw.services.bus.source, "https://example.invalid/bus.git");
        assert_eq!(raw.services.scheduler.source, "taskvisor-scheduler");
        assert_eq!(raw.logs.tail_lines, 20);
    }

    #[test]
    fn malformed_file_is_a_toml_error() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "[paths\nsystem_root = 3").unwrap();
        let err = load_from_path(file.path()).unwrap_err();
        assert!(matches!(err, TaskvisorError::TomlError(_)));
    }
}
