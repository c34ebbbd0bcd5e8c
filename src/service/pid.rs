use std::path::Path;
use std::sync::Arc;

use crate::errors::{Result, TaskvisorError};
use crate::fs::FileSystem;

/// One-line PID records, one file per service.
#[derive(Debug, Clone)]
pub struct PidStore {
    fs: Arc<dyn FileSystem>,
}

impl PidStore {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }

    /// Overwrite the record at `path` with `pid`, creating parent directories.
    pub fn write(&self, path: &Path, pid: u32) -> Result<()> {
        if let Some(parent) = path.parent() {
            self.fs.create_dir_all(parent)?;
        }
        self.fs.write(path, format!("{pid}\n").as_bytes())?;
        Ok(())
    }

    /// Read the record at `path`.
    ///
    /// A missing directory, missing file or unparsable first line are all
    /// reported as [`TaskvisorError::PidNotFound`].
    pub fn read(&self, path: &Path) -> Result<u32> {
        let not_found = || TaskvisorError::PidNotFound(path.to_path_buf());

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !self.fs.is_dir(parent) {
                return Err(not_found());
            }
        }
        let contents = self.fs.read_to_string(path).map_err(|_| not_found())?;
        parse_pid(&contents).ok_or_else(not_found)
    }
}

/// Parse the first line of a PID record. PIDs <= 0 are rejected.
pub fn parse_pid(contents: &str) -> Option<u32> {
    contents
        .lines()
        .next()?
        .trim()
        .parse::<u32>()
        .ok()
        .filter(|pid| *pid > 0 && *pid <= i32::MAX as u32)
}
