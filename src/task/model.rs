use std::fmt;
use std::path::PathBuf;

/// A scheduled task as recorded in the task repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    /// Identifier assigned by the repository; the scheduler addresses tasks by it.
    pub task_id: i64,
    pub name: String,
    pub description: String,
    pub schedule: Option<String>,
    pub executable: PathBuf,
    pub log_path: PathBuf,
    pub is_disabled: bool,
    pub is_error: bool,
    pub error_txt: String,
}

impl Task {
    /// Disabled and errored tasks are ignored by the scheduler.
    pub fn is_schedulable(&self) -> bool {
        !self.is_disabled && !self.is_error
    }

    pub fn state(&self) -> &'static str {
        if self.is_error {
            "error"
        } else if self.is_disabled {
            "disabled"
        } else {
            "active"
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} ({}) schedule={} state={}",
            self.task_id,
            self.name,
            self.description,
            self.schedule.as_deref().unwrap_or("-"),
            self.state(),
        )?;
        if self.is_error && !self.error_txt.is_empty() {
            write!(f, " error={:?}", self.error_txt)?;
        }
        Ok(())
    }
}

/// Fields needed to register a task; the repository assigns the id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewTask {
    pub name: String,
    pub description: String,
    pub schedule: Option<String>,
    pub executable: PathBuf,
    pub log_path: PathBuf,
}
