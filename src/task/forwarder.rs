use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};

use crate::errors::Result;
use crate::fs::FileSystem;
use crate::task::bus::{BusClient, StopTaskRequest};
use crate::task::model::Task;
use crate::task::repo::TaskRepository;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    /// The task was already out of the schedule; its files and record were
    /// removed locally.
    Purged,
    /// A delete request was handed to the scheduler.
    Forwarded,
}

/// Resolves tasks by name and forwards lifecycle changes to the scheduler.
///
/// Owns the repository handle; [`TaskForwarder::close`] releases it.
pub struct TaskForwarder<R, B> {
    repo: R,
    bus: B,
    fs: Arc<dyn FileSystem>,
}

impl<R: TaskRepository, B: BusClient> TaskForwarder<R, B> {
    pub fn new(repo: R, bus: B, fs: Arc<dyn FileSystem>) -> Self {
        Self { repo, bus, fs }
    }

    pub fn repository(&self) -> &R {
        &self.repo
    }

    /// The scheduler flips the flag once it has stopped the task.
    pub async fn disable(&self, name: &str) -> Result<()> {
        let task = self.repo.get_task_by_name(name)?;
        self.bus.stop_task(StopTaskRequest::disable(task.task_id)).await?;
        info!(task = name, "disable request sent");
        Ok(())
    }

    pub fn enable(&self, name: &str) -> Result<Task> {
        let task = self.repo.set_is_disabled(name, false)?;
        info!(task = name, "task enabled");
        Ok(task)
    }

    pub async fn delete(&self, name: &str) -> Result<DeleteOutcome> {
        let task = self.repo.get_task_by_name(name)?;
        if task.is_schedulable() {
            self.bus.stop_task(StopTaskRequest::delete(task.task_id)).await?;
            info!(task = name, "delete request sent");
            return Ok(DeleteOutcome::Forwarded);
        }

        warn!(task = name, state = task.state(), "task is not scheduled, deleting locally");
        if !self.fs.remove_file(&task.executable)? {
            warn!(path = %task.executable.display(), "task executable already absent");
        }
        if !self.fs.remove_file(&task.log_path)? {
            warn!(path = %task.log_path.display(), "task log already absent");
        }
        self.repo.delete_task(&task)?;
        info!(task = name, "task deleted");
        Ok(DeleteOutcome::Purged)
    }

    /// Clear the error flag. The scheduler is not contacted.
    pub fn resolve_error(&self, name: &str) -> Result<Task> {
        let task = self.repo.set_is_error(name, false, "")?;
        info!(task = name, "error resolved");
        Ok(task)
    }

    pub async fn restart(&self, name: &str) -> Result<()> {
        warn!(task = name, "restarting task");
        let task = self.repo.get_task_by_name(name)?;
        self.bus.stop_task(StopTaskRequest::restart(task.task_id)).await
    }

    /// One task by name, or every task when `name` is `None`.
    pub fn get(&self, name: Option<&str>) -> Result<Vec<Task>> {
        match name {
            Some(name) => Ok(vec![self.repo.get_task_by_name(name)?]),
            None => self.repo.get_all_tasks(),
        }
    }

    pub fn log_path(&self, name: &str) -> Result<PathBuf> {
        Ok(self.repo.get_task_by_name(name)?.log_path)
    }

    pub fn close(self) -> Result<()> {
        self.repo.close()
    }
}
