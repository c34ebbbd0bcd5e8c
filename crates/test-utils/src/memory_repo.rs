use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use taskvisor::errors::{Result, TaskvisorError};
use taskvisor::task::{Task, TaskRepository};

#[derive(Debug, Default)]
struct RepoState {
    tasks: BTreeMap<i64, Task>,
    closed: bool,
}

/// Task repository kept in memory. Clones share state, so a test can inspect
/// the records after the forwarder has consumed its handle.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTaskRepository {
    state: Arc<Mutex<RepoState>>,
}

impl InMemoryTaskRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_tasks(tasks: impl IntoIterator<Item = Task>) -> Self {
        let repo = Self::new();
        for task in tasks {
            repo.insert(task);
        }
        repo
    }

    pub fn insert(&self, task: Task) {
        self.state.lock().unwrap().tasks.insert(task.task_id, task);
    }

    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    pub fn is_closed(&self) -> bool {
        self.state.lock().unwrap().closed
    }

    fn find(&self, name: &str) -> Option<Task> {
        let state = self.state.lock().unwrap();
        state.tasks.values().find(|t| t.name == name).cloned()
    }

    fn modify(&self, name: &str, f: impl FnOnce(&mut Task)) -> Result<Task> {
        let mut state = self.state.lock().unwrap();
        let task = state
            .tasks
            .values_mut()
            .find(|t| t.name == name)
            .ok_or_else(|| TaskvisorError::TaskNotFound(name.to_string()))?;
        f(task);
        Ok(task.clone())
    }
}

impl TaskRepository for InMemoryTaskRepository {
    fn get_task_by_name(&self, name: &str) -> Result<Task> {
        self.find(name)
            .ok_or_else(|| TaskvisorError::TaskNotFound(name.to_string()))
    }

    fn get_all_tasks(&self) -> Result<Vec<Task>> {
        Ok(self.state.lock().unwrap().tasks.values().cloned().collect())
    }

    fn set_is_disabled(&self, name: &str, disabled: bool) -> Result<Task> {
        self.modify(name, |t| t.is_disabled = disabled)
    }

    fn set_is_error(&self, name: &str, is_error: bool, message: &str) -> Result<Task> {
        self.modify(name, |t| {
            t.is_error = is_error;
            t.error_txt = message.to_string();
        })
    }

    fn delete_task(&self, task: &Task) -> Result<()> {
        self.state
            .lock()
            .unwrap()
            .tasks
            .remove(&task.task_id)
            .map(drop)
            .ok_or_else(|| TaskvisorError::TaskNotFound(task.name.clone()))
    }

    fn close(self) -> Result<()> {
        self.state.lock().unwrap().closed = true;
        Ok(())
    }
}
