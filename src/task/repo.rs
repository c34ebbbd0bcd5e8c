use crate::errors::Result;
use crate::task::model::Task;

/// Persistent store of task records.
///
/// Lookups by an unknown name fail with
/// [`TaskNotFound`](crate::errors::TaskvisorError::TaskNotFound).
pub trait TaskRepository {
    fn get_task_by_name(&self, name: &str) -> Result<Task>;

    /// Every task, ordered by id.
    fn get_all_tasks(&self) -> Result<Vec<Task>>;

    /// Returns the updated record.
    fn set_is_disabled(&self, name: &str, disabled: bool) -> Result<Task>;

    /// Set or clear the error flag; `message` replaces the stored error text.
    fn set_is_error(&self, name: &str, is_error: bool, message: &str) -> Result<Task>;

    fn delete_task(&self, task: &Task) -> Result<()>;

    /// Release the underlying handle.
    fn close(self) -> Result<()>
    where
        Self: Sized;
}
