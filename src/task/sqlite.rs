//! SQLite-backed [`TaskRepository`].

use std::path::{Path, PathBuf};

use rusqlite::{Connection, OptionalExtension, params};
use tracing::debug;

use crate::errors::{Result, TaskvisorError};
use crate::task::model::{NewTask, Task};
use crate::task::repo::TaskRepository;

const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS tasks (
    task_id     INTEGER PRIMARY KEY AUTOINCREMENT,
    name        TEXT NOT NULL UNIQUE,
    description TEXT NOT NULL DEFAULT '',
    schedule    TEXT,
    executable  TEXT NOT NULL,
    log_path    TEXT NOT NULL,
    is_disabled INTEGER NOT NULL DEFAULT 0,
    is_error    INTEGER NOT NULL DEFAULT 0,
    error_txt   TEXT NOT NULL DEFAULT ''
);
"#;

const TASK_COLUMNS: &str = "task_id, name, description, schedule, executable, log_path, \
                            is_disabled, is_error, error_txt";

#[derive(Debug)]
pub struct SqliteTaskRepository {
    conn: Connection,
}

impl SqliteTaskRepository {
    /// Open (creating if needed) the database at `path` and apply the schema.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)?;
        conn.execute_batch(SCHEMA_SQL)?;
        debug!(path = %path.display(), "task database opened");
        Ok(Self { conn })
    }

    pub fn insert_task(&self, task: &NewTask) -> Result<Task> {
        self.conn.execute(
            "INSERT INTO tasks (name, description, schedule, executable, log_path) \
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                task.name,
                task.description,
                task.schedule,
                task.executable.to_string_lossy(),
                task.log_path.to_string_lossy(),
            ],
        )?;
        self.get_task_by_name(&task.name)
    }

    fn update_flags(&self, name: &str, sql: &str, args: &[&dyn rusqlite::ToSql]) -> Result<Task> {
        let changed = self.conn.execute(sql, args)?;
        if changed == 0 {
            return Err(TaskvisorError::TaskNotFound(name.to_string()));
        }
        self.get_task_by_name(name)
    }
}

impl TaskRepository for SqliteTaskRepository {
    fn get_task_by_name(&self, name: &str) -> Result<Task> {
        let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE name = ?1");
        self.conn
            .query_row(&sql, params![name], row_to_task)
            .optional()?
            .ok_or_else(|| TaskvisorError::TaskNotFound(name.to_string()))
    }

    fn get_all_tasks(&self) -> Result<Vec<Task>> {
        let sql = format!("SELECT {TASK_COLUMNS} FROM tasks ORDER BY task_id");
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([], row_to_task)?;
        let tasks = rows.collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(tasks)
    }

    fn set_is_disabled(&self, name: &str, disabled: bool) -> Result<Task> {
        self.update_flags(
            name,
            "UPDATE tasks SET is_disabled = ?1 WHERE name = ?2",
            params![disabled, name],
        )
    }

    fn set_is_error(&self, name: &str, is_error: bool, message: &str) -> Result<Task> {
        self.update_flags(
            name,
            "UPDATE tasks SET is_error = ?1, error_txt = ?2 WHERE name = ?3",
            params![is_error, message, name],
        )
    }

    fn delete_task(&self, task: &Task) -> Result<()> {
        let removed = self
            .conn
            .execute("DELETE FROM tasks WHERE task_id = ?1", params![task.task_id])?;
        if removed == 0 {
            return Err(TaskvisorError::TaskNotFound(task.name.clone()));
        }
        Ok(())
    }

    fn close(self) -> Result<()> {
        self.conn.close().map_err(|(_, err)| err)?;
        debug!("task database closed");
        Ok(())
    }
}

fn row_to_task(row: &rusqlite::Row<'_>) -> rusqlite::Result<Task> {
    Ok(Task {
        task_id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        schedule: row.get(3)?,
        executable: PathBuf::from(row.get::<_, String>(4)?),
        log_path: PathBuf::from(row.get::<_, String>(5)?),
        is_disabled: row.get(6)?,
        is_error: row.get(7)?,
        error_txt: row.get(8)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn new_task(name: &str) -> NewTask {
        NewTask {
            name: name.to_string(),
            description: format!("{name} task"),
            schedule: Some("*/5 * * * *".to_string()),
            executable: PathBuf::from(format!("/tasks/{name}/bin")),
            log_path: PathBuf::from(format!("/logs/{name}.log")),
        }
    }

    fn open_repo() -> (TempDir, SqliteTaskRepository) {
        let dir = TempDir::new().unwrap();
        let repo = SqliteTaskRepository::open(&dir.path().join("nested/tasks.db")).unwrap();
        (dir, repo)
    }

    #[test]
    fn insert_then_lookup_by_name() {
        let (_dir, repo) = open_repo();
        let created = repo.insert_task(&new_task("backup")).unwrap();

        let fetched = repo.get_task_by_name("backup").unwrap();
        assert_eq!(created, fetched);
        assert!(fetched.task_id > 0);
        assert!(!fetched.is_disabled);
        assert_eq!(fetched.log_path, PathBuf::from("/logs/backup.log"));
    }

    #[test]
    fn unknown_name_is_task_not_found() {
        let (_dir, repo) = open_repo();
        let err = repo.get_task_by_name("ghost").unwrap_err();
        assert!(matches!(err, TaskvisorError::TaskNotFound(name) if name == "ghost"));

        let err = repo.set_is_disabled("ghost", true).unwrap_err();
        assert!(matches!(err, TaskvisorError::TaskNotFound(_)));
    }

    #[test]
    fn flags_round_through_updates() {
        let (_dir, repo) = open_repo();
        repo.insert_task(&new_task("sync")).unwrap();

        let disabled = repo.set_is_disabled("sync", true).unwrap();
        assert!(disabled.is_disabled);

        let errored = repo.set_is_error("sync", true, "panicked").unwrap();
        assert!(errored.is_error);
        assert_eq!(errored.error_txt, "panicked");

        let resolved = repo.set_is_error("sync", false, "").unwrap();
        assert!(!resolved.is_error);
        assert!(resolved.error_txt.is_empty());
        assert!(resolved.is_disabled);
    }

    #[test]
    fn delete_removes_record_and_list_is_ordered() {
        let (_dir, repo) = open_repo();
        let a = repo.insert_task(&new_task("a")).unwrap();
        repo.insert_task(&new_task("b")).unwrap();

        let names: Vec<_> = repo
            .get_all_tasks()
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect();
        assert_eq!(names, ["a", "b"]);

        repo.delete_task(&a).unwrap();
        assert_eq!(repo.get_all_tasks().unwrap().len(), 1);
        assert!(repo.delete_task(&a).is_err());
    }

    #[test]
    fn reopening_keeps_records() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tasks.db");
        let repo = SqliteTaskRepository::open(&path).unwrap();
        repo.insert_task(&new_task("keep")).unwrap();
        repo.close().unwrap();

        let repo = SqliteTaskRepository::open(&path).unwrap();
        assert!(repo.get_task_by_name("keep").is_ok());
    }
}
