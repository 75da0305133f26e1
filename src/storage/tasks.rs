//! Task repository for JSON storage

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::{LedgerError, LedgerResult};
use crate::models::{DateRange, Task, TaskId};

use super::file_io::{read_json, write_json_atomic};

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct TaskData {
    tasks: Vec<Task>,
}

/// Repository for task persistence
pub struct TaskRepository {
    path: PathBuf,
    data: RwLock<HashMap<TaskId, Task>>,
}

impl TaskRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(HashMap::new()),
        }
    }

    pub fn load(&self) -> LedgerResult<()> {
        let file_data: TaskData = read_json(&self.path)?;

        let mut data = self.data.write().map_err(|e| {
            LedgerError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;

        data.clear();
        for task in file_data.tasks {
            data.insert(task.id, task);
        }

        Ok(())
    }

    pub fn save(&self) -> LedgerResult<()> {
        let data = self.data.read().map_err(|e| {
            LedgerError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        let file_data = TaskData {
            tasks: chronological(data.values().cloned().collect()),
        };
        write_json_atomic(&self.path, &file_data)
    }

    pub fn get(&self, id: TaskId) -> LedgerResult<Option<Task>> {
        let data = self.data.read().map_err(|e| {
            LedgerError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(data.get(&id).cloned())
    }

    /// All tasks ordered by reference date
    pub fn get_all(&self) -> LedgerResult<Vec<Task>> {
        let data = self.data.read().map_err(|e| {
            LedgerError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(chronological(data.values().cloned().collect()))
    }

    /// Tasks whose reference date falls in the range
    pub fn get_in_range(&self, range: DateRange) -> LedgerResult<Vec<Task>> {
        Ok(self
            .get_all()?
            .into_iter()
            .filter(|t| range.contains(t.reference_date()))
            .collect())
    }

    /// Replace a task and persist, restoring the previous version on failure
    pub fn commit(&self, task: Task) -> LedgerResult<()> {
        let id = task.id;
        let previous = {
            let mut data = self.data.write().map_err(|e| {
                LedgerError::Storage(format!("Failed to acquire write lock: {}", e))
            })?;
            data.insert(id, task)
        };

        if let Err(e) = self.save() {
            let mut data = self.data.write().map_err(|e| {
                LedgerError::Storage(format!("Failed to acquire write lock: {}", e))
            })?;
            match previous {
                Some(old) => data.insert(id, old),
                None => data.remove(&id),
            };
            return Err(e);
        }
        Ok(())
    }

    pub fn count(&self) -> LedgerResult<usize> {
        let data = self.data.read().map_err(|e| {
            LedgerError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;
        Ok(data.len())
    }
}

fn chronological(mut tasks: Vec<Task>) -> Vec<Task> {
    tasks.sort_by(|a, b| {
        a.reference_date()
            .cmp(&b.reference_date())
            .then(a.created_at.cmp(&b.created_at))
            .then(a.id.cmp(&b.id))
    });
    tasks
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_commit_reload_and_range() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("tasks.json");
        let repo = TaskRepository::new(path.clone());

        repo.commit(Task::new("Open account", Some(date(2024, 3, 2)))).unwrap();
        repo.commit(Task::new("Set up transfer", Some(date(2024, 4, 9)))).unwrap();

        let repo2 = TaskRepository::new(path);
        repo2.load().unwrap();
        assert_eq!(repo2.count().unwrap(), 2);

        let march = DateRange::new(date(2024, 3, 1), date(2024, 3, 31)).unwrap();
        let in_march = repo2.get_in_range(march).unwrap();
        assert_eq!(in_march.len(), 1);
        assert_eq!(in_march[0].title, "Open account");
    }
}
