//! Goal repository for JSON storage
//!
//! Manages loading and saving goals to goals.json

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::{LedgerError, LedgerResult};
use crate::models::{Goal, GoalId};

use super::file_io::{read_json, write_json_atomic};

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct GoalData {
    goals: Vec<Goal>,
}

/// Repository for goal persistence
pub struct GoalRepository {
    path: PathBuf,
    data: RwLock<HashMap<GoalId, Goal>>,
}

impl GoalRepository {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(HashMap::new()),
        }
    }

    /// Load goals from disk
    pub fn load(&self) -> LedgerResult<()> {
        let file_data: GoalData = read_json(&self.path)?;

        let mut data = self.data.write().map_err(|e| {
            LedgerError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;

        data.clear();
        for goal in file_data.goals {
            data.insert(goal.id, goal);
        }

        Ok(())
    }

    /// Save goals to disk
    pub fn save(&self) -> LedgerResult<()> {
        let data = self.data.read().map_err(|e| {
            LedgerError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        let file_data = GoalData {
            goals: by_priority(data.values().cloned().collect()),
        };
        write_json_atomic(&self.path, &file_data)
    }

    pub fn get(&self, id: GoalId) -> LedgerResult<Option<Goal>> {
        let data = self.data.read().map_err(|e| {
            LedgerError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(data.get(&id).cloned())
    }

    /// All goals, highest priority first, then by name
    pub fn get_all(&self) -> LedgerResult<Vec<Goal>> {
        let data = self.data.read().map_err(|e| {
            LedgerError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(by_priority(data.values().cloned().collect()))
    }

    pub fn upsert(&self, goal: Goal) -> LedgerResult<()> {
        let mut data = self.data.write().map_err(|e| {
            LedgerError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;

        data.insert(goal.id, goal);
        Ok(())
    }

    /// Replace a goal and persist, restoring the previous version on failure
    pub fn commit(&self, goal: Goal) -> LedgerResult<()> {
        let previous = self.get(goal.id)?;
        let id = goal.id;
        self.upsert(goal)?;

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

fn by_priority(mut goals: Vec<Goal>) -> Vec<Goal> {
    goals.sort_by(|a, b| {
        b.priority
            .cmp(&a.priority)
            .then(a.name.to_lowercase().cmp(&b.name.to_lowercase()))
            .then(a.id.cmp(&b.id))
    });
    goals
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Money;
    use tempfile::TempDir;

    fn create_test_repo() -> (TempDir, GoalRepository) {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("goals.json");
        (temp_dir, GoalRepository::new(path))
    }

    #[test]
    fn test_commit_and_reload() {
        let (temp_dir, repo) = create_test_repo();
        repo.load().unwrap();

        let goal = Goal::new("Laptop", Money::from_units(1200));
        let id = goal.id;
        repo.commit(goal).unwrap();

        let repo2 = GoalRepository::new(temp_dir.path().join("goals.json"));
        repo2.load().unwrap();
        assert_eq!(repo2.get(id).unwrap().unwrap().target_amount, Money::from_units(1200));
    }

    #[test]
    fn test_ordering() {
        let (_temp_dir, repo) = create_test_repo();
        repo.upsert(Goal::new("b", Money::from_units(1)).with_priority(2)).unwrap();
        repo.upsert(Goal::new("a", Money::from_units(1)).with_priority(2)).unwrap();
        repo.upsert(Goal::new("c", Money::from_units(1)).with_priority(5)).unwrap();

        let names: Vec<_> = repo.get_all().unwrap().into_iter().map(|g| g.name).collect();
        assert_eq!(names, vec!["c", "a", "b"]);
    }
}
