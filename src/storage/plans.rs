//! Plan repository for JSON storage
//!
//! Manages loading and saving savings plans to plans.json

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::RwLock;

use crate::error::{LedgerError, LedgerResult};
use crate::models::{Plan, PlanId};

use super::file_io::{read_json, write_json_atomic};

/// Serializable plan data structure
#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
struct PlanData {
    plans: Vec<Plan>,
}

/// Repository for plan persistence
pub struct PlanRepository {
    path: PathBuf,
    data: RwLock<HashMap<PlanId, Plan>>,
}

impl PlanRepository {
    /// Create a new plan repository
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            data: RwLock::new(HashMap::new()),
        }
    }

    /// Load plans from disk
    pub fn load(&self) -> LedgerResult<()> {
        let file_data: PlanData = read_json(&self.path)?;

        let mut data = self.data.write().map_err(|e| {
            LedgerError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;

        data.clear();
        for plan in file_data.plans {
            data.insert(plan.id, plan);
        }

        Ok(())
    }

    /// Save plans to disk
    pub fn save(&self) -> LedgerResult<()> {
        let data = self.data.read().map_err(|e| {
            LedgerError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        let file_data = PlanData {
            plans: sorted(data.values().cloned().collect()),
        };
        write_json_atomic(&self.path, &file_data)
    }

    /// Get a plan by ID
    pub fn get(&self, id: PlanId) -> LedgerResult<Option<Plan>> {
        let data = self.data.read().map_err(|e| {
            LedgerError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(data.get(&id).cloned())
    }

    /// Get all plans, archived ones included, ordered by name
    pub fn get_all(&self) -> LedgerResult<Vec<Plan>> {
        let data = self.data.read().map_err(|e| {
            LedgerError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        Ok(sorted(data.values().cloned().collect()))
    }

    /// Get plans that have not been archived
    pub fn get_visible(&self) -> LedgerResult<Vec<Plan>> {
        Ok(self
            .get_all()?
            .into_iter()
            .filter(|p| !p.archived)
            .collect())
    }

    /// Find a plan by name (case-insensitive), ignoring archived plans
    pub fn get_by_name(&self, name: &str) -> LedgerResult<Option<Plan>> {
        let data = self.data.read().map_err(|e| {
            LedgerError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;

        let name_lower = name.trim().to_lowercase();
        Ok(data
            .values()
            .find(|p| !p.archived && p.name.to_lowercase() == name_lower)
            .cloned())
    }

    /// Insert or update a plan in memory
    pub fn upsert(&self, plan: Plan) -> LedgerResult<()> {
        let mut data = self.data.write().map_err(|e| {
            LedgerError::Storage(format!("Failed to acquire write lock: {}", e))
        })?;

        data.insert(plan.id, plan);
        Ok(())
    }

    /// Replace a plan and persist; the previous version is restored if the
    /// write fails
    pub fn commit(&self, plan: Plan) -> LedgerResult<()> {
        let previous = self.get(plan.id)?;
        let id = plan.id;
        self.upsert(plan)?;

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

    /// Insert a new plan and persist it, unless a visible plan already has
    /// its name. Returns false on a name clash; the check and the insert
    /// happen under one write lock.
    pub fn commit_new(&self, plan: Plan) -> LedgerResult<bool> {
        let id = plan.id;
        {
            let mut data = self.data.write().map_err(|e| {
                LedgerError::Storage(format!("Failed to acquire write lock: {}", e))
            })?;

            let name_lower = plan.name.trim().to_lowercase();
            if data
                .values()
                .any(|p| !p.archived && p.name.to_lowercase() == name_lower)
            {
                return Ok(false);
            }
            data.insert(id, plan);
        }

        if let Err(e) = self.save() {
            let mut data = self.data.write().map_err(|e| {
                LedgerError::Storage(format!("Failed to acquire write lock: {}", e))
            })?;
            data.remove(&id);
            return Err(e);
        }
        Ok(true)
    }

    /// Count plans
    pub fn count(&self) -> LedgerResult<usize> {
        let data = self.data.read().map_err(|e| {
            LedgerError::Storage(format!("Failed to acquire read lock: {}", e))
        })?;
        Ok(data.len())
    }
}

fn sorted(mut plans: Vec<Plan>) -> Vec<Plan> {
    plans.sort_by(|a, b| {
        a.name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then(a.id.cmp(&b.id))
    });
    plans
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Frequency, Money};
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn create_test_repo() -> (TempDir, PlanRepository) {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("plans.json");
        let repo = PlanRepository::new(path);
        (temp_dir, repo)
    }

    fn plan(name: &str) -> Plan {
        Plan::new(
            name,
            Money::from_units(500),
            Money::from_units(50),
            Frequency::Weekly,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        )
    }

    #[test]
    fn test_empty_load() {
        let (_temp_dir, repo) = create_test_repo();
        repo.load().unwrap();
        assert_eq!(repo.count().unwrap(), 0);
    }

    #[test]
    fn test_commit_and_reload() {
        let (temp_dir, repo) = create_test_repo();
        let plan = plan("Vacation");
        let id = plan.id;
        repo.commit(plan).unwrap();

        let repo2 = PlanRepository::new(temp_dir.path().join("plans.json"));
        repo2.load().unwrap();
        assert_eq!(repo2.get(id).unwrap().unwrap().name, "Vacation");
    }

    #[test]
    fn test_failed_commit_restores_previous() {
        let temp_dir = TempDir::new().unwrap();
        let blocker = temp_dir.path().join("blocker");
        std::fs::write(&blocker, "x").unwrap();
        let repo = PlanRepository::new(blocker.join("plans.json"));

        let mut original = plan("Car");
        let id = original.id;
        repo.upsert(original.clone()).unwrap();

        original.current_amount = Money::from_units(100);
        assert!(repo.commit(original).is_err());
        assert_eq!(repo.get(id).unwrap().unwrap().current_amount, Money::zero());

        assert!(repo.commit(plan("New")).is_err());
        assert_eq!(repo.count().unwrap(), 1);
    }

    #[test]
    fn test_get_all_sorted_and_visible() {
        let (_temp_dir, repo) = create_test_repo();
        repo.upsert(plan("zebra")).unwrap();
        let mut archived = plan("Attic");
        archived.archive();
        repo.upsert(archived).unwrap();
        repo.upsert(plan("Bike")).unwrap();

        let names: Vec<_> = repo.get_all().unwrap().into_iter().map(|p| p.name).collect();
        assert_eq!(names, vec!["Attic", "Bike", "zebra"]);
        assert_eq!(repo.get_visible().unwrap().len(), 2);
        assert!(repo.get_by_name("attic").unwrap().is_none());
        assert!(repo.get_by_name("BIKE").unwrap().is_some());
    }

    #[test]
    fn test_commit_new_refuses_visible_name() {
        let (_temp_dir, repo) = create_test_repo();
        assert!(repo.commit_new(plan("Bike")).unwrap());
        assert!(!repo.commit_new(plan("bike")).unwrap());
        assert_eq!(repo.count().unwrap(), 1);

        let mut archived = plan("Attic");
        archived.archive();
        repo.upsert(archived).unwrap();
        assert!(repo.commit_new(plan("Attic")).unwrap());
        assert_eq!(repo.count().unwrap(), 3);
    }
}
