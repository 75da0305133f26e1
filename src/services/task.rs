//! Task service

use chrono::NaiveDate;

use crate::audit::EntityType;
use crate::error::{LedgerError, LedgerResult};
use crate::models::{Task, TaskId, TaskState};

use super::locks::LockKey;
use super::LedgerContext;

pub struct TaskService<'a> {
    ctx: &'a LedgerContext,
}

impl<'a> TaskService<'a> {
    pub fn new(ctx: &'a LedgerContext) -> Self {
        Self { ctx }
    }

    pub fn create(&self, title: &str, due_date: Option<NaiveDate>) -> LedgerResult<Task> {
        let title = title.trim();
        if title.is_empty() {
            return Err(LedgerError::Validation("Task title cannot be empty".into()));
        }

        let task = Task::new(title, due_date);
        {
            let _gate = self.ctx.storage.begin_write()?;
            self.ctx.storage.tasks.commit(task.clone())?;
        }

        self.ctx.storage.log_create(
            EntityType::Task,
            task.id.to_string(),
            Some(task.title.clone()),
            &task,
        );
        Ok(task)
    }

    /// Mark a task completed. Completing it again is a no-op.
    pub fn complete(&self, id: TaskId) -> LedgerResult<Task> {
        let _lock = self.ctx.locks().acquire(LockKey::Task(id))?;
        let _gate = self.ctx.storage.begin_write()?;

        let mut task = self
            .ctx
            .storage
            .tasks
            .get(id)?
            .ok_or_else(|| LedgerError::task_not_found(id.to_string()))?;
        if task.completed_at.is_some() {
            return Ok(task);
        }

        let before = task.clone();
        task.complete();
        self.ctx.storage.tasks.commit(task.clone())?;

        self.ctx.storage.log_update(
            EntityType::Task,
            task.id.to_string(),
            Some(task.title.clone()),
            &before,
            &task,
        );
        Ok(task)
    }

    /// Tasks with their state as of today, optionally only those in `state`
    pub fn list(&self, state: Option<TaskState>) -> LedgerResult<Vec<(Task, TaskState)>> {
        let today = self.ctx.today();
        Ok(self
            .ctx
            .storage
            .tasks
            .get_all()?
            .into_iter()
            .map(|task| {
                let current = task.state_on(today);
                (task, current)
            })
            .filter(|(_, current)| state.map_or(true, |wanted| *current == wanted))
            .collect())
    }

    /// Find a task by full ID or unique short prefix
    pub fn find(&self, identifier: &str) -> LedgerResult<Option<Task>> {
        if let Ok(id) = identifier.parse::<TaskId>() {
            return self.ctx.storage.tasks.get(id);
        }
        let needle = identifier.trim().to_lowercase();
        let prefix = needle.strip_prefix("tsk-").unwrap_or(&needle);
        if prefix.len() < 4 {
            return Ok(None);
        }
        let mut matches = self
            .ctx
            .storage
            .tasks
            .get_all()?
            .into_iter()
            .filter(|t| t.id.to_string().starts_with(prefix));
        match (matches.next(), matches.next()) {
            (Some(task), None) => Ok(Some(task)),
            _ => Ok(None),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::testing::{context, date};

    #[test]
    fn test_create_complete_list() {
        let (_temp, ctx, _sink) = context(date(2024, 6, 10));
        let service = TaskService::new(&ctx);

        let overdue = service.create("Call bank", Some(date(2024, 6, 1))).unwrap();
        let pending = service.create("Review plan", Some(date(2024, 6, 20))).unwrap();
        let done = service.create("Open account", None).unwrap();
        service.complete(done.id).unwrap();
        let again = service.complete(done.id).unwrap();
        assert!(again.completed_at.is_some());

        let all = service.list(None).unwrap();
        assert_eq!(all.len(), 3);

        let late = service.list(Some(TaskState::Overdue)).unwrap();
        assert_eq!(late.len(), 1);
        assert_eq!(late[0].0.id, overdue.id);

        let open = service.list(Some(TaskState::Pending)).unwrap();
        assert_eq!(open[0].0.id, pending.id);

        let short = done.id.short();
        assert_eq!(service.find(&short).unwrap().unwrap().id, done.id);
    }

    #[test]
    fn test_validation_and_missing() {
        let (_temp, ctx, _sink) = context(date(2024, 6, 10));
        let service = TaskService::new(&ctx);
        assert!(service.create("   ", None).unwrap_err().is_validation());
        assert!(service.complete(TaskId::new()).unwrap_err().is_not_found());
    }
}
