//! Task snapshot model
//!
//! Tasks are tracked only so reports can show completion rates next to the
//! savings figures.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::TaskId;

/// Stored status of a task. Overdue is derived, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    #[default]
    Pending,
    Completed,
}

/// Status of a task as of a given day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskState {
    Pending,
    Completed,
    Overdue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub id: TaskId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl Task {
    pub fn new(title: impl Into<String>, due_date: Option<NaiveDate>) -> Self {
        Self {
            id: TaskId::new(),
            title: title.into(),
            due_date,
            status: TaskStatus::Pending,
            completed_at: None,
            created_at: Utc::now(),
        }
    }

    pub fn complete(&mut self) {
        if self.status != TaskStatus::Completed {
            self.status = TaskStatus::Completed;
            self.completed_at = Some(Utc::now());
        }
    }

    pub fn state_on(&self, today: NaiveDate) -> TaskState {
        match self.status {
            TaskStatus::Completed => TaskState::Completed,
            TaskStatus::Pending => match self.due_date {
                Some(due) if due < today => TaskState::Overdue,
                _ => TaskState::Pending,
            },
        }
    }

    /// Day used to place the task in a report bucket
    pub fn reference_date(&self) -> NaiveDate {
        self.due_date.unwrap_or_else(|| self.created_at.date_naive())
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.due_date {
            Some(due) => write!(f, "{} (due {})", self.title, due),
            None => write!(f, "{}", self.title),
        }
    }
}
