//! Task completion per report bucket

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{DateRange, Granularity, Task, TaskState};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskCounts {
    pub completed: usize,
    pub pending: usize,
    pub overdue: usize,
}

impl TaskCounts {
    fn record(&mut self, state: TaskState) {
        match state {
            TaskState::Completed => self.completed += 1,
            TaskState::Pending => self.pending += 1,
            TaskState::Overdue => self.overdue += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.completed + self.pending + self.overdue
    }

    /// Completed share in percent, 0 when there are no tasks
    pub fn completion_rate(&self) -> f64 {
        match self.total() {
            0 => 0.0,
            total => self.completed as f64 / total as f64 * 100.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskBucket {
    pub label: String,
    pub start: NaiveDate,
    pub end: NaiveDate,
    #[serde(flatten)]
    pub counts: TaskCounts,
    pub completion_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskCompletionReport {
    pub granularity: Granularity,
    pub buckets: Vec<TaskBucket>,
    #[serde(flatten)]
    pub totals: TaskCounts,
    pub completion_rate: f64,
}

impl TaskCompletionReport {
    /// Place each task by due date (creation date when undated) and count its
    /// state as of `today`.
    pub fn generate(
        tasks: &[Task],
        range: DateRange,
        granularity: Granularity,
        today: NaiveDate,
    ) -> Self {
        let mut totals = TaskCounts::default();
        let buckets = range
            .buckets(granularity)
            .into_iter()
            .map(|bucket| {
                let mut counts = TaskCounts::default();
                for task in tasks.iter().filter(|t| bucket.contains(t.reference_date())) {
                    counts.record(task.state_on(today));
                }
                totals.completed += counts.completed;
                totals.pending += counts.pending;
                totals.overdue += counts.overdue;
                TaskBucket {
                    label: bucket.label(granularity),
                    start: bucket.start,
                    end: bucket.end,
                    completion_rate: counts.completion_rate(),
                    counts,
                }
            })
            .collect();

        Self {
            granularity,
            buckets,
            completion_rate: totals.completion_rate(),
            totals,
        }
    }
}
