//! Task display formatting

use crate::models::{Task, TaskState};

use super::truncate;

pub fn format_task_list(tasks: &[(Task, TaskState)]) -> String {
    if tasks.is_empty() {
        return "No tasks found.\n".to_string();
    }

    let mut output = String::new();
    output.push_str(&format!("{:<12} {:<36} {:<10} {}\n", "ID", "Title", "Due", "State"));
    output.push_str(&"-".repeat(70));
    output.push('\n');

    for (task, state) in tasks {
        let due = task
            .due_date
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".to_string());
        let state = match state {
            TaskState::Pending => "pending",
            TaskState::Completed => "completed",
            TaskState::Overdue => "OVERDUE",
        };
        output.push_str(&format!(
            "{:<12} {:<36} {:<10} {}\n",
            task.id.short(),
            truncate(&task.title, 36),
            due,
            state
        ));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_list() {
        assert_eq!(format_task_list(&[]), "No tasks found.\n");
        let task = Task::new("Move money", None);
        let text = format_task_list(&[(task, TaskState::Overdue)]);
        assert!(text.contains("Move money"));
        assert!(text.contains("OVERDUE"));
    }
}
