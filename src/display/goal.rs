//! Goal display formatting

use crate::models::Goal;
use crate::services::GoalProgressReport;

use super::{progress_bar, truncate};

/// Format goals as a table, in the order given
pub fn format_goal_list(goals: &[Goal]) -> String {
    if goals.is_empty() {
        return "No goals found.\n".to_string();
    }

    let mut output = String::new();
    output.push_str(&format!(
        "{:<12} {:<24} {:>3} {:>12} {:>12} {:<10}\n",
        "ID", "Name", "P", "Saved", "Target", "Deadline"
    ));
    output.push_str(&"-".repeat(78));
    output.push('\n');

    for goal in goals {
        let deadline = goal
            .deadline
            .map(|d| d.to_string())
            .unwrap_or_else(|| "-".to_string());
        let marker = if goal.is_completed { " *" } else { "" };
        output.push_str(&format!(
            "{:<12} {:<24} {:>3} {:>12} {:>12} {:<10}{}\n",
            goal.id.short(),
            truncate(&goal.name, 24),
            goal.priority,
            goal.current_amount.to_string(),
            goal.target_amount.to_string(),
            deadline,
            marker
        ));
    }

    output
}

/// Format one goal with its progress
pub fn format_goal_details(goal: &Goal, progress: &GoalProgressReport) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "Goal: {} {} {:.1}%\n",
        goal.name,
        progress_bar(progress.progress, 30),
        progress.progress
    ));
    output.push_str(&format!("  ID:        {}\n", goal.id));
    output.push_str(&format!("  Saved:     {} of {}\n", goal.current_amount, goal.target_amount));
    output.push_str(&format!("  Priority:  {}\n", goal.priority));
    output.push_str(&format!("  Status:    {}\n", progress.status));
    if let Some(deadline) = goal.deadline {
        output.push_str(&format!(
            "  Deadline:  {} ({} days)\n",
            deadline,
            progress.days_remaining.unwrap_or_default()
        ));
        output.push_str(&format!("  Expected:  {:.1}%\n", progress.expected_progress));
    }
    output.push_str(&format!("  Per month: {}\n", progress.monthly_contribution));
    if let Some(date) = progress.projected_completion_date {
        output.push_str(&format!("  Projected: {}\n", date));
    }

    output
}
