//! Display formatting for terminal output
//!
//! Plain-text tables and detail views for plans, goals, ledger entries and
//! tasks. Reports format themselves.

pub mod goal;
pub mod plan;
pub mod task;
pub mod transaction;

pub use goal::{format_goal_details, format_goal_list};
pub use plan::{format_plan_details, format_plan_list, format_plan_progress};
pub use task::format_task_list;
pub use transaction::{format_transaction_details, format_transaction_register};

/// Cut `s` to at most `max` characters, marking the cut with "..."
pub(crate) fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// Text progress bar, `width` cells wide
pub(crate) fn progress_bar(percent: f64, width: usize) -> String {
    let filled = ((percent.clamp(0.0, 100.0) / 100.0) * width as f64).round() as usize;
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a much longer name", 10), "a much ...");
        assert_eq!(truncate("ééééééé", 5), "éé...");
    }

    #[test]
    fn test_progress_bar() {
        assert_eq!(progress_bar(50.0, 10), "[#####-----]");
        assert_eq!(progress_bar(150.0, 4), "[####]");
        assert_eq!(progress_bar(-3.0, 4), "[----]");
    }
}
