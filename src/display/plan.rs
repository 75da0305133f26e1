//! Plan display formatting

use crate::models::Plan;
use crate::services::PlanPerformanceReport;

use super::{progress_bar, truncate};

/// Format plans as a table
pub fn format_plan_list(plans: &[Plan]) -> String {
    if plans.is_empty() {
        return "No plans found.\n".to_string();
    }

    let mut output = String::new();
    output.push_str(&format!(
        "{:<12} {:<24} {:>12} {:>12} {:<10} {}\n",
        "ID", "Name", "Saved", "Target", "Every", "State"
    ));
    output.push_str(&"-".repeat(84));
    output.push('\n');

    for plan in plans {
        let state = if plan.archived {
            "archived"
        } else if plan.is_completed {
            "completed"
        } else {
            "active"
        };
        output.push_str(&format!(
            "{:<12} {:<24} {:>12} {:>12} {:<10} {}\n",
            plan.id.short(),
            truncate(&plan.name, 24),
            plan.current_amount.to_string(),
            plan.target_amount.to_string(),
            truncate(&plan.frequency.description(), 10),
            state
        ));
    }

    output
}

/// Format a single plan for display
pub fn format_plan_details(plan: &Plan) -> String {
    let mut output = String::new();

    output.push_str(&format!("Plan: {}\n", plan.name));
    output.push_str(&format!("  ID:           {}\n", plan.id));
    output.push_str(&format!("  Saved:        {}\n", plan.current_amount));
    output.push_str(&format!("  Target:       {}\n", plan.target_amount));
    output.push_str(&format!(
        "  Contribution: {} {}\n",
        plan.amount_per_period,
        plan.frequency.description()
    ));
    output.push_str(&format!("  Start:        {}\n", plan.start_date));
    if let Some(end) = plan.end_date {
        output.push_str(&format!("  End:          {}\n", end));
    }
    if let Some(at) = plan.completed_at {
        output.push_str(&format!("  Completed:    {}\n", at.format("%Y-%m-%d")));
    }
    if plan.archived {
        output.push_str("  Archived:     yes\n");
    }

    output
}

/// Format a plan's progress classification
pub fn format_plan_progress(report: &PlanPerformanceReport) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "{} {} {:.1}%\n",
        report.name,
        progress_bar(report.progress, 30),
        report.progress
    ));
    output.push_str(&format!("  Status:        {}\n", report.status));
    output.push_str(&format!(
        "  Expected:      {:.1}% (variance {:+.1})\n",
        report.expected_progress, report.variance
    ));
    output.push_str(&format!("  Last 30 days:  {}\n", report.monthly_contribution));
    match report.projected_completion_date {
        Some(date) => output.push_str(&format!("  Projected:     {}\n", date)),
        None => output.push_str("  Projected:     no recent contributions\n"),
    }
    if let Some(days) = report.days_remaining {
        output.push_str(&format!("  Days left:     {}\n", days));
    }
    if report.missed_count > 0 {
        output.push_str(&format!("  Missed:        {}\n", report.missed_count));
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Frequency, Money};
    use crate::services::progress::plan_performance;
    use chrono::NaiveDate;

    fn plan() -> Plan {
        Plan::new(
            "Holiday",
            Money::from_units(1000),
            Money::from_units(100),
            Frequency::Monthly,
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
        )
    }

    #[test]
    fn test_empty_list() {
        assert_eq!(format_plan_list(&[]), "No plans found.\n");
    }

    #[test]
    fn test_list_and_details() {
        let plan = plan();
        let list = format_plan_list(&[plan.clone()]);
        assert!(list.contains("Holiday"));
        assert!(list.contains(&plan.id.short()));
        assert!(list.contains("active"));

        let details = format_plan_details(&plan);
        assert!(details.contains("Target:       $1000.00"));
    }

    #[test]
    fn test_progress_view() {
        let report = plan_performance(&plan(), &[], NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(), 5.0);
        let text = format_plan_progress(&report);
        assert!(text.contains("Status:        behind"));
        assert!(text.contains("no recent contributions"));
    }
}
