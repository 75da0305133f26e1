//! Recommendations
//!
//! Fixed rules over classifier output. Plans are visited before goals, each
//! sorted by name and then id, so the same input always gives the same text
//! in the same order.

use crate::services::{GoalProgressReport, PlanPerformanceReport, ProgressStatus};

use super::tasks::TaskCompletionReport;

/// Thresholds that trigger a recommendation
#[derive(Debug, Clone, Copy)]
pub struct Thresholds {
    pub deadline_warning_days: i64,
    pub task_completion_warning: f64,
}

pub fn recommend(
    plans: &[PlanPerformanceReport],
    goals: &[GoalProgressReport],
    tasks: Option<&TaskCompletionReport>,
    thresholds: Thresholds,
) -> Vec<String> {
    let mut out = Vec::new();

    let mut plans: Vec<&PlanPerformanceReport> = plans.iter().collect();
    plans.sort_by(|a, b| a.name.cmp(&b.name).then(a.plan_id.cmp(&b.plan_id)));
    for plan in plans {
        match plan.status {
            ProgressStatus::Behind => out.push(format!(
                "Plan '{}' is behind schedule by {:.0}%",
                plan.name, -plan.variance
            )),
            ProgressStatus::Overdue => out.push(format!(
                "Plan '{}' passed its end date at {:.0}% progress",
                plan.name, plan.progress
            )),
            ProgressStatus::OnTrack | ProgressStatus::Completed => {}
        }
        if plan.status != ProgressStatus::Completed && plan.missed_count > 0 {
            out.push(format!(
                "Plan '{}' has {} missed contribution(s)",
                plan.name, plan.missed_count
            ));
        }
    }

    let mut goals: Vec<&GoalProgressReport> = goals.iter().collect();
    goals.sort_by(|a, b| a.name.cmp(&b.name).then(a.goal_id.cmp(&b.goal_id)));
    for goal in goals {
        match goal.status {
            ProgressStatus::Completed => continue,
            ProgressStatus::Overdue => {
                out.push(format!(
                    "Goal '{}' passed its deadline at {:.0}% progress",
                    goal.name, goal.progress
                ));
                continue;
            }
            ProgressStatus::Behind => out.push(format!(
                "Goal '{}' is behind schedule by {:.0}%",
                goal.name, -goal.variance
            )),
            ProgressStatus::OnTrack => {}
        }
        if let Some(days) = goal.days_remaining {
            if (0..=thresholds.deadline_warning_days).contains(&days) {
                out.push(format!(
                    "Goal '{}' deadline is in {} days at {:.0}% progress",
                    goal.name, days, goal.progress
                ));
            }
        }
    }

    if let Some(tasks) = tasks {
        if tasks.totals.total() > 0 && tasks.completion_rate < thresholds.task_completion_warning {
            out.push(format!(
                "Task completion rate is {:.0}%, below the {:.0}% target",
                tasks.completion_rate, thresholds.task_completion_warning
            ));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DateRange, GoalId, Granularity, Money, PlanId, Task};
    use chrono::NaiveDate;

    const THRESHOLDS: Thresholds = Thresholds {
        deadline_warning_days: 7,
        task_completion_warning: 50.0,
    };

    fn plan(name: &str, status: ProgressStatus, variance: f64) -> PlanPerformanceReport {
        PlanPerformanceReport {
            plan_id: PlanId::new(),
            name: name.to_string(),
            current_amount: Money::zero(),
            target_amount: Money::from_units(100),
            progress: 20.0,
            expected_progress: 20.0 - variance,
            variance,
            status,
            monthly_contribution: Money::zero(),
            projected_completion_date: None,
            days_remaining: None,
            missed_count: 0,
        }
    }

    fn goal(name: &str, status: ProgressStatus, days: Option<i64>) -> GoalProgressReport {
        GoalProgressReport {
            goal_id: GoalId::new(),
            name: name.to_string(),
            priority: 3,
            current_amount: Money::from_units(40),
            target_amount: Money::from_units(100),
            progress: 40.0,
            expected_progress: 40.0,
            variance: 0.0,
            status,
            monthly_contribution: Money::zero(),
            projected_completion_date: None,
            days_remaining: days,
        }
    }

    #[test]
    fn test_rules_are_deterministic() {
        let plans = vec![
            plan("Zeta", ProgressStatus::Behind, -12.4),
            plan("Alpha", ProgressStatus::Behind, -30.0),
            plan("Done", ProgressStatus::Completed, 0.0),
        ];
        let goals = vec![
            goal("Trip", ProgressStatus::OnTrack, Some(7)),
            goal("Car", ProgressStatus::OnTrack, Some(30)),
        ];

        let first = recommend(&plans, &goals, None, THRESHOLDS);
        let mut reversed = plans.clone();
        reversed.reverse();
        let second = recommend(&reversed, &goals, None, THRESHOLDS);
        assert_eq!(first, second);
        assert_eq!(
            first,
            vec![
                "Plan 'Alpha' is behind schedule by 30%".to_string(),
                "Plan 'Zeta' is behind schedule by 12%".to_string(),
                "Goal 'Trip' deadline is in 7 days at 40% progress".to_string(),
            ]
        );
    }

    #[test]
    fn test_task_rate_warning() {
        let today = NaiveDate::from_ymd_opt(2024, 4, 10).unwrap();
        let tasks = vec![Task::new("Late", Some(NaiveDate::from_ymd_opt(2024, 4, 2).unwrap()))];
        let range = DateRange::new(NaiveDate::from_ymd_opt(2024, 4, 1).unwrap(), today).unwrap();
        let report = TaskCompletionReport::generate(&tasks, range, Granularity::Week, today);

        let out = recommend(&[], &[], Some(&report), THRESHOLDS);
        assert_eq!(out, vec!["Task completion rate is 0%, below the 50% target".to_string()]);
    }
}
