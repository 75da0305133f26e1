//! Reports module for the savings ledger
//!
//! `ReportAggregator` builds a `ReportData` document for a period from one
//! consistent storage snapshot. Aggregation never writes, so cancelling it
//! part way leaves nothing behind.

pub mod breakdown;
pub mod financial;
pub mod recommendations;
pub mod tasks;
pub mod trend;

pub use breakdown::{category_breakdown, largest_remainder, CategoryShare};
pub use financial::{FinancialSummary, MonthDelta};
pub use recommendations::{recommend, Thresholds};
pub use tasks::{TaskBucket, TaskCompletionReport, TaskCounts};
pub use trend::{savings_trend, SavingsTrend, TrendKind, TrendPoint};

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, LedgerResult};
use crate::models::{DateRange, Money, PlanId, ReportPeriod};
use crate::services::progress::{goal_progress, plan_performance};
use crate::services::{GoalProgressReport, LedgerContext, PlanPerformanceReport};

/// Which sections a report carries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportType {
    #[default]
    All,
    Financial,
    Goals,
    Plans,
    Tasks,
}

impl ReportType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Financial => "financial",
            Self::Goals => "goals",
            Self::Plans => "plans",
            Self::Tasks => "tasks",
        }
    }

    fn includes(&self, section: ReportType) -> bool {
        *self == Self::All || *self == section
    }
}

impl fmt::Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ReportType {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" => Ok(Self::All),
            "financial" => Ok(Self::Financial),
            "goals" => Ok(Self::Goals),
            "plans" => Ok(Self::Plans),
            "tasks" => Ok(Self::Tasks),
            other => Err(LedgerError::Validation(format!(
                "Unknown report type '{}'. Expected all, financial, goals, plans or tasks",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportRequest {
    pub period: ReportPeriod,
    pub report_type: ReportType,
    /// Required for `ReportPeriod::Custom`
    pub custom_range: Option<DateRange>,
}

impl ReportRequest {
    pub fn new(period: ReportPeriod, report_type: ReportType) -> Self {
        Self {
            period,
            report_type,
            custom_range: None,
        }
    }

    pub fn custom(range: DateRange, report_type: ReportType) -> Self {
        Self {
            period: ReportPeriod::Custom,
            report_type,
            custom_range: Some(range),
        }
    }
}

/// Cooperative cancellation flag shared with the caller
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn check(&self) -> LedgerResult<()> {
        if self.is_cancelled() {
            Err(LedgerError::Cancelled)
        } else {
            Ok(())
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportData {
    pub period: ReportPeriod,
    pub report_type: ReportType,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub generated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub savings_trend: Option<SavingsTrend>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category_breakdown: Option<Vec<CategoryShare>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub financial_summary: Option<FinancialSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task_completion: Option<TaskCompletionReport>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan_performance: Option<Vec<PlanPerformanceReport>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goal_progress: Option<Vec<GoalProgressReport>>,
    pub recommendations: Vec<String>,
}

/// Builds reports from a storage snapshot
pub struct ReportAggregator<'a> {
    ctx: &'a LedgerContext,
}

impl<'a> ReportAggregator<'a> {
    pub fn new(ctx: &'a LedgerContext) -> Self {
        Self { ctx }
    }

    pub fn generate(
        &self,
        request: &ReportRequest,
        cancel: &CancellationToken,
    ) -> LedgerResult<ReportData> {
        cancel.check()?;
        let today = self.ctx.today();
        let range = request
            .period
            .resolve(today, request.custom_range)
            .map_err(|e| LedgerError::InvalidDate(e.to_string()))?;

        let snapshot = self.ctx.storage.snapshot()?;
        cancel.check()?;

        // Archived plans drop out of every section
        let plans: Vec<_> = snapshot.plans.iter().filter(|p| !p.archived).cloned().collect();
        let visible: HashSet<PlanId> = plans.iter().map(|p| p.id).collect();
        let ledger: Vec<_> = snapshot
            .transactions
            .iter()
            .filter(|t| visible.contains(&t.plan_id))
            .cloned()
            .collect();

        let wants = |section| request.report_type.includes(section);
        let mut report = ReportData {
            period: request.period,
            report_type: request.report_type,
            start_date: range.start,
            end_date: range.end,
            generated_at: snapshot.taken_at,
            savings_trend: None,
            category_breakdown: None,
            financial_summary: None,
            task_completion: None,
            plan_performance: None,
            goal_progress: None,
            recommendations: Vec::new(),
        };

        if wants(ReportType::Financial) {
            report.savings_trend = Some(savings_trend(&ledger, range));
            cancel.check()?;
            report.category_breakdown = Some(category_breakdown(&plans, &ledger, range));
            cancel.check()?;
            report.financial_summary = Some(FinancialSummary::generate(&ledger, range));
            cancel.check()?;
        }

        let tolerance = self.ctx.settings.progress_tolerance;
        if wants(ReportType::Plans) {
            let mut rows = Vec::with_capacity(plans.len());
            for plan in &plans {
                cancel.check()?;
                let entries = ledger.iter().filter(|t| t.plan_id == plan.id);
                rows.push(plan_performance(plan, entries, today, tolerance));
            }
            report.plan_performance = Some(rows);
        }

        if wants(ReportType::Goals) {
            cancel.check()?;
            report.goal_progress = Some(
                snapshot
                    .goals
                    .iter()
                    .map(|goal| goal_progress(goal, today, tolerance))
                    .collect(),
            );
        }

        if wants(ReportType::Tasks) {
            cancel.check()?;
            let granularity = request.period.default_granularity(&range);
            report.task_completion = Some(TaskCompletionReport::generate(
                &snapshot.tasks,
                range,
                granularity,
                today,
            ));
        }

        cancel.check()?;
        report.recommendations = recommend(
            report.plan_performance.as_deref().unwrap_or(&[]),
            report.goal_progress.as_deref().unwrap_or(&[]),
            report.task_completion.as_ref(),
            Thresholds {
                deadline_warning_days: self.ctx.settings.deadline_warning_days,
                task_completion_warning: self.ctx.settings.task_completion_warning,
            },
        );

        tracing::debug!(
            period = %request.period,
            report_type = %request.report_type,
            start = %range.start,
            end = %range.end,
            recommendations = report.recommendations.len(),
            "report generated"
        );
        Ok(report)
    }
}

impl ReportData {
    /// Format the report for terminal display
    pub fn format_terminal(&self, currency: &str) -> String {
        let money = |m: Money| m.format_with_symbol(currency);
        let mut output = String::new();

        output.push_str(&format!(
            "Savings Report ({}, {}): {} to {}\n",
            self.period, self.report_type, self.start_date, self.end_date
        ));
        output.push_str(&"=".repeat(72));
        output.push('\n');

        if let Some(summary) = &self.financial_summary {
            output.push_str(&format!("Total Saved:       {:>14}\n", money(summary.total_saved)));
            output.push_str(&format!("Total Withdrawn:   {:>14}\n", money(summary.total_withdrawn)));
            output.push_str(&format!("Net Savings:       {:>14}\n", money(summary.net_savings)));
            output.push_str(&format!(
                "Monthly Average:   {:>14}\n",
                money(summary.average_monthly_savings)
            ));
            if let (Some(best), Some(worst)) = (&summary.best_month, &summary.worst_month) {
                output.push_str(&format!(
                    "Best Month:        {} ({})\nWorst Month:       {} ({})\n",
                    best.month,
                    money(best.net),
                    worst.month,
                    money(worst.net)
                ));
            }
            if summary.missed_count > 0 {
                output.push_str(&format!(
                    "Missed:            {} ({})\n",
                    summary.missed_count,
                    money(summary.missed_amount)
                ));
            }
        }

        if let Some(breakdown) = self.category_breakdown.as_ref().filter(|b| !b.is_empty()) {
            output.push_str(&format!("\n{:<40} {:>14} {:>6}\n", "Plan", "Deposits", "%"));
            output.push_str(&"-".repeat(72));
            output.push('\n');
            for row in breakdown {
                output.push_str(&format!(
                    "{:<40} {:>14} {:>5}%\n",
                    row.plan_name,
                    money(row.deposits),
                    row.percentage
                ));
            }
        }

        if let Some(plans) = self.plan_performance.as_ref().filter(|p| !p.is_empty()) {
            output.push_str(&format!(
                "\n{:<30} {:>9} {:>9} {:>10}\n",
                "Plan", "Progress", "Expected", "Status"
            ));
            output.push_str(&"-".repeat(72));
            output.push('\n');
            for plan in plans {
                output.push_str(&format!(
                    "{:<30} {:>8.1}% {:>8.1}% {:>10}\n",
                    plan.name, plan.progress, plan.expected_progress, plan.status.as_str()
                ));
            }
        }

        if let Some(goals) = self.goal_progress.as_ref().filter(|g| !g.is_empty()) {
            output.push_str(&format!(
                "\n{:<30} {:>9} {:>9} {:>10}\n",
                "Goal", "Progress", "Expected", "Status"
            ));
            output.push_str(&"-".repeat(72));
            output.push('\n');
            for goal in goals {
                output.push_str(&format!(
                    "{:<30} {:>8.1}% {:>8.1}% {:>10}\n",
                    goal.name, goal.progress, goal.expected_progress, goal.status.as_str()
                ));
            }
        }

        if let Some(tasks) = &self.task_completion {
            output.push_str(&format!(
                "\n{:<16} {:>9} {:>9} {:>9} {:>8}\n",
                "Tasks", "Done", "Pending", "Overdue", "Rate"
            ));
            output.push_str(&"-".repeat(72));
            output.push('\n');
            for bucket in &tasks.buckets {
                output.push_str(&format!(
                    "{:<16} {:>9} {:>9} {:>9} {:>7.1}%\n",
                    bucket.label,
                    bucket.counts.completed,
                    bucket.counts.pending,
                    bucket.counts.overdue,
                    bucket.completion_rate
                ));
            }
        }

        if !self.recommendations.is_empty() {
            output.push_str("\nRecommendations:\n");
            for line in &self.recommendations {
                output.push_str(&format!("  - {}\n", line));
            }
        }

        output
    }
}
