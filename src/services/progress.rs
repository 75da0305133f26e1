//! Progress classification for plans and goals
//!
//! Reports are derived on every request and never stored. The functions here
//! are the single place progress, expected progress, monthly contribution and
//! projected completion are computed; reports reuse them.

use chrono::{Datelike, Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::error::{LedgerError, LedgerResult};
use crate::models::{DateRange, Goal, GoalId, Money, Plan, PlanId, Transaction, TransactionType};

use super::LedgerContext;

/// Window used for a plan's monthly contribution
pub const CONTRIBUTION_WINDOW_DAYS: i64 = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    OnTrack,
    Behind,
    Completed,
    Overdue,
}

impl ProgressStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OnTrack => "on_track",
            Self::Behind => "behind",
            Self::Completed => "completed",
            Self::Overdue => "overdue",
        }
    }
}

impl std::fmt::Display for ProgressStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanPerformanceReport {
    pub plan_id: PlanId,
    pub name: String,
    pub current_amount: Money,
    pub target_amount: Money,
    pub progress: f64,
    pub expected_progress: f64,
    /// `progress - expected_progress`, in percentage points
    pub variance: f64,
    pub status: ProgressStatus,
    pub monthly_contribution: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub projected_completion_date: Option<NaiveDate>,
    /// Days until the end date; negative once it has passed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_remaining: Option<i64>,
    pub missed_count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GoalProgressReport {
    pub goal_id: GoalId,
    pub name: String,
    pub priority: u8,
    pub current_amount: Money,
    pub target_amount: Money,
    pub progress: f64,
    pub expected_progress: f64,
    pub variance: f64,
    pub status: ProgressStatus,
    pub monthly_contribution: Money,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub projected_completion_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub days_remaining: Option<i64>,
}

/// Share of the `start..deadline` span that has passed by `today`, in [0, 1]
pub fn elapsed_fraction(start: NaiveDate, deadline: NaiveDate, today: NaiveDate) -> f64 {
    let total = (deadline - start).num_days();
    if total <= 0 {
        return 1.0;
    }
    let elapsed = (today - start).num_days() as f64 / total as f64;
    elapsed.clamp(0.0, 1.0)
}

/// Status from completion, deadline and progress against expectation
pub fn classify(
    is_completed: bool,
    deadline: Option<NaiveDate>,
    today: NaiveDate,
    progress: f64,
    expected: f64,
    tolerance: f64,
) -> ProgressStatus {
    if is_completed {
        return ProgressStatus::Completed;
    }
    if deadline.is_some_and(|d| d < today) {
        return ProgressStatus::Overdue;
    }
    if progress >= expected - tolerance {
        ProgressStatus::OnTrack
    } else {
        ProgressStatus::Behind
    }
}

/// `today + ceil(remaining / daily)`, where daily is `monthly / 30`.
///
/// None when nothing is being contributed.
pub fn projected_completion(
    remaining: Money,
    monthly_contribution: Money,
    today: NaiveDate,
) -> Option<NaiveDate> {
    if remaining.cents() <= 0 {
        return Some(today);
    }
    if monthly_contribution.cents() <= 0 {
        return None;
    }
    let daily = monthly_contribution.cents() as f64 / CONTRIBUTION_WINDOW_DAYS as f64;
    let days = (remaining.cents() as f64 / daily).ceil();
    if !days.is_finite() || days > i64::from(i32::MAX) as f64 {
        return None;
    }
    today.checked_add_signed(Duration::days(days as i64))
}

/// Whole months from `start` to `today`, never less than 1
pub fn months_elapsed(start: NaiveDate, today: NaiveDate) -> i64 {
    let mut months = i64::from(today.year() - start.year()) * 12
        + i64::from(today.month()) - i64::from(start.month());
    if today.day() < start.day() {
        months -= 1;
    }
    months.max(1)
}

/// Classify a plan from its ledger
pub fn plan_performance<'a>(
    plan: &Plan,
    ledger: impl IntoIterator<Item = &'a Transaction>,
    today: NaiveDate,
    tolerance: f64,
) -> PlanPerformanceReport {
    let window = DateRange::trailing(today, CONTRIBUTION_WINDOW_DAYS);
    let mut monthly_contribution = Money::zero();
    let mut missed_count = 0;
    for txn in ledger {
        if txn.kind.is_deposit() && window.contains(txn.transaction_date) {
            monthly_contribution += txn.amount;
        }
        if txn.kind == TransactionType::Missed {
            missed_count += 1;
        }
    }

    let progress = plan.current_amount.percent_of(plan.target_amount);
    let expected_progress = match plan.end_date {
        Some(end) => elapsed_fraction(plan.start_date, end, today) * 100.0,
        None => plan
            .scheduled_amount(today)
            .percent_of(plan.target_amount)
            .min(100.0),
    };

    PlanPerformanceReport {
        plan_id: plan.id,
        name: plan.name.clone(),
        current_amount: plan.current_amount,
        target_amount: plan.target_amount,
        progress,
        expected_progress,
        variance: progress - expected_progress,
        status: classify(
            plan.is_completed,
            plan.end_date,
            today,
            progress,
            expected_progress,
            tolerance,
        ),
        monthly_contribution,
        projected_completion_date: projected_completion(
            plan.remaining(),
            monthly_contribution,
            today,
        ),
        days_remaining: plan.end_date.map(|end| (end - today).num_days()),
        missed_count,
    }
}

/// Classify a goal. Goals without a deadline are on track until completed.
pub fn goal_progress(goal: &Goal, today: NaiveDate, tolerance: f64) -> GoalProgressReport {
    let progress = goal.current_amount.percent_of(goal.target_amount);
    let expected_progress = match goal.deadline {
        Some(deadline) => elapsed_fraction(goal.start_date(), deadline, today) * 100.0,
        None => progress,
    };

    let months = months_elapsed(goal.start_date(), today);
    let monthly_contribution = Money::from_cents(goal.current_amount.cents() / months);

    GoalProgressReport {
        goal_id: goal.id,
        name: goal.name.clone(),
        priority: goal.priority,
        current_amount: goal.current_amount,
        target_amount: goal.target_amount,
        progress,
        expected_progress,
        variance: progress - expected_progress,
        status: classify(
            goal.is_completed,
            goal.deadline,
            today,
            progress,
            expected_progress,
            tolerance,
        ),
        monthly_contribution,
        projected_completion_date: projected_completion(
            goal.remaining(),
            monthly_contribution,
            today,
        ),
        days_remaining: goal.deadline.map(|d| (d - today).num_days()),
    }
}

/// Request-time progress views
pub struct ProgressService<'a> {
    ctx: &'a LedgerContext,
}

impl<'a> ProgressService<'a> {
    pub fn new(ctx: &'a LedgerContext) -> Self {
        Self { ctx }
    }

    /// Balance and ledger come from one snapshot, so a concurrent write
    /// never shows up in one and not the other
    pub fn plan_progress(&self, plan_id: PlanId) -> LedgerResult<PlanPerformanceReport> {
        let snapshot = self.ctx.storage.snapshot()?;
        let plan = snapshot
            .plan(plan_id)
            .ok_or_else(|| LedgerError::plan_not_found(plan_id.to_string()))?;
        Ok(plan_performance(
            plan,
            snapshot.ledger_for(plan_id),
            self.ctx.today(),
            self.ctx.settings.progress_tolerance,
        ))
    }

    pub fn goal_progress(&self, goal_id: GoalId) -> LedgerResult<GoalProgressReport> {
        let goal = self
            .ctx
            .storage
            .goals
            .get(goal_id)?
            .ok_or_else(|| LedgerError::goal_not_found(goal_id.to_string()))?;
        Ok(goal_progress(
            &goal,
            self.ctx.today(),
            self.ctx.settings.progress_tolerance,
        ))
    }

    /// Every visible plan, in name order
    pub fn all_plans(&self) -> LedgerResult<Vec<PlanPerformanceReport>> {
        let today = self.ctx.today();
        let tolerance = self.ctx.settings.progress_tolerance;
        let snapshot = self.ctx.storage.snapshot()?;
        Ok(snapshot
            .plans
            .iter()
            .filter(|plan| !plan.archived)
            .map(|plan| plan_performance(plan, snapshot.ledger_for(plan.id), today, tolerance))
            .collect())
    }

    /// Every goal, highest priority first
    pub fn all_goals(&self) -> LedgerResult<Vec<GoalProgressReport>> {
        let today = self.ctx.today();
        let tolerance = self.ctx.settings.progress_tolerance;
        Ok(self
            .ctx
            .storage
            .goals
            .get_all()?
            .iter()
            .map(|goal| goal_progress(goal, today, tolerance))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Frequency;
    use crate::services::testing::{context, date};
    use crate::services::{CreateTransactionInput, TransactionService};
    use chrono::{TimeZone, Utc};

    fn plan_ending(end: Option<NaiveDate>) -> Plan {
        let mut plan = Plan::new(
            "Wedding",
            Money::from_units(1000),
            Money::from_units(100),
            Frequency::Monthly,
            date(2024, 1, 1),
        );
        plan.end_date = end;
        plan
    }

    #[test]
    fn test_elapsed_fraction() {
        let start = date(2024, 1, 1);
        let end = date(2024, 1, 11);
        assert_eq!(elapsed_fraction(start, end, date(2024, 1, 6)), 0.5);
        assert_eq!(elapsed_fraction(start, end, date(2023, 12, 1)), 0.0);
        assert_eq!(elapsed_fraction(start, end, date(2024, 5, 1)), 1.0);
        assert_eq!(elapsed_fraction(start, start, start), 1.0);
    }

    #[test]
    fn test_classify_order() {
        let today = date(2024, 6, 1);
        assert_eq!(
            classify(true, Some(date(2024, 1, 1)), today, 0.0, 100.0, 5.0),
            ProgressStatus::Completed
        );
        assert_eq!(
            classify(false, Some(date(2024, 5, 31)), today, 99.0, 100.0, 5.0),
            ProgressStatus::Overdue
        );
        assert_eq!(
            classify(false, Some(today), today, 45.0, 50.0, 5.0),
            ProgressStatus::OnTrack
        );
        assert_eq!(
            classify(false, None, today, 44.9, 50.0, 5.0),
            ProgressStatus::Behind
        );
    }

    #[test]
    fn test_projection_never_divides_by_zero() {
        let today = date(2024, 6, 1);
        assert_eq!(projected_completion(Money::from_units(100), Money::zero(), today), None);
        assert_eq!(projected_completion(Money::zero(), Money::zero(), today), Some(today));
        // 30/month is 1/day; 100 remaining takes 100 days
        assert_eq!(
            projected_completion(Money::from_units(100), Money::from_units(30), today),
            Some(today + Duration::days(100))
        );
        // Rounds up partial days
        assert_eq!(
            projected_completion(Money::from_cents(101), Money::from_units(30), today),
            Some(today + Duration::days(2))
        );
    }

    #[test]
    fn test_months_elapsed_floor() {
        assert_eq!(months_elapsed(date(2024, 1, 15), date(2024, 1, 20)), 1);
        assert_eq!(months_elapsed(date(2024, 1, 15), date(2024, 4, 14)), 2);
        assert_eq!(months_elapsed(date(2024, 1, 15), date(2024, 4, 15)), 3);
    }

    #[test]
    fn test_plan_with_end_date() {
        let plan = {
            let mut p = plan_ending(Some(date(2024, 1, 11)));
            p.current_amount = Money::from_units(300);
            p
        };
        let report = plan_performance(&plan, &[], date(2024, 1, 6), 5.0);
        assert_eq!(report.expected_progress, 50.0);
        assert_eq!(report.progress, 30.0);
        assert_eq!(report.variance, -20.0);
        assert_eq!(report.status, ProgressStatus::Behind);
        assert_eq!(report.days_remaining, Some(5));
        assert_eq!(report.projected_completion_date, None);
    }

    #[test]
    fn test_plan_without_end_date_uses_schedule() {
        let mut plan = plan_ending(None);
        plan.current_amount = Money::from_units(250);
        // Three monthly periods have started by mid-March: 300 expected of 1000
        let report = plan_performance(&plan, &[], date(2024, 3, 15), 5.0);
        assert_eq!(report.expected_progress, 30.0);
        assert_eq!(report.status, ProgressStatus::OnTrack);
        assert_eq!(report.days_remaining, None);
    }

    #[test]
    fn test_plan_monthly_contribution_window() {
        let plan = plan_ending(None);
        let today = date(2024, 3, 31);
        let ledger = vec![
            Transaction::new(plan.id, TransactionType::Saved, Money::from_units(100), date(2024, 3, 1)),
            Transaction::new(plan.id, TransactionType::Extra, Money::from_units(50), date(2024, 3, 2)),
            Transaction::new(plan.id, TransactionType::Saved, Money::from_units(100), date(2024, 2, 29)),
            Transaction::new(plan.id, TransactionType::Withdrawal, Money::from_units(20), date(2024, 3, 5)),
            Transaction::new(plan.id, TransactionType::Missed, Money::from_units(100), date(2024, 3, 6)),
        ];
        let report = plan_performance(&plan, &ledger, today, 5.0);
        assert_eq!(report.monthly_contribution, Money::from_units(150));
        assert_eq!(report.missed_count, 1);
        assert!(report.projected_completion_date.is_some());
    }

    #[test]
    fn test_goal_progress() {
        let mut goal = Goal::new("Trip", Money::from_units(1200)).with_deadline(date(2024, 12, 31));
        goal.created_at = Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap();
        goal.current_amount = Money::from_units(600);

        let report = goal_progress(&goal, date(2024, 7, 1), 5.0);
        assert_eq!(report.progress, 50.0);
        assert_eq!(report.monthly_contribution, Money::from_units(100));
        assert_eq!(report.status, ProgressStatus::OnTrack);
        assert_eq!(report.days_remaining, Some(183));

        let no_deadline = Goal::new("Someday", Money::from_units(10));
        let report = goal_progress(&no_deadline, no_deadline.start_date(), 5.0);
        assert_eq!(report.status, ProgressStatus::OnTrack);
        assert_eq!(report.projected_completion_date, None);

        let late = goal_progress(&goal, date(2025, 1, 1), 5.0);
        assert_eq!(late.status, ProgressStatus::Overdue);
    }

    #[test]
    fn test_service_lookups() {
        let (_temp, ctx, _sink) = context(date(2024, 1, 20));
        let plan = plan_ending(None);
        let plan_id = plan.id;
        ctx.storage.plans.commit(plan).unwrap();
        TransactionService::new(&ctx)
            .create(
                CreateTransactionInput::new(plan_id, TransactionType::Saved, Money::from_units(100))
                    .on(date(2024, 1, 15)),
            )
            .unwrap();

        let service = ProgressService::new(&ctx);
        let report = service.plan_progress(plan_id).unwrap();
        assert_eq!(report.progress, 10.0);
        assert_eq!(report.monthly_contribution, Money::from_units(100));
        assert!(service.plan_progress(PlanId::new()).unwrap_err().is_not_found());
        assert!(service.goal_progress(GoalId::new()).unwrap_err().is_not_found());
    }

    #[test]
    fn test_progress_agrees_with_ledger_under_concurrent_writes() {
        let (_temp, ctx, _sink) = context(date(2024, 1, 20));
        let mut plan = plan_ending(None);
        plan.target_amount = Money::from_units(1_000_000);
        let plan_id = plan.id;
        ctx.storage.plans.commit(plan).unwrap();

        std::thread::scope(|scope| {
            scope.spawn(|| {
                let service = TransactionService::new(&ctx);
                for _ in 0..40 {
                    service
                        .create(
                            CreateTransactionInput::new(
                                plan_id,
                                TransactionType::Extra,
                                Money::from_units(10),
                            )
                            .on(date(2024, 1, 15)),
                        )
                        .unwrap();
                }
            });
            scope.spawn(|| {
                let service = ProgressService::new(&ctx);
                for _ in 0..40 {
                    let report = service.plan_progress(plan_id).unwrap();
                    let reports = service.all_plans().unwrap();
                    assert_eq!(reports.len(), 1);
                    // Every entry is 10 units inside the contribution window
                    assert_eq!(report.monthly_contribution, report.current_amount);
                    assert_eq!(reports[0].monthly_contribution, reports[0].current_amount);
                }
            });
        });

        let report = ProgressService::new(&ctx).plan_progress(plan_id).unwrap();
        assert_eq!(report.current_amount, Money::from_units(400));
    }

    #[test]
    fn test_status_serializes_snake_case() {
        assert_eq!(
            serde_json::to_string(&ProgressStatus::OnTrack).unwrap(),
            "\"on_track\""
        );
    }
}
