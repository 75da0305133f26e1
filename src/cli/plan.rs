//! Plan CLI commands

use clap::Subcommand;

use crate::display::{format_plan_details, format_plan_list, format_plan_progress};
use crate::error::{LedgerError, LedgerResult};
use crate::models::Frequency;
use crate::services::{CreatePlanInput, LedgerContext, PlanService, ProgressService};

use super::{parse_money, parse_optional_date, resolve_plan};

/// Plan subcommands
#[derive(Subcommand)]
pub enum PlanCommands {
    /// Create a new savings plan
    Create {
        /// Plan name
        name: String,
        /// Target amount (e.g., "1000" or "1000.00")
        target: String,
        /// Amount saved each period
        #[arg(short = 'a', long = "per-period")]
        per_period: String,
        /// daily, weekly, monthly, yearly or custom:<days>
        #[arg(short, long, default_value = "monthly")]
        frequency: String,
        /// Start date (YYYY-MM-DD), defaults to today
        #[arg(long)]
        start: Option<String>,
        /// Optional end date (YYYY-MM-DD)
        #[arg(long)]
        end: Option<String>,
    },
    /// List plans
    List {
        /// Include archived plans
        #[arg(short, long)]
        all: bool,
    },
    /// Show plan details
    Show {
        /// Plan name or ID
        plan: String,
    },
    /// Show progress for one plan, or all plans
    Progress {
        /// Plan name or ID
        plan: Option<String>,
    },
    /// Set the plan balance; the difference is recorded as a manual entry
    SetAmount {
        /// Plan name or ID
        plan: String,
        /// New balance
        amount: String,
    },
    /// Archive a plan (its ledger is kept)
    Archive {
        /// Plan name or ID
        plan: String,
    },
}

/// Handle a plan command
pub fn handle_plan_command(ctx: &LedgerContext, cmd: PlanCommands) -> LedgerResult<()> {
    let service = PlanService::new(ctx);

    match cmd {
        PlanCommands::Create {
            name,
            target,
            per_period,
            frequency,
            start,
            end,
        } => {
            let frequency = Frequency::parse(&frequency).map_err(LedgerError::Validation)?;
            let plan = service.create(CreatePlanInput {
                name,
                target_amount: parse_money(&target)?,
                amount_per_period: parse_money(&per_period)?,
                frequency,
                start_date: parse_optional_date(start.as_deref())?,
                end_date: parse_optional_date(end.as_deref())?,
            })?;

            println!("Created plan: {}", plan.name);
            println!("  Target: {}", plan.target_amount);
            println!(
                "  Saving: {} {}",
                plan.amount_per_period,
                plan.frequency.description()
            );
            println!("  ID: {}", plan.id);
        }

        PlanCommands::List { all } => {
            print!("{}", format_plan_list(&service.list(all)?));
        }

        PlanCommands::Show { plan } => {
            let found = resolve_plan(ctx, &plan)?;
            print!("{}", format_plan_details(&found));
        }

        PlanCommands::Progress { plan } => {
            let progress = ProgressService::new(ctx);
            let reports = match plan {
                Some(plan) => vec![progress.plan_progress(resolve_plan(ctx, &plan)?.id)?],
                None => progress.all_plans()?,
            };
            if reports.is_empty() {
                println!("No plans found.");
            }
            for report in reports {
                print!("{}", format_plan_progress(&report));
            }
        }

        PlanCommands::SetAmount { plan, amount } => {
            let found = resolve_plan(ctx, &plan)?;
            let updated = service.update_amount(found.id, parse_money(&amount)?)?;
            println!(
                "Plan '{}' balance: {} -> {}",
                updated.name, found.current_amount, updated.current_amount
            );
            if updated.is_completed && !found.is_completed {
                println!("Target reached!");
            }
        }

        PlanCommands::Archive { plan } => {
            let found = resolve_plan(ctx, &plan)?;
            let archived = service.archive(found.id)?;
            println!("Archived plan: {}", archived.name);
        }
    }

    Ok(())
}
