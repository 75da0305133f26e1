//! Goal CLI commands

use clap::Subcommand;

use crate::display::{format_goal_details, format_goal_list};
use crate::error::LedgerResult;
use crate::services::{CreateGoalInput, GoalService, LedgerContext, ProgressService};

use super::{parse_money, parse_optional_date, resolve_goal};

/// Goal subcommands
#[derive(Subcommand)]
pub enum GoalCommands {
    /// Create a new goal
    Create {
        /// Goal name
        name: String,
        /// Target amount
        target: String,
        /// Priority from 1 (low) to 5 (high)
        #[arg(short, long)]
        priority: Option<u8>,
        /// Deadline (YYYY-MM-DD)
        #[arg(short, long)]
        deadline: Option<String>,
    },
    /// List goals, highest priority first
    List,
    /// Show a goal with its progress
    Show {
        /// Goal name or ID
        goal: String,
    },
    /// Add money to a goal
    Add {
        /// Goal name or ID
        goal: String,
        amount: String,
    },
    /// Take money out of a goal
    Withdraw {
        /// Goal name or ID
        goal: String,
        amount: String,
    },
    /// Status of every goal
    Progress,
}

/// Handle a goal command
pub fn handle_goal_command(ctx: &LedgerContext, cmd: GoalCommands) -> LedgerResult<()> {
    let service = GoalService::new(ctx);

    match cmd {
        GoalCommands::Create {
            name,
            target,
            priority,
            deadline,
        } => {
            let goal = service.create(CreateGoalInput {
                name,
                target_amount: parse_money(&target)?,
                priority,
                deadline: parse_optional_date(deadline.as_deref())?,
            })?;
            println!("Created goal: {}", goal.name);
            println!("  Target: {}", goal.target_amount);
            println!("  Priority: {}", goal.priority);
            println!("  ID: {}", goal.id);
        }

        GoalCommands::List => {
            print!("{}", format_goal_list(&service.list()?));
        }

        GoalCommands::Show { goal } => {
            let found = resolve_goal(ctx, &goal)?;
            let progress = ProgressService::new(ctx).goal_progress(found.id)?;
            print!("{}", format_goal_details(&found, &progress));
        }

        GoalCommands::Add { goal, amount } => {
            let found = resolve_goal(ctx, &goal)?;
            let updated = service.add_amount(found.id, parse_money(&amount)?)?;
            println!(
                "Goal '{}': {} of {}",
                updated.name, updated.current_amount, updated.target_amount
            );
            if updated.is_completed && !found.is_completed {
                println!("Goal reached!");
            }
        }

        GoalCommands::Withdraw { goal, amount } => {
            let found = resolve_goal(ctx, &goal)?;
            let updated = service.withdraw_amount(found.id, parse_money(&amount)?)?;
            println!(
                "Goal '{}': {} of {}",
                updated.name, updated.current_amount, updated.target_amount
            );
        }

        GoalCommands::Progress => {
            let reports = ProgressService::new(ctx).all_goals()?;
            if reports.is_empty() {
                println!("No goals found.");
            }
            for report in reports {
                println!(
                    "{:<24} {:>6.1}% {:<9} {}",
                    report.name,
                    report.progress,
                    report.status.as_str(),
                    report
                        .projected_completion_date
                        .map(|d| format!("projected {}", d))
                        .unwrap_or_default()
                );
            }
        }
    }

    Ok(())
}
