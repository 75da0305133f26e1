//! Task CLI commands

use clap::Subcommand;

use crate::display::format_task_list;
use crate::error::{LedgerError, LedgerResult};
use crate::models::TaskState;
use crate::services::{LedgerContext, TaskService};

use super::parse_optional_date;

/// Task subcommands
#[derive(Subcommand)]
pub enum TaskCommands {
    /// Add a task
    Add {
        title: String,
        /// Due date (YYYY-MM-DD)
        #[arg(short, long)]
        due: Option<String>,
    },
    /// Mark a task completed
    Complete {
        /// Task ID or short ID
        task: String,
    },
    /// List tasks
    List {
        /// pending, completed or overdue
        #[arg(short, long)]
        state: Option<String>,
    },
}

fn parse_state(input: &str) -> LedgerResult<TaskState> {
    match input.trim().to_lowercase().as_str() {
        "pending" => Ok(TaskState::Pending),
        "completed" | "done" => Ok(TaskState::Completed),
        "overdue" => Ok(TaskState::Overdue),
        other => Err(LedgerError::Validation(format!(
            "Unknown task state '{}'. Use pending, completed or overdue",
            other
        ))),
    }
}

/// Handle a task command
pub fn handle_task_command(ctx: &LedgerContext, cmd: TaskCommands) -> LedgerResult<()> {
    let service = TaskService::new(ctx);

    match cmd {
        TaskCommands::Add { title, due } => {
            let task = service.create(&title, parse_optional_date(due.as_deref())?)?;
            println!("Added task: {}", task.title);
            println!("  ID: {}", task.id);
        }

        TaskCommands::Complete { task } => {
            let found = service
                .find(&task)?
                .ok_or_else(|| LedgerError::task_not_found(&task))?;
            let done = service.complete(found.id)?;
            println!("Completed task: {}", done.title);
        }

        TaskCommands::List { state } => {
            let state = state.as_deref().map(parse_state).transpose()?;
            print!("{}", format_task_list(&service.list(state)?));
        }
    }

    Ok(())
}
