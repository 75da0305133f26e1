use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};

use savings_ledger::cli::{
    handle_audit_command, handle_export_command, handle_goal_command, handle_plan_command,
    handle_report_command, handle_task_command, handle_transaction_command,
    handle_verify_command, AuditArgs, ExportArgs, GoalCommands, PlanCommands, ReportArgs,
    TaskCommands, TransactionCommands,
};
use savings_ledger::config::LedgerPaths;
use savings_ledger::services::LedgerContext;
use savings_ledger::LedgerError;

#[derive(Parser)]
#[command(
    name = "savings",
    version,
    about = "Savings plans, goals and progress reports from the terminal",
    long_about = "Track savings plans through an append-only ledger of deposits and \
                  withdrawals, follow goals and tasks, and produce period reports \
                  with progress classification and recommendations."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the data directory and default settings
    Init,

    /// Show current configuration and paths
    Config,

    /// Savings plan commands
    #[command(subcommand)]
    Plan(PlanCommands),

    /// Savings goal commands
    #[command(subcommand)]
    Goal(GoalCommands),

    /// Ledger transaction commands
    #[command(subcommand, alias = "txn")]
    Transaction(TransactionCommands),

    /// Task commands
    #[command(subcommand)]
    Task(TaskCommands),

    /// Generate a period report
    Report(ReportArgs),

    /// Export a plan's ledger
    Export(ExportArgs),

    /// Check stored plan balances against their ledgers
    Verify {
        /// Rewrite drifted balances from the ledger
        #[arg(long)]
        repair: bool,
    },

    /// Show recent audit log entries
    Audit(AuditArgs),
}

fn main() -> ExitCode {
    savings_ledger::logging::init();
    let cli = Cli::parse();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            match err.downcast_ref::<LedgerError>() {
                Some(ledger_err) => {
                    tracing::debug!(error = %ledger_err, "command failed");
                    eprintln!("Error [{}]: {}", ledger_err.code(), ledger_err.public_message());
                }
                None => eprintln!("Error: {:#}", err),
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let paths = LedgerPaths::new()?;

    let Some(command) = cli.command else {
        println!("Savings Ledger - plans, goals and progress reports");
        println!();
        println!("Run 'savings --help' for usage information.");
        println!("Run 'savings init' to set up the data directory.");
        return Ok(());
    };

    let ctx = LedgerContext::open(paths.clone())?;

    match command {
        Commands::Init => {
            println!("Initializing savings ledger at: {}", paths.base_dir().display());
            paths.ensure_directories()?;
            ctx.settings.save(&paths)?;
            ctx.storage.save_all()?;
            println!("Initialization complete!");
            println!();
            println!("Run 'savings plan create <name> <target>' to start a plan.");
        }
        Commands::Config => {
            println!("Savings Ledger Configuration");
            println!("============================");
            println!("Base directory:  {}", paths.base_dir().display());
            println!("Data directory:  {}", paths.data_dir().display());
            println!("Settings file:   {}", paths.settings_file().display());
            println!("Audit log:       {}", paths.audit_log().display());
            println!();
            println!("Settings:");
            println!("  Progress tolerance:      {}%", ctx.settings.progress_tolerance);
            println!("  Deadline warning:        {} days", ctx.settings.deadline_warning_days);
            println!("  Task completion warning: {}%", ctx.settings.task_completion_warning);
            println!("  Lock timeout:            {} ms", ctx.settings.lock_timeout_ms);
            println!("  Currency symbol:         {}", ctx.settings.currency_symbol);
            println!("  Date format:             {}", ctx.settings.date_format);
        }
        Commands::Plan(cmd) => handle_plan_command(&ctx, cmd)?,
        Commands::Goal(cmd) => handle_goal_command(&ctx, cmd)?,
        Commands::Transaction(cmd) => handle_transaction_command(&ctx, cmd)?,
        Commands::Task(cmd) => handle_task_command(&ctx, cmd)?,
        Commands::Report(args) => handle_report_command(&ctx, args)?,
        Commands::Export(args) => handle_export_command(&ctx, args)?,
        Commands::Verify { repair } => handle_verify_command(&ctx, repair)?,
        Commands::Audit(args) => handle_audit_command(&ctx, args)?,
    }

    Ok(())
}
