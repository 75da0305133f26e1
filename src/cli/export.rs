//! Export CLI command
//!
//! Writes one plan's filtered ledger to a file, or to stdout when no output
//! path is given.

use std::io::Write;
use std::path::PathBuf;

use clap::Args;

use crate::error::{LedgerError, LedgerResult};
use crate::export::{export_transactions, ExportFormat};
use crate::services::LedgerContext;

use super::resolve_plan;
use super::transaction::build_filter;

#[derive(Args)]
pub struct ExportArgs {
    /// Plan name or ID
    pub plan: String,

    /// csv, json or yaml
    #[arg(short, long, default_value = "csv")]
    pub format: String,

    /// Output file path (stdout when omitted)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Start date (YYYY-MM-DD)
    #[arg(long)]
    pub from: Option<String>,

    /// End date (YYYY-MM-DD)
    #[arg(long)]
    pub to: Option<String>,

    /// Only these types (comma separated)
    #[arg(short = 't', long = "type", value_delimiter = ',')]
    pub types: Vec<String>,

    /// Only catch-up entries
    #[arg(long)]
    pub catch_up: bool,

    /// At most this many of the most recent entries
    #[arg(short, long)]
    pub limit: Option<usize>,
}

/// Handle the export command
pub fn handle_export_command(ctx: &LedgerContext, args: ExportArgs) -> LedgerResult<()> {
    let plan = resolve_plan(ctx, &args.plan)?;
    let format: ExportFormat = args.format.parse()?;
    let filter = build_filter(
        args.from.as_deref(),
        args.to.as_deref(),
        &args.types,
        args.catch_up,
        args.limit,
    )?;

    let bytes = export_transactions(&ctx.storage, plan.id, format, &filter)?;

    match args.output {
        Some(path) => {
            std::fs::write(&path, &bytes).map_err(|e| {
                LedgerError::Export(format!("Failed to write {}: {}", path.display(), e))
            })?;
            println!(
                "Exported '{}' as {} to {} ({} bytes)",
                plan.name,
                format,
                path.display(),
                bytes.len()
            );
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(&bytes)
                .map_err(|e| LedgerError::Export(e.to_string()))?;
        }
    }

    Ok(())
}
