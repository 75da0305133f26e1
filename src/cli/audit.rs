//! Audit log CLI command

use clap::{Args, ValueEnum};

use crate::audit::EntityType;
use crate::error::LedgerResult;
use crate::services::LedgerContext;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum AuditEntity {
    Plan,
    Goal,
    Transaction,
    Task,
}

impl From<AuditEntity> for EntityType {
    fn from(entity: AuditEntity) -> Self {
        match entity {
            AuditEntity::Plan => EntityType::Plan,
            AuditEntity::Goal => EntityType::Goal,
            AuditEntity::Transaction => EntityType::Transaction,
            AuditEntity::Task => EntityType::Task,
        }
    }
}

#[derive(Args)]
pub struct AuditArgs {
    /// Number of entries to show
    #[arg(short = 'n', long, default_value = "20")]
    pub limit: usize,

    /// Only entries for this kind of entity
    #[arg(short, long, value_enum)]
    pub entity: Option<AuditEntity>,
}

/// Handle the audit command
pub fn handle_audit_command(ctx: &LedgerContext, args: AuditArgs) -> LedgerResult<()> {
    let entries = ctx
        .storage
        .audit()
        .read_recent(args.limit, args.entity.map(EntityType::from))?;

    if entries.is_empty() {
        println!("No audit entries.");
        return Ok(());
    }
    for entry in entries {
        println!("{}", entry.format_human_readable());
    }

    Ok(())
}
