//! Ledger replay check
//!
//! `verify` compares every plan's stored balance with a replay of its
//! ledger; `--repair` rewrites drifted balances from the ledger.

use crate::error::{LedgerError, LedgerResult};
use crate::services::{BalanceService, LedgerContext};

/// Handle the verify command
pub fn handle_verify_command(ctx: &LedgerContext, repair: bool) -> LedgerResult<()> {
    let service = BalanceService::new(ctx);
    let drift = if repair {
        service.repair()?
    } else {
        service.verify()?
    };

    if drift.is_empty() {
        println!("All plan balances match their ledgers.");
        return Ok(());
    }

    for d in &drift {
        println!(
            "{:<24} stored {:>12}  ledger {:>12}",
            d.name,
            d.stored.to_string(),
            d.replayed.to_string()
        );
    }

    if repair {
        println!("Repaired {} plan(s).", drift.len());
        Ok(())
    } else {
        Err(LedgerError::Validation(format!(
            "{} plan(s) disagree with their ledger; run with --repair",
            drift.len()
        )))
    }
}
