//! Diagnostic logging setup
//!
//! Service-level events go through `tracing`. The subscriber is installed once
//! per process; the filter comes from `SAVINGS_LOG`, then `RUST_LOG`, and
//! defaults to warnings so CLI output stays clean.

use std::sync::Once;

use tracing_subscriber::{fmt, EnvFilter};

static TRACING_INIT: Once = Once::new();

/// Environment variable holding the log filter directive
pub const LOG_ENV_VAR: &str = "SAVINGS_LOG";

/// Initializes the global tracing subscriber. Safe to call more than once.
pub fn init() {
    TRACING_INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
            .or_else(|_| EnvFilter::try_from_default_env())
            .unwrap_or_else(|_| EnvFilter::new("savings_ledger=warn"));

        // Another subscriber may already be installed by an embedding application.
        let _ = fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();

        tracing::debug!("savings ledger tracing initialized");
    });
}

#[cfg(test)]
mod tests {
    #[test]
    fn init_twice_does_not_panic() {
        super::init();
        super::init();
    }
}
