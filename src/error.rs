//! Custom error types for the savings ledger
//!
//! This module defines the error hierarchy for the ledger using thiserror
//! for ergonomic error definitions. The first six variants are the caller-facing
//! rejection taxonomy; everything after them is ambient plumbing.

use chrono::NaiveDate;
use thiserror::Error;

use crate::models::Money;

/// The main error type for ledger operations
#[derive(Error, Debug)]
pub enum LedgerError {
    /// Amount was zero or negative
    #[error("Invalid amount: {0} (amount must be greater than zero)")]
    InvalidAmount(Money),

    /// Withdrawal larger than the available balance
    #[error("Insufficient funds: requested {requested}, available {available}")]
    InsufficientFunds { requested: Money, available: Money },

    /// A regular SAVED entry already exists for that plan and day
    #[error("A savings transaction already exists for plan {plan} on {date}")]
    DuplicateTransaction { plan: String, date: NaiveDate },

    /// Transaction date rejected (future date or inverted range)
    #[error("Invalid date: {0}")]
    InvalidDate(String),

    /// Entity not found errors
    #[error("{entity_type} not found: {identifier}")]
    NotFound {
        entity_type: &'static str,
        identifier: String,
    },

    /// Another writer holds the entity lock past the configured timeout
    #[error("Concurrent update on {entity_type} {identifier}, retry with fresh state")]
    ConcurrencyConflict {
        entity_type: &'static str,
        identifier: String,
    },

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(String),

    /// Validation errors for data models
    #[error("Validation error: {0}")]
    Validation(String),

    /// Export errors
    #[error("Export error: {0}")]
    Export(String),

    /// Storage errors
    #[error("Storage error: {0}")]
    Storage(String),

    /// Report generation was cancelled by the caller
    #[error("Operation cancelled")]
    Cancelled,
}

impl LedgerError {
    /// Create a "not found" error for plans
    pub fn plan_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Plan",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for goals
    pub fn goal_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Goal",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for transactions
    pub fn transaction_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Transaction",
            identifier: identifier.into(),
        }
    }

    /// Create a "not found" error for tasks
    pub fn task_not_found(identifier: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type: "Task",
            identifier: identifier.into(),
        }
    }

    /// Check if this is a "not found" error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Rejections the caller can fix and resubmit. None of them leave state behind.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::InvalidAmount(_)
                | Self::InsufficientFunds { .. }
                | Self::DuplicateTransaction { .. }
                | Self::InvalidDate(_)
                | Self::NotFound { .. }
                | Self::ConcurrencyConflict { .. }
                | Self::Validation(_)
                | Self::Cancelled
        )
    }

    /// Stable machine-readable code for the error kind
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidAmount(_) => "InvalidAmount",
            Self::InsufficientFunds { .. } => "InsufficientFunds",
            Self::DuplicateTransaction { .. } => "DuplicateTransaction",
            Self::InvalidDate(_) => "InvalidDate",
            Self::NotFound { .. } => "NotFound",
            Self::ConcurrencyConflict { .. } => "ConcurrencyConflict",
            Self::Config(_) => "Config",
            Self::Io(_) | Self::Json(_) | Self::Storage(_) => "StorageFailure",
            Self::Validation(_) => "Validation",
            Self::Export(_) => "Export",
            Self::Cancelled => "Cancelled",
        }
    }

    /// Message safe to show outside the process.
    ///
    /// Storage-layer faults are collapsed into a generic failure so paths and
    /// OS error text never leak to callers.
    pub fn public_message(&self) -> String {
        match self {
            Self::Io(_) | Self::Json(_) | Self::Storage(_) => {
                "The request could not be completed due to a storage failure".to_string()
            }
            other => other.to_string(),
        }
    }
}

// Implement From traits for common error types

impl From<std::io::Error> for LedgerError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err.to_string())
    }
}

impl From<serde_json::Error> for LedgerError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Result type alias for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;
