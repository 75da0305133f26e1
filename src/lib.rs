//! Savings Ledger - savings plans, goals and progress reporting
//!
//! This library provides the core of a savings tracker: an append-only
//! ledger of typed transactions per savings plan, a validator that rejects
//! bad transactions before they touch the ledger, a balance engine with
//! one-way completion, a progress classifier for plans and goals, and a report
//! aggregator that builds period summaries from a consistent snapshot.
//!
//! # Architecture
//!
//! The crate is organized into the following modules:
//!
//! - `config`: Configuration and path management
//! - `error`: Custom error types
//! - `models`: Core data models (plans, goals, transactions, tasks)
//! - `storage`: JSON file storage layer and the ledger store
//! - `services`: Validation, balance, progress and entity services
//! - `reports`: Report aggregation
//! - `export`: Filtered transaction export
//! - `display`: Terminal formatting for the CLI
//! - `cli`: Command handlers for the `savings` binary
//! - `audit`: Audit logging system
//! - `events`: Completion events for the notification collaborator
//!
//! # Example
//!
//! ```rust,ignore
//! use savings_ledger::config::{paths::LedgerPaths, settings::Settings};
//! use savings_ledger::storage::Storage;
//!
//! let paths = LedgerPaths::new()?;
//! let settings = Settings::load_or_create(&paths)?;
//! let mut storage = Storage::new(paths)?;
//! storage.load_all()?;
//! ```

pub mod audit;
pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod events;
pub mod export;
pub mod logging;
pub mod models;
pub mod reports;
pub mod services;
pub mod storage;

pub use error::{LedgerError, LedgerResult};
