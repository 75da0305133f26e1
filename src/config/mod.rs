//! Configuration module for the savings ledger
//!
//! This module provides configuration management including:
//! - XDG-compliant path resolution
//! - User settings persistence
//! - Progress classification thresholds

pub mod paths;
pub mod settings;

pub use paths::LedgerPaths;
pub use settings::Settings;
