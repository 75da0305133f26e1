//! User settings for the savings ledger
//!
//! Holds the thresholds used by the progress classifier and report
//! recommendations, the lock timeout used by writers, and display
//! preferences.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::paths::LedgerPaths;
use crate::error::LedgerError;

/// User settings for the savings ledger
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    /// Schema version for migration support
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,

    /// Percentage points a plan or goal may trail its expected progress
    /// and still be classified as on track
    #[serde(default = "default_progress_tolerance")]
    pub progress_tolerance: f64,

    /// A goal whose deadline falls within this many days gets a
    /// recommendation
    #[serde(default = "default_deadline_warning_days")]
    pub deadline_warning_days: i64,

    /// Task completion rate (percent) under which a recommendation is issued
    #[serde(default = "default_task_completion_warning")]
    pub task_completion_warning: f64,

    /// How long a writer waits for a plan or goal lock
    #[serde(default = "default_lock_timeout_ms")]
    pub lock_timeout_ms: u64,

    /// Default currency symbol
    #[serde(default = "default_currency")]
    pub currency_symbol: String,

    /// Date format preference (strftime format)
    #[serde(default = "default_date_format")]
    pub date_format: String,
}

fn default_schema_version() -> u32 {
    1
}

fn default_progress_tolerance() -> f64 {
    5.0
}

fn default_deadline_warning_days() -> i64 {
    7
}

fn default_task_completion_warning() -> f64 {
    50.0
}

fn default_lock_timeout_ms() -> u64 {
    2_000
}

fn default_currency() -> String {
    "$".to_string()
}

fn default_date_format() -> String {
    "%Y-%m-%d".to_string()
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            schema_version: default_schema_version(),
            progress_tolerance: default_progress_tolerance(),
            deadline_warning_days: default_deadline_warning_days(),
            task_completion_warning: default_task_completion_warning(),
            lock_timeout_ms: default_lock_timeout_ms(),
            currency_symbol: default_currency(),
            date_format: default_date_format(),
        }
    }
}

impl Settings {
    /// Lock acquisition timeout as a Duration
    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(self.lock_timeout_ms)
    }

    /// Reject settings the classifier cannot work with
    pub fn validate(&self) -> Result<(), LedgerError> {
        if !(0.0..=100.0).contains(&self.progress_tolerance) {
            return Err(LedgerError::Config(format!(
                "progress_tolerance must be between 0 and 100, got {}",
                self.progress_tolerance
            )));
        }
        if self.deadline_warning_days < 0 {
            return Err(LedgerError::Config(
                "deadline_warning_days cannot be negative".into(),
            ));
        }
        if self.lock_timeout_ms == 0 {
            return Err(LedgerError::Config(
                "lock_timeout_ms must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Load settings from disk, or create default settings if file doesn't exist
    pub fn load_or_create(paths: &LedgerPaths) -> Result<Self, LedgerError> {
        let settings_path = paths.settings_file();

        if settings_path.exists() {
            let contents = std::fs::read_to_string(&settings_path)
                .map_err(|e| LedgerError::Io(format!("Failed to read settings file: {}", e)))?;

            let settings: Settings = serde_json::from_str(&contents).map_err(|e| {
                LedgerError::Config(format!("Failed to parse settings file: {}", e))
            })?;

            settings.validate()?;
            Ok(settings)
        } else {
            // Don't save yet - let caller decide when to persist
            Ok(Settings::default())
        }
    }

    /// Save settings to disk
    pub fn save(&self, paths: &LedgerPaths) -> Result<(), LedgerError> {
        paths.ensure_directories()?;

        let settings_path = paths.settings_file();
        let contents = serde_json::to_string_pretty(self)
            .map_err(|e| LedgerError::Config(format!("Failed to serialize settings: {}", e)))?;

        std::fs::write(&settings_path, contents)
            .map_err(|e| LedgerError::Io(format!("Failed to write settings file: {}", e)))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.progress_tolerance, 5.0);
        assert_eq!(settings.deadline_warning_days, 7);
        assert_eq!(settings.lock_timeout(), Duration::from_millis(2_000));
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let paths = LedgerPaths::with_base_dir(temp_dir.path().to_path_buf());

        let mut settings = Settings::default();
        settings.progress_tolerance = 10.0;
        settings.deadline_warning_days = 14;

        settings.save(&paths).unwrap();

        let loaded = Settings::load_or_create(&paths).unwrap();
        assert_eq!(loaded.progress_tolerance, 10.0);
        assert_eq!(loaded.deadline_warning_days, 14);
    }

    #[test]
    fn test_missing_fields_take_defaults() {
        let settings: Settings = serde_json::from_str(r#"{"currency_symbol": "€"}"#).unwrap();
        assert_eq!(settings.currency_symbol, "€");
        assert_eq!(settings.progress_tolerance, 5.0);
        assert_eq!(settings.lock_timeout_ms, 2_000);
    }

    #[test]
    fn test_invalid_tolerance_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let paths = LedgerPaths::with_base_dir(temp_dir.path().to_path_buf());
        paths.ensure_directories().unwrap();
        std::fs::write(paths.settings_file(), r#"{"progress_tolerance": 150.0}"#).unwrap();

        let err = Settings::load_or_create(&paths).unwrap_err();
        assert!(matches!(err, LedgerError::Config(_)));
    }
}
