//! Application constants and reporting configuration.

use std::path::Path;

use chrono::{DateTime, FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const APP_NAME: &str = "CareHub";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "carehub_core=info";

/// Largest accepted calendar offset, in minutes.
const MAX_OFFSET_MINUTES: i32 = 18 * 60;

/// Longest accepted weekly lookback (ten years).
pub const MAX_WEEKLY_LOOKBACK_WEEKS: u32 = 520;

/// Longest accepted monthly lookback (ten years).
pub const MAX_MONTHLY_LOOKBACK_MONTHS: u32 = 120;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

/// Reporting configuration. Every field has a default.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ReportConfig {
    /// Offset of the reporting calendar from UTC
    pub utc_offset_minutes: i32,
    /// Number of ISO weeks in the weekly series
    pub weekly_lookback_weeks: u32,
    /// Number of months in the monthly series
    pub monthly_lookback_months: u32,
    /// Collection holding appointment documents
    pub appointments_collection: String,
    /// Collections holding staff documents, one per role
    pub staff_collections: Vec<String>,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            utc_offset_minutes: 0,
            weekly_lookback_weeks: 6,
            monthly_lookback_months: 6,
            appointments_collection: "appointments".into(),
            staff_collections: vec!["doctors".into(), "admins".into()],
        }
    }
}

impl ReportConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json(json: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> ConfigResult<Self> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.utc_offset_minutes.abs() > MAX_OFFSET_MINUTES {
            return Err(ConfigError::Invalid(format!(
                "utc_offset_minutes must be within ±{}, got {}",
                MAX_OFFSET_MINUTES, self.utc_offset_minutes
            )));
        }
        if !(1..=MAX_WEEKLY_LOOKBACK_WEEKS).contains(&self.weekly_lookback_weeks) {
            return Err(ConfigError::Invalid(format!(
                "weekly_lookback_weeks must be within 1..={}, got {}",
                MAX_WEEKLY_LOOKBACK_WEEKS, self.weekly_lookback_weeks
            )));
        }
        if !(1..=MAX_MONTHLY_LOOKBACK_MONTHS).contains(&self.monthly_lookback_months) {
            return Err(ConfigError::Invalid(format!(
                "monthly_lookback_months must be within 1..={}, got {}",
                MAX_MONTHLY_LOOKBACK_MONTHS, self.monthly_lookback_months
            )));
        }
        if self.appointments_collection.trim().is_empty() {
            return Err(ConfigError::Invalid("appointments_collection is empty".into()));
        }
        Ok(())
    }

    /// The reporting calendar's offset.
    pub fn offset(&self) -> FixedOffset {
        FixedOffset::east_opt(self.utc_offset_minutes * 60).unwrap_or_else(|| Utc.fix())
    }

    /// Express an instant in the reporting calendar.
    pub fn local_now(&self, now: DateTime<Utc>) -> DateTime<FixedOffset> {
        now.with_timezone(&self.offset())
    }
}
