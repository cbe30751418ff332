//! Update schedule predicate

use crate::error::ConfigError;
use chrono::{Datelike, NaiveDate, Weekday};
use std::fmt;

/// How often an update config entry should be processed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateSchedule {
    /// Process on every run
    Live,
    /// Process on every run
    Daily,
    /// Process only on Mondays
    Weekly,
    /// Process only on the first day of the month
    Monthly,
}

impl UpdateSchedule {
    /// Parse a policy document schedule value
    pub fn from_config_value(value: &str) -> Result<Self, ConfigError> {
        match value {
            "live" => Ok(UpdateSchedule::Live),
            "daily" => Ok(UpdateSchedule::Daily),
            "weekly" => Ok(UpdateSchedule::Weekly),
            "monthly" => Ok(UpdateSchedule::Monthly),
            other => Err(ConfigError::unsupported_schedule(other)),
        }
    }

    /// Returns true if the entry should be processed on the given date
    pub fn is_due(&self, today: NaiveDate) -> bool {
        match self {
            UpdateSchedule::Live | UpdateSchedule::Daily => true,
            UpdateSchedule::Weekly => today.weekday() == Weekday::Mon,
            UpdateSchedule::Monthly => today.day() == 1,
        }
    }
}

impl fmt::Display for UpdateSchedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = match self {
            UpdateSchedule::Live => "live",
            UpdateSchedule::Daily => "daily",
            UpdateSchedule::Weekly => "weekly",
            UpdateSchedule::Monthly => "monthly",
        };
        f.write_str(value)
    }
}
