//! Scheduler configuration.
//!
//! Every field has a default, so an empty TOML table or JSON object is a valid
//! configuration. Wall-clock fields use `"HH:MM"` strings.

use chrono::NaiveTime;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::dst::DstPolicy;
use crate::error::{Result, SchedulerError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// IANA identifier of the target timezone (e.g., "America/Los_Angeles").
    pub timezone: String,
    /// Start of each day's scanning window.
    #[serde(with = "wall_time")]
    pub day_start: NaiveTime,
    /// End of each day's scanning window.
    #[serde(with = "wall_time")]
    pub day_end: NaiveTime,
    /// Smallest free gap worth using, and the smallest block ever proposed.
    pub min_block_minutes: u32,
    /// Unit that greedy chunks and scan starts are rounded up to.
    pub granularity_minutes: u32,
    /// Cap on a single session derived from `estimated_hours`.
    pub max_session_minutes: u32,
    /// Time used for recurring goals without a usable preferred time.
    #[serde(with = "wall_time")]
    pub default_preferred_time: NaiveTime,
    pub dst_policy: DstPolicy,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            timezone: "UTC".to_string(),
            day_start: hm(8, 0),
            day_end: hm(21, 0),
            min_block_minutes: 15,
            granularity_minutes: 15,
            max_session_minutes: 120,
            default_preferred_time: hm(9, 0),
            dst_policy: DstPolicy::default(),
        }
    }
}

fn hm(hour: u32, minute: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or_default()
}

impl SchedulerConfig {
    /// Defaults with the given target timezone.
    pub fn with_timezone(timezone: impl Into<String>) -> Self {
        Self {
            timezone: timezone.into(),
            ..Self::default()
        }
    }

    /// Parse the configured timezone.
    ///
    /// # Errors
    /// Returns [`SchedulerError::InvalidTimezone`] for an unknown IANA identifier.
    pub fn tz(&self) -> Result<Tz> {
        self.timezone
            .parse()
            .map_err(|_| SchedulerError::InvalidTimezone(self.timezone.clone()))
    }

    /// Check the configuration for values the allocator cannot work with.
    ///
    /// # Errors
    /// Returns [`SchedulerError::InvalidTimezone`] or
    /// [`SchedulerError::InvalidConfig`].
    pub fn validate(&self) -> Result<()> {
        self.tz()?;
        if self.day_start >= self.day_end {
            return Err(SchedulerError::InvalidConfig(format!(
                "day_start {} must be before day_end {}",
                self.day_start.format("%H:%M"),
                self.day_end.format("%H:%M")
            )));
        }
        if self.granularity_minutes == 0 {
            return Err(SchedulerError::InvalidConfig(
                "granularity_minutes must be positive".to_string(),
            ));
        }
        if self.min_block_minutes == 0 {
            return Err(SchedulerError::InvalidConfig(
                "min_block_minutes must be positive".to_string(),
            ));
        }
        if self.max_session_minutes < self.min_block_minutes {
            return Err(SchedulerError::InvalidConfig(format!(
                "max_session_minutes {} is below min_block_minutes {}",
                self.max_session_minutes, self.min_block_minutes
            )));
        }
        Ok(())
    }
}

/// Serde adapter for `"HH:MM"` wall-clock times.
mod wall_time {
    use chrono::NaiveTime;
    use serde::{de, Deserialize, Deserializer, Serializer};

    use crate::dst::parse_wall_time;

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(&time.format("%H:%M"))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let raw = String::deserialize(deserializer)?;
        parse_wall_time(&raw)
            .ok_or_else(|| de::Error::custom(format!("invalid wall-clock time '{}'", raw)))
    }
}
