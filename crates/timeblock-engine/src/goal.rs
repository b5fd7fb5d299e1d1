//! Goals: the units of work the allocator places on the calendar.

use chrono::{NaiveDate, NaiveTime, Weekday};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::config::SchedulerConfig;
use crate::dst;
use crate::error::{Result, SchedulerError};

/// Lowest accepted priority.
pub const MIN_PRIORITY: u8 = 1;
/// Highest accepted priority (most urgent).
pub const MAX_PRIORITY: u8 = 5;

/// Which of the user's two calendar identities a block belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CalendarType {
    Work,
    Personal,
}

/// How often the weekday pattern of a [`Recurrence`] repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Cadence {
    #[default]
    Weekly,
    /// Every other week, counted from the week containing the window start.
    Biweekly,
}

impl Cadence {
    /// RRULE `INTERVAL` for this cadence.
    pub fn interval(self) -> u32 {
        match self {
            Self::Weekly => 1,
            Self::Biweekly => 2,
        }
    }
}

/// Weekday pattern for goals that repeat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recurrence {
    pub days: Vec<Weekday>,
    #[serde(default)]
    pub cadence: Cadence,
}

impl Recurrence {
    pub fn weekly(days: impl IntoIterator<Item = Weekday>) -> Self {
        Self {
            days: days.into_iter().collect(),
            cadence: Cadence::Weekly,
        }
    }
}

/// A unit of work to schedule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub id: String,
    pub title: String,
    /// Total effort across all sessions.
    pub estimated_hours: f64,
    /// Length of a single session. Derived from `estimated_hours` when absent.
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    #[serde(default)]
    pub is_hard_deadline: bool,
    #[serde(default = "default_priority")]
    pub priority: u8,
    #[serde(default)]
    pub is_work: bool,
    /// `"HH:MM"` in the target timezone. Unparseable values count as absent.
    #[serde(default)]
    pub preferred_time: Option<String>,
    #[serde(default)]
    pub recurring: Option<Recurrence>,
    pub due_date: NaiveDate,
}

fn default_priority() -> u8 {
    3
}

impl Goal {
    /// A flexible, personal goal of default priority with no time preferences.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        estimated_hours: f64,
        due_date: NaiveDate,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            estimated_hours,
            duration_minutes: None,
            is_hard_deadline: false,
            priority: default_priority(),
            is_work: false,
            preferred_time: None,
            recurring: None,
            due_date,
        }
    }

    pub fn with_priority(mut self, priority: u8) -> Self {
        self.priority = priority;
        self
    }

    pub fn with_duration(mut self, minutes: u32) -> Self {
        self.duration_minutes = Some(minutes);
        self
    }

    pub fn with_preferred_time(mut self, time: impl Into<String>) -> Self {
        self.preferred_time = Some(time.into());
        self
    }

    pub fn with_recurrence(mut self, recurrence: Recurrence) -> Self {
        self.recurring = Some(recurrence);
        self
    }

    pub fn hard_deadline(mut self) -> Self {
        self.is_hard_deadline = true;
        self
    }

    pub fn work(mut self) -> Self {
        self.is_work = true;
        self
    }

    /// Reject goals that break the record invariants.
    ///
    /// # Errors
    /// Returns [`SchedulerError::InvalidGoal`] for a priority outside 1–5, a
    /// non-positive (or non-finite) `estimated_hours`, or a session shorter than
    /// 15 minutes.
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| SchedulerError::InvalidGoal {
            goal_id: self.id.clone(),
            reason,
        };

        if !(MIN_PRIORITY..=MAX_PRIORITY).contains(&self.priority) {
            return Err(invalid(format!(
                "priority {} outside {MIN_PRIORITY}..={MAX_PRIORITY}",
                self.priority
            )));
        }
        if !self.estimated_hours.is_finite() || self.estimated_hours <= 0.0 {
            return Err(invalid(format!(
                "estimated_hours must be positive, got {}",
                self.estimated_hours
            )));
        }
        if let Some(minutes) = self.duration_minutes {
            if minutes < 15 {
                return Err(invalid(format!(
                    "duration_minutes must be at least 15, got {minutes}"
                )));
            }
        }
        Ok(())
    }

    pub fn calendar_type(&self) -> CalendarType {
        if self.is_work {
            CalendarType::Work
        } else {
            CalendarType::Personal
        }
    }

    /// The preferred wall-clock time, if present and parseable.
    pub fn preferred_wall_time(&self) -> Option<NaiveTime> {
        let raw = self.preferred_time.as_deref()?;
        let parsed = dst::parse_wall_time(raw);
        if parsed.is_none() {
            warn!(
                "goal {}: ignoring unparseable preferred_time {:?}",
                self.id, raw
            );
        }
        parsed
    }

    /// Total effort in whole minutes, rounded up.
    pub fn total_minutes(&self) -> i64 {
        // estimated_hours is validated finite and positive before use.
        #[allow(clippy::cast_possible_truncation)]
        let minutes = (self.estimated_hours * 60.0).ceil() as i64;
        minutes.max(1)
    }

    /// Length of one session in minutes.
    ///
    /// An explicit `duration_minutes` wins. Otherwise the total effort is
    /// rounded up to the granularity and capped at `max_session_minutes`.
    pub fn session_minutes(&self, config: &SchedulerConfig) -> i64 {
        if let Some(minutes) = self.duration_minutes {
            return i64::from(minutes);
        }
        let granularity = i64::from(config.granularity_minutes.max(1));
        let rounded = round_up_minutes(self.total_minutes(), granularity);
        rounded
            .min(i64::from(config.max_session_minutes))
            .max(i64::from(config.min_block_minutes))
    }
}

/// Round `minutes` up to the next multiple of `granularity`.
pub(crate) fn round_up_minutes(minutes: i64, granularity: i64) -> i64 {
    let granularity = granularity.max(1);
    minutes.saturating_add(granularity - 1).div_euclid(granularity) * granularity
}
