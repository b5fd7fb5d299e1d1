//! Error types for scheduling operations.
//!
//! Only caller bugs end up here. "No slot found" and partial fulfilment are
//! ordinary results and never surface as errors.

use chrono::{DateTime, Utc};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum SchedulerError {
    #[error("Invalid timezone: {0}")]
    InvalidTimezone(String),

    #[error("Invalid RRULE: {0}")]
    InvalidRule(String),

    #[error("Invalid goal '{goal_id}': {reason}")]
    InvalidGoal { goal_id: String, reason: String },

    #[error("Invalid window: start {start} is after end {end}")]
    InvalidWindow {
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    },

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, SchedulerError>;
