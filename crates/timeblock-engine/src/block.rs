//! Busy intervals going in, proposed blocks coming out.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::goal::{CalendarType, Goal};

/// An externally committed interval `[start, end)`.
///
/// Source-agnostic: calendar events and previously accepted blocks look the
/// same. Slots may overlap or touch; nothing assumes they are merged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BusySlot {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl BusySlot {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }
}

/// A tentative allocation for a goal, not yet committed to any calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProposedBlock {
    pub goal_id: String,
    pub goal_title: String,
    pub calendar_type: CalendarType,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl ProposedBlock {
    pub fn for_goal(goal: &Goal, start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            goal_id: goal.id.clone(),
            goal_title: goal.title.clone(),
            calendar_type: goal.calendar_type(),
            start,
            end,
        }
    }

    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    /// The interval this block occupies once it is treated as busy time.
    pub fn as_busy(&self) -> BusySlot {
        BusySlot::new(self.start, self.end)
    }
}

impl From<&ProposedBlock> for BusySlot {
    fn from(block: &ProposedBlock) -> Self {
        block.as_busy()
    }
}
