//! The working busy set of one allocation run.
//!
//! Busy time comes from several sources: the external calendar, blocks the user
//! already accepted, and blocks proposed earlier in the same run. They are
//! flattened into one list so every candidate is checked against all of them
//! with the same conflict predicate.

use chrono::{DateTime, Utc};

use crate::block::{BusySlot, ProposedBlock};
use crate::conflict;
use crate::freebusy::{self, TimeSlot};

/// Busy intervals a run must not overlap. Grows as blocks are proposed.
#[derive(Debug, Clone, Default)]
pub struct BusySet {
    slots: Vec<BusySlot>,
}

impl BusySet {
    pub fn new(busy: &[BusySlot]) -> Self {
        Self {
            slots: busy.to_vec(),
        }
    }

    /// External busy slots plus blocks committed by earlier runs.
    pub fn from_sources(busy: &[BusySlot], existing: &[ProposedBlock]) -> Self {
        let mut set = Self::new(busy);
        set.slots.extend(existing.iter().map(BusySlot::from));
        set
    }

    /// Record a block proposed in this run so later candidates avoid it.
    pub fn push(&mut self, block: &ProposedBlock) {
        self.slots.push(block.as_busy());
    }

    pub fn conflicts(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        conflict::has_conflict(start, end, &self.slots)
    }

    /// Free slots of at least `min_minutes` between `start` and `end`.
    pub fn free_slots(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        min_minutes: i64,
    ) -> Vec<TimeSlot> {
        freebusy::find_free_slots(&self.slots, start, end, min_minutes)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
