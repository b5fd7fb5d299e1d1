//! Availability calculator: free gaps between busy slots.
//!
//! Sorts busy slots by start time, merges overlapping periods, then walks a
//! cursor through the window emitting gaps that are at least the minimum block
//! size.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::block::BusySlot;

/// A free time slot `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSlot {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub duration_minutes: i64,
}

impl TimeSlot {
    fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self {
            start,
            end,
            duration_minutes: (end - start).num_minutes(),
        }
    }
}

/// Merge overlapping or adjacent busy periods, clipped to the given window.
///
/// Returns a sorted, non-overlapping list of `(start, end)` intervals.
pub fn merge_busy_periods(
    busy: &[BusySlot],
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
) -> Vec<(DateTime<Utc>, DateTime<Utc>)> {
    // Clip to the window, discarding slots entirely outside.
    let mut intervals: Vec<(DateTime<Utc>, DateTime<Utc>)> = busy
        .iter()
        .filter(|b| b.start < window_end && b.end > window_start)
        .map(|b| (b.start.max(window_start), b.end.min(window_end)))
        .collect();

    if intervals.is_empty() {
        return Vec::new();
    }

    intervals.sort_by_key(|&(start, end)| (start, end));

    let mut merged: Vec<(DateTime<Utc>, DateTime<Utc>)> = Vec::new();
    for (start, end) in intervals {
        if let Some(last) = merged.last_mut() {
            if start <= last.1 {
                last.1 = last.1.max(end);
                continue;
            }
        }
        merged.push((start, end));
    }

    merged
}

/// Free slots of at least `min_minutes` within `[window_start, window_end)`.
///
/// A gap exactly `min_minutes` long is included. Slots come back in
/// chronological order. An empty or inverted window has no free slots.
pub fn find_free_slots(
    busy: &[BusySlot],
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
    min_minutes: i64,
) -> Vec<TimeSlot> {
    if window_start >= window_end {
        return Vec::new();
    }

    let merged = merge_busy_periods(busy, window_start, window_end);

    let mut free_slots = Vec::new();
    let mut cursor = window_start;

    for (busy_start, busy_end) in &merged {
        if cursor < *busy_start {
            let slot = TimeSlot::new(cursor, *busy_start);
            if slot.duration_minutes >= min_minutes {
                free_slots.push(slot);
            }
        }
        cursor = cursor.max(*busy_end);
    }

    // Trailing free slot after the last busy period.
    if cursor < window_end {
        let slot = TimeSlot::new(cursor, window_end);
        if slot.duration_minutes >= min_minutes {
            free_slots.push(slot);
        }
    }

    free_slots
}

/// The first free slot of at least `min_minutes` within the window.
pub fn find_first_free_slot(
    busy: &[BusySlot],
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
    min_minutes: i64,
) -> Option<TimeSlot> {
    find_free_slots(busy, window_start, window_end, min_minutes)
        .into_iter()
        .next()
}
