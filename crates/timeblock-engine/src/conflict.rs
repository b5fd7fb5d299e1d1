//! Overlap detection between intervals.
//!
//! Intervals are half-open: adjacent intervals (where one ends exactly when
//! another starts) are NOT conflicts. Every conflict check in the allocator goes
//! through [`overlaps`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::block::BusySlot;

/// A detected conflict between two intervals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conflict {
    pub slot_a: BusySlot,
    pub slot_b: BusySlot,
    pub overlap_minutes: i64,
}

/// `[s1, e1)` and `[s2, e2)` conflict iff `s1 < e2 && e1 > s2`.
pub fn overlaps(
    start_a: DateTime<Utc>,
    end_a: DateTime<Utc>,
    start_b: DateTime<Utc>,
    end_b: DateTime<Utc>,
) -> bool {
    start_a < end_b && end_a > start_b
}

/// True when `[start, end)` overlaps any slot in `busy`.
pub fn has_conflict(start: DateTime<Utc>, end: DateTime<Utc>, busy: &[BusySlot]) -> bool {
    busy.iter().any(|b| overlaps(start, end, b.start, b.end))
}

/// Find all pairwise conflicts between two interval lists.
///
/// The overlap duration is `min(a.end, b.end) - max(a.start, b.start)`.
pub fn find_conflicts(slots_a: &[BusySlot], slots_b: &[BusySlot]) -> Vec<Conflict> {
    let mut conflicts = Vec::new();

    for a in slots_a {
        for b in slots_b {
            if overlaps(a.start, a.end, b.start, b.end) {
                let overlap_start = a.start.max(b.start);
                let overlap_end = a.end.min(b.end);
                conflicts.push(Conflict {
                    slot_a: *a,
                    slot_b: *b,
                    overlap_minutes: (overlap_end - overlap_start).num_minutes(),
                });
            }
        }
    }

    conflicts
}

/// Find conflicts among the intervals of a single list (each unordered pair once).
pub fn find_self_conflicts(slots: &[BusySlot]) -> Vec<Conflict> {
    let mut conflicts = Vec::new();
    for (i, a) in slots.iter().enumerate() {
        conflicts.extend(find_conflicts(std::slice::from_ref(a), &slots[i + 1..]));
    }
    conflicts
}
