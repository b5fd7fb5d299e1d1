//! Tests for the overlap predicate and conflict reports.

use chrono::{DateTime, TimeZone, Utc};
use timeblock_engine::conflict::{find_self_conflicts, has_conflict};
use timeblock_engine::{find_conflicts, overlaps, BusySlot};

fn at(hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, hour, minute, 0).unwrap()
}

fn slot(start: (u32, u32), end: (u32, u32)) -> BusySlot {
    BusySlot::new(at(start.0, start.1), at(end.0, end.1))
}

#[test]
fn touching_intervals_do_not_conflict() {
    assert!(!overlaps(at(9, 0), at(10, 0), at(10, 0), at(11, 0)));
    assert!(!overlaps(at(10, 0), at(11, 0), at(9, 0), at(10, 0)));
}

#[test]
fn partial_and_nested_overlaps_conflict() {
    assert!(overlaps(at(9, 0), at(10, 30), at(10, 0), at(11, 0)));
    assert!(overlaps(at(9, 0), at(12, 0), at(10, 0), at(11, 0)));
    assert!(overlaps(at(10, 0), at(11, 0), at(10, 0), at(11, 0)));
}

#[test]
fn has_conflict_checks_every_slot() {
    let busy = vec![slot((8, 0), (9, 0)), slot((13, 0), (14, 0))];
    assert!(has_conflict(at(13, 30), at(14, 30), &busy));
    assert!(!has_conflict(at(9, 0), at(13, 0), &busy));
    assert!(!has_conflict(at(9, 0), at(13, 0), &[]));
}

#[test]
fn find_conflicts_reports_overlap_minutes() {
    let a = vec![slot((9, 0), (10, 0))];
    let b = vec![slot((9, 30), (11, 0)), slot((10, 0), (10, 30))];

    let conflicts = find_conflicts(&a, &b);
    assert_eq!(conflicts.len(), 1, "adjacent slot must not be reported");
    assert_eq!(conflicts[0].overlap_minutes, 30);
    assert_eq!(conflicts[0].slot_a, a[0]);
    assert_eq!(conflicts[0].slot_b, b[0]);
}

#[test]
fn self_conflicts_count_each_pair_once() {
    let slots = vec![
        slot((9, 0), (10, 0)),
        slot((9, 30), (10, 30)),
        slot((10, 15), (11, 0)),
        slot((12, 0), (13, 0)),
    ];
    let conflicts = find_self_conflicts(&slots);
    assert_eq!(conflicts.len(), 2);
    assert_eq!(conflicts[0].overlap_minutes, 30);
    assert_eq!(conflicts[1].overlap_minutes, 15);
}
