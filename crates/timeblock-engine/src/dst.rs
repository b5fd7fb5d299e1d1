//! Wall-clock to instant resolution in the target timezone.
//!
//! The UTC offset of a zone is a function of the date, so every day boundary and
//! preferred time is resolved on its own date through `chrono-tz`. Local times
//! that fall into a DST gap or fold are settled by a [`DstPolicy`].

use chrono::{
    DateTime, Duration, LocalResult, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone, Utc,
};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

/// Upper bound when searching for the end of a DST gap. Real gaps are an hour
/// or less; a skipped calendar day is the extreme case.
const MAX_GAP_MINUTES: i64 = 48 * 60;

/// Policy for local times that fall during DST transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DstPolicy {
    /// Skip local times that fall in the DST gap (e.g., 2:30 AM during spring forward)
    Skip,
    /// Shift to the first valid minute after the gap
    ShiftForward,
    /// Keep the pre-transition UTC offset for times in the gap, so 02:30 in a
    /// one-hour gap lands on 03:30 after it
    #[default]
    WallClock,
}

impl DstPolicy {
    /// Resolve a local wall-clock datetime in `tz` to an absolute instant.
    ///
    /// Ambiguous times (the repeated hour at fall back) always take the earlier
    /// instant. Returns `None` only for a nonexistent time under [`DstPolicy::Skip`].
    pub fn resolve(self, tz: Tz, local: NaiveDateTime) -> Option<DateTime<Utc>> {
        match tz.from_local_datetime(&local) {
            LocalResult::Single(dt) => Some(dt.with_timezone(&Utc)),
            LocalResult::Ambiguous(earliest, _) => Some(earliest.with_timezone(&Utc)),
            LocalResult::None => match self {
                Self::Skip => None,
                Self::ShiftForward => first_valid_after(tz, local),
                Self::WallClock => {
                    with_offset_before(tz, local).or_else(|| first_valid_after(tz, local))
                }
            },
        }
    }
}

/// Interpret `local` with the offset that was in effect one day earlier.
fn with_offset_before(tz: Tz, local: NaiveDateTime) -> Option<DateTime<Utc>> {
    let probe = tz.from_local_datetime(&(local - Duration::days(1))).earliest()?;
    let offset_seconds = i64::from(probe.offset().fix().local_minus_utc());
    Some(Utc.from_utc_datetime(&(local - Duration::seconds(offset_seconds))))
}

fn first_valid_after(tz: Tz, local: NaiveDateTime) -> Option<DateTime<Utc>> {
    (1..=MAX_GAP_MINUTES).find_map(|minutes| {
        tz.from_local_datetime(&(local + Duration::minutes(minutes)))
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
    })
}

/// Resolve `time` on `date` in `tz` using `policy`.
pub fn resolve_wall_clock(
    tz: Tz,
    date: NaiveDate,
    time: NaiveTime,
    policy: DstPolicy,
) -> Option<DateTime<Utc>> {
    policy.resolve(tz, date.and_time(time))
}

/// Resolve a day boundary. Boundaries must always exist, so a nonexistent
/// local time moves forward past the gap.
pub fn day_boundary(tz: Tz, date: NaiveDate, time: NaiveTime) -> DateTime<Utc> {
    let local = date.and_time(time);
    DstPolicy::ShiftForward
        .resolve(tz, local)
        .unwrap_or_else(|| Utc.from_utc_datetime(&local))
}

/// The first instant after `date` ends in `tz` (local midnight of the next day).
pub fn end_of_date(tz: Tz, date: NaiveDate) -> DateTime<Utc> {
    let next = date.succ_opt().unwrap_or(date);
    day_boundary(tz, next, NaiveTime::MIN)
}

/// The calendar date of `instant` as seen in `tz`.
pub fn local_date(tz: Tz, instant: DateTime<Utc>) -> NaiveDate {
    instant.with_timezone(&tz).date_naive()
}

/// Every local calendar date touched by `[start, end)`, in order.
pub fn days_between(
    tz: Tz,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> impl Iterator<Item = NaiveDate> {
    let first = local_date(tz, start);
    let last = local_date(tz, end);
    let count = if start < end {
        usize::try_from((last - first).num_days() + 1).unwrap_or(0)
    } else {
        0
    };
    first.iter_days().take(count)
}

/// Parse an `"HH:MM"` (or `"HH:MM:SS"`) wall-clock time.
pub fn parse_wall_time(raw: &str) -> Option<NaiveTime> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .ok()
}

/// Round `instant` up to the next multiple of `minutes` since the Unix epoch.
///
/// Every zone in use today has an offset that is a whole number of quarter
/// hours, so a quarter-hour boundary in UTC is one in local time as well.
pub fn round_up(instant: DateTime<Utc>, minutes: u32) -> DateTime<Utc> {
    let step = i64::from(minutes.max(1)) * 60;
    let seconds = instant.timestamp();
    let aligned = seconds.rem_euclid(step) == 0 && instant.timestamp_subsec_nanos() == 0;
    if aligned {
        return instant;
    }
    let rounded = (seconds.div_euclid(step) + 1) * step;
    DateTime::from_timestamp(rounded, 0).unwrap_or(instant)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    #[test]
    fn offset_follows_the_date() {
        let tz = chrono_tz::America::New_York;
        // EST (UTC-5) before 2026-03-08, EDT (UTC-4) after.
        let before = DstPolicy::WallClock.resolve(tz, local(2026, 3, 6, 9, 0)).unwrap();
        let after = DstPolicy::WallClock.resolve(tz, local(2026, 3, 9, 9, 0)).unwrap();
        assert_eq!(before, Utc.with_ymd_and_hms(2026, 3, 6, 14, 0, 0).unwrap());
        assert_eq!(after, Utc.with_ymd_and_hms(2026, 3, 9, 13, 0, 0).unwrap());
    }

    #[test]
    fn gap_policies() {
        let tz = chrono_tz::America::New_York;
        // 02:30 does not exist on 2026-03-08.
        let gap = local(2026, 3, 8, 2, 30);
        assert_eq!(DstPolicy::Skip.resolve(tz, gap), None);
        assert_eq!(
            DstPolicy::ShiftForward.resolve(tz, gap),
            Some(Utc.with_ymd_and_hms(2026, 3, 8, 7, 0, 0).unwrap())
        );
        assert_eq!(
            DstPolicy::WallClock.resolve(tz, gap),
            Some(Utc.with_ymd_and_hms(2026, 3, 8, 7, 30, 0).unwrap())
        );
    }

    #[test]
    fn fold_takes_earlier_instant() {
        let tz = chrono_tz::America::New_York;
        // 01:30 happens twice on 2026-11-01; the EDT one comes first.
        let fold = local(2026, 11, 1, 1, 30);
        assert_eq!(
            DstPolicy::Skip.resolve(tz, fold),
            Some(Utc.with_ymd_and_hms(2026, 11, 1, 5, 30, 0).unwrap())
        );
    }

    #[test]
    fn parse_wall_time_accepts_both_forms() {
        assert_eq!(parse_wall_time("09:00"), NaiveTime::from_hms_opt(9, 0, 0));
        assert_eq!(parse_wall_time(" 7:30 "), NaiveTime::from_hms_opt(7, 30, 0));
        assert_eq!(parse_wall_time("18:45:00"), NaiveTime::from_hms_opt(18, 45, 0));
        assert_eq!(parse_wall_time("nine"), None);
        assert_eq!(parse_wall_time("25:00"), None);
    }

    #[test]
    fn round_up_to_quarter_hours() {
        let at = |h, m, s| Utc.with_ymd_and_hms(2026, 3, 2, h, m, s).unwrap();
        assert_eq!(round_up(at(10, 0, 0), 15), at(10, 0, 0));
        assert_eq!(round_up(at(10, 0, 1), 15), at(10, 15, 0));
        assert_eq!(round_up(at(10, 44, 0), 15), at(10, 45, 0));
    }

    #[test]
    fn days_between_is_inclusive_of_both_local_dates() {
        let tz = chrono_tz::UTC;
        let start = Utc.with_ymd_and_hms(2026, 3, 2, 8, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2026, 3, 4, 1, 0, 0).unwrap();
        let days: Vec<_> = days_between(tz, start, end).collect();
        assert_eq!(days.len(), 3);
        assert_eq!(days[0], NaiveDate::from_ymd_opt(2026, 3, 2).unwrap());
        assert_eq!(days_between(tz, end, start).count(), 0);
    }
}
