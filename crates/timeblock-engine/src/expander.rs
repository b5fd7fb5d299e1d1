//! Recurrence expansion: weekday patterns into concrete occurrence dates.
//!
//! Builds an RFC 5545 rule (`FREQ=WEEKLY;INTERVAL=n;BYDAY=..`) and expands it
//! with the `rrule` crate. The rule is anchored at local noon, which no zone
//! skips, and yields *dates* only; the preferred time of each date is resolved
//! afterwards through the DST policy.

use chrono::{Datelike, Duration, NaiveDate, NaiveTime, Weekday};
use chrono_tz::Tz;
use rrule::RRuleSet;

use crate::dst;
use crate::error::{Result, SchedulerError};
use crate::goal::Recurrence;

fn byday(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "MO",
        Weekday::Tue => "TU",
        Weekday::Wed => "WE",
        Weekday::Thu => "TH",
        Weekday::Fri => "FR",
        Weekday::Sat => "SA",
        Weekday::Sun => "SU",
    }
}

/// Build the RRULE text block for `recurrence`, anchored on `anchor` and
/// running through the end of `last`.
fn rule_text(recurrence: &Recurrence, tz: Tz, anchor: NaiveDate, last: NaiveDate) -> String {
    let noon = NaiveTime::from_hms_opt(12, 0, 0).unwrap_or_default();

    let mut days: Vec<Weekday> = recurrence.days.clone();
    days.sort_by_key(|d| d.num_days_from_monday());
    days.dedup();
    let codes: Vec<&str> = days.into_iter().map(byday).collect();

    let dtstart = anchor.and_time(noon).format("%Y%m%dT%H%M%S");
    // rrule only accepts a UTC UNTIL next to a zoned DTSTART.
    let until = (dst::end_of_date(tz, last) - Duration::seconds(1)).format("%Y%m%dT%H%M%SZ");

    format!(
        "DTSTART;TZID={}:{}\nRRULE:FREQ=WEEKLY;INTERVAL={};BYDAY={};UNTIL={}",
        tz.name(),
        dtstart,
        recurrence.cadence.interval(),
        codes.join(","),
        until
    )
}

/// Dates in `[first, last]` (local to `tz`) on which `recurrence` occurs.
///
/// `anchor` is the date the cadence counts from: a biweekly recurrence falls
/// in the week containing `anchor` and every other week after it. Passing a
/// fixed anchor keeps the alternation stable however `first` moves.
///
/// # Errors
/// Returns [`SchedulerError::InvalidRule`] if the generated rule is rejected.
pub fn occurrence_dates(
    recurrence: &Recurrence,
    tz: Tz,
    anchor: NaiveDate,
    first: NaiveDate,
    last: NaiveDate,
) -> Result<Vec<NaiveDate>> {
    let anchor = anchor.min(first);
    if recurrence.days.is_empty() || last < first {
        return Ok(Vec::new());
    }

    let rrule_set: RRuleSet = rule_text(recurrence, tz, anchor, last)
        .parse()
        .map_err(|e| SchedulerError::InvalidRule(format!("{}", e)))?;

    // At most one occurrence per day in range, plus DTSTART itself.
    let span = (last - anchor).num_days() + 2;
    let max_count = u16::try_from(span).unwrap_or(u16::MAX);

    let dates = rrule_set
        .all(max_count)
        .dates
        .into_iter()
        .map(|dt| dt.date_naive())
        .filter(|date| *date >= first && *date <= last)
        .filter(|date| recurrence.days.contains(&date.weekday()))
        .collect();

    Ok(dates)
}
