//! Slot allocator: places goals into free time.
//!
//! One placement core serves every operation. A strategy decides where
//! candidates come from:
//!
//! - fixed start times (preferred time on each day, or on each recurrence date),
//!   taking either the first conflict-free one or all of them;
//! - the first free slot of the day scan, trimmed to one session;
//! - greedy consumption of a goal's total effort across the day scans.
//!
//! Every block placed during a call is pushed into the run's [`BusySet`], so
//! later candidates (of the same goal or of other goals) never overlap it.
//! Nothing here reads the system clock: `now` is part of the [`Scheduler`].

use std::cmp::Reverse;

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use chrono_tz::Tz;
use log::{debug, trace};

use crate::availability::BusySet;
use crate::block::{BusySlot, ProposedBlock};
use crate::config::SchedulerConfig;
use crate::dst;
use crate::error::{Result, SchedulerError};
use crate::expander;
use crate::goal::{round_up_minutes, Goal, Recurrence};
use crate::schedule::{DayAvailability, Demand, GoalOutcome, RecurringSchedule, Schedule};

/// The span an operation may place blocks in, after clipping to `now` and to
/// hard deadlines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Window {
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    /// The caller's window start before clipping; recurrence cadence counts from it.
    anchor: DateTime<Utc>,
}

impl Window {
    fn is_empty(&self) -> bool {
        self.start >= self.end
    }
}

enum Strategy {
    /// Sessions at fixed instants, in order.
    AtTimes {
        starts: Vec<DateTime<Utc>>,
        first_only: bool,
    },
    /// One session carved from the first free slot.
    FirstFree,
    /// Split `minutes` of effort over free slots until it is used up.
    Consume { minutes: i64 },
}

/// Goals in the order they claim time: hard deadlines first, then by
/// descending priority. Ties keep input order.
pub fn allocation_order(goals: &[Goal]) -> Vec<&Goal> {
    let mut ordered: Vec<&Goal> = goals.iter().collect();
    ordered.sort_by_key(|g| (Reverse(g.is_hard_deadline), Reverse(g.priority)));
    ordered
}

/// Deterministic allocator bound to a configuration and a fixed "now".
#[derive(Debug, Clone)]
pub struct Scheduler {
    config: SchedulerConfig,
    tz: Tz,
    now: DateTime<Utc>,
}

impl Scheduler {
    /// # Errors
    /// Returns an error if `config` does not validate.
    pub fn new(config: SchedulerConfig, now: DateTime<Utc>) -> Result<Self> {
        config.validate()?;
        let tz = config.tz()?;
        Ok(Self { config, tz, now })
    }

    pub fn timezone(&self) -> Tz {
        self.tz
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.now
    }

    /// End of the goal's due date in the target timezone.
    pub fn deadline(&self, goal: &Goal) -> DateTime<Utc> {
        dst::end_of_date(self.tz, goal.due_date)
    }

    /// Place one session of a non-recurring goal.
    ///
    /// Tries the preferred time on each day first; if no day is free at that
    /// time (or there is no preferred time), takes the first free slot of the
    /// daily scan window, trimmed to the session length. `Ok(None)` means the
    /// window had no room.
    ///
    /// # Errors
    /// Returns an error for an invalid goal or an inverted window.
    pub fn find_next_slot(
        &self,
        goal: &Goal,
        busy: &[BusySlot],
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<Option<ProposedBlock>> {
        goal.validate()?;
        let window = self.search_window(goal, window_start, window_end)?;
        let mut busy = BusySet::new(busy);

        if let Some(time) = goal.preferred_wall_time() {
            let strategy = Strategy::AtTimes {
                starts: self.daily_starts(goal, time, window),
                first_only: true,
            };
            if let Some(block) = self.place(goal, &strategy, &mut busy, window).into_iter().next() {
                return Ok(Some(block));
            }
            debug!(
                "goal {}: no free day at {}, falling back to free-slot scan",
                goal.id,
                time.format("%H:%M")
            );
        }

        Ok(self
            .place(goal, &Strategy::FirstFree, &mut busy, window)
            .into_iter()
            .next())
    }

    /// Expand a recurring goal into one block per matching day.
    ///
    /// Occurrences that conflict with `busy` or with an earlier occurrence are
    /// skipped; [`RecurringSchedule::requested`] keeps the full count.
    ///
    /// # Errors
    /// Returns an error for an invalid goal, a goal without recurrence, an
    /// inverted window, or a recurrence the rule expander rejects.
    pub fn find_recurring_slots(
        &self,
        goal: &Goal,
        busy: &[BusySlot],
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<RecurringSchedule> {
        goal.validate()?;
        let recurrence = goal
            .recurring
            .as_ref()
            .ok_or_else(|| SchedulerError::InvalidGoal {
                goal_id: goal.id.clone(),
                reason: "goal has no recurrence".to_string(),
            })?;
        let window = self.search_window(goal, window_start, window_end)?;
        let time = goal
            .preferred_wall_time()
            .unwrap_or(self.config.default_preferred_time);

        let starts = self.recurring_starts(goal, recurrence, time, window)?;
        let requested = starts.len();
        let mut busy = BusySet::new(busy);
        let blocks = self.place(
            goal,
            &Strategy::AtTimes {
                starts,
                first_only: false,
            },
            &mut busy,
            window,
        );

        debug!(
            "goal {}: {} of {} occurrences scheduled",
            goal.id,
            blocks.len(),
            requested
        );
        Ok(RecurringSchedule { blocks, requested })
    }

    /// Fill a window with blocks for many goals at once.
    ///
    /// `busy` and `existing_blocks` are both treated as committed time. Goals
    /// are placed in [`allocation_order`], and each goal's blocks become busy
    /// time for the goals after it.
    ///
    /// # Errors
    /// Returns an error if any goal is invalid, the window is inverted, or a
    /// recurrence is rejected by the rule expander. No partial schedule is
    /// returned in that case.
    pub fn generate_schedule(
        &self,
        goals: &[Goal],
        busy: &[BusySlot],
        existing_blocks: &[ProposedBlock],
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<Schedule> {
        check_window(window_start, window_end)?;
        for goal in goals {
            goal.validate()?;
        }

        let mut busy = BusySet::from_sources(busy, existing_blocks);
        let mut schedule = Schedule::default();

        for goal in allocation_order(goals) {
            let window = self.search_window(goal, window_start, window_end)?;
            let (strategy, demand) = match (&goal.recurring, goal.preferred_wall_time()) {
                (Some(recurrence), Some(time)) => {
                    let starts = self.recurring_starts(goal, recurrence, time, window)?;
                    let demand = Demand::Occurrences(starts.len());
                    (
                        Strategy::AtTimes {
                            starts,
                            first_only: false,
                        },
                        demand,
                    )
                }
                (None, Some(time)) => (
                    Strategy::AtTimes {
                        starts: self.daily_starts(goal, time, window),
                        first_only: true,
                    },
                    Demand::Session,
                ),
                _ => {
                    let minutes = goal.total_minutes();
                    (Strategy::Consume { minutes }, Demand::Minutes(minutes))
                }
            };

            let blocks = self.place(goal, &strategy, &mut busy, window);
            let outcome = GoalOutcome::new(goal, demand, &blocks);
            debug!(
                "goal {} (priority {}, hard={}): {} blocks, {} min, demand {:?}",
                goal.id,
                goal.priority,
                goal.is_hard_deadline,
                outcome.scheduled_blocks,
                outcome.scheduled_minutes,
                outcome.demand
            );
            schedule.record(outcome, blocks);
        }

        Ok(schedule)
    }

    /// Free slots of each day's scan window, day by day.
    ///
    /// # Errors
    /// Returns [`SchedulerError::InvalidWindow`] for an inverted window.
    pub fn free_time(
        &self,
        busy: &[BusySlot],
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<Vec<DayAvailability>> {
        let window = self.window(window_start, window_end)?;
        let busy = BusySet::new(busy);
        let min = i64::from(self.config.min_block_minutes);

        Ok(dst::days_between(self.tz, window.start, window.end)
            .filter_map(|date| {
                let (start, end) = self.scan_bounds(date, window)?;
                Some(DayAvailability {
                    date,
                    slots: busy.free_slots(start, end, min),
                })
            })
            .collect())
    }

    // ── Placement core ──────────────────────────────────────────────────────

    fn place(
        &self,
        goal: &Goal,
        strategy: &Strategy,
        busy: &mut BusySet,
        window: Window,
    ) -> Vec<ProposedBlock> {
        let mut placed = Vec::new();
        if window.is_empty() {
            trace!("goal {}: empty window", goal.id);
            return placed;
        }
        let session = goal.session_minutes(&self.config);
        let min_block = i64::from(self.config.min_block_minutes);

        match strategy {
            Strategy::AtTimes { starts, first_only } => {
                for &start in starts {
                    let end = start + Duration::minutes(session);
                    if busy.conflicts(start, end) {
                        debug!("goal {}: {} conflicts, skipped", goal.id, start);
                        continue;
                    }
                    let block = ProposedBlock::for_goal(goal, start, end);
                    busy.push(&block);
                    placed.push(block);
                    if *first_only {
                        break;
                    }
                }
            }
            Strategy::FirstFree => {
                for date in dst::days_between(self.tz, window.start, window.end) {
                    let Some((start, end)) = self.scan_bounds(date, window) else {
                        continue;
                    };
                    if let Some(slot) = busy.free_slots(start, end, min_block).first() {
                        let minutes = session.min(slot.duration_minutes);
                        let block = ProposedBlock::for_goal(
                            goal,
                            slot.start,
                            slot.start + Duration::minutes(minutes),
                        );
                        busy.push(&block);
                        placed.push(block);
                        break;
                    }
                    trace!("goal {}: {} has no free slot", goal.id, date);
                }
            }
            Strategy::Consume { minutes } => {
                let mut remaining = *minutes;
                for date in dst::days_between(self.tz, window.start, window.end) {
                    if remaining <= 0 {
                        break;
                    }
                    let Some((start, end)) = self.scan_bounds(date, window) else {
                        continue;
                    };
                    for slot in busy.free_slots(start, end, min_block) {
                        if remaining <= 0 {
                            break;
                        }
                        let chunk = self.chunk_minutes(remaining, slot.duration_minutes);
                        let block = ProposedBlock::for_goal(
                            goal,
                            slot.start,
                            slot.start + Duration::minutes(chunk),
                        );
                        trace!("goal {}: {} min on {}", goal.id, chunk, date);
                        busy.push(&block);
                        placed.push(block);
                        remaining -= chunk;
                    }
                }
                if remaining > 0 {
                    debug!(
                        "goal {}: window exhausted with {} of {} min unplaced",
                        goal.id, remaining, minutes
                    );
                }
            }
        }

        placed
    }

    /// Minutes to carve from a free slot: the remaining effort rounded up to
    /// the granularity, clamped to the slot, and never below the minimum block.
    fn chunk_minutes(&self, remaining: i64, free: i64) -> i64 {
        let granularity = i64::from(self.config.granularity_minutes);
        let min_block = i64::from(self.config.min_block_minutes);
        round_up_minutes(remaining.min(free), granularity)
            .max(min_block)
            .min(free)
    }

    // ── Candidates and windows ──────────────────────────────────────────────

    /// The preferred time on every day of the window.
    fn daily_starts(&self, goal: &Goal, time: NaiveTime, window: Window) -> Vec<DateTime<Utc>> {
        let dates = dst::days_between(self.tz, window.start, window.end);
        self.candidate_starts(goal, dates, time, window)
    }

    /// The preferred time on every recurrence date of the window.
    fn recurring_starts(
        &self,
        goal: &Goal,
        recurrence: &Recurrence,
        time: NaiveTime,
        window: Window,
    ) -> Result<Vec<DateTime<Utc>>> {
        if window.is_empty() {
            return Ok(Vec::new());
        }
        let dates = expander::occurrence_dates(
            recurrence,
            self.tz,
            dst::local_date(self.tz, window.anchor),
            dst::local_date(self.tz, window.start),
            dst::local_date(self.tz, window.end),
        )?;
        Ok(self.candidate_starts(goal, dates, time, window))
    }

    /// Resolve `time` on each date and keep the sessions that start strictly
    /// after `now` and lie entirely inside the window.
    fn candidate_starts(
        &self,
        goal: &Goal,
        dates: impl IntoIterator<Item = NaiveDate>,
        time: NaiveTime,
        window: Window,
    ) -> Vec<DateTime<Utc>> {
        let session = Duration::minutes(goal.session_minutes(&self.config));
        dates
            .into_iter()
            .filter_map(|date| {
                let Some(start) =
                    dst::resolve_wall_clock(self.tz, date, time, self.config.dst_policy)
                else {
                    trace!("{} {}: skipped by DST policy", date, time.format("%H:%M"));
                    return None;
                };
                let inside = start > self.now
                    && start >= window.start
                    && start + session <= window.end;
                inside.then_some(start)
            })
            .collect()
    }

    /// The part of `date`'s scan window (day_start..day_end) inside `window`.
    /// A window start inside the day is rounded up to the granularity.
    fn scan_bounds(
        &self,
        date: NaiveDate,
        window: Window,
    ) -> Option<(DateTime<Utc>, DateTime<Utc>)> {
        let day_start = dst::day_boundary(self.tz, date, self.config.day_start);
        let day_end = dst::day_boundary(self.tz, date, self.config.day_end);
        let start = day_start.max(dst::round_up(window.start, self.config.granularity_minutes));
        let end = day_end.min(window.end);
        (start < end).then_some((start, end))
    }

    fn window(&self, window_start: DateTime<Utc>, window_end: DateTime<Utc>) -> Result<Window> {
        check_window(window_start, window_end)?;
        Ok(Window {
            start: window_start.max(self.now),
            end: window_end,
            anchor: window_start,
        })
    }

    fn search_window(
        &self,
        goal: &Goal,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> Result<Window> {
        let mut window = self.window(window_start, window_end)?;
        if goal.is_hard_deadline {
            window.end = window.end.min(self.deadline(goal));
        }
        Ok(window)
    }
}

fn check_window(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<()> {
    if start > end {
        return Err(SchedulerError::InvalidWindow { start, end });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn scheduler() -> Scheduler {
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap();
        Scheduler::new(SchedulerConfig::default(), now).unwrap()
    }

    #[test]
    fn chunk_rounds_up_then_clamps_to_slot() {
        let s = scheduler();
        // 40 remaining in a 52-minute gap: round 40 up to 45, fits.
        assert_eq!(s.chunk_minutes(40, 52), 45);
        // 60 remaining in a 52-minute gap: take the whole gap.
        assert_eq!(s.chunk_minutes(60, 52), 52);
        // 8 remaining: never shorter than the minimum block.
        assert_eq!(s.chunk_minutes(8, 120), 15);
        assert_eq!(s.chunk_minutes(120, 120), 120);
    }

    #[test]
    fn scan_bounds_round_window_start_up() {
        let s = scheduler();
        let date = NaiveDate::from_ymd_opt(2026, 3, 2).unwrap();
        let window = Window {
            start: Utc.with_ymd_and_hms(2026, 3, 2, 10, 7, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2026, 3, 3, 0, 0, 0).unwrap(),
            anchor: Utc.with_ymd_and_hms(2026, 3, 2, 0, 0, 0).unwrap(),
        };
        let (start, end) = s.scan_bounds(date, window).unwrap();
        assert_eq!(start, Utc.with_ymd_and_hms(2026, 3, 2, 10, 15, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2026, 3, 2, 21, 0, 0).unwrap());
    }

    #[test]
    fn allocation_order_is_stable() {
        let due = NaiveDate::from_ymd_opt(2026, 3, 20).unwrap();
        let goals = vec![
            Goal::new("a", "a", 1.0, due).with_priority(2),
            Goal::new("b", "b", 1.0, due).with_priority(5),
            Goal::new("c", "c", 1.0, due).with_priority(2).hard_deadline(),
            Goal::new("d", "d", 1.0, due).with_priority(5),
            Goal::new("e", "e", 1.0, due).with_priority(1).hard_deadline(),
        ];
        let ids: Vec<&str> = allocation_order(&goals)
            .iter()
            .map(|g| g.id.as_str())
            .collect();
        assert_eq!(ids, vec!["c", "e", "b", "d", "a"]);
    }

    #[test]
    fn scheduler_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Scheduler>();
    }
}
