//! # timeblock-engine
//!
//! Deterministic time-block allocation for goals on a user's calendar.
//!
//! Given goals (effort, deadline, priority, optional preferred time and weekly
//! recurrence), the busy intervals already on the calendar, and a search window,
//! the engine proposes non-overlapping blocks. It is a greedy first-fit
//! allocator: hard deadlines and higher priorities claim time first, and every
//! wall-clock computation resolves through the target timezone's offset for
//! that specific date via `chrono-tz`.
//!
//! The engine performs no I/O and never reads the system clock; "now" is passed
//! into [`Scheduler::new`].
//!
//! ## Modules
//!
//! - [`allocator`]: the [`Scheduler`]: next slot, recurring expansion, batch schedule
//! - [`freebusy`]: availability calculator (free gaps between busy slots)
//! - [`availability`]: the busy set an allocation run accumulates
//! - [`conflict`]: the half-open overlap predicate and conflict reports
//! - [`expander`]: weekday recurrence → occurrence dates (via `rrule`)
//! - [`dst`]: wall-clock → instant resolution and DST policies
//! - [`goal`], [`block`], [`schedule`]: input and output records
//! - [`config`]: [`SchedulerConfig`]
//! - [`error`]: error types

pub mod allocator;
pub mod availability;
pub mod block;
pub mod config;
pub mod conflict;
pub mod dst;
pub mod error;
pub mod expander;
pub mod freebusy;
pub mod goal;
pub mod schedule;

pub use allocator::{allocation_order, Scheduler};
pub use block::{BusySlot, ProposedBlock};
pub use config::SchedulerConfig;
pub use conflict::{find_conflicts, overlaps, Conflict};
pub use dst::DstPolicy;
pub use error::SchedulerError;
pub use freebusy::{find_free_slots, TimeSlot};
pub use goal::{Cadence, CalendarType, Goal, Recurrence};
pub use schedule::{DayAvailability, Demand, GoalOutcome, RecurringSchedule, Schedule};
