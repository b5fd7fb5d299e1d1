//! Results of allocation runs.
//!
//! Producing fewer blocks than a goal asked for is an expected outcome. These
//! types keep the requested amount next to what was placed so callers can
//! report "scheduled 4 of 6" instead of losing the difference.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::block::ProposedBlock;
use crate::freebusy::TimeSlot;
use crate::goal::Goal;

/// What a goal asked for in a batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Demand {
    /// One session at the preferred time.
    Session,
    /// One session per recurrence date inside the window.
    Occurrences(usize),
    /// Total effort in minutes, split over as many blocks as needed.
    Minutes(i64),
}

/// How much of a goal's demand a run satisfied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalOutcome {
    pub goal_id: String,
    pub demand: Demand,
    pub scheduled_blocks: usize,
    pub scheduled_minutes: i64,
}

impl GoalOutcome {
    pub fn new(goal: &Goal, demand: Demand, blocks: &[ProposedBlock]) -> Self {
        Self {
            goal_id: goal.id.clone(),
            demand,
            scheduled_blocks: blocks.len(),
            scheduled_minutes: blocks.iter().map(ProposedBlock::duration_minutes).sum(),
        }
    }

    pub fn is_complete(&self) -> bool {
        match self.demand {
            Demand::Session => self.scheduled_blocks >= 1,
            Demand::Occurrences(n) => self.scheduled_blocks >= n,
            Demand::Minutes(m) => self.scheduled_minutes >= m,
        }
    }
}

/// Output of a batch run: blocks in placement order, one outcome per goal in
/// allocation order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub blocks: Vec<ProposedBlock>,
    pub outcomes: Vec<GoalOutcome>,
}

impl Schedule {
    pub(crate) fn record(&mut self, outcome: GoalOutcome, blocks: Vec<ProposedBlock>) {
        self.outcomes.push(outcome);
        self.blocks.extend(blocks);
    }

    pub fn blocks_for<'a>(&'a self, goal_id: &'a str) -> impl Iterator<Item = &'a ProposedBlock> {
        self.blocks.iter().filter(move |b| b.goal_id == goal_id)
    }

    pub fn outcome_for(&self, goal_id: &str) -> Option<&GoalOutcome> {
        self.outcomes.iter().find(|o| o.goal_id == goal_id)
    }

    /// Goals that got less than they asked for.
    pub fn unfulfilled(&self) -> impl Iterator<Item = &GoalOutcome> {
        self.outcomes.iter().filter(|o| !o.is_complete())
    }
}

/// Output of expanding one recurring goal.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecurringSchedule {
    pub blocks: Vec<ProposedBlock>,
    /// Occurrences that fell inside the window before conflict checks.
    pub requested: usize,
}

impl RecurringSchedule {
    pub fn is_complete(&self) -> bool {
        self.blocks.len() >= self.requested
    }

    /// Occurrences skipped because of conflicts.
    pub fn missing(&self) -> usize {
        self.requested.saturating_sub(self.blocks.len())
    }
}

/// Free time of one local day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayAvailability {
    pub date: NaiveDate,
    pub slots: Vec<TimeSlot>,
}
