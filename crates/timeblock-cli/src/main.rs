//! `timeblock` CLI: propose calendar blocks for goals from the command line.
//!
//! Every subcommand reads one JSON request from a file or stdin:
//!
//! ```json
//! {
//!   "window_start": "2026-03-02T05:00:00Z",
//!   "window_end": "2026-03-09T05:00:00Z",
//!   "goals": [ ... ],
//!   "busy": [ { "start": "...", "end": "..." } ],
//!   "existing_blocks": [ ... ],
//!   "now": "2026-03-01T12:00:00Z"
//! }
//! ```
//!
//! and prints the result as pretty-printed JSON.
//!
//! ## Usage
//!
//! ```sh
//! # Batch schedule every goal in the request
//! timeblock schedule -i request.json
//!
//! # Next slot for one goal, in New York time
//! timeblock next --goal write-report --timezone America/New_York -i request.json
//!
//! # Expand a recurring goal with settings from a TOML file
//! timeblock recurring --config scheduler.toml -i request.json -o blocks.json
//!
//! # Free time per day
//! cat request.json | timeblock free
//!
//! # Show per-goal decisions
//! RUST_LOG=timeblock_engine=debug timeblock schedule -i request.json
//! ```

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand};
use log::{debug, info};
use serde::Deserialize;
use serde_json::json;
use std::io::{self, Read};
use timeblock_engine::{BusySlot, Goal, ProposedBlock, Scheduler, SchedulerConfig};

#[derive(Parser)]
#[command(
    name = "timeblock",
    version,
    about = "Propose calendar time blocks for goals"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Scheduler settings file (TOML)
    #[arg(long, global = true)]
    config: Option<String>,

    /// Target IANA timezone, overrides the config file
    #[arg(long, global = true)]
    timezone: Option<String>,

    /// Current instant (RFC 3339), overrides the request's "now"
    #[arg(long, global = true)]
    now: Option<String>,

    /// Input file (reads from stdin if omitted)
    #[arg(short, long, global = true)]
    input: Option<String>,

    /// Output file (writes to stdout if omitted)
    #[arg(short, long, global = true)]
    output: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Find the next free session for one goal
    Next {
        /// Goal id (defaults to the first goal in the request)
        #[arg(long)]
        goal: Option<String>,
    },
    /// Expand a recurring goal into one block per matching day
    Recurring {
        /// Goal id (defaults to the first goal in the request)
        #[arg(long)]
        goal: Option<String>,
    },
    /// Schedule every goal in the request
    Schedule,
    /// List free slots of each day in the window
    Free,
}

/// A calendar snapshot plus the goals to place in it.
#[derive(Debug, Deserialize)]
struct Request {
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
    #[serde(default)]
    goals: Vec<Goal>,
    #[serde(default)]
    busy: Vec<BusySlot>,
    #[serde(default)]
    existing_blocks: Vec<ProposedBlock>,
    #[serde(default)]
    now: Option<DateTime<Utc>>,
}

impl Request {
    fn goal(&self, id: Option<&str>) -> Result<&Goal> {
        match id {
            Some(id) => self
                .goals
                .iter()
                .find(|g| g.id == id)
                .with_context(|| format!("No goal with id '{}' in request", id)),
            None => self
                .goals
                .first()
                .context("Request contains no goals"),
        }
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let config = load_config(cli.config.as_deref(), cli.timezone.as_deref())?;
    let raw = read_input(cli.input.as_deref())?;
    let request: Request = serde_json::from_str(&raw).context("Failed to parse request JSON")?;
    let now = resolve_now(cli.now.as_deref(), request.now)?;

    let scheduler = Scheduler::new(config, now).context("Invalid scheduler configuration")?;
    debug!(
        "scheduling in {} with now = {}",
        scheduler.timezone(),
        scheduler.now()
    );

    let value = match cli.command {
        Commands::Next { goal } => {
            let goal = request.goal(goal.as_deref())?;
            let block = scheduler
                .find_next_slot(goal, &request.busy, request.window_start, request.window_end)
                .with_context(|| format!("Failed to find a slot for goal '{}'", goal.id))?;
            json!({ "goal_id": goal.id, "block": block })
        }
        Commands::Recurring { goal } => {
            let goal = request.goal(goal.as_deref())?;
            let result = scheduler
                .find_recurring_slots(goal, &request.busy, request.window_start, request.window_end)
                .with_context(|| format!("Failed to expand recurring goal '{}'", goal.id))?;
            info!(
                "{}: {} of {} occurrences scheduled",
                goal.id,
                result.blocks.len(),
                result.requested
            );
            serde_json::to_value(&result)?
        }
        Commands::Schedule => {
            let schedule = scheduler
                .generate_schedule(
                    &request.goals,
                    &request.busy,
                    &request.existing_blocks,
                    request.window_start,
                    request.window_end,
                )
                .context("Failed to generate schedule")?;
            for outcome in schedule.unfulfilled() {
                info!(
                    "{}: demand {:?} not fully met ({} blocks, {} min)",
                    outcome.goal_id,
                    outcome.demand,
                    outcome.scheduled_blocks,
                    outcome.scheduled_minutes
                );
            }
            serde_json::to_value(&schedule)?
        }
        Commands::Free => {
            let mut busy = request.busy.clone();
            busy.extend(request.existing_blocks.iter().map(ProposedBlock::as_busy));
            let days = scheduler
                .free_time(&busy, request.window_start, request.window_end)
                .context("Failed to compute free time")?;
            serde_json::to_value(&days)?
        }
    };

    let mut pretty = serde_json::to_string_pretty(&value)?;
    pretty.push('\n');
    write_output(cli.output.as_deref(), &pretty)
}

/// Load settings from `path` (or defaults) and apply the `--timezone` override.
fn load_config(path: Option<&str>, timezone: Option<&str>) -> Result<SchedulerConfig> {
    let mut config = match path {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path))?;
            toml::from_str(&raw)
                .with_context(|| format!("Failed to parse config file: {}", path))?
        }
        None => SchedulerConfig::default(),
    };
    if let Some(tz) = timezone {
        config.timezone = tz.to_string();
    }
    Ok(config)
}

/// The flag wins over the request; the system clock is the last resort.
fn resolve_now(flag: Option<&str>, from_request: Option<DateTime<Utc>>) -> Result<DateTime<Utc>> {
    if let Some(raw) = flag {
        let parsed = DateTime::parse_from_rfc3339(raw)
            .with_context(|| format!("Invalid --now value: '{}' (expected RFC 3339)", raw))?;
        return Ok(parsed.with_timezone(&Utc));
    }
    Ok(from_request.unwrap_or_else(Utc::now))
}

fn read_input(path: Option<&str>) -> Result<String> {
    match path {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("Failed to read file: {}", path))
        }
        None => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read from stdin")?;
            Ok(buf)
        }
    }
}

fn write_output(path: Option<&str>, content: &str) -> Result<()> {
    match path {
        Some(path) => {
            std::fs::write(path, content)
                .with_context(|| format!("Failed to write file: {}", path))?;
        }
        None => {
            print!("{}", content);
        }
    }
    Ok(())
}
