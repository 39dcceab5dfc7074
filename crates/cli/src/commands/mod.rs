// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Command definitions and dispatch.

pub mod meeting;
pub mod ops;
pub mod queue;

use anyhow::Result;
use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "cmv", about = "Municipal meeting-video pipeline", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// List jobs in a queue, optionally filtered by state
    List {
        /// Queue name (download, extract, upload, diarize)
        queue: String,
        /// Job state (waiting, active, delayed, completed, failed)
        state: Option<String>,
        /// Maximum number of jobs to show
        #[arg(long, default_value = "50")]
        limit: usize,
        /// Emit JSON
        #[arg(long)]
        json: bool,
    },
    /// Show per-state job counts for a queue
    Stats {
        queue: String,
        #[arg(long)]
        json: bool,
    },
    /// Enqueue a job for a meeting
    Add {
        queue: String,
        meeting_id: String,
    },
    /// Move a failed job back to waiting
    Retry {
        queue: String,
        job_id: String,
    },
    /// Remove a job outright
    Remove {
        queue: String,
        job_id: String,
    },
    /// Remove aged jobs in a state
    Clean {
        queue: String,
        state: String,
        /// Minimum age in seconds
        #[arg(long, default_value = "3600")]
        min_age_secs: u64,
    },
    /// Remove all jobs in a state regardless of age
    Clear {
        queue: String,
        state: String,
    },
    /// Show a meeting's phase, artifacts, and per-queue jobs
    Meeting {
        meeting_id: String,
        #[arg(long)]
        json: bool,
    },
    /// Reset a failed meeting to a phase and enqueue its job
    Restart {
        meeting_id: String,
        phase: String,
    },
    /// Force a meeting's phase without enqueuing anything
    SetState {
        meeting_id: String,
        phase: String,
    },
    /// Run one discovery pass against the calendar
    Discover {
        /// Range start, ISO-8601 with offset (default: start of this month)
        #[arg(long)]
        start: Option<String>,
        /// Range end, ISO-8601 with offset (default: start of next month)
        #[arg(long)]
        end: Option<String>,
    },
    /// Enqueue missing jobs and requeue stale active ones
    Reconcile,
    /// Run a phase worker until shutdown
    Worker {
        /// Queue to work (download, extract, upload, diarize)
        queue: String,
    },
}

pub async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::List { queue, state, limit, json } => queue::list(&queue, state.as_deref(), limit, json),
        Command::Stats { queue, json } => queue::stats(&queue, json),
        Command::Add { queue, meeting_id } => queue::add(&queue, &meeting_id),
        Command::Retry { queue, job_id } => queue::retry(&queue, &job_id),
        Command::Remove { queue, job_id } => queue::remove(&queue, &job_id),
        Command::Clean { queue, state, min_age_secs } => queue::clean(&queue, &state, min_age_secs),
        Command::Clear { queue, state } => queue::clear(&queue, &state),
        Command::Meeting { meeting_id, json } => meeting::show(&meeting_id, json),
        Command::Restart { meeting_id, phase } => meeting::restart(&meeting_id, &phase),
        Command::SetState { meeting_id, phase } => meeting::set_state(&meeting_id, &phase),
        Command::Discover { start, end } => ops::discover(start.as_deref(), end.as_deref()).await,
        Command::Reconcile => ops::reconcile(),
        Command::Worker { queue } => ops::worker(&queue).await,
    }
}
