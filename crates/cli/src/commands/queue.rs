// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Queue administration commands.

use crate::context::Context;
use anyhow::Result;
use cmv_core::{Clock, QueueKind, SystemClock};
use cmv_storage::{Enqueued, JobRecord, JobState};

pub(crate) fn parse_queue(s: &str) -> Result<QueueKind> {
    Ok(s.parse::<QueueKind>()?)
}

pub(crate) fn parse_state(s: &str) -> Result<JobState> {
    Ok(s.parse::<JobState>()?)
}

/// `5s ago`, `3m ago`, `2h ago`, `4d ago`.
pub(crate) fn format_age(now_ms: u64, then_ms: u64) -> String {
    let secs = now_ms.saturating_sub(then_ms) / 1000;
    match secs {
        0..=59 => format!("{secs}s ago"),
        60..=3599 => format!("{}m ago", secs / 60),
        3600..=86_399 => format!("{}h ago", secs / 3600),
        _ => format!("{}d ago", secs / 86_400),
    }
}

fn print_jobs(jobs: &[JobRecord], now_ms: u64) {
    println!(
        "{:<28} {:<9} {:>8} {:>10}  {}",
        "ID", "STATE", "ATTEMPTS", "PUSHED", "ERROR"
    );
    for job in jobs {
        println!(
            "{:<28} {:<9} {:>8} {:>10}  {}",
            job.id,
            job.state.to_string(),
            job.attempts,
            format_age(now_ms, job.pushed_at_ms),
            job.last_error.as_deref().unwrap_or("-"),
        );
    }
}

pub fn list(queue: &str, state: Option<&str>, limit: usize, json: bool) -> Result<()> {
    let kind = parse_queue(queue)?;
    let state = state.map(parse_state).transpose()?;
    let ctx = Context::open()?;
    let mut jobs = ctx.queues.get(kind).list(state)?;
    jobs.truncate(limit);
    if json {
        println!("{}", serde_json::to_string_pretty(&jobs)?);
    } else if jobs.is_empty() {
        println!("No jobs in queue '{kind}'");
    } else {
        print_jobs(&jobs, SystemClock.epoch_ms());
    }
    Ok(())
}

pub fn stats(queue: &str, json: bool) -> Result<()> {
    let kind = parse_queue(queue)?;
    let ctx = Context::open()?;
    let stats = ctx.queues.get(kind).stats()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
    } else {
        println!("queue '{kind}'");
        println!("  waiting:   {}", stats.waiting);
        println!("  active:    {}", stats.active);
        println!("  delayed:   {}", stats.delayed);
        println!("  completed: {}", stats.completed);
        println!("  failed:    {}", stats.failed);
    }
    Ok(())
}

pub fn add(queue: &str, meeting_id: &str) -> Result<()> {
    let kind = parse_queue(queue)?;
    let ctx = Context::open()?;
    match ctx.queues.get(kind).enqueue(meeting_id, SystemClock.epoch_ms())? {
        Enqueued::Queued => println!("Enqueued '{}'", kind.job_id(meeting_id)),
        Enqueued::Duplicate => println!("Job '{}' already live, skipped", kind.job_id(meeting_id)),
    }
    Ok(())
}

pub fn retry(queue: &str, job_id: &str) -> Result<()> {
    let kind = parse_queue(queue)?;
    let ctx = Context::open()?;
    ctx.queues.get(kind).retry(job_id, SystemClock.epoch_ms())?;
    println!("Retrying '{job_id}' in queue '{kind}'");
    Ok(())
}

pub fn remove(queue: &str, job_id: &str) -> Result<()> {
    let kind = parse_queue(queue)?;
    let ctx = Context::open()?;
    if ctx.queues.get(kind).remove(job_id)? {
        println!("Removed '{job_id}' from queue '{kind}'");
        Ok(())
    } else {
        anyhow::bail!("job '{job_id}' not found in queue '{kind}'")
    }
}

pub fn clean(queue: &str, state: &str, min_age_secs: u64) -> Result<()> {
    let kind = parse_queue(queue)?;
    let state = parse_state(state)?;
    let ctx = Context::open()?;
    let removed =
        ctx.queues.get(kind).clean(state, min_age_secs * 1000, SystemClock.epoch_ms())?;
    println!(
        "Removed {removed} {state} job{} from queue '{kind}'",
        if removed == 1 { "" } else { "s" }
    );
    Ok(())
}

pub fn clear(queue: &str, state: &str) -> Result<()> {
    let kind = parse_queue(queue)?;
    let state = parse_state(state)?;
    let ctx = Context::open()?;
    let removed = ctx.queues.get(kind).clear(state)?;
    println!(
        "Removed {removed} {state} job{} from queue '{kind}'",
        if removed == 1 { "" } else { "s" }
    );
    Ok(())
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
