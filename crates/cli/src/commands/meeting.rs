// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Meeting inspection and operator resets.

use crate::commands::queue::format_age;
use crate::context::Context;
use anyhow::Result;
use cmv_core::{Clock, MeetingPatch, Phase, QueueKind, SystemClock};

fn parse_phase(s: &str) -> Result<Phase> {
    Ok(s.parse::<Phase>()?)
}

pub fn show(meeting_id: &str, json: bool) -> Result<()> {
    let ctx = Context::open()?;
    let Some(meeting) = ctx.store.get_meeting(meeting_id)? else {
        anyhow::bail!("meeting '{meeting_id}' not found");
    };

    if json {
        let jobs: serde_json::Map<String, serde_json::Value> = QueueKind::ALL
            .iter()
            .filter_map(|kind| {
                let job = ctx.queues.get(*kind).get(&kind.job_id(meeting_id)).ok()??;
                Some((kind.name().to_string(), serde_json::to_value(job).ok()?))
            })
            .collect();
        let mut doc = serde_json::to_value(&meeting)?;
        if let Some(obj) = doc.as_object_mut() {
            obj.insert("jobs".to_string(), serde_json::Value::Object(jobs));
        }
        println!("{}", serde_json::to_string_pretty(&doc)?);
        return Ok(());
    }

    let now = SystemClock.epoch_ms();
    println!("meeting   {}", meeting.id);
    println!("title     {}", meeting.title);
    println!("date      {}", meeting.date);
    println!("phase     {}", meeting.phase);
    println!("source    {}", meeting.source_url);
    println!("updated   {}", format_age(now, meeting.updated_at_ms));
    if let Some(url) = &meeting.published_url {
        println!("published {url}");
    }
    if let Some(error) = &meeting.error_message {
        let at = meeting
            .failed_at_phase
            .map(|p| p.to_string())
            .unwrap_or_else(|| "?".to_string());
        println!("failed    at {at}: {error}");
    }

    println!("\nartifacts");
    for (label, path) in [
        ("raw video", &meeting.raw_video_path),
        ("chapters", &meeting.chapters_path),
        ("metadata", &meeting.metadata_path),
        ("audio", &meeting.audio_path),
        ("diarized", &meeting.diarized_path),
    ] {
        println!("  {:<10} {}", label, path.as_deref().unwrap_or("-"));
    }

    println!("\njobs");
    for kind in QueueKind::ALL {
        let job = ctx.queues.get(kind).get(&kind.job_id(meeting_id))?;
        match job {
            Some(job) => println!(
                "  {:<9} {:<9} attempts={} {}",
                kind.name(),
                job.state.to_string(),
                job.attempts,
                job.last_error.as_deref().unwrap_or(""),
            ),
            None => println!("  {:<9} -", kind.name()),
        }
    }
    Ok(())
}

pub fn restart(meeting_id: &str, phase: &str) -> Result<()> {
    let phase = parse_phase(phase)?;
    let ctx = Context::open()?;
    if ctx.store.get_meeting(meeting_id)?.is_none() {
        anyhow::bail!("meeting '{meeting_id}' not found");
    }
    ctx.orchestrator().restart(meeting_id, phase)?;
    println!("Restarted '{meeting_id}' at phase '{phase}'");
    Ok(())
}

pub fn set_state(meeting_id: &str, phase: &str) -> Result<()> {
    let phase = parse_phase(phase)?;
    let ctx = Context::open()?;
    ctx.store
        .update_meeting(meeting_id, phase, &MeetingPatch::new(), &SystemClock)?;
    println!("Set '{meeting_id}' to phase '{phase}'");
    Ok(())
}
