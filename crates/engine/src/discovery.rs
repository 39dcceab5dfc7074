// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Discovery service: polls the calendar and seeds the pipeline.
//!
//! Idempotent and safe to run at any cadence: already-present meetings are
//! silently skipped and only newly inserted ones get a download job. An
//! advisory lock keeps concurrent runs out.

use crate::error::EngineError;
use chrono::FixedOffset;
use cmv_adapters::{default_month_range, CalendarClient, DateRange};
use cmv_core::{Clock, Meeting, QueueKind};
use cmv_storage::{InsertOutcome, QueueSet, StateStore};
use fs2::FileExt;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Counters from one discovery run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DiscoveryReport {
    pub fetched: usize,
    pub with_video: usize,
    pub inserted: usize,
    pub enqueued: usize,
    pub already_present: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DiscoveryOutcome {
    Completed(DiscoveryReport),
    /// Another discovery run holds the advisory lock.
    AlreadyRunning,
}

pub struct Discovery<C: Clock> {
    calendar: Arc<dyn CalendarClient>,
    store: Arc<StateStore>,
    queues: Arc<QueueSet>,
    clock: C,
    /// Base URL the per-meeting source page is derived from.
    source_base: String,
    offset: FixedOffset,
    lock_path: PathBuf,
}

impl<C: Clock> Discovery<C> {
    pub fn new(
        calendar: Arc<dyn CalendarClient>,
        store: Arc<StateStore>,
        queues: Arc<QueueSet>,
        clock: C,
        source_base: impl Into<String>,
        offset: FixedOffset,
        state_dir: &Path,
    ) -> Self {
        Self {
            calendar,
            store,
            queues,
            clock,
            source_base: source_base.into().trim_end_matches('/').to_string(),
            offset,
            lock_path: state_dir.join("discovery.lock"),
        }
    }

    fn source_url(&self, meeting_id: &str) -> String {
        format!("{}/Meeting.aspx?Id={}", self.source_base, meeting_id)
    }

    /// Run one discovery pass over `range` (default: the current calendar
    /// month in the configured offset).
    pub async fn run(&self, range: Option<DateRange>) -> Result<DiscoveryOutcome, EngineError> {
        let lock_file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .write(true)
            .open(&self.lock_path)?;
        if lock_file.try_lock_exclusive().is_err() {
            tracing::info!(step = "discover", "discovery already running, skipping");
            return Ok(DiscoveryOutcome::AlreadyRunning);
        }

        let range = range.unwrap_or_else(|| default_month_range(self.clock.epoch_ms(), self.offset));
        tracing::info!(
            start = %range.start_param(),
            end = %range.end_param(),
            step = "discover",
            "fetching calendar meetings"
        );
        let fetched = self.calendar.fetch_meetings(&range).await?;

        let mut report = DiscoveryReport { fetched: fetched.len(), ..Default::default() };
        for entry in fetched.into_iter().filter(|m| m.has_video) {
            report.with_video += 1;
            let now = self.clock.epoch_ms();
            let meeting = Meeting::discovered(
                entry.id.clone(),
                entry.name,
                entry.start_date,
                self.source_url(&entry.id),
                now,
            );
            match self.store.insert_if_absent(&meeting)? {
                InsertOutcome::Inserted => {
                    report.inserted += 1;
                    self.queues.get(QueueKind::Download).enqueue(&meeting.id, now)?;
                    report.enqueued += 1;
                    tracing::info!(meeting_id = %meeting.id, step = "discover", "meeting discovered");
                }
                InsertOutcome::AlreadyPresent => {
                    report.already_present += 1;
                }
            }
        }
        tracing::info!(
            fetched = report.fetched,
            inserted = report.inserted,
            skipped = report.already_present,
            step = "discover",
            "discovery pass complete"
        );
        Ok(DiscoveryOutcome::Completed(report))
    }
}

#[cfg(test)]
#[path = "discovery_tests.rs"]
mod tests;
