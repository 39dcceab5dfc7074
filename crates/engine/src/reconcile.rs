// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Reconcile sweep: repairs the two crash windows the pipeline accepts.
//!
//! 1. Phase advanced but the next job never enqueued (crash between the
//!    orchestrator's store write and enqueue): any non-terminal meeting
//!    whose driving queue holds no live job gets one.
//! 2. Worker crashed mid-job: active jobs untouched past the stale
//!    threshold return to waiting for redelivery.

use crate::error::EngineError;
use cmv_core::{Clock, QueueKind};
use cmv_storage::{QueueSet, StateStore};
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// `(queue, meeting_id)` pairs that got a missing job enqueued.
    pub enqueued: Vec<(QueueKind, String)>,
    pub requeued_stale: usize,
}

pub struct Reconciler<C: Clock> {
    store: Arc<StateStore>,
    queues: Arc<QueueSet>,
    clock: C,
    stale_active_after: Duration,
}

impl<C: Clock> Reconciler<C> {
    pub fn new(
        store: Arc<StateStore>,
        queues: Arc<QueueSet>,
        clock: C,
        stale_active_after: Duration,
    ) -> Self {
        Self { store, queues, clock, stale_active_after }
    }

    pub fn run(&self) -> Result<ReconcileReport, EngineError> {
        let now = self.clock.epoch_ms();
        let mut report = ReconcileReport::default();

        for queue in self.queues.iter() {
            report.requeued_stale +=
                queue.requeue_stale_active(self.stale_active_after.as_millis() as u64, now)?;
        }

        for meeting in self.store.list_meetings()? {
            if meeting.phase.is_terminal() {
                continue;
            }
            let Some(kind) = meeting.phase.driving_queue() else {
                continue;
            };
            let queue = self.queues.get(kind);
            if !queue.has_live_job(&meeting.id)? {
                queue.enqueue(&meeting.id, now)?;
                tracing::info!(
                    meeting_id = %meeting.id,
                    queue = %kind,
                    step = "reconcile",
                    "enqueued missing job"
                );
                report.enqueued.push((kind, meeting.id));
            }
        }

        tracing::info!(
            enqueued = report.enqueued.len(),
            requeued_stale = report.requeued_stale,
            step = "reconcile",
            "reconcile sweep complete"
        );
        Ok(report)
    }
}

#[cfg(test)]
#[path = "reconcile_tests.rs"]
mod tests;
