// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workflow orchestrator: the only writer of phase transitions.
//!
//! `advance` records the new phase and enqueues the next phase's job. The
//! two steps are deliberately not atomic: a crash in between leaves the
//! phase advanced with no queued job, which the reconcile sweep repairs.
//! That failure mode is favored over its converse because workers are
//! idempotent and can simply be re-driven.

use crate::error::EngineError;
use cmv_core::{Clock, MeetingPatch, Phase};
use cmv_storage::{Enqueued, QueueSet, StateStore};
use std::sync::Arc;

pub struct Orchestrator<C: Clock> {
    store: Arc<StateStore>,
    queues: Arc<QueueSet>,
    clock: C,
}

impl<C: Clock> Orchestrator<C> {
    pub fn new(store: Arc<StateStore>, queues: Arc<QueueSet>, clock: C) -> Self {
        Self { store, queues, clock }
    }

    /// Record the transition out of `from` together with `patch`, then
    /// enqueue the job driving the next transition. Returns the new phase,
    /// or None when `from` is terminal (both steps skipped).
    pub fn advance(
        &self,
        meeting_id: &str,
        from: Phase,
        patch: MeetingPatch,
    ) -> Result<Option<Phase>, EngineError> {
        let Some(next) = from.next() else {
            tracing::warn!(meeting_id, phase = %from, step = "advance", "ignoring advance from terminal phase");
            return Ok(None);
        };
        self.store.update_meeting(meeting_id, next, &patch, &self.clock)?;
        tracing::info!(meeting_id, from = %from, to = %next, step = "advance", "recorded phase transition");

        if let Some(queue) = next.driving_queue() {
            let outcome = self.queues.get(queue).enqueue(meeting_id, self.clock.epoch_ms())?;
            if outcome == Enqueued::Duplicate {
                tracing::debug!(meeting_id, queue = %queue, step = "advance", "job already live, enqueue skipped");
            }
        }
        Ok(Some(next))
    }

    /// Mark the meeting failed, recording the message and the phase the
    /// failure happened at so an operator can restart from there.
    pub fn fail(
        &self,
        meeting_id: &str,
        at_phase: Phase,
        error: &str,
    ) -> Result<(), EngineError> {
        let patch = MeetingPatch::new()
            .error_message(error)
            .failed_at_phase(at_phase);
        self.store.update_meeting(meeting_id, Phase::Failed, &patch, &self.clock)?;
        tracing::warn!(meeting_id, at_phase = %at_phase, step = "fail", error, "meeting failed");
        Ok(())
    }

    /// Operator reset: put the meeting back at `from`, clear the failure
    /// fields, and enqueue the corresponding job.
    pub fn restart(&self, meeting_id: &str, from: Phase) -> Result<(), EngineError> {
        let patch = MeetingPatch::new().clear_failure(true);
        self.store.update_meeting(meeting_id, from, &patch, &self.clock)?;
        if let Some(queue) = from.driving_queue() {
            self.queues.get(queue).enqueue(meeting_id, self.clock.epoch_ms())?;
        }
        tracing::info!(meeting_id, phase = %from, step = "restart", "meeting restarted");
        Ok(())
    }
}

#[cfg(test)]
#[path = "orchestrator_tests.rs"]
mod tests;
