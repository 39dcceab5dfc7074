// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Phase workers: one per queue, each owning exactly one transition.

pub mod diarize;
pub mod download;
pub mod extract;
pub mod pool;
mod scratch;
pub mod upload;

use async_trait::async_trait;
use cmv_adapters::AdapterError;
use cmv_core::{Meeting, MeetingPatch, QueueKind};
use cmv_storage::{ArtifactError, StateError};

/// Failure classification for one job attempt.
///
/// Transient failures go back to the queue for backoff retry with no
/// state-store change. Precondition failures can never succeed on retry:
/// the orchestrator marks the meeting failed and the job lands in `failed`
/// immediately.
#[derive(Debug, thiserror::Error)]
pub enum WorkerError {
    #[error("{0}")]
    Transient(String),
    #[error("precondition failed: {0}")]
    Precondition(String),
}

impl From<AdapterError> for WorkerError {
    fn from(e: AdapterError) -> Self {
        WorkerError::Transient(e.to_string())
    }
}

impl From<ArtifactError> for WorkerError {
    fn from(e: ArtifactError) -> Self {
        match e {
            // A cross-phase artifact that should exist but doesn't cannot
            // be regenerated here; retrying won't help.
            ArtifactError::Missing { .. } => WorkerError::Precondition(e.to_string()),
            other => WorkerError::Transient(other.to_string()),
        }
    }
}

impl From<StateError> for WorkerError {
    fn from(e: StateError) -> Self {
        WorkerError::Transient(e.to_string())
    }
}

impl From<std::io::Error> for WorkerError {
    fn from(e: std::io::Error) -> Self {
        WorkerError::Transient(e.to_string())
    }
}

/// One pipeline transition. The pool handles dequeue, phase checks, the
/// orchestrator calls, and error classification; `run` only produces
/// artifacts and returns the field patch to record with the transition.
#[async_trait]
pub trait PhaseWorker: Send + Sync {
    fn queue(&self) -> QueueKind;

    async fn run(&self, meeting: &Meeting) -> Result<MeetingPatch, WorkerError>;
}

/// Bounded concurrency per queue: downloads saturate bandwidth, upload and
/// diarize are serialized (host rate limits, GPU contention).
pub fn default_concurrency(kind: QueueKind) -> usize {
    match kind {
        QueueKind::Download => 2,
        QueueKind::Extract => 3,
        QueueKind::Upload | QueueKind::Diarize => 1,
    }
}
