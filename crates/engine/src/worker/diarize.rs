// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Diarize worker: Uploaded → Diarized. Concurrency is strictly 1; the
//! diarization container owns the GPU.
//!
//! The scratch directory is world-writable because the container runs as a
//! different uid than the worker. Preferred deployment is to run the
//! container as the invoking user; the chmod is the fallback for hosts
//! where that is not available.

use crate::worker::scratch::ScratchDir;
use crate::worker::{PhaseWorker, WorkerError};
use async_trait::async_trait;
use cmv_adapters::Diarizer;
use cmv_core::{sanitize, ArtifactKind, Clock, Meeting, MeetingPatch, QueueKind};
use cmv_storage::ArtifactStore;
use std::path::PathBuf;
use std::sync::Arc;

pub struct DiarizeWorker<C: Clock> {
    diarizer: Arc<dyn Diarizer>,
    artifacts: Arc<dyn ArtifactStore>,
    run_root: PathBuf,
    clock: C,
}

impl<C: Clock> DiarizeWorker<C> {
    pub fn new(
        diarizer: Arc<dyn Diarizer>,
        artifacts: Arc<dyn ArtifactStore>,
        run_root: PathBuf,
        clock: C,
    ) -> Self {
        Self { diarizer, artifacts, run_root, clock }
    }
}

#[async_trait]
impl<C: Clock> PhaseWorker for DiarizeWorker<C> {
    fn queue(&self) -> QueueKind {
        QueueKind::Diarize
    }

    async fn run(&self, meeting: &Meeting) -> Result<MeetingPatch, WorkerError> {
        if !self
            .artifacts
            .exists(ArtifactKind::DerivedAudio, &meeting.id)
            .await?
        {
            return Err(WorkerError::Precondition(format!(
                "derived audio for meeting '{}' is absent (audio extraction skipped or failed)",
                meeting.id
            )));
        }

        let scratch = ScratchDir::create_world_writable(self.run_root.join(format!(
            "diarize_{}_{}",
            sanitize(&meeting.id),
            self.clock.epoch_ms()
        )))?;

        let audio = scratch.path().join("audio.m4a");
        self.artifacts
            .read_into(ArtifactKind::DerivedAudio, &meeting.id, &audio)
            .await?;

        let transcript = self.diarizer.diarize(&audio, scratch.path()).await?;
        let rel = self
            .artifacts
            .write_from(&transcript, ArtifactKind::DerivedDiarized, &meeting.id)
            .await?;
        tracing::info!(meeting_id = %meeting.id, path = %rel, step = "diarize", "transcript stored");

        Ok(MeetingPatch::new().diarized_path(rel))
    }
}

#[cfg(test)]
#[path = "diarize_tests.rs"]
mod tests;
