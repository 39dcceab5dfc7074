// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Download worker: Discovered → Downloaded.

use crate::worker::scratch::ScratchDir;
use crate::worker::{PhaseWorker, WorkerError};
use async_trait::async_trait;
use cmv_adapters::VideoDownloader;
use cmv_core::{sanitize, ArtifactKind, Clock, Meeting, MeetingPatch, QueueKind};
use cmv_storage::ArtifactStore;
use std::path::PathBuf;
use std::sync::Arc;

pub struct DownloadWorker<C: Clock> {
    downloader: Arc<dyn VideoDownloader>,
    artifacts: Arc<dyn ArtifactStore>,
    run_root: PathBuf,
    clock: C,
}

impl<C: Clock> DownloadWorker<C> {
    pub fn new(
        downloader: Arc<dyn VideoDownloader>,
        artifacts: Arc<dyn ArtifactStore>,
        run_root: PathBuf,
        clock: C,
    ) -> Self {
        Self { downloader, artifacts, run_root, clock }
    }
}

#[async_trait]
impl<C: Clock> PhaseWorker for DownloadWorker<C> {
    fn queue(&self) -> QueueKind {
        QueueKind::Download
    }

    async fn run(&self, meeting: &Meeting) -> Result<MeetingPatch, WorkerError> {
        let scratch = ScratchDir::create(self.run_root.join(format!(
            "download_{}_{}",
            sanitize(&meeting.id),
            self.clock.epoch_ms()
        )))?;
        let video = scratch.path().join("video.mp4");

        self.downloader.download(&meeting.source_url, &video).await?;
        let rel = self
            .artifacts
            .write_from(&video, ArtifactKind::RawVideo, &meeting.id)
            .await?;
        tracing::info!(meeting_id = %meeting.id, path = %rel, step = "download", "raw video stored");

        Ok(MeetingPatch::new().raw_video_path(rel))
    }
}

#[cfg(test)]
#[path = "download_tests.rs"]
mod tests;
