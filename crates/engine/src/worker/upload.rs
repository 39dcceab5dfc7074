// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Upload worker: Extracted → Uploaded. Concurrency is strictly 1; the
//! external host rate-limits aggressively.

use crate::playlist::{match_playlists, PlaylistRule};
use crate::worker::scratch::ScratchDir;
use crate::worker::{PhaseWorker, WorkerError};
use async_trait::async_trait;
use cmv_adapters::{UploadRequest, VideoHost};
use cmv_core::{sanitize, ArtifactKind, Clock, Meeting, MeetingPatch, QueueKind};
use cmv_storage::ArtifactStore;
use std::path::PathBuf;
use std::sync::Arc;

pub struct UploadWorker<C: Clock> {
    host: Arc<dyn VideoHost>,
    artifacts: Arc<dyn ArtifactStore>,
    run_root: PathBuf,
    location_tag: String,
    tags: Vec<String>,
    rules: Vec<PlaylistRule>,
    clock: C,
}

impl<C: Clock> UploadWorker<C> {
    pub fn new(
        host: Arc<dyn VideoHost>,
        artifacts: Arc<dyn ArtifactStore>,
        run_root: PathBuf,
        location_tag: impl Into<String>,
        tags: Vec<String>,
        rules: Vec<PlaylistRule>,
        clock: C,
    ) -> Self {
        Self {
            host,
            artifacts,
            run_root,
            location_tag: location_tag.into(),
            tags,
            rules,
            clock,
        }
    }

    /// Upload description: the chapters blob recorded at extract time, or
    /// the chapters artifact when the blob is absent.
    async fn description(&self, meeting: &Meeting, scratch: &std::path::Path) -> Result<String, WorkerError> {
        if let Some(chapters) = &meeting.chapters {
            return Ok(chapters.clone());
        }
        let local = scratch.join("chapters.txt");
        self.artifacts
            .read_into(ArtifactKind::DerivedChapters, &meeting.id, &local)
            .await?;
        Ok(tokio::fs::read_to_string(&local).await?)
    }
}

#[async_trait]
impl<C: Clock> PhaseWorker for UploadWorker<C> {
    fn queue(&self) -> QueueKind {
        QueueKind::Upload
    }

    async fn run(&self, meeting: &Meeting) -> Result<MeetingPatch, WorkerError> {
        let scratch = ScratchDir::create(self.run_root.join(format!(
            "upload_{}_{}",
            sanitize(&meeting.id),
            self.clock.epoch_ms()
        )))?;

        let title = format!("{} - {} | {}", meeting.title, meeting.date_ymd(), self.location_tag);
        let description = self.description(meeting, scratch.path()).await?;
        let playlists = match_playlists(&meeting.title, &self.rules);

        let video = scratch.path().join("video.mp4");
        self.artifacts
            .read_into(ArtifactKind::RawVideo, &meeting.id, &video)
            .await?;

        let request = UploadRequest {
            meeting_id: meeting.id.clone(),
            title,
            description,
            tags: self.tags.clone(),
            playlists,
            video,
        };
        let outcome = self.host.upload(&request).await?;
        for result in &outcome.playlists {
            if result.ok {
                tracing::info!(
                    meeting_id = %meeting.id,
                    playlist = %result.playlist_id,
                    step = "upload",
                    "added to playlist"
                );
            } else {
                tracing::warn!(
                    meeting_id = %meeting.id,
                    playlist = %result.playlist_id,
                    detail = result.detail.as_deref().unwrap_or(""),
                    step = "upload",
                    "playlist add failed"
                );
            }
        }
        tracing::info!(meeting_id = %meeting.id, url = %outcome.url, step = "upload", "video published");

        Ok(MeetingPatch::new().published_url(outcome.url))
    }
}

#[cfg(test)]
#[path = "upload_tests.rs"]
mod tests;
