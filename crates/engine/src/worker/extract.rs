// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Extract worker: Downloaded → Extracted.
//!
//! Fetches the agenda page, joins bookmarks with item titles, and emits the
//! chapter description and metadata record. Audio extraction is attempted
//! but optional: a failure is logged, recorded in the metadata, and the
//! phase still succeeds (diarization is skipped downstream when audio is
//! absent).

use crate::worker::scratch::ScratchDir;
use crate::worker::{PhaseWorker, WorkerError};
use async_trait::async_trait;
use cmv_adapters::agenda::{parse_agenda_titles, parse_bookmarks};
use cmv_adapters::{AgendaClient, AudioExtractor};
use cmv_core::agenda::join_items;
use cmv_core::{
    chapter_description, sanitize, ArtifactKind, Clock, Meeting, MeetingMetadata, MeetingPatch,
    QueueKind,
};
use cmv_storage::ArtifactStore;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub struct ExtractWorker<C: Clock> {
    agenda: Arc<dyn AgendaClient>,
    audio: Arc<dyn AudioExtractor>,
    artifacts: Arc<dyn ArtifactStore>,
    run_root: PathBuf,
    clock: C,
}

impl<C: Clock> ExtractWorker<C> {
    pub fn new(
        agenda: Arc<dyn AgendaClient>,
        audio: Arc<dyn AudioExtractor>,
        artifacts: Arc<dyn ArtifactStore>,
        run_root: PathBuf,
        clock: C,
    ) -> Self {
        Self { agenda, audio, artifacts, run_root, clock }
    }

    /// Materialize the raw video, extract its audio track, and store it.
    /// Returns the stored relative path.
    async fn extract_audio(
        &self,
        meeting: &Meeting,
        scratch: &Path,
    ) -> Result<String, WorkerError> {
        let video = scratch.join("video.mp4");
        let audio = scratch.join("audio.m4a");
        self.artifacts
            .read_into(ArtifactKind::RawVideo, &meeting.id, &video)
            .await?;
        self.audio.extract(&video, &audio).await?;
        let rel = self
            .artifacts
            .write_from(&audio, ArtifactKind::DerivedAudio, &meeting.id)
            .await?;
        Ok(rel)
    }
}

#[async_trait]
impl<C: Clock> PhaseWorker for ExtractWorker<C> {
    fn queue(&self) -> QueueKind {
        QueueKind::Extract
    }

    async fn run(&self, meeting: &Meeting) -> Result<MeetingPatch, WorkerError> {
        let scratch = ScratchDir::create(self.run_root.join(format!(
            "extract_{}_{}",
            sanitize(&meeting.id),
            self.clock.epoch_ms()
        )))?;

        let html = self.agenda.fetch_agenda(&meeting.id).await?;
        let agenda_file = scratch.path().join("agenda.html");
        tokio::fs::write(&agenda_file, &html).await?;
        self.artifacts
            .write_from(&agenda_file, ArtifactKind::RawAgenda, &meeting.id)
            .await?;

        let bookmarks = parse_bookmarks(&html)?;
        let titles = parse_agenda_titles(&html);
        let items = join_items(&titles, &bookmarks);
        let chapters = chapter_description(&meeting.title, &meeting.date_ymd(), &items);
        tracing::info!(
            meeting_id = %meeting.id,
            items = items.len(),
            bookmarks = bookmarks.len(),
            step = "extract",
            "agenda parsed"
        );

        let (audio_rel, audio_error) = match self.extract_audio(meeting, scratch.path()).await {
            Ok(rel) => (Some(rel), None),
            Err(e) => {
                tracing::warn!(
                    meeting_id = %meeting.id,
                    error = %e,
                    step = "extract",
                    "audio extraction failed, continuing without audio"
                );
                (None, Some(e.to_string()))
            }
        };

        let metadata = MeetingMetadata {
            meeting_id: meeting.id.clone(),
            title: meeting.title.clone(),
            date: meeting.date.clone(),
            items,
            bookmarks: bookmarks.clone(),
            extracted_at_ms: self.clock.epoch_ms(),
            audio_error,
        };

        let chapters_file = scratch.path().join("chapters.txt");
        tokio::fs::write(&chapters_file, &chapters).await?;
        let chapters_rel = self
            .artifacts
            .write_from(&chapters_file, ArtifactKind::DerivedChapters, &meeting.id)
            .await?;

        let metadata_file = scratch.path().join("metadata.json");
        let metadata_json = serde_json::to_vec_pretty(&metadata)
            .map_err(|e| WorkerError::Transient(e.to_string()))?;
        tokio::fs::write(&metadata_file, metadata_json).await?;
        let metadata_rel = self
            .artifacts
            .write_from(&metadata_file, ArtifactKind::DerivedMetadata, &meeting.id)
            .await?;

        let agenda_blob = serde_json::to_value(&bookmarks)
            .map_err(|e| WorkerError::Transient(e.to_string()))?;
        let mut patch = MeetingPatch::new()
            .chapters_path(chapters_rel)
            .metadata_path(metadata_rel)
            .chapters(chapters)
            .agenda(Some(agenda_blob));
        if let Some(rel) = audio_rel {
            patch = patch.audio_path(rel);
        }
        Ok(patch)
    }
}

#[cfg(test)]
#[path = "extract_tests.rs"]
mod tests;
