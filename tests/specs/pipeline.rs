// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end pipeline specs with stubbed external collaborators.

use crate::prelude::*;
use cmv_core::{ArtifactKind, Clock, Phase, QueueKind};
use cmv_storage::JobState;

/// Happy path: one meeting advances Discovered → Downloaded → Extracted →
/// Uploaded → Diarized, with exactly one job per transition.
#[tokio::test]
async fn single_meeting_happy_path() {
    let p = Pipeline::new(vec![calendar_meeting("m1", "City Commission - Regular", true)]);
    p.agenda.set_page("m1", AGENDA_PAGE);

    p.discovery().run(None).await.unwrap();
    assert_eq!(p.meeting("m1").phase, Phase::Discovered);
    assert_eq!(p.job(QueueKind::Download, "m1").unwrap().state, JobState::Waiting);

    p.run_worker(QueueKind::Download).await;
    assert_eq!(p.meeting("m1").phase, Phase::Downloaded);

    p.run_worker(QueueKind::Extract).await;
    assert_eq!(p.meeting("m1").phase, Phase::Extracted);

    p.run_worker(QueueKind::Upload).await;
    let uploaded = p.meeting("m1");
    assert_eq!(uploaded.phase, Phase::Uploaded);
    assert_eq!(uploaded.published_url.as_deref(), Some("https://video.example/watch/m1"));

    p.run_worker(QueueKind::Diarize).await;
    let done = p.meeting("m1");
    assert_eq!(done.phase, Phase::Diarized);
    assert_eq!(done.diarized_path.as_deref(), Some("derived/diarized/m1_diarized.json"));

    // Exactly one job per queue, all completed; terminal phase enqueues nothing
    for kind in QueueKind::ALL {
        let jobs = p.queues.get(kind).list(None).unwrap();
        assert_eq!(jobs.len(), 1, "queue {kind}");
        assert_eq!(jobs[0].state, JobState::Completed, "queue {kind}");
    }

    // Artifacts exist at their canonical paths for every recorded phase
    for kind in [
        ArtifactKind::RawVideo,
        ArtifactKind::RawAgenda,
        ArtifactKind::DerivedAudio,
        ArtifactKind::DerivedChapters,
        ArtifactKind::DerivedMetadata,
        ArtifactKind::DerivedDiarized,
    ] {
        assert!(p.artifacts.exists(kind, "m1").await.unwrap(), "artifact {kind}");
    }
}

/// Discovery twice over the same range inserts nothing new and enqueues
/// nothing new.
#[tokio::test]
async fn discovery_rerun_is_a_no_op() {
    let p = Pipeline::new(vec![calendar_meeting("m1", "City Commission - Regular", true)]);

    p.discovery().run(None).await.unwrap();
    p.discovery().run(None).await.unwrap();

    assert_eq!(p.store.list_meetings().unwrap().len(), 1);
    assert_eq!(p.queues.get(QueueKind::Download).list(None).unwrap().len(), 1);
}

/// Audio extraction failure is partial: extract still succeeds, chapters
/// and metadata exist, audio is absent, and the later diarize job fails
/// fast with a precondition failure recorded at phase Uploaded.
#[tokio::test]
async fn audio_failure_degrades_gracefully_until_diarize() {
    let p = Pipeline::new(vec![calendar_meeting("m1", "City Commission - Regular", true)]);
    p.agenda.set_page("m1", AGENDA_PAGE);
    p.audio.fail_with("no audio stream");

    p.discovery().run(None).await.unwrap();
    p.run_worker(QueueKind::Download).await;
    p.run_worker(QueueKind::Extract).await;

    let extracted = p.meeting("m1");
    assert_eq!(extracted.phase, Phase::Extracted);
    assert!(extracted.chapters_path.is_some());
    assert!(extracted.metadata_path.is_some());
    assert!(extracted.audio_path.is_none());
    assert!(!p.artifacts.exists(ArtifactKind::DerivedAudio, "m1").await.unwrap());

    p.run_worker(QueueKind::Upload).await;
    p.run_worker(QueueKind::Diarize).await;

    let failed = p.meeting("m1");
    assert_eq!(failed.phase, Phase::Failed);
    assert_eq!(failed.failed_at_phase, Some(Phase::Uploaded));
    assert!(failed.error_message.as_deref().unwrap().contains("derived audio"));
    assert_eq!(p.job(QueueKind::Diarize, "m1").unwrap().state, JobState::Failed);
}

/// An operator restart from the failed-at phase re-drives the pipeline.
#[tokio::test]
async fn restart_after_failure_resumes_from_failed_phase() {
    let p = Pipeline::new(vec![calendar_meeting("m1", "City Commission - Regular", true)]);
    p.agenda.set_page("m1", AGENDA_PAGE);
    p.audio.fail_with("no audio stream");

    p.discovery().run(None).await.unwrap();
    for kind in QueueKind::ALL {
        p.run_worker(kind).await;
    }
    assert_eq!(p.meeting("m1").phase, Phase::Failed);

    // Re-running extract with working audio fills the missing artifact
    let orch = p.orchestrator();
    orch.restart("m1", Phase::Downloaded).unwrap();
    p.audio.clear_failure();
    p.run_worker(QueueKind::Extract).await;
    p.run_worker(QueueKind::Upload).await;
    p.run_worker(QueueKind::Diarize).await;

    assert_eq!(p.meeting("m1").phase, Phase::Diarized);
}

/// Worker restart idempotency: a redelivered job whose transition was
/// already recorded completes without re-running the transition.
#[tokio::test]
async fn redelivered_job_after_recorded_transition_is_idempotent() {
    let p = Pipeline::new(vec![calendar_meeting("m1", "City Commission - Regular", true)]);
    p.discovery().run(None).await.unwrap();
    p.run_worker(QueueKind::Download).await;
    assert_eq!(p.meeting("m1").phase, Phase::Downloaded);

    // Simulate the crash window: the download job is forced live again
    // even though its transition is recorded.
    p.queues.get(QueueKind::Download).enqueue("m1", p.clock.epoch_ms()).unwrap();
    p.run_worker(QueueKind::Download).await;

    let meeting = p.meeting("m1");
    assert_eq!(meeting.phase, Phase::Downloaded);
    assert_eq!(p.job(QueueKind::Download, "m1").unwrap().state, JobState::Completed);
    // The downloader ran exactly once; redelivery did not re-download
    assert_eq!(p.downloader.calls().len(), 1);
}

/// Meetings without video never enter the pipeline.
#[tokio::test]
async fn meetings_without_video_are_ignored() {
    let p = Pipeline::new(vec![
        calendar_meeting("m1", "City Commission - Regular", true),
        calendar_meeting("m2", "Briefing (no broadcast)", false),
    ]);
    p.discovery().run(None).await.unwrap();
    assert!(p.store.get_meeting("m2").unwrap().is_none());
    assert!(p.job(QueueKind::Download, "m2").is_none());
}
