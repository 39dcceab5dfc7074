// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use cmv_adapters::FakeVideoHost;
use cmv_core::{FakeClock, Phase};
use cmv_storage::LocalStore;

struct Fixture {
    _dir: tempfile::TempDir,
    artifacts: Arc<dyn ArtifactStore>,
    host: FakeVideoHost,
}

fn fixture() -> Fixture {
    let dir = tempfile::tempdir().unwrap();
    let artifacts: Arc<dyn ArtifactStore> = Arc::new(LocalStore::new(dir.path().join("storage")));
    Fixture { _dir: dir, artifacts, host: FakeVideoHost::new() }
}

fn worker(f: &Fixture, rules: Vec<PlaylistRule>) -> UploadWorker<FakeClock> {
    UploadWorker::new(
        Arc::new(f.host.clone()),
        f.artifacts.clone(),
        f._dir.path().join("run"),
        "City Hall",
        vec!["city".to_string(), "meetings".to_string()],
        rules,
        FakeClock::new(),
    )
}

async fn seed_video(f: &Fixture, id: &str) {
    let src = f._dir.path().join("seed.mp4");
    tokio::fs::write(&src, b"video").await.unwrap();
    f.artifacts.write_from(&src, ArtifactKind::RawVideo, id).await.unwrap();
}

fn meeting(title: &str) -> Meeting {
    Meeting::builder()
        .id("m1")
        .title(title)
        .date("2025-06-05 19:00")
        .phase(Phase::Extracted)
        .chapters("Title - 2025-06-05\n\nChapters:\n00:00:00 Item A\n")
        .build()
}

fn rules() -> Vec<PlaylistRule> {
    vec![
        PlaylistRule::new("^City Commission", "P1").unwrap(),
        PlaylistRule::new("^General Policy Committee", "P2").unwrap(),
    ]
}

#[tokio::test]
async fn upload_builds_title_description_and_playlists() {
    let f = fixture();
    seed_video(&f, "m1").await;
    let worker = worker(&f, rules());

    let patch = worker
        .run(&meeting("General Policy Committee - Work Session"))
        .await
        .unwrap();

    assert_eq!(patch.published_url.as_deref(), Some("https://video.example/watch/m1"));
    let requests = f.host.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(
        request.title,
        "General Policy Committee - Work Session - 2025-06-05 | City Hall"
    );
    assert_eq!(request.playlists, vec!["P2"]);
    assert_eq!(request.tags, vec!["city", "meetings"]);
    assert!(request.description.starts_with("Title - 2025-06-05"));
}

#[tokio::test]
async fn unmatched_title_gets_no_playlists() {
    let f = fixture();
    seed_video(&f, "m1").await;
    // Only the City Commission rule is configured
    let worker = worker(&f, vec![PlaylistRule::new("^City Commission", "P1").unwrap()]);

    worker
        .run(&meeting("General Policy Committee - Work Session"))
        .await
        .unwrap();

    assert!(f.host.requests()[0].playlists.is_empty());
}

#[tokio::test]
async fn description_falls_back_to_chapters_artifact() {
    let f = fixture();
    seed_video(&f, "m1").await;
    let src = f._dir.path().join("chapters.txt");
    tokio::fs::write(&src, "Stored chapters\n").await.unwrap();
    f.artifacts.write_from(&src, ArtifactKind::DerivedChapters, "m1").await.unwrap();

    let mut m = meeting("City Commission - Regular");
    m.chapters = None;
    worker(&f, rules()).run(&m).await.unwrap();

    assert_eq!(f.host.requests()[0].description, "Stored chapters\n");
}

#[tokio::test]
async fn missing_raw_video_is_a_precondition_failure() {
    let f = fixture();
    let err = worker(&f, rules())
        .run(&meeting("City Commission - Regular"))
        .await
        .unwrap_err();
    assert!(matches!(err, WorkerError::Precondition(_)));
}

#[tokio::test]
async fn host_failure_is_transient() {
    let f = fixture();
    seed_video(&f, "m1").await;
    f.host.fail_with("rate limited");
    let err = worker(&f, rules())
        .run(&meeting("City Commission - Regular"))
        .await
        .unwrap_err();
    assert!(matches!(err, WorkerError::Transient(_)));
}
