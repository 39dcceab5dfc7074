// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn local() -> (tempfile::TempDir, LocalStore) {
    let dir = tempfile::tempdir().unwrap();
    let store = LocalStore::new(dir.path().join("storage"));
    (dir, store)
}

#[tokio::test]
async fn write_then_read_round_trips_bytes() {
    let (dir, store) = local();
    let src = dir.path().join("video.mp4");
    tokio::fs::write(&src, b"fake video bytes").await.unwrap();

    let rel = store.write_from(&src, ArtifactKind::RawVideo, "m1").await.unwrap();
    assert_eq!(rel, "raw/videos/m1.mp4");

    let dest = dir.path().join("work/copy.mp4");
    store.read_into(ArtifactKind::RawVideo, "m1", &dest).await.unwrap();
    assert_eq!(tokio::fs::read(&dest).await.unwrap(), b"fake video bytes");
}

#[tokio::test]
async fn exists_and_size_track_writes() {
    let (dir, store) = local();
    assert!(!store.exists(ArtifactKind::DerivedAudio, "m1").await.unwrap());
    assert!(matches!(
        store.size_of(ArtifactKind::DerivedAudio, "m1").await,
        Err(ArtifactError::Missing { .. })
    ));

    let src = dir.path().join("audio.m4a");
    tokio::fs::write(&src, b"12345").await.unwrap();
    store.write_from(&src, ArtifactKind::DerivedAudio, "m1").await.unwrap();

    assert!(store.exists(ArtifactKind::DerivedAudio, "m1").await.unwrap());
    assert_eq!(store.size_of(ArtifactKind::DerivedAudio, "m1").await.unwrap(), 5);
}

#[tokio::test]
async fn read_missing_artifact_is_missing_error() {
    let (dir, store) = local();
    let dest = dir.path().join("out.json");
    let err = store.read_into(ArtifactKind::DerivedDiarized, "m1", &dest).await.unwrap_err();
    assert!(matches!(err, ArtifactError::Missing { kind: ArtifactKind::DerivedDiarized, .. }));
}

#[tokio::test]
async fn write_overwrites_previous_artifact() {
    let (dir, store) = local();
    let src = dir.path().join("chapters.txt");
    tokio::fs::write(&src, "first").await.unwrap();
    store.write_from(&src, ArtifactKind::DerivedChapters, "m1").await.unwrap();
    tokio::fs::write(&src, "second").await.unwrap();
    store.write_from(&src, ArtifactKind::DerivedChapters, "m1").await.unwrap();

    let dest = dir.path().join("out.txt");
    store.read_into(ArtifactKind::DerivedChapters, "m1", &dest).await.unwrap();
    assert_eq!(tokio::fs::read_to_string(&dest).await.unwrap(), "second");
}

#[test]
fn local_urls_are_file_scheme() {
    let (_dir, store) = local();
    let url = store.url_for(ArtifactKind::RawVideo, "m1");
    assert!(url.starts_with("file://"));
    assert!(url.ends_with("raw/videos/m1.mp4"));
}

#[test]
fn remote_urls_hit_the_files_route() {
    let store = RemoteStore::new("http://files.internal:8080/");
    assert_eq!(
        store.url_for(ArtifactKind::DerivedChapters, "m1"),
        "http://files.internal:8080/files/derived/chapters/m1_chapters.txt"
    );
}
