// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Playlist matching through the upload worker.

use crate::prelude::*;
use cmv_core::QueueKind;

async fn run_to_upload(p: &Pipeline, id: &str) {
    p.agenda.set_page(id, AGENDA_PAGE);
    p.discovery().run(None).await.unwrap();
    p.run_worker(QueueKind::Download).await;
    p.run_worker(QueueKind::Extract).await;
    p.run_worker(QueueKind::Upload).await;
}

/// Title matching the second rule yields exactly that playlist, and the
/// published title carries the date and location tag.
#[tokio::test]
async fn matching_rule_contributes_its_playlist() {
    let p = Pipeline::new(vec![calendar_meeting(
        "m1",
        "General Policy Committee - Work Session",
        true,
    )]);
    run_to_upload(&p, "m1").await;

    let requests = p.host.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].playlists, vec!["P2"]);
    assert_eq!(
        requests[0].title,
        "General Policy Committee - Work Session - 2025-06-05 | City Hall"
    );
    // The chapter document is the upload description
    assert!(requests[0].description.contains("Chapters:"));
}

/// A title matching no configured rule uploads with no playlists.
#[tokio::test]
async fn unmatched_title_uploads_without_playlists() {
    let p = Pipeline::new(vec![calendar_meeting("m1", "Utility Advisory Board", true)]);
    run_to_upload(&p, "m1").await;

    let requests = p.host.requests();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].playlists.is_empty());
}
