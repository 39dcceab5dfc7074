// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Chapter synthesis through the extract worker.

use crate::prelude::*;
use cmv_core::{ArtifactKind, QueueKind};

/// First bookmark at 5s: the chapter file gets the synthetic
/// `00:00:00 Pre-meeting` line and the exact expected layout.
#[tokio::test]
async fn chapter_file_contents_match_expected_document() {
    let p = Pipeline::new(vec![calendar_meeting("m1", "City Commission - Regular", true)]);
    p.agenda.set_page("m1", AGENDA_PAGE);

    p.discovery().run(None).await.unwrap();
    p.run_worker(QueueKind::Download).await;
    p.run_worker(QueueKind::Extract).await;

    let out = p.dir.path().join("chapters_out.txt");
    p.artifacts
        .read_into(ArtifactKind::DerivedChapters, "m1", &out)
        .await
        .unwrap();
    let contents = std::fs::read_to_string(&out).unwrap();
    assert_eq!(
        contents,
        "City Commission - Regular - 2025-06-05\n\
         \n\
         Chapters:\n\
         00:00:00 Pre-meeting\n\
         00:00:05 Item A\n\
         00:01:05 Item B\n\
         01:01:05 Item C\n"
    );

    // The same document is carried on the meeting and used as the upload
    // description.
    assert_eq!(p.meeting("m1").chapters.as_deref(), Some(contents.as_str()));
}

/// A bookmark starting at 0 needs no synthetic chapter.
#[tokio::test]
async fn no_pre_meeting_when_first_bookmark_at_origin() {
    let page = r#"
<script>var x = { Bookmarks: [
  {"AgendaItemId": 1, "TimeStart": 0, "TimeEnd": 60000}
] };</script>
<DIV class="AgendaItem AgendaItem1"><DIV class="AgendaItemTitle"><a>Call to Order</a></DIV></DIV>
"#;
    let p = Pipeline::new(vec![calendar_meeting("m1", "City Commission - Regular", true)]);
    p.agenda.set_page("m1", page);

    p.discovery().run(None).await.unwrap();
    p.run_worker(QueueKind::Download).await;
    p.run_worker(QueueKind::Extract).await;

    let chapters = p.meeting("m1").chapters.unwrap();
    assert!(!chapters.contains("Pre-meeting"));
    assert!(chapters.contains("00:00:00 Call to Order"));
}
