// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use cmv_core::{FakeClock, Meeting, QueueKind};
use cmv_storage::JobState;

fn fixture() -> (tempfile::TempDir, Arc<StateStore>, Arc<QueueSet>, Orchestrator<FakeClock>) {
    let dir = tempfile::tempdir().unwrap();
    let store = Arc::new(StateStore::open(dir.path()).unwrap());
    let queues = Arc::new(QueueSet::open(dir.path()).unwrap());
    let orch = Orchestrator::new(store.clone(), queues.clone(), FakeClock::new());
    (dir, store, queues, orch)
}

#[test]
fn advance_records_phase_and_enqueues_next() {
    let (_dir, store, queues, orch) = fixture();
    store.insert_if_absent(&Meeting::builder().id("m1").build()).unwrap();

    let patch = MeetingPatch::new().raw_video_path("raw/videos/m1.mp4");
    let next = orch.advance("m1", Phase::Discovered, patch).unwrap();
    assert_eq!(next, Some(Phase::Downloaded));

    let meeting = store.get_meeting("m1").unwrap().unwrap();
    assert_eq!(meeting.phase, Phase::Downloaded);
    assert_eq!(meeting.raw_video_path.as_deref(), Some("raw/videos/m1.mp4"));

    let job = queues.get(QueueKind::Extract).get("extract-m1").unwrap().unwrap();
    assert_eq!(job.state, JobState::Waiting);
}

#[test]
fn advance_twice_enqueues_exactly_one_job() {
    let (_dir, store, queues, orch) = fixture();
    store.insert_if_absent(&Meeting::builder().id("m1").build()).unwrap();

    orch.advance("m1", Phase::Discovered, MeetingPatch::new()).unwrap();
    orch.advance("m1", Phase::Discovered, MeetingPatch::new()).unwrap();

    assert_eq!(queues.get(QueueKind::Extract).list(None).unwrap().len(), 1);
}

#[test]
fn advance_from_terminal_is_a_no_op() {
    let (_dir, store, queues, orch) = fixture();
    store
        .insert_if_absent(&Meeting::builder().id("m1").phase(Phase::Diarized).build())
        .unwrap();

    assert_eq!(orch.advance("m1", Phase::Diarized, MeetingPatch::new()).unwrap(), None);
    assert_eq!(orch.advance("m1", Phase::Failed, MeetingPatch::new()).unwrap(), None);

    assert_eq!(store.get_meeting("m1").unwrap().unwrap().phase, Phase::Diarized);
    for queue in queues.iter() {
        assert!(queue.list(None).unwrap().is_empty());
    }
}

#[test]
fn final_transition_enqueues_nothing() {
    let (_dir, store, queues, orch) = fixture();
    store
        .insert_if_absent(&Meeting::builder().id("m1").phase(Phase::Uploaded).build())
        .unwrap();

    let next = orch.advance("m1", Phase::Uploaded, MeetingPatch::new()).unwrap();
    assert_eq!(next, Some(Phase::Diarized));
    for queue in queues.iter() {
        assert!(queue.list(None).unwrap().is_empty());
    }
}

#[test]
fn fail_records_message_and_phase() {
    let (_dir, store, _queues, orch) = fixture();
    store
        .insert_if_absent(&Meeting::builder().id("m1").phase(Phase::Uploaded).build())
        .unwrap();

    orch.fail("m1", Phase::Uploaded, "derived audio missing").unwrap();

    let meeting = store.get_meeting("m1").unwrap().unwrap();
    assert_eq!(meeting.phase, Phase::Failed);
    assert_eq!(meeting.error_message.as_deref(), Some("derived audio missing"));
    assert_eq!(meeting.failed_at_phase, Some(Phase::Uploaded));
}

#[test]
fn restart_clears_failure_and_enqueues() {
    let (_dir, store, queues, orch) = fixture();
    store
        .insert_if_absent(
            &Meeting::builder()
                .id("m1")
                .phase(Phase::Failed)
                .error_message("boom")
                .failed_at_phase(Phase::Extracted)
                .build(),
        )
        .unwrap();

    orch.restart("m1", Phase::Extracted).unwrap();

    let meeting = store.get_meeting("m1").unwrap().unwrap();
    assert_eq!(meeting.phase, Phase::Extracted);
    assert!(meeting.error_message.is_none());
    assert!(meeting.failed_at_phase.is_none());
    assert!(queues.get(QueueKind::Upload).has_live_job("m1").unwrap());
}

#[test]
fn advance_missing_meeting_propagates_store_error() {
    let (_dir, _store, _queues, orch) = fixture();
    assert!(orch.advance("ghost", Phase::Discovered, MeetingPatch::new()).is_err());
}
