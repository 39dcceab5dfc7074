// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixture: the whole pipeline wired with fake external
//! collaborators over a temp directory.

use cmv_adapters::{
    CalendarMeeting, FakeAgendaClient, FakeAudioExtractor, FakeCalendarClient, FakeDiarizer,
    FakeVideoDownloader, FakeVideoHost,
};
use cmv_core::{FakeClock, Meeting, QueueKind};
use cmv_engine::{
    DiarizeWorker, Discovery, DownloadWorker, ExtractWorker, Orchestrator, PhaseWorker,
    PlaylistRule, UploadWorker, WorkerPool,
};
use cmv_storage::{ArtifactStore, JobRecord, LocalStore, QueueSet, StateStore};
use std::sync::Arc;
use std::time::Duration;

/// Agenda page used across specs: first bookmark at 5s, so the chapter
/// list needs the synthetic Pre-meeting entry.
pub const AGENDA_PAGE: &str = r#"
<script>var MeetingData = { Bookmarks: [
  {"AgendaItemId": 1, "TimeStart": 5000, "TimeEnd": 60000},
  {"AgendaItemId": 2, "TimeStart": 65000, "TimeEnd": 120000},
  {"AgendaItemId": 3, "TimeStart": 3665000, "TimeEnd": 3700000}
] };</script>
<DIV class="AgendaItem AgendaItem1"><DIV class="AgendaItemTitle"><a>Item A</a></DIV></DIV>
<DIV class="AgendaItem AgendaItem2"><DIV class="AgendaItemTitle"><a>Item B</a></DIV></DIV>
<DIV class="AgendaItem AgendaItem3"><DIV class="AgendaItemTitle"><a>Item C</a></DIV></DIV>
"#;

pub fn calendar_meeting(id: &str, name: &str, has_video: bool) -> CalendarMeeting {
    CalendarMeeting {
        id: id.to_string(),
        name: name.to_string(),
        start_date: "2025-06-05 19:00".to_string(),
        has_video,
    }
}

pub struct Pipeline {
    pub dir: tempfile::TempDir,
    pub store: Arc<StateStore>,
    pub queues: Arc<QueueSet>,
    pub clock: FakeClock,
    pub artifacts: Arc<dyn ArtifactStore>,
    pub calendar: FakeCalendarClient,
    pub agenda: FakeAgendaClient,
    pub downloader: FakeVideoDownloader,
    pub audio: FakeAudioExtractor,
    pub host: FakeVideoHost,
    pub diarizer: FakeDiarizer,
}

impl Pipeline {
    pub fn new(meetings: Vec<CalendarMeeting>) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(StateStore::open(dir.path()).unwrap());
        let queues = Arc::new(QueueSet::open(dir.path()).unwrap());
        let artifacts: Arc<dyn ArtifactStore> =
            Arc::new(LocalStore::new(dir.path().join("storage")));
        Self {
            store,
            queues,
            clock: FakeClock::new(),
            artifacts,
            calendar: FakeCalendarClient::new(meetings),
            agenda: FakeAgendaClient::new(),
            downloader: FakeVideoDownloader::new(),
            audio: FakeAudioExtractor::new(),
            host: FakeVideoHost::new(),
            diarizer: FakeDiarizer::new(),
            dir,
        }
    }

    pub fn orchestrator(&self) -> Arc<Orchestrator<FakeClock>> {
        Arc::new(Orchestrator::new(self.store.clone(), self.queues.clone(), self.clock.clone()))
    }

    pub fn discovery(&self) -> Discovery<FakeClock> {
        Discovery::new(
            Arc::new(self.calendar.clone()),
            self.store.clone(),
            self.queues.clone(),
            self.clock.clone(),
            "https://city.example",
            cmv_adapters::parse_utc_offset("-04:00").unwrap(),
            self.dir.path(),
        )
    }

    fn run_root(&self) -> std::path::PathBuf {
        self.dir.path().join("run")
    }

    fn phase_worker(&self, kind: QueueKind) -> Arc<dyn PhaseWorker> {
        match kind {
            QueueKind::Download => Arc::new(DownloadWorker::new(
                Arc::new(self.downloader.clone()),
                self.artifacts.clone(),
                self.run_root(),
                self.clock.clone(),
            )),
            QueueKind::Extract => Arc::new(ExtractWorker::new(
                Arc::new(self.agenda.clone()),
                Arc::new(self.audio.clone()),
                self.artifacts.clone(),
                self.run_root(),
                self.clock.clone(),
            )),
            QueueKind::Upload => Arc::new(UploadWorker::new(
                Arc::new(self.host.clone()),
                self.artifacts.clone(),
                self.run_root(),
                "City Hall",
                vec!["city".to_string()],
                vec![
                    PlaylistRule::new("^City Commission", "P1").unwrap(),
                    PlaylistRule::new("^General Policy Committee", "P2").unwrap(),
                ],
                self.clock.clone(),
            )),
            QueueKind::Diarize => Arc::new(DiarizeWorker::new(
                Arc::new(self.diarizer.clone()),
                self.artifacts.clone(),
                self.run_root(),
                self.clock.clone(),
            )),
        }
    }

    /// Drain one queue through its phase worker.
    pub async fn run_worker(&self, kind: QueueKind) {
        let pool = WorkerPool::new(
            self.queues.clone(),
            self.store.clone(),
            self.orchestrator(),
            self.phase_worker(kind),
            self.clock.clone(),
            1,
            Duration::from_millis(10),
            Duration::from_secs(1),
        );
        pool.run_until_idle().await;
    }

    pub fn meeting(&self, id: &str) -> Meeting {
        self.store.get_meeting(id).unwrap().unwrap()
    }

    pub fn job(&self, kind: QueueKind, meeting_id: &str) -> Option<JobRecord> {
        self.queues.get(kind).get(&kind.job_id(meeting_id)).unwrap()
    }
}
