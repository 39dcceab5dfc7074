// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Persistent per-phase job queues.
//!
//! Delivery is at-least-once: a worker that crashes mid-job leaves the job
//! active, and the reconcile sweep requeues it later. Job identifiers are
//! deterministic (`<queue>-<meetingId>`) and act as the dedup key: at most
//! one job per id may be live (waiting, active, or delayed) at any instant.

use crate::doc::{self, DocError};
use crate::lock::FileLock;
use cmv_core::QueueKind;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Bounded retention of terminal jobs, kept for operator visibility.
pub const COMPLETED_RETENTION: usize = 100;
pub const FAILED_RETENTION: usize = 500;

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("job '{0}' not found")]
    NotFound(String),
    #[error("job '{job_id}' is {actual}, expected {expected}")]
    WrongState {
        job_id: String,
        actual: JobState,
        expected: &'static str,
    },
}

impl From<DocError> for QueueError {
    fn from(e: DocError) -> Self {
        match e {
            DocError::Io(e) => QueueError::Io(e),
            DocError::Json(e) => QueueError::Json(e),
        }
    }
}

/// Retry with exponential backoff: attempt N is redelivered after
/// `backoff_base_ms * 2^(N-1)`.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub backoff_base_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self { max_attempts: 3, backoff_base_ms: 2_000 }
    }
}

impl RetryPolicy {
    fn backoff_ms(&self, attempt: u32) -> u64 {
        let shift = attempt.saturating_sub(1).min(16);
        self.backoff_base_ms.saturating_mul(1 << shift)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Waiting,
    Active,
    Delayed,
    Completed,
    Failed,
}

cmv_core::simple_display! {
    JobState {
        Waiting => "waiting",
        Active => "active",
        Delayed => "delayed",
        Completed => "completed",
        Failed => "failed",
    }
}

impl JobState {
    /// Live states participate in the dedup invariant.
    pub fn is_live(&self) -> bool {
        matches!(self, JobState::Waiting | JobState::Active | JobState::Delayed)
    }
}

impl FromStr for JobState {
    type Err = UnknownJobState;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "waiting" => Ok(JobState::Waiting),
            "active" => Ok(JobState::Active),
            "delayed" => Ok(JobState::Delayed),
            "completed" => Ok(JobState::Completed),
            "failed" => Ok(JobState::Failed),
            _ => Err(UnknownJobState(s.to_string())),
        }
    }
}

/// Error for unrecognized job state names.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown job state '{0}' (expected waiting, active, delayed, completed, or failed)")]
pub struct UnknownJobState(pub String);

/// A queue entry. Carries only the meeting id; everything else a worker
/// needs is re-derived from the state store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRecord {
    pub id: String,
    pub meeting_id: String,
    pub state: JobState,
    pub attempts: u32,
    /// Redelivery time for delayed jobs.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub not_before_ms: Option<u64>,
    pub pushed_at_ms: u64,
    pub updated_at_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_error: Option<String>,
}

/// Outcome of an enqueue attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enqueued {
    Queued,
    /// A live job with the same id already exists; enqueue was a no-op.
    Duplicate,
}

/// Per-queue operator statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct QueueStats {
    pub waiting: usize,
    pub active: usize,
    pub delayed: usize,
    pub completed: usize,
    pub failed: usize,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct QueueDoc {
    jobs: Vec<JobRecord>,
}

/// One persisted queue, stored as a locked JSON document.
pub struct JobQueue {
    kind: QueueKind,
    doc_path: PathBuf,
    lock_path: PathBuf,
    policy: RetryPolicy,
}

impl JobQueue {
    pub fn open(state_dir: &Path, kind: QueueKind) -> Result<Self, QueueError> {
        Self::open_with_policy(state_dir, kind, RetryPolicy::default())
    }

    pub fn open_with_policy(
        state_dir: &Path,
        kind: QueueKind,
        policy: RetryPolicy,
    ) -> Result<Self, QueueError> {
        let queues_dir = state_dir.join("queues");
        fs::create_dir_all(&queues_dir)?;
        Ok(Self {
            doc_path: queues_dir.join(format!("{}.json", kind.name())),
            lock_path: queues_dir.join(format!("{}.lock", kind.name())),
            kind,
            policy,
        })
    }

    pub fn kind(&self) -> QueueKind {
        self.kind
    }

    fn with_doc<T>(
        &self,
        f: impl FnOnce(&mut QueueDoc) -> Result<T, QueueError>,
    ) -> Result<T, QueueError> {
        let _guard = FileLock::acquire(&self.lock_path)?;
        let mut doc = doc::load::<QueueDoc>(&self.doc_path)?.unwrap_or_default();
        let result = f(&mut doc)?;
        doc::store(&self.doc_path, &doc)?;
        Ok(result)
    }

    fn read_doc(&self) -> Result<QueueDoc, QueueError> {
        Ok(doc::load::<QueueDoc>(&self.doc_path)?.unwrap_or_default())
    }

    /// Enqueue a job for `meeting_id`. No-op when a live job with the same
    /// deterministic id exists; a terminal record with the same id is
    /// replaced by the fresh job.
    pub fn enqueue(&self, meeting_id: &str, now_ms: u64) -> Result<Enqueued, QueueError> {
        let job_id = self.kind.job_id(meeting_id);
        self.with_doc(|doc| {
            if doc.jobs.iter().any(|j| j.id == job_id && j.state.is_live()) {
                return Ok(Enqueued::Duplicate);
            }
            doc.jobs.retain(|j| j.id != job_id);
            doc.jobs.push(JobRecord {
                id: job_id.clone(),
                meeting_id: meeting_id.to_string(),
                state: JobState::Waiting,
                attempts: 0,
                not_before_ms: None,
                pushed_at_ms: now_ms,
                updated_at_ms: now_ms,
                last_error: None,
            });
            Ok(Enqueued::Queued)
        })
    }

    /// Promote due delayed jobs, then hand out the oldest waiting job as
    /// active. Returns None when nothing is ready.
    pub fn take(&self, now_ms: u64) -> Result<Option<JobRecord>, QueueError> {
        self.with_doc(|doc| {
            for job in &mut doc.jobs {
                if job.state == JobState::Delayed
                    && job.not_before_ms.is_none_or(|t| t <= now_ms)
                {
                    job.state = JobState::Waiting;
                    job.not_before_ms = None;
                    job.updated_at_ms = now_ms;
                }
            }
            let Some(job) = doc
                .jobs
                .iter_mut()
                .filter(|j| j.state == JobState::Waiting)
                .min_by_key(|j| j.pushed_at_ms)
            else {
                return Ok(None);
            };
            job.state = JobState::Active;
            job.updated_at_ms = now_ms;
            Ok(Some(job.clone()))
        })
    }

    /// Terminal success. Completed retention is bounded; the oldest records
    /// are dropped past [`COMPLETED_RETENTION`].
    pub fn complete(&self, job_id: &str, now_ms: u64) -> Result<(), QueueError> {
        self.with_doc(|doc| {
            let job = find_mut(&mut doc.jobs, job_id)?;
            job.state = JobState::Completed;
            job.not_before_ms = None;
            job.updated_at_ms = now_ms;
            trim(&mut doc.jobs, JobState::Completed, COMPLETED_RETENTION);
            Ok(())
        })
    }

    /// Record a failure. Below the attempt limit the job is delayed for
    /// exponential-backoff redelivery; at the limit it lands in `failed`.
    pub fn fail(&self, job_id: &str, error: &str, now_ms: u64) -> Result<JobState, QueueError> {
        self.with_doc(|doc| {
            let policy = self.policy;
            let job = find_mut(&mut doc.jobs, job_id)?;
            job.attempts += 1;
            job.last_error = Some(error.to_string());
            if job.attempts >= policy.max_attempts {
                job.state = JobState::Failed;
                job.not_before_ms = None;
            } else {
                job.state = JobState::Delayed;
                job.not_before_ms = Some(now_ms + policy.backoff_ms(job.attempts));
            }
            job.updated_at_ms = now_ms;
            let state = job.state;
            trim(&mut doc.jobs, JobState::Failed, FAILED_RETENTION);
            Ok(state)
        })
    }

    /// Straight to `failed` with no retry, used for logical precondition
    /// failures where redelivery cannot help.
    pub fn fail_fast(&self, job_id: &str, error: &str, now_ms: u64) -> Result<(), QueueError> {
        self.with_doc(|doc| {
            let job = find_mut(&mut doc.jobs, job_id)?;
            job.attempts += 1;
            job.last_error = Some(error.to_string());
            job.state = JobState::Failed;
            job.not_before_ms = None;
            job.updated_at_ms = now_ms;
            trim(&mut doc.jobs, JobState::Failed, FAILED_RETENTION);
            Ok(())
        })
    }

    /// Operator retry: move a failed job back to waiting with a clean slate.
    pub fn retry(&self, job_id: &str, now_ms: u64) -> Result<(), QueueError> {
        self.with_doc(|doc| {
            let job = find_mut(&mut doc.jobs, job_id)?;
            if job.state != JobState::Failed {
                return Err(QueueError::WrongState {
                    job_id: job_id.to_string(),
                    actual: job.state,
                    expected: "failed",
                });
            }
            job.state = JobState::Waiting;
            job.attempts = 0;
            job.not_before_ms = None;
            job.last_error = None;
            job.updated_at_ms = now_ms;
            Ok(())
        })
    }

    /// Remove a job outright. Returns false when no such job exists.
    pub fn remove(&self, job_id: &str) -> Result<bool, QueueError> {
        self.with_doc(|doc| {
            let before = doc.jobs.len();
            doc.jobs.retain(|j| j.id != job_id);
            Ok(doc.jobs.len() != before)
        })
    }

    pub fn get(&self, job_id: &str) -> Result<Option<JobRecord>, QueueError> {
        Ok(self.read_doc()?.jobs.into_iter().find(|j| j.id == job_id))
    }

    /// List jobs, optionally filtered by state, newest first.
    pub fn list(&self, state: Option<JobState>) -> Result<Vec<JobRecord>, QueueError> {
        let mut jobs = self.read_doc()?.jobs;
        if let Some(state) = state {
            jobs.retain(|j| j.state == state);
        }
        jobs.sort_by(|a, b| b.pushed_at_ms.cmp(&a.pushed_at_ms));
        Ok(jobs)
    }

    pub fn stats(&self) -> Result<QueueStats, QueueError> {
        let mut stats = QueueStats::default();
        for job in self.read_doc()?.jobs {
            match job.state {
                JobState::Waiting => stats.waiting += 1,
                JobState::Active => stats.active += 1,
                JobState::Delayed => stats.delayed += 1,
                JobState::Completed => stats.completed += 1,
                JobState::Failed => stats.failed += 1,
            }
        }
        Ok(stats)
    }

    /// Remove jobs in `state` whose last update is at least `min_age_ms`
    /// old. Returns the number removed.
    pub fn clean(&self, state: JobState, min_age_ms: u64, now_ms: u64) -> Result<usize, QueueError> {
        self.with_doc(|doc| {
            let before = doc.jobs.len();
            doc.jobs
                .retain(|j| j.state != state || now_ms.saturating_sub(j.updated_at_ms) < min_age_ms);
            Ok(before - doc.jobs.len())
        })
    }

    /// Remove all jobs in `state` regardless of age.
    pub fn clear(&self, state: JobState) -> Result<usize, QueueError> {
        self.with_doc(|doc| {
            let before = doc.jobs.len();
            doc.jobs.retain(|j| j.state != state);
            Ok(before - doc.jobs.len())
        })
    }

    /// Requeue active jobs that have not been touched for `max_age_ms`:
    /// the crash-recovery half of the reconcile sweep.
    pub fn requeue_stale_active(&self, max_age_ms: u64, now_ms: u64) -> Result<usize, QueueError> {
        self.with_doc(|doc| {
            let mut requeued = 0;
            for job in &mut doc.jobs {
                if job.state == JobState::Active
                    && now_ms.saturating_sub(job.updated_at_ms) >= max_age_ms
                {
                    job.state = JobState::Waiting;
                    job.updated_at_ms = now_ms;
                    requeued += 1;
                }
            }
            Ok(requeued)
        })
    }

    /// True when a live job exists for the meeting. Query side of the dedup
    /// invariant, used by the reconcile sweep.
    pub fn has_live_job(&self, meeting_id: &str) -> Result<bool, QueueError> {
        let job_id = self.kind.job_id(meeting_id);
        Ok(self
            .read_doc()?
            .jobs
            .iter()
            .any(|j| j.id == job_id && j.state.is_live()))
    }
}

fn find_mut<'a>(jobs: &'a mut [JobRecord], job_id: &str) -> Result<&'a mut JobRecord, QueueError> {
    jobs.iter_mut()
        .find(|j| j.id == job_id)
        .ok_or_else(|| QueueError::NotFound(job_id.to_string()))
}

/// Drop the oldest jobs in `state` past `cap` (by last update).
fn trim(jobs: &mut Vec<JobRecord>, state: JobState, cap: usize) {
    let count = jobs.iter().filter(|j| j.state == state).count();
    if count <= cap {
        return;
    }
    let mut in_state: Vec<(u64, String)> = jobs
        .iter()
        .filter(|j| j.state == state)
        .map(|j| (j.updated_at_ms, j.id.clone()))
        .collect();
    in_state.sort();
    let drop_ids: Vec<String> =
        in_state.into_iter().take(count - cap).map(|(_, id)| id).collect();
    jobs.retain(|j| j.state != state || !drop_ids.contains(&j.id));
}

/// All four workflow queues opened together.
pub struct QueueSet {
    download: JobQueue,
    extract: JobQueue,
    upload: JobQueue,
    diarize: JobQueue,
}

impl QueueSet {
    pub fn open(state_dir: &Path) -> Result<Self, QueueError> {
        Ok(Self {
            download: JobQueue::open(state_dir, QueueKind::Download)?,
            extract: JobQueue::open(state_dir, QueueKind::Extract)?,
            upload: JobQueue::open(state_dir, QueueKind::Upload)?,
            diarize: JobQueue::open(state_dir, QueueKind::Diarize)?,
        })
    }

    pub fn get(&self, kind: QueueKind) -> &JobQueue {
        match kind {
            QueueKind::Download => &self.download,
            QueueKind::Extract => &self.extract,
            QueueKind::Upload => &self.upload,
            QueueKind::Diarize => &self.diarize,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &JobQueue> {
        QueueKind::ALL.iter().map(|kind| self.get(*kind))
    }
}

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
