// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Durable meeting state store.
//!
//! One JSON document per meeting under `<state_dir>/meetings/`, with an
//! exclusive advisory lock taken for every mutation. The store is the only
//! durable source of truth: queues and temporary files can be lost and the
//! pipeline recovers by re-deriving work from the recorded phase.

use crate::doc::{self, DocError};
use crate::lock::FileLock;
use cmv_core::{sanitize, Clock, Meeting, MeetingPatch, Phase};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("meeting '{0}' not found")]
    NotFound(String),
    #[error("meeting id collision: '{requested}' and '{found}' share a sanitized name")]
    IdCollision { requested: String, found: String },
}

impl From<DocError> for StateError {
    fn from(e: DocError) -> Self {
        match e {
            DocError::Io(e) => StateError::Io(e),
            DocError::Json(e) => StateError::Json(e),
        }
    }
}

/// Outcome of [`StateStore::insert_if_absent`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    AlreadyPresent,
}

/// Durable mapping from meeting id to [`Meeting`].
///
/// Updates from different workers are serialized by the mutation lock;
/// readers observe whole documents thanks to rename-atomic writes.
pub struct StateStore {
    meetings_dir: PathBuf,
    lock_path: PathBuf,
}

impl StateStore {
    pub fn open(state_dir: &Path) -> Result<Self, StateError> {
        let meetings_dir = state_dir.join("meetings");
        fs::create_dir_all(&meetings_dir)?;
        Ok(Self {
            lock_path: state_dir.join("meetings.lock"),
            meetings_dir,
        })
    }

    fn meeting_path(&self, id: &str) -> PathBuf {
        self.meetings_dir.join(format!("{}.json", sanitize(id)))
    }

    pub fn get_meeting(&self, id: &str) -> Result<Option<Meeting>, StateError> {
        match doc::load::<Meeting>(&self.meeting_path(id))? {
            Some(meeting) if meeting.id == id => Ok(Some(meeting)),
            Some(meeting) => Err(StateError::IdCollision {
                requested: id.to_string(),
                found: meeting.id,
            }),
            None => Ok(None),
        }
    }

    /// All meetings, unordered.
    pub fn list_meetings(&self) -> Result<Vec<Meeting>, StateError> {
        let mut meetings = Vec::new();
        for entry in fs::read_dir(&self.meetings_dir)? {
            let path = entry?.path();
            if path.extension().is_some_and(|ext| ext == "json") {
                if let Some(meeting) = doc::load::<Meeting>(&path)? {
                    meetings.push(meeting);
                }
            }
        }
        Ok(meetings)
    }

    pub fn get_by_phase(&self, phase: Phase) -> Result<Vec<Meeting>, StateError> {
        let mut meetings = self.list_meetings()?;
        meetings.retain(|m| m.phase == phase);
        Ok(meetings)
    }

    /// Idempotent insert used by discovery: an already-present meeting is
    /// left untouched.
    pub fn insert_if_absent(&self, meeting: &Meeting) -> Result<InsertOutcome, StateError> {
        let _guard = FileLock::acquire(&self.lock_path)?;
        let path = self.meeting_path(&meeting.id);
        if doc::load::<Meeting>(&path)?.is_some() {
            return Ok(InsertOutcome::AlreadyPresent);
        }
        doc::store(&path, meeting)?;
        Ok(InsertOutcome::Inserted)
    }

    /// Atomic update of phase plus any subset of patchable fields; also
    /// bumps `updated_at_ms`. Errors propagate without leaving a partially
    /// applied document behind.
    pub fn update_meeting(
        &self,
        id: &str,
        phase: Phase,
        patch: &MeetingPatch,
        clock: &impl Clock,
    ) -> Result<Meeting, StateError> {
        let _guard = FileLock::acquire(&self.lock_path)?;
        let path = self.meeting_path(id);
        let mut meeting = doc::load::<Meeting>(&path)?
            .ok_or_else(|| StateError::NotFound(id.to_string()))?;
        if meeting.id != id {
            return Err(StateError::IdCollision {
                requested: id.to_string(),
                found: meeting.id,
            });
        }
        meeting.phase = phase;
        patch.apply(&mut meeting);
        meeting.updated_at_ms = clock.epoch_ms();
        doc::store(&path, &meeting)?;
        Ok(meeting)
    }
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
