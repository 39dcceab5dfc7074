// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Meeting record and pipeline phase state machine.

use crate::queue::QueueKind;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// A meeting's position in the pipeline.
///
/// Transitions are monotonic except via explicit operator reset:
/// `Discovered → Downloaded → Extracted → Uploaded → Diarized`, with
/// `Failed` reachable from any non-terminal phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Discovered,
    Downloaded,
    Extracted,
    Uploaded,
    Diarized,
    Failed,
}

crate::simple_display! {
    Phase {
        Discovered => "discovered",
        Downloaded => "downloaded",
        Extracted => "extracted",
        Uploaded => "uploaded",
        Diarized => "diarized",
        Failed => "failed",
    }
}

impl Phase {
    /// Phases a meeting never leaves without operator intervention.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Phase::Diarized | Phase::Failed)
    }

    /// Successor phase per the transition table. None for terminal phases.
    pub fn next(&self) -> Option<Phase> {
        match self {
            Phase::Discovered => Some(Phase::Downloaded),
            Phase::Downloaded => Some(Phase::Extracted),
            Phase::Extracted => Some(Phase::Uploaded),
            Phase::Uploaded => Some(Phase::Diarized),
            Phase::Diarized | Phase::Failed => None,
        }
    }

    /// Queue whose worker moves a meeting *out* of this phase.
    pub fn driving_queue(&self) -> Option<QueueKind> {
        match self {
            Phase::Discovered => Some(QueueKind::Download),
            Phase::Downloaded => Some(QueueKind::Extract),
            Phase::Extracted => Some(QueueKind::Upload),
            Phase::Uploaded => Some(QueueKind::Diarize),
            Phase::Diarized | Phase::Failed => None,
        }
    }
}

impl FromStr for Phase {
    type Err = UnknownPhase;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "discovered" => Ok(Phase::Discovered),
            "downloaded" => Ok(Phase::Downloaded),
            "extracted" => Ok(Phase::Extracted),
            "uploaded" => Ok(Phase::Uploaded),
            "diarized" => Ok(Phase::Diarized),
            "failed" => Ok(Phase::Failed),
            _ => Err(UnknownPhase(s.to_string())),
        }
    }
}

/// Error for unrecognized phase names.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown phase '{0}'")]
pub struct UnknownPhase(pub String);

/// The central pipeline entity. Created by discovery, mutated only through
/// the orchestrator, never deleted by the core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Meeting {
    /// Externally assigned opaque identifier.
    pub id: String,
    pub title: String,
    /// Raw calendar start date, e.g. `2025-06-05 19:00`.
    pub date: String,
    /// Source page URL the downloader is pointed at.
    pub source_url: String,
    pub phase: Phase,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_video_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chapters_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diarized_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_url: Option<String>,
    /// Message of the most recent failure.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Phase the worker was executing when the failure happened, so an
    /// operator can restart from there.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_at_phase: Option<Phase>,
    /// Raw bookmark/agenda JSON captured at extract time.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agenda: Option<serde_json::Value>,
    /// Generated chapter description text (the upload description).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chapters: Option<String>,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
}

impl Meeting {
    /// Create a newly discovered meeting.
    pub fn discovered(
        id: impl Into<String>,
        title: impl Into<String>,
        date: impl Into<String>,
        source_url: impl Into<String>,
        now_ms: u64,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            date: date.into(),
            source_url: source_url.into(),
            phase: Phase::Discovered,
            raw_video_path: None,
            chapters_path: None,
            metadata_path: None,
            audio_path: None,
            diarized_path: None,
            published_url: None,
            error_message: None,
            failed_at_phase: None,
            agenda: None,
            chapters: None,
            created_at_ms: now_ms,
            updated_at_ms: now_ms,
        }
    }

    /// `YYYY-MM-DD` derived from the stored date: first whitespace token,
    /// slashes mapped to dashes. Used in the chapter header and published
    /// title.
    pub fn date_ymd(&self) -> String {
        self.date
            .split_whitespace()
            .next()
            .unwrap_or("")
            .replace('/', "-")
    }
}

/// Field patch applied together with a phase write in one atomic update.
/// Only `Some` fields are written; `clear_failure` additionally resets the
/// error fields (operator restart).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MeetingPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_video_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chapters_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub diarized_path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failed_at_phase: Option<Phase>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agenda: Option<serde_json::Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub chapters: Option<String>,
    #[serde(default)]
    pub clear_failure: bool,
}

impl MeetingPatch {
    pub fn new() -> Self {
        Self::default()
    }

    crate::setters! {
        into {
            clear_failure: bool,
            agenda: Option<serde_json::Value>,
        }
        option {
            raw_video_path: String,
            chapters_path: String,
            metadata_path: String,
            audio_path: String,
            diarized_path: String,
            published_url: String,
            error_message: String,
            failed_at_phase: Phase,
            chapters: String,
        }
    }

    /// Apply the patch to a meeting record (phase and timestamps are the
    /// store's responsibility).
    pub fn apply(&self, meeting: &mut Meeting) {
        if let Some(v) = &self.raw_video_path {
            meeting.raw_video_path = Some(v.clone());
        }
        if let Some(v) = &self.chapters_path {
            meeting.chapters_path = Some(v.clone());
        }
        if let Some(v) = &self.metadata_path {
            meeting.metadata_path = Some(v.clone());
        }
        if let Some(v) = &self.audio_path {
            meeting.audio_path = Some(v.clone());
        }
        if let Some(v) = &self.diarized_path {
            meeting.diarized_path = Some(v.clone());
        }
        if let Some(v) = &self.published_url {
            meeting.published_url = Some(v.clone());
        }
        if let Some(v) = &self.error_message {
            meeting.error_message = Some(v.clone());
        }
        if let Some(v) = self.failed_at_phase {
            meeting.failed_at_phase = Some(v);
        }
        if let Some(v) = &self.agenda {
            meeting.agenda = Some(v.clone());
        }
        if let Some(v) = &self.chapters {
            meeting.chapters = Some(v.clone());
        }
        if self.clear_failure {
            meeting.error_message = None;
            meeting.failed_at_phase = None;
        }
    }
}

crate::builder! {
    pub struct MeetingBuilder => Meeting {
        into {
            id: String = "m1",
            title: String = "City Commission - Regular",
            date: String = "2025-06-05 19:00",
            source_url: String = "https://example.test/Meeting.aspx?Id=m1",
            phase: Phase = Phase::Discovered,
        }
        option {
            raw_video_path: String = None,
            chapters_path: String = None,
            metadata_path: String = None,
            audio_path: String = None,
            diarized_path: String = None,
            published_url: String = None,
            error_message: String = None,
            failed_at_phase: Phase = None,
            agenda: serde_json::Value = None,
            chapters: String = None,
        }
        computed {
            created_at_ms: u64 = 0,
            updated_at_ms: u64 = 0,
        }
    }
}

#[cfg(test)]
#[path = "meeting_tests.rs"]
mod tests;
