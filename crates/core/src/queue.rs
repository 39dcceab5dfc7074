// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Workflow queues and deterministic job identifiers.

use crate::meeting::Phase;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// One persisted queue per pipeline transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QueueKind {
    Download,
    Extract,
    Upload,
    Diarize,
}

crate::simple_display! {
    QueueKind {
        Download => "download",
        Extract => "extract",
        Upload => "upload",
        Diarize => "diarize",
    }
}

impl QueueKind {
    /// All queues, in pipeline order.
    pub const ALL: [QueueKind; 4] = [
        QueueKind::Download,
        QueueKind::Extract,
        QueueKind::Upload,
        QueueKind::Diarize,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            QueueKind::Download => "download",
            QueueKind::Extract => "extract",
            QueueKind::Upload => "upload",
            QueueKind::Diarize => "diarize",
        }
    }

    /// Deterministic job identifier. Doubles as the dedup key: at most one
    /// job with this id may be live per queue.
    pub fn job_id(&self, meeting_id: &str) -> String {
        format!("{}-{}", self.name(), meeting_id)
    }

    /// Phase a meeting must be in for this queue's worker to act on it.
    pub fn expects(&self) -> Phase {
        match self {
            QueueKind::Download => Phase::Discovered,
            QueueKind::Extract => Phase::Downloaded,
            QueueKind::Upload => Phase::Extracted,
            QueueKind::Diarize => Phase::Uploaded,
        }
    }

    /// Phase recorded after this queue's worker completes its transition.
    pub fn on_success(&self) -> Phase {
        match self {
            QueueKind::Download => Phase::Downloaded,
            QueueKind::Extract => Phase::Extracted,
            QueueKind::Upload => Phase::Uploaded,
            QueueKind::Diarize => Phase::Diarized,
        }
    }
}

impl FromStr for QueueKind {
    type Err = UnknownQueue;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "download" => Ok(QueueKind::Download),
            "extract" => Ok(QueueKind::Extract),
            "upload" => Ok(QueueKind::Upload),
            "diarize" => Ok(QueueKind::Diarize),
            _ => Err(UnknownQueue(s.to_string())),
        }
    }
}

/// Error for unrecognized queue names.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown queue '{0}' (expected download, extract, upload, or diarize)")]
pub struct UnknownQueue(pub String);

#[cfg(test)]
#[path = "queue_tests.rs"]
mod tests;
