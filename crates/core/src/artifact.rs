// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Artifact kinds and the canonical storage layout.
//!
//! Every file the pipeline produces or consumes has a kind; given a kind
//! and a meeting id the storage-relative path is fully determined, which is
//! what lets crashed workers re-run without coordination.

use crate::sanitize::sanitize;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactKind {
    RawVideo,
    RawAgenda,
    DerivedAudio,
    DerivedChapters,
    DerivedMetadata,
    DerivedDiarized,
}

crate::simple_display! {
    ArtifactKind {
        RawVideo => "raw_video",
        RawAgenda => "raw_agenda",
        DerivedAudio => "derived_audio",
        DerivedChapters => "derived_chapters",
        DerivedMetadata => "derived_metadata",
        DerivedDiarized => "derived_diarized",
    }
}

impl ArtifactKind {
    pub const ALL: [ArtifactKind; 6] = [
        ArtifactKind::RawVideo,
        ArtifactKind::RawAgenda,
        ArtifactKind::DerivedAudio,
        ArtifactKind::DerivedChapters,
        ArtifactKind::DerivedMetadata,
        ArtifactKind::DerivedDiarized,
    ];

    /// Storage-relative path for this kind. Pure: no I/O, no state.
    pub fn rel_path(&self, meeting_id: &str) -> String {
        let sid = sanitize(meeting_id);
        match self {
            ArtifactKind::RawVideo => format!("raw/videos/{sid}.mp4"),
            ArtifactKind::RawAgenda => format!("raw/agendas/{sid}_agenda.html"),
            ArtifactKind::DerivedAudio => format!("derived/audio/{sid}.m4a"),
            ArtifactKind::DerivedChapters => format!("derived/chapters/{sid}_chapters.txt"),
            ArtifactKind::DerivedMetadata => format!("derived/metadata/{sid}_metadata.json"),
            ArtifactKind::DerivedDiarized => format!("derived/diarized/{sid}_diarized.json"),
        }
    }
}

impl FromStr for ArtifactKind {
    type Err = UnknownArtifactKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "raw_video" => Ok(ArtifactKind::RawVideo),
            "raw_agenda" => Ok(ArtifactKind::RawAgenda),
            "derived_audio" => Ok(ArtifactKind::DerivedAudio),
            "derived_chapters" => Ok(ArtifactKind::DerivedChapters),
            "derived_metadata" => Ok(ArtifactKind::DerivedMetadata),
            "derived_diarized" => Ok(ArtifactKind::DerivedDiarized),
            _ => Err(UnknownArtifactKind(s.to_string())),
        }
    }
}

/// Error for unrecognized artifact kind names.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown artifact kind '{0}'")]
pub struct UnknownArtifactKind(pub String);

#[cfg(test)]
#[path = "artifact_tests.rs"]
mod tests;
