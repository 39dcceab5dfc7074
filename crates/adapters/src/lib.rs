// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! cmv-adapters: external collaborators behind trait seams.
//!
//! The pipeline core treats the calendar API, agenda pages, the video
//! downloader, audio extraction, the video host, and the diarization
//! container as opaque collaborators. Each gets a trait, a production
//! implementation (HTTP via reqwest or a configured subprocess), and a
//! `Fake*` implementation behind the `test-support` feature.

pub mod agenda;
pub mod audio;
pub mod calendar;
pub mod diarize;
pub mod downloader;
pub mod host;
mod subprocess;

pub use agenda::{AgendaClient, HttpAgendaClient};
pub use audio::{AudioExtractor, FfmpegAudioExtractor};
pub use calendar::{
    default_month_range, parse_utc_offset, CalendarClient, CalendarMeeting, DateRange,
    HttpCalendarClient,
};
pub use diarize::{CommandDiarizer, Diarizer};
pub use downloader::{CommandVideoDownloader, VideoDownloader};
pub use host::{CommandVideoHost, PlaylistResult, UploadOutcome, UploadRequest, VideoHost};

#[cfg(any(test, feature = "test-support"))]
pub use agenda::FakeAgendaClient;
#[cfg(any(test, feature = "test-support"))]
pub use audio::FakeAudioExtractor;
#[cfg(any(test, feature = "test-support"))]
pub use calendar::FakeCalendarClient;
#[cfg(any(test, feature = "test-support"))]
pub use diarize::FakeDiarizer;
#[cfg(any(test, feature = "test-support"))]
pub use downloader::FakeVideoDownloader;
#[cfg(any(test, feature = "test-support"))]
pub use host::FakeVideoHost;

/// Errors from external collaborators. Workers classify these as transient
/// unless a precondition of their own is violated.
#[derive(Debug, thiserror::Error)]
pub enum AdapterError {
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status {status} from {url}")]
    Status { status: u16, url: String },
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("{program} exited with {status:?}: {stderr}")]
    Subprocess {
        program: String,
        status: Option<i32>,
        stderr: String,
    },
    #[error("parse error: {0}")]
    Parse(String),
    #[error("configuration error: {0}")]
    Config(String),
}
