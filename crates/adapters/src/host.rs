// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Video host upload adapter.
//!
//! Publication is at-least-once: the host client must treat the meeting id
//! embedded in the request as an idempotency token. OAuth and API specifics
//! live entirely inside the configured uploader command.

use crate::subprocess::{check_status, split_command};
use crate::AdapterError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

/// Everything the host needs to publish one video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UploadRequest {
    /// Idempotency token for at-least-once publication.
    pub meeting_id: String,
    pub title: String,
    /// Chapter description document.
    pub description: String,
    pub tags: Vec<String>,
    /// Playlist/category identifiers the video is added to.
    pub playlists: Vec<String>,
    pub video: PathBuf,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaylistResult {
    pub playlist_id: String,
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadOutcome {
    /// Published video URL.
    pub url: String,
    #[serde(default)]
    pub playlists: Vec<PlaylistResult>,
}

#[async_trait]
pub trait VideoHost: Send + Sync {
    async fn upload(&self, request: &UploadRequest) -> Result<UploadOutcome, AdapterError>;
}

/// Production host client: the configured command receives the request as
/// JSON on stdin and answers with an [`UploadOutcome`] JSON document on
/// stdout.
pub struct CommandVideoHost {
    cmd: String,
}

impl CommandVideoHost {
    pub fn new(cmd: impl Into<String>) -> Self {
        Self { cmd: cmd.into() }
    }
}

#[async_trait]
impl VideoHost for CommandVideoHost {
    async fn upload(&self, request: &UploadRequest) -> Result<UploadOutcome, AdapterError> {
        let (program, args) = split_command(&self.cmd)?;
        let mut child = Command::new(&program)
            .args(&args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let body = serde_json::to_vec(request)?;
        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(&body).await?;
            stdin.shutdown().await?;
        }
        let output = child.wait_with_output().await?;
        check_status(&program, &output)?;

        let outcome: UploadOutcome = serde_json::from_slice(&output.stdout)
            .map_err(|e| AdapterError::Parse(format!("invalid uploader response: {e}")))?;
        Ok(outcome)
    }
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::{UploadOutcome, UploadRequest, VideoHost};
    use crate::AdapterError;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Fake host recording upload requests and answering with a canned URL.
    #[derive(Clone)]
    pub struct FakeVideoHost {
        inner: Arc<Mutex<FakeHostState>>,
    }

    struct FakeHostState {
        requests: Vec<UploadRequest>,
        fail_with: Option<String>,
    }

    impl FakeVideoHost {
        pub fn new() -> Self {
            Self {
                inner: Arc::new(Mutex::new(FakeHostState {
                    requests: Vec::new(),
                    fail_with: None,
                })),
            }
        }

        pub fn fail_with(&self, message: &str) {
            self.inner.lock().fail_with = Some(message.to_string());
        }

        pub fn requests(&self) -> Vec<UploadRequest> {
            self.inner.lock().requests.clone()
        }
    }

    impl Default for FakeVideoHost {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl VideoHost for FakeVideoHost {
        async fn upload(&self, request: &UploadRequest) -> Result<UploadOutcome, AdapterError> {
            let (fail, url) = {
                let mut state = self.inner.lock();
                state.requests.push(request.clone());
                (
                    state.fail_with.clone(),
                    format!("https://video.example/watch/{}", request.meeting_id),
                )
            };
            if let Some(message) = fail {
                return Err(AdapterError::Status { status: 503, url: message });
            }
            Ok(UploadOutcome {
                url,
                playlists: request
                    .playlists
                    .iter()
                    .map(|id| super::PlaylistResult {
                        playlist_id: id.clone(),
                        ok: true,
                        detail: None,
                    })
                    .collect(),
            })
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeVideoHost;
