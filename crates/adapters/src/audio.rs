// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Audio track extraction adapter.

use crate::subprocess::{check_status, split_command};
use crate::AdapterError;
use async_trait::async_trait;
use std::path::Path;
use tokio::process::Command;

#[async_trait]
pub trait AudioExtractor: Send + Sync {
    /// Extract the audio track of `video` into `dest`.
    async fn extract(&self, video: &Path, dest: &Path) -> Result<(), AdapterError>;
}

/// Production extractor invoking a configured ffmpeg binary.
pub struct FfmpegAudioExtractor {
    cmd: String,
}

impl FfmpegAudioExtractor {
    pub fn new(cmd: impl Into<String>) -> Self {
        Self { cmd: cmd.into() }
    }
}

#[async_trait]
impl AudioExtractor for FfmpegAudioExtractor {
    async fn extract(&self, video: &Path, dest: &Path) -> Result<(), AdapterError> {
        let (program, args) = split_command(&self.cmd)?;
        let output = Command::new(&program)
            .args(&args)
            .arg("-y")
            .arg("-i")
            .arg(video)
            .arg("-vn")
            .arg("-acodec")
            .arg("copy")
            .arg(dest)
            .output()
            .await?;
        check_status(&program, &output)
    }
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::AudioExtractor;
    use crate::AdapterError;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::path::Path;
    use std::sync::Arc;

    /// Fake extractor writing placeholder audio, with a failure switch for
    /// exercising the audio-is-optional path.
    #[derive(Clone, Default)]
    pub struct FakeAudioExtractor {
        fail_with: Arc<Mutex<Option<String>>>,
    }

    impl FakeAudioExtractor {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn fail_with(&self, message: &str) {
            *self.fail_with.lock() = Some(message.to_string());
        }

        pub fn clear_failure(&self) {
            *self.fail_with.lock() = None;
        }
    }

    #[async_trait]
    impl AudioExtractor for FakeAudioExtractor {
        async fn extract(&self, _video: &Path, dest: &Path) -> Result<(), AdapterError> {
            if let Some(message) = self.fail_with.lock().clone() {
                return Err(AdapterError::Subprocess {
                    program: "fake-ffmpeg".to_string(),
                    status: Some(1),
                    stderr: message,
                });
            }
            if let Some(parent) = dest.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(dest, b"fake audio bytes").await?;
            Ok(())
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeAudioExtractor;
