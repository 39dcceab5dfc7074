// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Speaker diarization adapter.

use crate::subprocess::{check_status, split_command};
use crate::AdapterError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;

/// File name the diarization tool writes inside the scratch directory.
pub const DIARIZED_FILE: &str = "diarized.json";

#[async_trait]
pub trait Diarizer: Send + Sync {
    /// Run diarization over `audio`, using `scratch` as the working
    /// directory. Returns the path of the emitted JSON transcript.
    async fn diarize(&self, audio: &Path, scratch: &Path) -> Result<PathBuf, AdapterError>;
}

/// Production diarizer running the configured container command. The
/// command receives the audio path and scratch directory as its final two
/// arguments and must leave `diarized.json` in the scratch directory.
pub struct CommandDiarizer {
    cmd: String,
}

impl CommandDiarizer {
    pub fn new(cmd: impl Into<String>) -> Self {
        Self { cmd: cmd.into() }
    }
}

#[async_trait]
impl Diarizer for CommandDiarizer {
    async fn diarize(&self, audio: &Path, scratch: &Path) -> Result<PathBuf, AdapterError> {
        let (program, args) = split_command(&self.cmd)?;
        tracing::info!(audio = %audio.display(), scratch = %scratch.display(), "starting diarization");
        let output = Command::new(&program)
            .args(&args)
            .arg(audio)
            .arg(scratch)
            .output()
            .await?;
        check_status(&program, &output)?;

        let result = scratch.join(DIARIZED_FILE);
        if !result.exists() {
            return Err(AdapterError::Parse(format!(
                "diarization produced no {DIARIZED_FILE} in {}",
                scratch.display()
            )));
        }
        Ok(result)
    }
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::{Diarizer, DIARIZED_FILE};
    use crate::AdapterError;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::path::{Path, PathBuf};
    use std::sync::Arc;

    /// Fake diarizer emitting a canned transcript.
    #[derive(Clone, Default)]
    pub struct FakeDiarizer {
        fail_with: Arc<Mutex<Option<String>>>,
    }

    impl FakeDiarizer {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn fail_with(&self, message: &str) {
            *self.fail_with.lock() = Some(message.to_string());
        }
    }

    #[async_trait]
    impl Diarizer for FakeDiarizer {
        async fn diarize(&self, _audio: &Path, scratch: &Path) -> Result<PathBuf, AdapterError> {
            if let Some(message) = self.fail_with.lock().clone() {
                return Err(AdapterError::Subprocess {
                    program: "fake-diarizer".to_string(),
                    status: Some(1),
                    stderr: message,
                });
            }
            let result = scratch.join(DIARIZED_FILE);
            tokio::fs::write(
                &result,
                br#"{"segments": [{"speaker": "SPEAKER_00", "start": 0.0, "end": 2.5, "text": "Call to order."}]}"#,
            )
            .await?;
            Ok(result)
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeDiarizer;
