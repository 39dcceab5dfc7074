// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Video downloader adapter.

use crate::subprocess::{check_status, split_command};
use crate::AdapterError;
use async_trait::async_trait;
use std::path::Path;
use tokio::process::Command;

#[async_trait]
pub trait VideoDownloader: Send + Sync {
    /// Fetch the meeting video from its source page into `dest`.
    async fn download(&self, source_url: &str, dest: &Path) -> Result<(), AdapterError>;
}

/// Production downloader invoking a configured yt-dlp-style tool.
/// Credentials and format selection live in the tool's own configuration;
/// the pipeline only supplies the source URL and output path.
pub struct CommandVideoDownloader {
    cmd: String,
}

impl CommandVideoDownloader {
    pub fn new(cmd: impl Into<String>) -> Self {
        Self { cmd: cmd.into() }
    }
}

#[async_trait]
impl VideoDownloader for CommandVideoDownloader {
    async fn download(&self, source_url: &str, dest: &Path) -> Result<(), AdapterError> {
        let (program, args) = split_command(&self.cmd)?;
        tracing::info!(url = source_url, dest = %dest.display(), "starting video download");
        let output = Command::new(&program)
            .args(&args)
            .arg("-o")
            .arg(dest)
            .arg(source_url)
            .output()
            .await?;
        check_status(&program, &output)
    }
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::VideoDownloader;
    use crate::AdapterError;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::path::{Path, PathBuf};
    use std::sync::Arc;

    /// Fake downloader that writes placeholder bytes and records calls.
    #[derive(Clone)]
    pub struct FakeVideoDownloader {
        inner: Arc<Mutex<FakeDownloaderState>>,
    }

    struct FakeDownloaderState {
        calls: Vec<(String, PathBuf)>,
        fail_with: Option<String>,
    }

    impl FakeVideoDownloader {
        pub fn new() -> Self {
            Self {
                inner: Arc::new(Mutex::new(FakeDownloaderState {
                    calls: Vec::new(),
                    fail_with: None,
                })),
            }
        }

        /// Make subsequent downloads fail with the given message.
        pub fn fail_with(&self, message: &str) {
            self.inner.lock().fail_with = Some(message.to_string());
        }

        pub fn calls(&self) -> Vec<(String, PathBuf)> {
            self.inner.lock().calls.clone()
        }
    }

    impl Default for FakeVideoDownloader {
        fn default() -> Self {
            Self::new()
        }
    }

    #[async_trait]
    impl VideoDownloader for FakeVideoDownloader {
        async fn download(&self, source_url: &str, dest: &Path) -> Result<(), AdapterError> {
            let fail = {
                let mut state = self.inner.lock();
                state.calls.push((source_url.to_string(), dest.to_path_buf()));
                state.fail_with.clone()
            };
            if let Some(message) = fail {
                return Err(AdapterError::Subprocess {
                    program: "fake-downloader".to_string(),
                    status: Some(1),
                    stderr: message,
                });
            }
            if let Some(parent) = dest.parent() {
                tokio::fs::create_dir_all(parent).await?;
            }
            tokio::fs::write(dest, b"fake video bytes").await?;
            Ok(())
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeVideoDownloader;
