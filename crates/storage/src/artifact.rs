// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Artifact store: one abstraction over pipeline files whether they live on
//! the local filesystem or behind the remote file server.
//!
//! Canonical paths come from [`ArtifactKind::rel_path`], so a phase owns its
//! output paths exclusively and no locking is needed. Keeping local and
//! remote access behind one trait lets the same worker binary run on a
//! standalone node or on a split deployment (e.g. a GPU-only diarize host).

use async_trait::async_trait;
use cmv_core::ArtifactKind;
use serde::Deserialize;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;

#[derive(Debug, thiserror::Error)]
pub enum ArtifactError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("remote returned {status} for {url}")]
    Remote { status: u16, url: String },
    #[error("artifact {kind} for meeting '{meeting_id}' not found")]
    Missing { kind: ArtifactKind, meeting_id: String },
    #[error("configuration error: {0}")]
    Config(String),
}

/// Uniform access to pipeline artifacts.
#[async_trait]
pub trait ArtifactStore: Send + Sync {
    /// Human-readable location, for logs and health output.
    fn describe(&self) -> String;

    /// Resolvable URL for the artifact (file:// locally, http:// remotely).
    fn url_for(&self, kind: ArtifactKind, meeting_id: &str) -> String;

    async fn exists(&self, kind: ArtifactKind, meeting_id: &str) -> Result<bool, ArtifactError>;

    async fn size_of(&self, kind: ArtifactKind, meeting_id: &str) -> Result<u64, ArtifactError>;

    /// Materialize the artifact to a local working path.
    async fn read_into(
        &self,
        kind: ArtifactKind,
        meeting_id: &str,
        dest: &Path,
    ) -> Result<(), ArtifactError>;

    /// Persist a local file as the artifact. Returns the storage-relative
    /// path recorded on the meeting.
    async fn write_from(
        &self,
        src: &Path,
        kind: ArtifactKind,
        meeting_id: &str,
    ) -> Result<String, ArtifactError>;
}

/// Artifact store on the local filesystem under a configurable root.
pub struct LocalStore {
    root: PathBuf,
}

impl LocalStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn abs_path(&self, kind: ArtifactKind, meeting_id: &str) -> PathBuf {
        self.root.join(kind.rel_path(meeting_id))
    }
}

#[async_trait]
impl ArtifactStore for LocalStore {
    fn describe(&self) -> String {
        format!("local:{}", self.root.display())
    }

    fn url_for(&self, kind: ArtifactKind, meeting_id: &str) -> String {
        format!("file://{}", self.abs_path(kind, meeting_id).display())
    }

    async fn exists(&self, kind: ArtifactKind, meeting_id: &str) -> Result<bool, ArtifactError> {
        Ok(tokio::fs::try_exists(self.abs_path(kind, meeting_id)).await?)
    }

    async fn size_of(&self, kind: ArtifactKind, meeting_id: &str) -> Result<u64, ArtifactError> {
        match tokio::fs::metadata(self.abs_path(kind, meeting_id)).await {
            Ok(meta) => Ok(meta.len()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(ArtifactError::Missing {
                kind,
                meeting_id: meeting_id.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    async fn read_into(
        &self,
        kind: ArtifactKind,
        meeting_id: &str,
        dest: &Path,
    ) -> Result<(), ArtifactError> {
        let src = self.abs_path(kind, meeting_id);
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        match tokio::fs::copy(&src, dest).await {
            Ok(_) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Err(ArtifactError::Missing {
                kind,
                meeting_id: meeting_id.to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    async fn write_from(
        &self,
        src: &Path,
        kind: ArtifactKind,
        meeting_id: &str,
    ) -> Result<String, ArtifactError> {
        let rel = kind.rel_path(meeting_id);
        let dest = self.root.join(&rel);
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        // Copy to a sibling temp name then rename so a concurrent reader
        // never sees a half-written artifact.
        let tmp = dest.with_extension("part");
        tokio::fs::copy(src, &tmp).await?;
        tokio::fs::rename(&tmp, &dest).await?;
        Ok(rel)
    }
}

#[derive(Deserialize)]
struct UploadResponse {
    success: bool,
    path: String,
}

/// Artifact store speaking HTTP to the cmv file server.
pub struct RemoteStore {
    base: String,
    client: reqwest::Client,
}

impl RemoteStore {
    pub fn new(base: impl Into<String>) -> Self {
        Self {
            base: base.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn file_url(&self, kind: ArtifactKind, meeting_id: &str) -> String {
        format!("{}/files/{}", self.base, kind.rel_path(meeting_id))
    }
}

#[async_trait]
impl ArtifactStore for RemoteStore {
    fn describe(&self) -> String {
        format!("remote:{}", self.base)
    }

    fn url_for(&self, kind: ArtifactKind, meeting_id: &str) -> String {
        self.file_url(kind, meeting_id)
    }

    async fn exists(&self, kind: ArtifactKind, meeting_id: &str) -> Result<bool, ArtifactError> {
        let url = self.file_url(kind, meeting_id);
        let resp = self.client.head(&url).send().await?;
        Ok(resp.status().is_success())
    }

    async fn size_of(&self, kind: ArtifactKind, meeting_id: &str) -> Result<u64, ArtifactError> {
        let url = self.file_url(kind, meeting_id);
        let resp = self.client.head(&url).send().await?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ArtifactError::Missing { kind, meeting_id: meeting_id.to_string() });
        }
        if !resp.status().is_success() {
            return Err(ArtifactError::Remote { status: resp.status().as_u16(), url });
        }
        resp.content_length()
            .ok_or_else(|| ArtifactError::Remote { status: resp.status().as_u16(), url })
    }

    async fn read_into(
        &self,
        kind: ArtifactKind,
        meeting_id: &str,
        dest: &Path,
    ) -> Result<(), ArtifactError> {
        let url = self.file_url(kind, meeting_id);
        let mut resp = self.client.get(&url).send().await?;
        if resp.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ArtifactError::Missing { kind, meeting_id: meeting_id.to_string() });
        }
        if !resp.status().is_success() {
            return Err(ArtifactError::Remote { status: resp.status().as_u16(), url });
        }
        if let Some(parent) = dest.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::File::create(dest).await?;
        while let Some(chunk) = resp.chunk().await? {
            file.write_all(&chunk).await?;
        }
        file.flush().await?;
        Ok(())
    }

    async fn write_from(
        &self,
        src: &Path,
        kind: ArtifactKind,
        meeting_id: &str,
    ) -> Result<String, ArtifactError> {
        let url = format!("{}/upload/{}/{}", self.base, kind, meeting_id);
        let file = tokio::fs::File::open(src).await?;
        let stream = tokio_util::io::ReaderStream::new(file);
        let part = reqwest::multipart::Part::stream(reqwest::Body::wrap_stream(stream))
            .file_name(kind.rel_path(meeting_id));
        let form = reqwest::multipart::Form::new().part("file", part);
        let resp = self.client.post(&url).multipart(form).send().await?;
        if !resp.status().is_success() {
            return Err(ArtifactError::Remote { status: resp.status().as_u16(), url });
        }
        let body: UploadResponse = resp.json().await?;
        if !body.success {
            return Err(ArtifactError::Remote { status: 500, url });
        }
        Ok(body.path)
    }
}

/// Select the artifact store from the environment: `IS_LOCAL=true` or an
/// unset `FILE_SERVER_HOST` picks the local store under `STORAGE_ROOT`,
/// otherwise the remote store against the configured file server.
pub fn store_from_env() -> Result<Arc<dyn ArtifactStore>, ArtifactError> {
    let is_local = std::env::var("IS_LOCAL")
        .map(|v| matches!(v.to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
        .unwrap_or(false);
    let host = std::env::var("FILE_SERVER_HOST").ok().filter(|h| !h.is_empty());

    if is_local || host.is_none() {
        let root = std::env::var("STORAGE_ROOT")
            .map_err(|_| ArtifactError::Config("STORAGE_ROOT is not set".to_string()))?;
        return Ok(Arc::new(LocalStore::new(root)));
    }

    let host = host.unwrap_or_default();
    let port = std::env::var("FILE_SERVER_PORT")
        .ok()
        .and_then(|p| p.parse::<u16>().ok())
        .unwrap_or(8080);
    Ok(Arc::new(RemoteStore::new(format!("http://{host}:{port}"))))
}

#[cfg(test)]
#[path = "artifact_tests.rs"]
mod tests;
