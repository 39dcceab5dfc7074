// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! cmv-server: the artifact file server.
//!
//! Serves the storage root to remote-mode workers: static reads under
//! `/files/`, multipart uploads routed through the canonical artifact
//! layout, and a health endpoint. Every resolved path is confined to the
//! storage root.

use axum::body::Body;
use axum::extract::{DefaultBodyLimit, Multipart, Path as UrlPath, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use cmv_core::ArtifactKind;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::io::AsyncWriteExt;
use tower_http::trace::TraceLayer;

/// Meeting ids accepted on the upload route.
const MEETING_ID_MAX: usize = 100;

#[derive(Clone)]
pub struct AppState {
    root: Arc<PathBuf>,
    started: Instant,
}

impl AppState {
    pub fn new(root: PathBuf) -> Self {
        Self { root: Arc::new(root), started: Instant::now() }
    }
}

/// Build the file-server router over `root`.
pub fn router(root: PathBuf) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/files/*path", get(serve_file))
        .route("/upload/*path", post(upload))
        .layer(DefaultBodyLimit::disable())
        .layer(TraceLayer::new_for_http())
        .with_state(AppState::new(root))
}

#[derive(Debug, thiserror::Error)]
enum ApiError {
    #[error("{0}")]
    BadRequest(String),
    #[error("path resolves outside the storage root")]
    Forbidden,
    #[error("not found")]
    NotFound,
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    error: String,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if matches!(self, ApiError::Io(_)) {
            tracing::error!(error = %self, "request failed");
        }
        let body = ErrorBody { success: false, error: self.to_string() };
        (status, Json(body)).into_response()
    }
}

#[derive(Serialize)]
struct HealthBody {
    status: &'static str,
    storage_root: String,
    uptime_seconds: u64,
}

async fn health(State(state): State<AppState>) -> Json<HealthBody> {
    Json(HealthBody {
        status: "ok",
        storage_root: state.root.display().to_string(),
        uptime_seconds: state.started.elapsed().as_secs(),
    })
}

/// Confine a request path to the storage root: no traversal components, no
/// dotfiles, forward slashes only.
fn resolve_under_root(root: &Path, rel: &str) -> Result<PathBuf, ApiError> {
    if rel.is_empty() || rel.contains('\\') {
        return Err(ApiError::Forbidden);
    }
    for segment in rel.split('/') {
        if segment.is_empty() || segment.starts_with('.') {
            return Err(ApiError::Forbidden);
        }
    }
    Ok(root.join(rel))
}

fn content_type_for(path: &Path) -> &'static str {
    match path.extension().and_then(|e| e.to_str()) {
        Some("mp4") => "video/mp4",
        Some("m4a") => "audio/mp4",
        Some("json") => "application/json",
        Some("txt") => "text/plain; charset=utf-8",
        Some("html") => "text/html; charset=utf-8",
        _ => "application/octet-stream",
    }
}

async fn serve_file(
    State(state): State<AppState>,
    UrlPath(path): UrlPath<String>,
) -> Result<Response, ApiError> {
    let full = resolve_under_root(&state.root, &path)?;
    let file = match tokio::fs::File::open(&full).await {
        Ok(f) => f,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Err(ApiError::NotFound),
        Err(e) => return Err(e.into()),
    };
    let len = file.metadata().await?.len();
    let stream = tokio_util::io::ReaderStream::new(file);
    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type_for(&full))
        .header(header::CONTENT_LENGTH, len)
        .body(Body::from_stream(stream))
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;
    Ok(response)
}

/// Validate the upload route's `<kind>/<meeting_id>` suffix. Anything that
/// is not exactly two well-formed segments is a 400.
fn parse_upload_path(rest: &str) -> Result<(ArtifactKind, String), ApiError> {
    let mut segments = rest.split('/');
    let (Some(kind), Some(id), None) = (segments.next(), segments.next(), segments.next()) else {
        return Err(ApiError::BadRequest(format!(
            "expected /upload/<kind>/<meeting_id>, got '{rest}'"
        )));
    };
    let kind: ArtifactKind = kind
        .parse()
        .map_err(|e: cmv_core::artifact::UnknownArtifactKind| ApiError::BadRequest(e.to_string()))?;
    if id.is_empty()
        || id.len() > MEETING_ID_MAX
        || !id.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'_' || b == b'-')
    {
        return Err(ApiError::BadRequest(format!("invalid meeting id '{id}'")));
    }
    Ok((kind, id.to_string()))
}

#[derive(Serialize)]
struct UploadBody {
    success: bool,
    path: String,
}

async fn upload(
    State(state): State<AppState>,
    UrlPath(path): UrlPath<String>,
    mut multipart: Multipart,
) -> Result<Json<UploadBody>, ApiError> {
    let (kind, meeting_id) = parse_upload_path(&path)?;
    let rel = kind.rel_path(&meeting_id);
    let dest = resolve_under_root(&state.root, &rel)?;
    if !dest.starts_with(state.root.as_ref()) {
        return Err(ApiError::Forbidden);
    }
    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let tmp = dest.with_extension("part");
    let result = receive_file(&mut multipart, &tmp).await;
    match result {
        Ok(()) => {
            if let Err(e) = tokio::fs::rename(&tmp, &dest).await {
                let _ = tokio::fs::remove_file(&tmp).await;
                return Err(e.into());
            }
            tracing::info!(kind = %kind, meeting_id, path = %rel, "artifact uploaded");
            Ok(Json(UploadBody { success: true, path: rel }))
        }
        Err(e) => {
            let _ = tokio::fs::remove_file(&tmp).await;
            Err(e)
        }
    }
}

/// Stream the single `file` field into `tmp`.
async fn receive_file(multipart: &mut Multipart, tmp: &Path) -> Result<(), ApiError> {
    while let Some(mut field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("malformed multipart body: {e}")))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let mut out = tokio::fs::File::create(tmp).await?;
        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| ApiError::BadRequest(format!("upload truncated: {e}")))?
        {
            out.write_all(&chunk).await?;
        }
        out.flush().await?;
        return Ok(());
    }
    Err(ApiError::BadRequest("missing 'file' field".to_string()))
}

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
