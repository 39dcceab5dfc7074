// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for worker and discovery
//! processes. Missing required configuration is a fatal startup error;
//! the supervisor restarts per its policy once the environment is fixed.

use crate::error::EngineError;
use chrono::FixedOffset;
use cmv_adapters::parse_utc_offset;
use std::path::PathBuf;
use std::time::Duration;

fn required(var: &str) -> Result<String, EngineError> {
    std::env::var(var)
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| EngineError::Config(format!("{var} is not set")))
}

/// Root directory for artifacts (local mode and the file server).
pub fn storage_root() -> Result<PathBuf, EngineError> {
    required("STORAGE_ROOT").map(PathBuf::from)
}

/// Scratch directory for in-flight work. Default: `<tmp>/cmv`.
pub fn run_root() -> PathBuf {
    std::env::var("CMV_RUN_ROOT")
        .map(PathBuf::from)
        .unwrap_or_else(|_| std::env::temp_dir().join("cmv"))
}

/// Shutdown drain deadline (default 30s, `CMV_DRAIN_TIMEOUT_MS`).
pub fn drain_timeout() -> Duration {
    millis_var("CMV_DRAIN_TIMEOUT_MS").unwrap_or(Duration::from_secs(30))
}

/// Queue poll sleep when idle (default 500ms, `CMV_POLL_INTERVAL_MS`).
pub fn poll_interval() -> Duration {
    millis_var("CMV_POLL_INTERVAL_MS").unwrap_or(Duration::from_millis(500))
}

/// Age past which an active job is considered abandoned by a crashed
/// worker (default 1h, `CMV_STALE_ACTIVE_MS`).
pub fn stale_active_after() -> Duration {
    millis_var("CMV_STALE_ACTIVE_MS").unwrap_or(Duration::from_secs(3600))
}

fn millis_var(var: &str) -> Option<Duration> {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
}

/// Base URL of the municipal calendar site.
pub fn calendar_base_url() -> Result<String, EngineError> {
    required("CALENDAR_BASE_URL")
}

/// Calendar timezone offset (default `-04:00`, `CALENDAR_UTC_OFFSET`).
/// Configurable because the upstream API pins a fixed offset that may not
/// track the municipality's DST rules.
pub fn calendar_offset() -> Result<FixedOffset, EngineError> {
    let raw = std::env::var("CALENDAR_UTC_OFFSET").unwrap_or_else(|_| "-04:00".to_string());
    parse_utc_offset(&raw).map_err(|e| EngineError::Config(e.to_string()))
}

/// Location tag appended to published titles.
pub fn location_tag() -> Result<String, EngineError> {
    required("LOCATION_TAG")
}

/// Tag list attached to uploads (`UPLOAD_TAGS`, comma-separated).
pub fn upload_tags() -> Vec<String> {
    std::env::var("UPLOAD_TAGS")
        .map(|raw| {
            raw.split(',')
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Video download command (default `yt-dlp`, `CMV_YTDLP_BIN`).
pub fn downloader_cmd() -> String {
    std::env::var("CMV_YTDLP_BIN").unwrap_or_else(|_| "yt-dlp".to_string())
}

/// Audio extraction command (default `ffmpeg`, `CMV_FFMPEG_BIN`).
pub fn ffmpeg_cmd() -> String {
    std::env::var("CMV_FFMPEG_BIN").unwrap_or_else(|_| "ffmpeg".to_string())
}

/// Uploader command holding the host credentials (`CMV_UPLOADER_CMD`).
pub fn uploader_cmd() -> Result<String, EngineError> {
    required("CMV_UPLOADER_CMD")
}

/// Diarization container command (`CMV_DIARIZE_CMD`).
pub fn diarize_cmd() -> Result<String, EngineError> {
    required("CMV_DIARIZE_CMD")
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
