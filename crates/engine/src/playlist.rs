// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Playlist routing for the upload worker.
//!
//! Meeting titles are matched against an ordered table of case-insensitive
//! patterns; each pattern maps to a `PLAYLIST_*` environment variable whose
//! value is the host-side playlist identifier. Rules without a configured
//! identifier contribute nothing.

use crate::error::EngineError;
use regex::RegexBuilder;

/// Ordered pattern → env var table for the municipal bodies we publish.
pub const RULE_TABLE: &[(&str, &str)] = &[
    ("^City Commission", "PLAYLIST_CITY_COMMISSION"),
    ("^General Policy Committee", "PLAYLIST_GENERAL_POLICY_COMMITTEE"),
    ("^Community Redevelopment Agency", "PLAYLIST_CRA"),
    ("^City Plan Board", "PLAYLIST_PLAN_BOARD"),
    ("^Utility Advisory Board", "PLAYLIST_UTILITY_ADVISORY_BOARD"),
];

#[derive(Debug, Clone)]
pub struct PlaylistRule {
    pattern: regex::Regex,
    playlist_id: String,
}

impl PlaylistRule {
    pub fn new(pattern: &str, playlist_id: impl Into<String>) -> Result<Self, EngineError> {
        let pattern = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|e| EngineError::Config(format!("invalid playlist pattern '{pattern}': {e}")))?;
        Ok(Self { pattern, playlist_id: playlist_id.into() })
    }

    pub fn playlist_id(&self) -> &str {
        &self.playlist_id
    }
}

/// Build the active rule list from [`RULE_TABLE`] and the environment.
/// Only table entries whose env var holds a non-empty value produce rules.
pub fn rules_from_env() -> Result<Vec<PlaylistRule>, EngineError> {
    let mut rules = Vec::new();
    for (pattern, var) in RULE_TABLE {
        if let Some(id) = std::env::var(var).ok().filter(|v| !v.is_empty()) {
            rules.push(PlaylistRule::new(pattern, id)?);
        }
    }
    Ok(rules)
}

/// Playlist identifiers for a meeting title, in rule order.
pub fn match_playlists(title: &str, rules: &[PlaylistRule]) -> Vec<String> {
    rules
        .iter()
        .filter(|rule| rule.pattern.is_match(title))
        .map(|rule| rule.playlist_id.clone())
        .collect()
}

#[cfg(test)]
#[path = "playlist_tests.rs"]
mod tests;
