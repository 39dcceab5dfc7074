// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agenda model: bookmarks, agenda items, and the extracted metadata record.

use serde::{Deserialize, Serialize};

/// A video bookmark from the agenda page's `Bookmarks:` literal.
/// Field names follow the upstream wire format; times are milliseconds
/// from video start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bookmark {
    #[serde(rename = "AgendaItemId")]
    pub agenda_item_id: i64,
    #[serde(rename = "TimeStart")]
    pub time_start_ms: i64,
    #[serde(rename = "TimeEnd")]
    pub time_end_ms: i64,
}

/// One agenda item after joining titles with bookmarks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgendaItem {
    pub id: i64,
    pub title: String,
    /// Absent when the item has no bookmark; such items sort last.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time_start_ms: Option<i64>,
}

/// Join the ordered title stream with the bookmark stream and sort
/// ascending by start time. Items without a bookmark keep their relative
/// order after all timestamped items (stable sort, missing-last).
pub fn join_items(titles: &[(i64, String)], bookmarks: &[Bookmark]) -> Vec<AgendaItem> {
    let mut items: Vec<AgendaItem> = titles
        .iter()
        .map(|(id, title)| AgendaItem {
            id: *id,
            title: title.clone(),
            time_start_ms: bookmarks
                .iter()
                .find(|b| b.agenda_item_id == *id)
                .map(|b| b.time_start_ms),
        })
        .collect();
    items.sort_by_key(|item| item.time_start_ms.unwrap_or(i64::MAX));
    items
}

/// Metadata record written alongside the chapter description.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeetingMetadata {
    pub meeting_id: String,
    pub title: String,
    pub date: String,
    /// Joined and sorted agenda items.
    pub items: Vec<AgendaItem>,
    /// Raw bookmarks as parsed from the agenda page.
    pub bookmarks: Vec<Bookmark>,
    pub extracted_at_ms: u64,
    /// Present when audio extraction failed (the phase still succeeds;
    /// diarization is skipped downstream).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_error: Option<String>,
}

#[cfg(test)]
#[path = "agenda_tests.rs"]
mod tests;
