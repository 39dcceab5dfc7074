// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Chapter description generation.
//!
//! The external video host requires the first chapter to start at origin,
//! so a synthetic `Pre-meeting` line is prepended whenever the earliest
//! timestamped item does not round to `00:00:00`.

use crate::agenda::AgendaItem;

/// Format milliseconds from video start as `HH:MM:SS`.
/// Negative inputs clamp to zero; hours grow past 99 unclamped.
pub fn format_timestamp(ms: i64) -> String {
    let total_secs = ms.max(0) / 1000;
    let hours = total_secs / 3600;
    let minutes = (total_secs % 3600) / 60;
    let seconds = total_secs % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

/// Generate the chapter description document consumed as the upload
/// description. `date_ymd` is the meeting's normalized `YYYY-MM-DD` date.
/// Untimed items are omitted from the chapter list.
pub fn chapter_description(title: &str, date_ymd: &str, items: &[AgendaItem]) -> String {
    let mut timed: Vec<(i64, &str)> = items
        .iter()
        .filter_map(|item| item.time_start_ms.map(|t| (t, item.title.as_str())))
        .collect();
    timed.sort_by_key(|(t, _)| *t);

    let mut out = format!("{title} - {date_ymd}\n\nChapters:\n");
    if let Some((first, _)) = timed.first() {
        if format_timestamp(*first) != "00:00:00" {
            out.push_str("00:00:00 Pre-meeting\n");
        }
    }
    for (t, item_title) in timed {
        out.push_str(&format_timestamp(t));
        out.push(' ');
        out.push_str(item_title);
        out.push('\n');
    }
    out
}

#[cfg(test)]
#[path = "chapters_tests.rs"]
mod tests;
