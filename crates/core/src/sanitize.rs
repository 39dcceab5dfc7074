// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Meeting identifier sanitization for filesystem paths.

/// Map a meeting id to the character class `[A-Za-z0-9_]` for use in
/// artifact paths. Total: every input yields a non-empty result that is
/// safe as a single path component.
pub fn sanitize(meeting_id: &str) -> String {
    if meeting_id.is_empty() {
        return "_".to_string();
    }
    meeting_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect()
}

#[cfg(test)]
#[path = "sanitize_tests.rs"]
mod tests;
