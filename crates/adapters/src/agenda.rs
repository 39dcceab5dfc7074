// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agenda page client and HTML extraction.
//!
//! The agenda page carries two streams the extract worker joins: a
//! `Bookmarks: [...]` JSON literal with per-item start/end times, and
//! repeated `AgendaItem` div blocks holding the ordered item titles.

use crate::AdapterError;
use async_trait::async_trait;
use cmv_core::Bookmark;
use regex::Regex;
use std::sync::OnceLock;

#[async_trait]
pub trait AgendaClient: Send + Sync {
    /// Fetch the raw agenda HTML for a meeting.
    async fn fetch_agenda(&self, meeting_id: &str) -> Result<String, AdapterError>;
}

/// Production client for the municipal agenda pages.
pub struct HttpAgendaClient {
    base_url: String,
    client: reqwest::Client,
}

impl HttpAgendaClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl AgendaClient for HttpAgendaClient {
    async fn fetch_agenda(&self, meeting_id: &str) -> Result<String, AdapterError> {
        let url = format!(
            "{}/Meeting.aspx?Id={}&Agenda=Agenda&lang=English",
            self.base_url, meeting_id
        );
        let resp = self.client.get(&url).send().await?;
        if !resp.status().is_success() {
            return Err(AdapterError::Status { status: resp.status().as_u16(), url });
        }
        Ok(resp.text().await?)
    }
}

/// Extract the `Bookmarks: [...]` JSON array. The literal may span lines;
/// the array is located by bracket matching from the marker.
pub fn parse_bookmarks(html: &str) -> Result<Vec<Bookmark>, AdapterError> {
    let marker = html
        .find("Bookmarks:")
        .ok_or_else(|| AdapterError::Parse("no Bookmarks literal in agenda page".to_string()))?;
    let rest = &html[marker..];
    let open = rest
        .find('[')
        .ok_or_else(|| AdapterError::Parse("Bookmarks literal has no array".to_string()))?;
    let mut depth = 0usize;
    let mut end = None;
    for (i, c) in rest[open..].char_indices() {
        match c {
            '[' => depth += 1,
            ']' => {
                depth -= 1;
                if depth == 0 {
                    end = Some(open + i + 1);
                    break;
                }
            }
            _ => {}
        }
    }
    let end =
        end.ok_or_else(|| AdapterError::Parse("unterminated Bookmarks array".to_string()))?;
    let bookmarks: Vec<Bookmark> = serde_json::from_str(&rest[open..end])
        .map_err(|e| AdapterError::Parse(format!("invalid Bookmarks JSON: {e}")))?;
    Ok(bookmarks)
}

fn title_block_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        // Pattern is a literal; construction cannot fail.
        #[allow(clippy::unwrap_used)]
        let re = Regex::new(
            r#"(?is)class="AgendaItem\s+AgendaItem(\d+)[\s"].*?class="AgendaItemTitle"[^>]*>.*?<a[^>]*>(.*?)</a>"#,
        )
        .unwrap();
        re
    })
}

fn tag_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        #[allow(clippy::unwrap_used)]
        let re = Regex::new(r"<[^>]+>").unwrap();
        re
    })
}

/// Decode the handful of HTML entities that show up in agenda titles.
fn unescape(text: &str) -> String {
    let mut out = text
        .replace("&amp;", "&")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&nbsp;", " ");
    if out.contains("&#") {
        static NUM: OnceLock<Regex> = OnceLock::new();
        #[allow(clippy::unwrap_used)]
        let re = NUM.get_or_init(|| Regex::new(r"&#(\d+);").unwrap());
        out = re
            .replace_all(&out, |caps: &regex::Captures| {
                caps[1]
                    .parse::<u32>()
                    .ok()
                    .and_then(char::from_u32)
                    .map(String::from)
                    .unwrap_or_default()
            })
            .into_owned();
    }
    out
}

/// Extract `(agenda_item_id, title)` pairs in document order.
pub fn parse_agenda_titles(html: &str) -> Vec<(i64, String)> {
    title_block_re()
        .captures_iter(html)
        .filter_map(|caps| {
            let id: i64 = caps.get(1)?.as_str().parse().ok()?;
            let raw_title = caps.get(2)?.as_str();
            let title = unescape(tag_re().replace_all(raw_title, "").trim());
            (!title.is_empty()).then_some((id, title))
        })
        .collect()
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::AgendaClient;
    use crate::AdapterError;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::collections::HashMap;
    use std::sync::Arc;

    /// Fake agenda client serving canned HTML per meeting id.
    #[derive(Clone, Default)]
    pub struct FakeAgendaClient {
        pages: Arc<Mutex<HashMap<String, String>>>,
    }

    impl FakeAgendaClient {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn set_page(&self, meeting_id: &str, html: impl Into<String>) {
            self.pages.lock().insert(meeting_id.to_string(), html.into());
        }
    }

    #[async_trait]
    impl AgendaClient for FakeAgendaClient {
        async fn fetch_agenda(&self, meeting_id: &str) -> Result<String, AdapterError> {
            self.pages.lock().get(meeting_id).cloned().ok_or_else(|| AdapterError::Status {
                status: 404,
                url: format!("fake://agenda/{meeting_id}"),
            })
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeAgendaClient;

#[cfg(test)]
#[path = "agenda_tests.rs"]
mod tests;
