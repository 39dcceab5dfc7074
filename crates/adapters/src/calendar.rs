// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Calendar API client: discovers public meetings for a date range.

use crate::AdapterError;
use async_trait::async_trait;
use chrono::{DateTime, Datelike, FixedOffset, TimeZone, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Inclusive-exclusive discovery window, carried in the calendar's fixed
/// offset so the formatted bounds match what the API expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
}

impl DateRange {
    /// ISO-8601 with explicit offset, e.g. `2025-06-01T00:00:00-04:00`.
    pub fn start_param(&self) -> String {
        self.start.format("%Y-%m-%dT%H:%M:%S%:z").to_string()
    }

    pub fn end_param(&self) -> String {
        self.end.format("%Y-%m-%dT%H:%M:%S%:z").to_string()
    }
}

/// Parse a `±HH:MM` offset string (e.g. the default `-04:00`).
pub fn parse_utc_offset(s: &str) -> Result<FixedOffset, AdapterError> {
    let bad = || AdapterError::Config(format!("invalid UTC offset '{s}' (expected ±HH:MM)"));
    let (sign, rest) = match s.split_at_checked(1) {
        Some(("+", rest)) => (1, rest),
        Some(("-", rest)) => (-1, rest),
        _ => return Err(bad()),
    };
    let (hh, mm) = rest.split_once(':').ok_or_else(bad)?;
    let hours: i32 = hh.parse().map_err(|_| bad())?;
    let minutes: i32 = mm.parse().map_err(|_| bad())?;
    let secs = sign * (hours * 3600 + minutes * 60);
    FixedOffset::east_opt(secs).ok_or_else(bad)
}

/// Default window: first instant of the current calendar month through the
/// first instant of the next month, in the configured offset.
pub fn default_month_range(now_ms: u64, offset: FixedOffset) -> DateRange {
    let now = DateTime::<Utc>::from_timestamp_millis(now_ms as i64)
        .unwrap_or_default()
        .with_timezone(&offset);
    let (year, month) = (now.year(), now.month());
    let (next_year, next_month) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    // Day 1 at midnight always exists in a fixed offset
    let start = offset
        .with_ymd_and_hms(year, month, 1, 0, 0, 0)
        .single()
        .unwrap_or(now);
    let end = offset
        .with_ymd_and_hms(next_year, next_month, 1, 0, 0, 0)
        .single()
        .unwrap_or(now);
    DateRange { start, end }
}

/// Accept the upstream `ID` field as either a JSON string or number.
fn de_string_or_number<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum StringOrNumber {
        String(String),
        Number(i64),
    }
    Ok(match StringOrNumber::deserialize(deserializer)? {
        StringOrNumber::String(s) => s,
        StringOrNumber::Number(n) => n.to_string(),
    })
}

/// One meeting as reported by the calendar endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CalendarMeeting {
    #[serde(rename = "ID", deserialize_with = "de_string_or_number")]
    pub id: String,
    #[serde(rename = "MeetingName")]
    pub name: String,
    #[serde(rename = "StartDate")]
    pub start_date: String,
    #[serde(rename = "HasVideo", default)]
    pub has_video: bool,
}

#[async_trait]
pub trait CalendarClient: Send + Sync {
    async fn fetch_meetings(&self, range: &DateRange) -> Result<Vec<CalendarMeeting>, AdapterError>;
}

#[derive(Serialize)]
struct CalendarRequest {
    #[serde(rename = "calendarStartDate")]
    calendar_start_date: String,
    #[serde(rename = "calendarEndDate")]
    calendar_end_date: String,
}

#[derive(Deserialize)]
struct CalendarEnvelope {
    d: Vec<CalendarMeeting>,
}

/// Production client for the municipal calendar endpoint.
pub struct HttpCalendarClient {
    base_url: String,
    client: reqwest::Client,
}

impl HttpCalendarClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl CalendarClient for HttpCalendarClient {
    async fn fetch_meetings(&self, range: &DateRange) -> Result<Vec<CalendarMeeting>, AdapterError> {
        let url = format!("{}/MeetingsCalendarView.aspx/GetCalendarMeetings", self.base_url);
        let body = CalendarRequest {
            calendar_start_date: range.start_param(),
            calendar_end_date: range.end_param(),
        };
        let resp = self.client.post(&url).json(&body).send().await?;
        if !resp.status().is_success() {
            return Err(AdapterError::Status { status: resp.status().as_u16(), url });
        }
        let envelope: CalendarEnvelope = resp.json().await?;
        tracing::debug!(count = envelope.d.len(), "fetched calendar meetings");
        Ok(envelope.d)
    }
}

#[cfg(any(test, feature = "test-support"))]
mod fake {
    use super::{CalendarClient, CalendarMeeting, DateRange};
    use crate::AdapterError;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::Arc;

    /// Fake calendar serving a canned meeting list and recording ranges.
    #[derive(Clone, Default)]
    pub struct FakeCalendarClient {
        inner: Arc<Mutex<FakeCalendarState>>,
    }

    #[derive(Default)]
    struct FakeCalendarState {
        meetings: Vec<CalendarMeeting>,
        ranges: Vec<(String, String)>,
    }

    impl FakeCalendarClient {
        pub fn new(meetings: Vec<CalendarMeeting>) -> Self {
            Self {
                inner: Arc::new(Mutex::new(FakeCalendarState { meetings, ranges: Vec::new() })),
            }
        }

        /// Ranges seen by `fetch_meetings`, as formatted parameters.
        pub fn requested_ranges(&self) -> Vec<(String, String)> {
            self.inner.lock().ranges.clone()
        }
    }

    #[async_trait]
    impl CalendarClient for FakeCalendarClient {
        async fn fetch_meetings(
            &self,
            range: &DateRange,
        ) -> Result<Vec<CalendarMeeting>, AdapterError> {
            let mut state = self.inner.lock();
            state.ranges.push((range.start_param(), range.end_param()));
            Ok(state.meetings.clone())
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeCalendarClient;

#[cfg(test)]
#[path = "calendar_tests.rs"]
mod tests;
