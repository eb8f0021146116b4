use chrono::{DateTime, Local, TimeZone};
use serde::{Deserialize, Serialize};

// ─── Events ───────────────────────────────────────────────────────

/// A single log event as returned by `FilterLogEvents`.
///
/// `ingestion_time` is the dedup and watermark clock. `timestamp` is the
/// producer's own time and can lag well behind ingestion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEvent {
    pub event_id: String,
    pub group: String,
    pub stream: String,
    /// Milliseconds since the Unix epoch.
    pub ingestion_time: i64,
    /// Milliseconds since the Unix epoch.
    pub timestamp: i64,
    pub message: String,
}

// ─── Streams ──────────────────────────────────────────────────────

/// A log stream observed active during discovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogStream {
    pub name: String,
    /// `lastIngestionTime` of the stream, in milliseconds. Used instead of
    /// `lastEventTimestamp`, which CloudWatch updates lazily.
    pub last_ingestion_time: i64,
}

// ─── Watermark ────────────────────────────────────────────────────

/// Per-group progress marker bounding the next poll's query window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Watermark {
    last_seen: i64,
}

impl Watermark {
    pub fn new(start_ms: i64) -> Self {
        Self {
            last_seen: start_ms,
        }
    }

    pub fn get(self) -> i64 {
        self.last_seen
    }

    /// Move the watermark forward. Never moves backwards; returns whether the
    /// value changed.
    pub fn advance(&mut self, ingestion_time: i64) -> bool {
        if ingestion_time > self.last_seen {
            self.last_seen = ingestion_time;
            true
        } else {
            false
        }
    }
}

/// Render epoch milliseconds as RFC 3339 in the local timezone.
pub fn format_millis(millis: i64) -> String {
    match Local.timestamp_millis_opt(millis).single() {
        Some(dt) => dt.to_rfc3339_opts(chrono::SecondsFormat::Secs, false),
        None => millis.to_string(),
    }
}

/// Current wall-clock time in epoch milliseconds.
pub fn now_millis() -> i64 {
    let now: DateTime<chrono::Utc> = chrono::Utc::now();
    now.timestamp_millis()
}
