//! `LogsBackend` trait: one call per page of each CloudWatch Logs API the
//! tailer uses. Pagination is driven by the caller so that it can stop early,
//! react to cancellation between pages, and dedup page by page.

use async_trait::async_trait;
use cwtail_core::LogEvent;

use crate::error::ApiError;

// ─── Log groups ─────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GroupPage {
    pub group_names: Vec<String>,
    pub next_token: Option<String>,
}

// ─── Log streams ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamOrder {
    /// Sorted by stream name, restricted to a name prefix.
    NamePrefix,
    /// Most recently active stream first.
    LastEventTimeDescending,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamQuery {
    pub group: String,
    pub order: StreamOrder,
    pub prefix: Option<String>,
}

/// A stream as described by `DescribeLogStreams`. Activity fields are absent
/// for streams that have never received an event.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawLogStream {
    pub name: String,
    pub first_event_timestamp: Option<i64>,
    pub last_event_timestamp: Option<i64>,
    pub last_ingestion_time: Option<i64>,
}

impl RawLogStream {
    /// `lastIngestionTime` if the stream has any recorded activity at all.
    pub fn activity(&self) -> Option<i64> {
        match (
            self.first_event_timestamp,
            self.last_event_timestamp,
            self.last_ingestion_time,
        ) {
            (Some(_), Some(_), Some(ingested)) => Some(ingested),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StreamPage {
    pub streams: Vec<RawLogStream>,
    pub next_token: Option<String>,
}

// ─── Log events ─────────────────────────────────────────────────────

/// Bounds of one `FilterLogEvents` pagination, applied identically to every
/// page request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterQuery {
    pub group: String,
    pub stream_names: Vec<String>,
    pub start_time: i64,
    pub end_time: Option<i64>,
    pub filter_pattern: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventPage {
    pub events: Vec<LogEvent>,
    pub next_token: Option<String>,
}

impl EventPage {
    pub fn is_last(&self) -> bool {
        self.next_token.is_none()
    }
}

// ─── Trait ──────────────────────────────────────────────────────────

/// Paged access to CloudWatch Logs. Enables mock injection for testing.
#[async_trait]
pub trait LogsBackend: Send + Sync {
    async fn describe_log_groups(&self, next_token: Option<String>)
    -> Result<GroupPage, ApiError>;

    async fn describe_log_streams(
        &self,
        query: &StreamQuery,
        next_token: Option<String>,
    ) -> Result<StreamPage, ApiError>;

    /// Interleaved, time-ordered events across `query.stream_names`.
    async fn filter_log_events(
        &self,
        query: &FilterQuery,
        next_token: Option<String>,
    ) -> Result<EventPage, ApiError>;
}

#[async_trait]
impl<T: LogsBackend + ?Sized> LogsBackend for std::sync::Arc<T> {
    async fn describe_log_groups(
        &self,
        next_token: Option<String>,
    ) -> Result<GroupPage, ApiError> {
        (**self).describe_log_groups(next_token).await
    }

    async fn describe_log_streams(
        &self,
        query: &StreamQuery,
        next_token: Option<String>,
    ) -> Result<StreamPage, ApiError> {
        (**self).describe_log_streams(query, next_token).await
    }

    async fn filter_log_events(
        &self,
        query: &FilterQuery,
        next_token: Option<String>,
    ) -> Result<EventPage, ApiError> {
        (**self).filter_log_events(query, next_token).await
    }
}
