//! Active stream discovery for one log group.
//!
//! Without a name prefix, streams are requested most-recently-active first and
//! the listing stops at the first page that is both partly stale and holds no
//! matching fresh stream. With a prefix CloudWatch cannot sort by recency, so
//! every page is scanned.

use std::time::Duration;

use cwtail_cloudwatch::{ApiError, LogsBackend, RawLogStream, StreamOrder, StreamQuery};
use cwtail_core::{LogStream, StreamFilter};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

/// Pause after a throttled listing before the caller's next cycle.
pub const THROTTLE_BACKOFF: Duration = Duration::from_millis(500);

/// What one page of `DescribeLogStreams` contributed.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct PageScan {
    pub fresh: Vec<LogStream>,
    /// Smallest `lastIngestionTime` among streams with activity, matching or not.
    pub min_activity: Option<i64>,
}

impl PageScan {
    /// Whether a recency-ordered listing can still hold fresh streams past
    /// this page.
    pub fn worth_continuing(&self, since: i64) -> bool {
        match self.min_activity {
            None => true,
            Some(min) => min >= since || !self.fresh.is_empty(),
        }
    }
}

/// Apply the activity, name and freshness tests to one page.
pub fn scan_page(streams: &[RawLogStream], since: i64, filter: &StreamFilter) -> PageScan {
    let mut scan = PageScan::default();
    for raw in streams {
        // Streams that never received an event carry no timestamps.
        let Some(ingested) = raw.activity() else {
            continue;
        };
        scan.min_activity = Some(scan.min_activity.map_or(ingested, |m| m.min(ingested)));
        if !filter.matches(&raw.name) || ingested < since {
            continue;
        }
        scan.fresh.push(LogStream {
            name: raw.name.clone(),
            last_ingestion_time: ingested,
        });
    }
    scan
}

/// List streams of `group` with activity at or after `since`.
///
/// A deleted group and a throttled listing both yield an empty result; the
/// latter after sleeping `throttle_backoff`. Cancellation also yields an empty
/// result. Any other API failure is returned.
pub async fn list_streams<B: LogsBackend + ?Sized>(
    backend: &B,
    group: &str,
    since: i64,
    filter: &StreamFilter,
    cancel: &CancellationToken,
    throttle_backoff: Duration,
) -> Result<Vec<LogStream>, ApiError> {
    let query = StreamQuery {
        group: group.to_string(),
        order: if filter.is_prefix_mode() {
            StreamOrder::NamePrefix
        } else {
            StreamOrder::LastEventTimeDescending
        },
        prefix: filter.prefix().map(str::to_string),
    };

    let mut found = Vec::new();
    let mut next_token = None;
    loop {
        let page = tokio::select! {
            biased;
            () = cancel.cancelled() => return Ok(Vec::new()),
            page = backend.describe_log_streams(&query, next_token.take()) => page,
        };
        let page = match page {
            Ok(page) => page,
            Err(e) if e.is_not_found() => {
                debug!(group, "log group no longer exists");
                return Ok(Vec::new());
            }
            Err(e) if e.is_throttled() => {
                warn!(group, "rate exceeded while listing log streams, backing off");
                tokio::select! {
                    () = cancel.cancelled() => {}
                    () = tokio::time::sleep(throttle_backoff) => {}
                }
                return Ok(Vec::new());
            }
            Err(e) => return Err(e),
        };

        let scan = scan_page(&page.streams, since, filter);
        let keep_going = filter.is_prefix_mode() || scan.worth_continuing(since);
        found.extend(scan.fresh);

        match page.next_token {
            Some(token) if keep_going => next_token = Some(token),
            _ => break,
        }
    }

    debug!(group, since, streams = found.len(), "discovered active streams");
    Ok(found)
}
