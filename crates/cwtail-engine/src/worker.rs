//! One polling loop per log group.
//!
//! Each cycle takes a token from the shared `RateGate`, rediscovers the
//! group's active streams, then pages through `FilterLogEvents` from the
//! group's watermark. Events already seen in this group are dropped; the rest
//! go to the output queue in page order.

use std::sync::{Arc, PoisonError};
use std::time::Duration;

use cwtail_cloudwatch::{ApiError, FilterQuery, LogsBackend};
use cwtail_core::cache::Partition;
use cwtail_core::types::now_millis;
use cwtail_core::{DedupCache, LogEvent, TailConfig, Watermark};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::announce::Announcer;
use crate::discovery::{self, list_streams};
use crate::error::TailError;
use crate::rate_gate::RateGate;

/// Above this many active streams a group cannot be tailed in one request.
pub const STREAM_LIMIT: usize = 100;

// ─── Shared context ─────────────────────────────────────────────────

/// Everything the workers of one session share.
pub struct TailContext<B: ?Sized> {
    pub backend: Arc<B>,
    pub config: Arc<TailConfig>,
    pub gate: Arc<RateGate>,
    pub cache: Arc<DedupCache>,
    pub announcer: Arc<Announcer>,
    pub events: mpsc::Sender<LogEvent>,
    pub cancel: CancellationToken,
    pub stream_limit: usize,
    pub throttle_backoff: Duration,
}

impl<B: ?Sized> Clone for TailContext<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            config: Arc::clone(&self.config),
            gate: Arc::clone(&self.gate),
            cache: Arc::clone(&self.cache),
            announcer: Arc::clone(&self.announcer),
            events: self.events.clone(),
            cancel: self.cancel.clone(),
            stream_limit: self.stream_limit,
            throttle_backoff: self.throttle_backoff,
        }
    }
}

impl<B: LogsBackend + ?Sized> TailContext<B> {
    pub fn new(
        backend: Arc<B>,
        config: Arc<TailConfig>,
        gate: Arc<RateGate>,
        announcer: Arc<Announcer>,
        events: mpsc::Sender<LogEvent>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            backend,
            config,
            gate,
            cache: Arc::new(DedupCache::new()),
            announcer,
            events,
            cancel,
            stream_limit: STREAM_LIMIT,
            throttle_backoff: discovery::THROTTLE_BACKOFF,
        }
    }

    #[must_use]
    pub fn with_stream_limit(mut self, limit: usize) -> Self {
        self.stream_limit = limit;
        self
    }

    #[must_use]
    pub fn with_throttle_backoff(mut self, backoff: Duration) -> Self {
        self.throttle_backoff = backoff;
        self
    }

    /// Build the worker for `group`, starting at the session start time.
    pub fn worker(&self, group: &str) -> TailWorker<B> {
        TailWorker {
            group: group.to_string(),
            seen: self.cache.partition(group),
            watermark: Watermark::new(self.config.start_time),
            ctx: self.clone(),
        }
    }
}

// ─── Worker ─────────────────────────────────────────────────────────

/// How one fetch cycle ended.
enum Cycle {
    Completed,
    Throttled,
    Cancelled,
}

pub struct TailWorker<B: ?Sized> {
    group: String,
    seen: Partition,
    watermark: Watermark,
    ctx: TailContext<B>,
}

impl<B: LogsBackend + ?Sized> TailWorker<B> {
    pub fn group(&self) -> &str {
        &self.group
    }

    pub fn watermark(&self) -> i64 {
        self.watermark.get()
    }

    /// Poll until cancelled, until the end bound has passed, or until a fatal
    /// error.
    pub async fn run(mut self) -> Result<(), TailError> {
        let cancel = self.ctx.cancel.clone();
        loop {
            let Some(_permit) = self.ctx.gate.acquire(&cancel).await else {
                return Ok(());
            };

            let streams = list_streams(
                self.ctx.backend.as_ref(),
                &self.group,
                self.watermark.get(),
                &self.ctx.config.stream_filter,
                &cancel,
                self.ctx.throttle_backoff,
            )
            .await
            .map_err(|source| TailError::Discovery {
                group: self.group.clone(),
                source,
            })?;
            if cancel.is_cancelled() {
                return Ok(());
            }
            for stream in &streams {
                self.ctx.announcer.stream(&self.group, stream);
            }

            if streams.is_empty() {
                if self.ctx.config.end_reached(now_millis()) {
                    debug!(group = %self.group, "end time reached");
                    return Ok(());
                }
                continue;
            }

            if streams.len() > self.ctx.stream_limit {
                return Err(TailError::TooManyStreams {
                    group: self.group.clone(),
                    count: streams.len(),
                    limit: self.ctx.stream_limit,
                });
            }

            let query = FilterQuery {
                group: self.group.clone(),
                stream_names: streams.into_iter().map(|s| s.name).collect(),
                start_time: self.watermark.get(),
                end_time: self.ctx.config.end_time,
                filter_pattern: self.ctx.config.filter_pattern.clone(),
            };

            match self.fetch(&query, &cancel).await? {
                Cycle::Cancelled => return Ok(()),
                Cycle::Throttled => {
                    warn!(group = %self.group, "rate exceeded while filtering log events, backing off");
                    tokio::select! {
                        () = cancel.cancelled() => return Ok(()),
                        () = tokio::time::sleep(self.ctx.throttle_backoff) => {}
                    }
                }
                Cycle::Completed => {
                    if self.ctx.config.end_reached(now_millis()) {
                        debug!(group = %self.group, "end time reached");
                        return Ok(());
                    }
                }
            }
        }
    }

    /// Page through one `FilterLogEvents` query, emitting unseen events.
    async fn fetch(
        &mut self,
        query: &FilterQuery,
        cancel: &CancellationToken,
    ) -> Result<Cycle, TailError> {
        let mut next_token = None;
        loop {
            let page = tokio::select! {
                biased;
                () = cancel.cancelled() => return Ok(Cycle::Cancelled),
                page = self.ctx.backend.filter_log_events(query, next_token.take()) => page,
            };
            let page = match page {
                Ok(page) => page,
                Err(ApiError::Throttled { .. }) => return Ok(Cycle::Throttled),
                Err(source) => {
                    return Err(TailError::Fetch {
                        group: self.group.clone(),
                        source,
                    });
                }
            };

            for event in &page.events {
                if !self.remember(event) {
                    continue;
                }
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => return Ok(Cycle::Cancelled),
                    sent = self.ctx.events.send(event.clone()) => {
                        if sent.is_err() {
                            return Ok(Cycle::Cancelled);
                        }
                    }
                }
            }

            if let Some(token) = page.next_token {
                next_token = Some(token);
                continue;
            }

            if let Some(last) = page.events.last() {
                self.watermark.advance(last.ingestion_time);
                let evicted = self
                    .seen
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .evict(last.ingestion_time);
                debug!(
                    group = %self.group,
                    watermark = self.watermark.get(),
                    evicted,
                    "fetch cycle complete"
                );
            }
            return Ok(Cycle::Completed);
        }
    }

    /// Record `event` as seen. Returns false if it already was.
    fn remember(&self, event: &LogEvent) -> bool {
        let mut seen = self.seen.lock().unwrap_or_else(PoisonError::into_inner);
        if seen.seen(&event.event_id) {
            return false;
        }
        seen.store(&event.event_id, event.ingestion_time);
        true
    }
}
