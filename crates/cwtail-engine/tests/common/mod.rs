//! Scripted `LogsBackend` shared by the engine integration tests.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::io::Write;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use std::time::Duration;

use async_trait::async_trait;
use cwtail_cloudwatch::{
    ApiError, EventPage, FilterQuery, GroupPage, LogsBackend, RawLogStream, StreamPage,
    StreamQuery,
};
use cwtail_core::{LogEvent, TailConfig};
use cwtail_engine::{Announcer, Palette, RateGate, TailContext};
use tokio::io::AsyncWrite;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

pub const GATE_PERIOD: Duration = Duration::from_millis(10);
pub const BACKOFF: Duration = Duration::from_millis(500);

/// One `FilterLogEvents` pagination: each entry answers one page request.
pub type FetchCycle = Vec<Result<Vec<LogEvent>, ApiError>>;

#[derive(Default)]
struct GroupScript {
    stream_pages: Vec<Vec<RawLogStream>>,
    stream_errors: VecDeque<ApiError>,
    cycles: VecDeque<FetchCycle>,
    current: VecDeque<Result<Vec<LogEvent>, ApiError>>,
    hang: bool,
}

#[derive(Default)]
pub struct ScriptedBackend {
    groups: Vec<String>,
    group_error: Option<ApiError>,
    scripts: Mutex<HashMap<String, GroupScript>>,
    pub stream_calls: Mutex<Vec<(StreamQuery, Option<String>)>>,
    pub fetch_calls: Mutex<Vec<(FilterQuery, Option<String>)>>,
}

impl ScriptedBackend {
    pub fn new(groups: &[&str]) -> Self {
        Self {
            groups: groups.iter().map(|g| g.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn failing_group_listing(error: ApiError) -> Self {
        Self {
            group_error: Some(error),
            ..Default::default()
        }
    }

    fn with_script(self, group: &str, f: impl FnOnce(&mut GroupScript)) -> Self {
        {
            let mut scripts = self.scripts.lock().expect("lock");
            f(scripts.entry(group.to_string()).or_default());
        }
        self
    }

    /// Pages answered by every `DescribeLogStreams` pagination of `group`.
    pub fn streams(self, group: &str, pages: Vec<Vec<RawLogStream>>) -> Self {
        self.with_script(group, |s| s.stream_pages = pages)
    }

    /// Errors returned, in order, before the stream pages are served again.
    pub fn stream_error(self, group: &str, error: ApiError) -> Self {
        self.with_script(group, |s| s.stream_errors.push_back(error))
    }

    /// Queue one fetch cycle. Once the queue is empty every cycle is a single
    /// empty page.
    pub fn cycle(self, group: &str, pages: FetchCycle) -> Self {
        self.with_script(group, |s| s.cycles.push_back(pages))
    }

    /// Make every fetch of `group` block forever.
    pub fn hang(self, group: &str) -> Self {
        self.with_script(group, |s| s.hang = true)
    }

    pub fn fetches(&self) -> Vec<FilterQuery> {
        self.fetch_calls
            .lock()
            .expect("lock")
            .iter()
            .map(|(q, _)| q.clone())
            .collect()
    }

    /// Start times of the first page request of every fetch cycle of `group`.
    pub fn cycle_starts(&self, group: &str) -> Vec<i64> {
        self.fetch_calls
            .lock()
            .expect("lock")
            .iter()
            .filter(|(q, token)| q.group == group && token.is_none())
            .map(|(q, _)| q.start_time)
            .collect()
    }
}

#[async_trait]
impl LogsBackend for ScriptedBackend {
    async fn describe_log_groups(
        &self,
        _next_token: Option<String>,
    ) -> Result<GroupPage, ApiError> {
        if let Some(e) = &self.group_error {
            return Err(e.clone());
        }
        Ok(GroupPage {
            group_names: self.groups.clone(),
            next_token: None,
        })
    }

    async fn describe_log_streams(
        &self,
        query: &StreamQuery,
        next_token: Option<String>,
    ) -> Result<StreamPage, ApiError> {
        self.stream_calls
            .lock()
            .expect("lock")
            .push((query.clone(), next_token.clone()));
        let mut scripts = self.scripts.lock().expect("lock");
        let script = scripts.entry(query.group.clone()).or_default();
        if let Some(e) = script.stream_errors.pop_front() {
            return Err(e);
        }
        let idx = next_token.map_or(0, |t| t.parse::<usize>().expect("numeric token"));
        Ok(StreamPage {
            streams: script.stream_pages.get(idx).cloned().unwrap_or_default(),
            next_token: (idx + 1 < script.stream_pages.len()).then(|| (idx + 1).to_string()),
        })
    }

    async fn filter_log_events(
        &self,
        query: &FilterQuery,
        next_token: Option<String>,
    ) -> Result<EventPage, ApiError> {
        self.fetch_calls
            .lock()
            .expect("lock")
            .push((query.clone(), next_token.clone()));
        let page = {
            let mut scripts = self.scripts.lock().expect("lock");
            let script = scripts.entry(query.group.clone()).or_default();
            if script.hang {
                None
            } else {
                if next_token.is_none() {
                    script.current = script.cycles.pop_front().unwrap_or_default().into();
                }
                let page = script.current.pop_front().unwrap_or_else(|| Ok(Vec::new()));
                Some(page.map(|events| EventPage {
                    events,
                    next_token: (!script.current.is_empty()).then(|| "more".to_string()),
                }))
            }
        };
        match page {
            Some(page) => page,
            None => std::future::pending::<Result<EventPage, ApiError>>().await,
        }
    }
}

// ─── Builders ───────────────────────────────────────────────────────

pub fn event(group: &str, stream: &str, id: &str, ingested: i64) -> LogEvent {
    LogEvent {
        event_id: id.into(),
        group: group.into(),
        stream: stream.into(),
        ingestion_time: ingested,
        timestamp: ingested,
        message: format!("message {id}"),
    }
}

pub fn stream(name: &str, ingested: i64) -> RawLogStream {
    RawLogStream {
        name: name.into(),
        first_event_timestamp: Some(ingested),
        last_event_timestamp: Some(ingested),
        last_ingestion_time: Some(ingested),
    }
}

pub fn throttled() -> ApiError {
    ApiError::from_code("FilterLogEvents", Some(ApiError::THROTTLING_CODE), None)
}

pub fn service_error(operation: &'static str) -> ApiError {
    ApiError::from_code(operation, Some("AccessDeniedException"), Some("denied"))
}

pub fn config(start_time: i64) -> TailConfig {
    TailConfig::new(".*", start_time).expect("config")
}

pub fn quiet_announcer() -> Arc<Announcer> {
    Arc::new(Announcer::new(Box::new(std::io::sink()), Palette::new(false)))
}

/// Worker context over `backend` with a fast gate and the production backoff.
pub fn context(
    backend: Arc<ScriptedBackend>,
    config: TailConfig,
    capacity: usize,
    cancel: &CancellationToken,
) -> (TailContext<ScriptedBackend>, mpsc::Receiver<LogEvent>) {
    let (tx, rx) = mpsc::channel(capacity);
    let gate = RateGate::spawn(GATE_PERIOD, cancel.clone());
    let ctx = TailContext::new(
        backend,
        Arc::new(config),
        gate,
        quiet_announcer(),
        tx,
        cancel.clone(),
    )
    .with_throttle_backoff(BACKOFF);
    (ctx, rx)
}

pub async fn recv_ids(rx: &mut mpsc::Receiver<LogEvent>, n: usize) -> Vec<String> {
    let mut ids = Vec::with_capacity(n);
    for _ in 0..n {
        let event = rx.recv().await.expect("event");
        ids.push(event.event_id);
    }
    ids
}

// ─── Output capture ─────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct Captured(pub Arc<Mutex<Vec<u8>>>);

impl Captured {
    pub fn lines(&self) -> Vec<String> {
        String::from_utf8(self.0.lock().expect("lock").clone())
            .expect("utf8")
            .lines()
            .map(str::to_string)
            .collect()
    }
}

impl Write for Captured {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().expect("lock").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl AsyncWrite for Captured {
    fn poll_write(
        self: Pin<&mut Self>,
        _: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<std::io::Result<usize>> {
        self.0.lock().expect("lock").extend_from_slice(buf);
        Poll::Ready(Ok(buf.len()))
    }

    fn poll_flush(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Poll::Ready(Ok(()))
    }

    fn poll_shutdown(self: Pin<&mut Self>, _: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}
