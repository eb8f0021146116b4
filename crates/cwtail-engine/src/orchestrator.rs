//! Session lifecycle: resolve groups, run the initial check, then supervise
//! the per-group workers and the output sink.
//!
//! The session ends in one of three ways:
//! - the caller cancels: everything stops, `Ok(())`
//! - a worker or the sink fails: the rest is cancelled and only that first
//!   error is returned
//! - every worker finishes (end bound reached): the queue is drained into the
//!   sink before returning `Ok(())`
//!
//! Worker results are always collected before the sink's: the sink also ends
//! when the last worker drops its sender, and a failing last worker must not be
//! reported as a drained session.

use std::sync::Arc;
use std::time::Duration;

use cwtail_cloudwatch::{LogsBackend, list_log_groups};
use cwtail_core::TailConfig;
use tokio::io::AsyncWrite;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinSet};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::announce::Announcer;
use crate::discovery::{self, list_streams};
use crate::error::TailError;
use crate::format::LineFormatter;
use crate::rate_gate::RateGate;
use crate::sink::OutputSink;
use crate::worker::{self, TailContext};

/// Tunables of the engine. The defaults match CloudWatch Logs quotas.
#[derive(Debug, Clone)]
pub struct TailSettings {
    pub gate_period: Duration,
    pub queue_capacity: usize,
    pub stream_limit: usize,
    pub throttle_backoff: Duration,
}

impl Default for TailSettings {
    fn default() -> Self {
        Self {
            gate_period: RateGate::DEFAULT_PERIOD,
            queue_capacity: 1000,
            stream_limit: worker::STREAM_LIMIT,
            throttle_backoff: discovery::THROTTLE_BACKOFF,
        }
    }
}

enum Outcome {
    Drained,
    Stopped,
    Failed(TailError),
}

pub struct Orchestrator<B: ?Sized> {
    backend: Arc<B>,
    config: Arc<TailConfig>,
    formatter: LineFormatter,
    announcer: Arc<Announcer>,
    settings: TailSettings,
}

impl<B: LogsBackend + ?Sized + 'static> Orchestrator<B> {
    pub fn new(
        backend: Arc<B>,
        config: TailConfig,
        formatter: LineFormatter,
        announcer: Arc<Announcer>,
    ) -> Self {
        Self {
            backend,
            config: Arc::new(config),
            formatter,
            announcer,
            settings: TailSettings::default(),
        }
    }

    #[must_use]
    pub fn with_settings(mut self, settings: TailSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Run the session, writing event lines to `out`, until `cancel` fires,
    /// the end bound has passed for every group, or a fatal error occurs.
    pub async fn run<W: AsyncWrite + Unpin + Send + 'static>(
        self,
        out: W,
        cancel: CancellationToken,
    ) -> Result<(), TailError> {
        let session = cancel.child_token();
        let result = self.run_session(out, &session).await;
        session.cancel();
        result
    }

    async fn run_session<W: AsyncWrite + Unpin + Send + 'static>(
        self,
        out: W,
        session: &CancellationToken,
    ) -> Result<(), TailError> {
        let groups = {
            let _progress = self.announcer.progress("Fetching log groups...");
            list_log_groups(self.backend.as_ref(), &self.config.group_filter)
                .await
                .map_err(TailError::ListGroups)?
        };
        if groups.is_empty() {
            warn!(
                pattern = %self.config.group_filter,
                "no log group matched"
            );
            return Ok(());
        }
        info!(groups = groups.len(), "tailing log groups");

        let gate = RateGate::spawn(self.settings.gate_period, session.clone());

        // ─── Initial check ──────────────────────────────────────────

        for group in &groups {
            self.announcer.group(group);
            let Some(_permit) = gate.acquire(session).await else {
                return Ok(());
            };
            let streams = {
                let _progress = self.announcer.progress("Fetching log streams...");
                list_streams(
                    self.backend.as_ref(),
                    group,
                    self.config.start_time,
                    &self.config.stream_filter,
                    session,
                    self.settings.throttle_backoff,
                )
                .await
                .map_err(|source| TailError::InitialDiscovery {
                    group: group.clone(),
                    source,
                })?
            };
            for stream in &streams {
                self.announcer.stream(group, stream);
            }
        }

        // ─── Tail ───────────────────────────────────────────────────

        let (tx, rx) = mpsc::channel(self.settings.queue_capacity);
        let mut sink = tokio::spawn(
            OutputSink::new(rx, self.formatter.clone(), out, session.clone()).run(),
        );

        let ctx = TailContext::new(
            Arc::clone(&self.backend),
            Arc::clone(&self.config),
            gate,
            Arc::clone(&self.announcer),
            tx,
            session.clone(),
        )
        .with_stream_limit(self.settings.stream_limit)
        .with_throttle_backoff(self.settings.throttle_backoff);

        let mut workers = JoinSet::new();
        for group in &groups {
            workers.spawn(ctx.worker(group).run());
        }
        drop(ctx);

        let mut sink_written = None;
        let outcome = loop {
            tokio::select! {
                biased;
                next = workers.join_next() => match next {
                    None => break Outcome::Drained,
                    Some(Ok(Ok(()))) => {}
                    Some(Ok(Err(e))) => break Outcome::Failed(e),
                    Some(Err(e)) => break Outcome::Failed(TailError::TaskAborted(e.to_string())),
                },
                () = session.cancelled() => break Outcome::Stopped,
                joined = &mut sink, if sink_written.is_none() => match flatten(joined) {
                    Ok(written) => {
                        debug!(written, "output sink finished before the workers");
                        sink_written = Some(written);
                    }
                    Err(e) => break Outcome::Failed(e),
                },
            }
        };

        if !matches!(outcome, Outcome::Drained) {
            session.cancel();
            workers.shutdown().await;
        }

        let sink_result = match sink_written {
            Some(written) => Ok(written),
            None => flatten(sink.await),
        }
        .map(|written| debug!(written, "output sink finished"));

        match outcome {
            Outcome::Failed(e) => Err(e),
            Outcome::Drained => sink_result,
            Outcome::Stopped => {
                if let Err(e) = sink_result {
                    debug!("output sink stopped with: {e}");
                }
                Ok(())
            }
        }
    }
}

fn flatten(joined: Result<Result<u64, TailError>, JoinError>) -> Result<u64, TailError> {
    joined.unwrap_or_else(|e| Err(TailError::TaskAborted(e.to_string())))
}
