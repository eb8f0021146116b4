//! Shared polling budget: a token bucket of size one.
//!
//! A single refill task puts one token into a capacity-one channel, waits for
//! some worker to take it, then waits `period` before producing the next one.
//! The refill clock therefore never runs ahead of consumption: over any
//! interval Δt at most ⌈Δt / period⌉ + 1 tokens are handed out, however many
//! groups are being tailed.
//!
//! Which ready worker wins a given token is unspecified. Waiters queue on a
//! fair lock around the receiver, so each of them is eventually served.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;

/// Proof that the holder may issue one round of API calls.
#[derive(Debug)]
#[must_use]
pub struct Permit(());

pub struct RateGate {
    tokens: Mutex<mpsc::Receiver<()>>,
    period: Duration,
}

impl RateGate {
    /// Keeps aggregate polling under the CloudWatch Logs API throttling limits.
    pub const DEFAULT_PERIOD: Duration = Duration::from_millis(250);

    /// Create the gate and start its refill task. The task stops when `cancel`
    /// fires or the gate is dropped.
    pub fn spawn(period: Duration, cancel: CancellationToken) -> Arc<Self> {
        let (tx, rx) = mpsc::channel(1);
        tokio::spawn(refill(tx, period, cancel));
        Arc::new(Self {
            tokens: Mutex::new(rx),
            period,
        })
    }

    pub fn period(&self) -> Duration {
        self.period
    }

    /// Wait for a token. Returns `None` once `cancel` fires.
    pub async fn acquire(&self, cancel: &CancellationToken) -> Option<Permit> {
        tokio::select! {
            biased;
            () = cancel.cancelled() => None,
            token = async { self.tokens.lock().await.recv().await } => token.map(|()| Permit(())),
        }
    }
}

async fn refill(tx: mpsc::Sender<()>, period: Duration, cancel: CancellationToken) {
    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => return,
            sent = tx.send(()) => {
                if sent.is_err() {
                    return;
                }
            }
        }

        // The slot frees up only when a worker takes the token. Reserving and
        // releasing it waits for exactly that.
        tokio::select! {
            biased;
            () = cancel.cancelled() => return,
            slot = tx.reserve() => match slot {
                Ok(permit) => drop(permit),
                Err(_) => return,
            },
        }

        tokio::select! {
            biased;
            () = cancel.cancelled() => return,
            () = tokio::time::sleep(period) => {}
        }
    }
}
