//! Single consumer of the event queue.
//!
//! Writes go through `AsyncWrite` and race the cancel token, so a reader that
//! stops consuming stdout cannot pin the session open after a signal.

use std::io::ErrorKind;

use cwtail_core::LogEvent;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::error::TailError;
use crate::format::LineFormatter;

pub struct OutputSink<W> {
    rx: mpsc::Receiver<LogEvent>,
    formatter: LineFormatter,
    out: W,
    cancel: CancellationToken,
}

impl<W: AsyncWrite + Unpin + Send + 'static> OutputSink<W> {
    pub fn new(
        rx: mpsc::Receiver<LogEvent>,
        formatter: LineFormatter,
        out: W,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            rx,
            formatter,
            out,
            cancel,
        }
    }

    /// Drain the queue until every sender is gone or `cancel` fires. Returns
    /// the number of lines written.
    ///
    /// A closed pipe on the output ends the sink without an error and cancels
    /// `cancel`, since nothing further can be shown.
    pub async fn run(mut self) -> Result<u64, TailError> {
        let mut written = 0u64;
        loop {
            let event = tokio::select! {
                biased;
                () = self.cancel.cancelled() => return Ok(written),
                event = self.rx.recv() => match event {
                    Some(event) => event,
                    None => break,
                },
            };

            let mut line = self.formatter.format(&event)?;
            line.push('\n');
            let result = tokio::select! {
                biased;
                () = self.cancel.cancelled() => return Ok(written),
                result = self.out.write_all(line.as_bytes()) => result,
            };
            match result {
                Ok(()) => written += 1,
                Err(e) if e.kind() == ErrorKind::BrokenPipe => return Ok(self.closed(written)),
                Err(e) => return Err(e.into()),
            }
        }

        let flushed = tokio::select! {
            biased;
            () = self.cancel.cancelled() => Ok(()),
            result = self.out.flush() => result,
        };
        match flushed {
            Err(e) if e.kind() == ErrorKind::BrokenPipe => return Ok(self.closed(written)),
            Err(e) => return Err(e.into()),
            Ok(()) => {}
        }
        debug!(written, "output sink stopped");
        Ok(written)
    }

    fn closed(&self, written: u64) -> u64 {
        debug!(written, "output closed");
        self.cancel.cancel();
        written
    }
}
