//! Status lines for newly observed log groups and streams.
//!
//! The orchestrator owns one `Announcer` for the session and hands it to every
//! worker, so each group and each group/stream pair is announced exactly once.
//!
//! While the session waits on a listing call a spinner can run on the same
//! stream; status lines are written with the spinner suspended.

use std::collections::HashSet;
use std::io::Write;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use cwtail_core::LogStream;
use cwtail_core::types::format_millis;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use crate::format::Palette;

const SPINNER_TICK: Duration = Duration::from_millis(100);
const SPINNER_CHARS: &str = "⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ";

pub struct Announcer {
    groups: Mutex<HashSet<String>>,
    streams: Mutex<HashSet<(String, String)>>,
    out: Mutex<Box<dyn Write + Send>>,
    palette: Palette,
    spinner: Option<fn() -> ProgressDrawTarget>,
    active: Mutex<Option<ProgressBar>>,
}

/// Running spinner; cleared when dropped.
#[must_use]
pub struct Progress<'a> {
    announcer: &'a Announcer,
}

impl Drop for Progress<'_> {
    fn drop(&mut self) {
        let bar = self
            .announcer
            .active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some(bar) = bar {
            bar.finish_and_clear();
        }
    }
}

impl Announcer {
    pub fn new(out: Box<dyn Write + Send>, palette: Palette) -> Self {
        Self {
            groups: Mutex::new(HashSet::new()),
            streams: Mutex::new(HashSet::new()),
            out: Mutex::new(out),
            palette,
            spinner: None,
            active: Mutex::new(None),
        }
    }

    pub fn stderr(palette: Palette) -> Self {
        Self::new(Box::new(std::io::stderr()), palette)
    }

    /// Show a spinner on stderr during [`Announcer::progress`]. Meant for
    /// interactive terminals only.
    #[must_use]
    pub fn with_spinner(mut self, enabled: bool) -> Self {
        self.spinner = enabled.then_some(ProgressDrawTarget::stderr as fn() -> _);
        self
    }

    /// Spin with `message` until the returned guard is dropped. Does nothing
    /// without a spinner.
    pub fn progress(&self, message: &'static str) -> Progress<'_> {
        if let Some(target) = self.spinner {
            let bar = ProgressBar::with_draw_target(None, target());
            bar.set_style(ProgressStyle::default_spinner().tick_chars(SPINNER_CHARS));
            bar.set_message(message);
            bar.enable_steady_tick(SPINNER_TICK);
            let previous = self
                .active
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .replace(bar);
            if let Some(previous) = previous {
                previous.finish_and_clear();
            }
        }
        Progress { announcer: self }
    }

    pub fn is_spinning(&self) -> bool {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }

    /// Print `+ <group>` the first time a group is seen. Returns whether it
    /// was new.
    pub fn group(&self, group: &str) -> bool {
        let fresh = self
            .groups
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(group.to_string());
        if fresh {
            self.write_line(&format!(
                "{} {}",
                self.palette.added(),
                self.palette.group(group)
            ));
        }
        fresh
    }

    /// Print `+ <group> › <stream> (<last ingestion>)` the first time a
    /// stream is seen in a group.
    pub fn stream(&self, group: &str, stream: &LogStream) -> bool {
        let fresh = self
            .streams
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert((group.to_string(), stream.name.clone()));
        if fresh {
            self.write_line(&format!(
                "{} {} \u{203a} {} ({})",
                self.palette.added(),
                self.palette.group(group),
                self.palette.stream(&stream.name),
                format_millis(stream.last_ingestion_time),
            ));
        }
        fresh
    }

    fn write_line(&self, line: &str) {
        let write = || {
            let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
            if let Err(e) = writeln!(out, "{line}") {
                tracing::debug!("status output failed: {e}");
            }
        };
        let bar = self
            .active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        match bar {
            Some(bar) => bar.suspend(write),
            None => write(),
        }
    }
}
