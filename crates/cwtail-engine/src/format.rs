//! Line formatting for events and status output.
//!
//! Group and stream labels get a color picked from a fixed palette by hashing
//! the name, so the same group keeps its color across runs.

use std::hash::Hasher;

use cwtail_core::LogEvent;
use cwtail_core::types::format_millis;
use fnv::FnvHasher;
use serde::Serialize;

const GROUP_COLORS: [&str; 6] = ["96", "92", "95", "93", "94", "91"];
const STREAM_COLORS: [&str; 6] = ["36", "32", "35", "33", "34", "31"];
const ADDED_MARKER: &str = "92;1";

// ─── Options ────────────────────────────────────────────────────────

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DisplayOptions {
    pub timestamps: bool,
    pub event_id: bool,
    pub no_group: bool,
    pub no_stream: bool,
    /// Maximum message length in characters. 0 disables truncation.
    pub max_length: usize,
    pub format: OutputFormat,
}

// ─── Palette ────────────────────────────────────────────────────────

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    enabled: bool,
}

impl Palette {
    pub fn new(enabled: bool) -> Self {
        Self { enabled }
    }

    pub fn enabled(self) -> bool {
        self.enabled
    }

    pub fn group(self, name: &str) -> String {
        self.paint(GROUP_COLORS[color_index(name)], name)
    }

    pub fn stream(self, name: &str) -> String {
        self.paint(STREAM_COLORS[color_index(name)], name)
    }

    pub fn added(self) -> String {
        self.paint(ADDED_MARKER, "+")
    }

    fn paint(self, code: &str, text: &str) -> String {
        if self.enabled {
            format!("\x1b[{code}m{text}\x1b[0m")
        } else {
            text.to_string()
        }
    }
}

/// 64-bit FNV-1a of the name, modulo the palette size.
fn color_index(name: &str) -> usize {
    let mut hasher = FnvHasher::default();
    hasher.write(name.as_bytes());
    (hasher.finish() % GROUP_COLORS.len() as u64) as usize
}

// ─── Event lines ────────────────────────────────────────────────────

#[derive(Serialize)]
struct JsonLine<'a> {
    group: &'a str,
    stream: &'a str,
    event_id: &'a str,
    ingestion_time: i64,
    timestamp: i64,
    message: &'a str,
}

#[derive(Debug, Clone)]
pub struct LineFormatter {
    options: DisplayOptions,
    palette: Palette,
}

impl LineFormatter {
    pub fn new(options: DisplayOptions, palette: Palette) -> Self {
        Self { options, palette }
    }

    /// Render one event as a single line, without the trailing newline.
    pub fn format(&self, event: &LogEvent) -> Result<String, serde_json::Error> {
        let message = truncate_chars(
            event.message.trim_end_matches(['\n', '\r']),
            self.options.max_length,
        );
        match self.options.format {
            OutputFormat::Json => serde_json::to_string(&JsonLine {
                group: &event.group,
                stream: &event.stream,
                event_id: &event.event_id,
                ingestion_time: event.ingestion_time,
                timestamp: event.timestamp,
                message,
            }),
            OutputFormat::Text => Ok(self.format_text(event, message)),
        }
    }

    fn format_text(&self, event: &LogEvent, message: &str) -> String {
        let mut parts: Vec<String> = Vec::with_capacity(5);
        if !self.options.no_group {
            parts.push(self.palette.group(&event.group));
        }
        if !self.options.no_stream {
            parts.push(self.palette.stream(&event.stream));
        }
        if self.options.event_id {
            parts.push(event.event_id.clone());
        }
        if self.options.timestamps {
            parts.push(format_millis(event.ingestion_time));
        }
        parts.push(message.to_string());
        parts.join(" ")
    }
}

/// Keep at most `max` characters of `s`; `max == 0` keeps everything.
pub fn truncate_chars(s: &str, max: usize) -> &str {
    if max == 0 {
        return s;
    }
    match s.char_indices().nth(max) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
