//! cwtail-core: data model, dedup cache and session configuration for the
//! CloudWatch Logs tailer. No IO and no async runtime.

pub mod cache;
pub mod config;
pub mod time_window;
pub mod types;

pub use cache::{DedupCache, SeenEvents};
pub use config::{ConfigError, StreamFilter, TailConfig};
pub use time_window::{parse_time_bound, resolve_window};
pub use types::{LogEvent, LogStream, Watermark};
