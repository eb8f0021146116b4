//! Resolved, immutable tail session configuration.

use regex::Regex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid '{field}' time format: {value}")]
    InvalidTime { field: &'static str, value: String },

    #[error("'{field}' must be specified to be after January 1, 1970 UTC")]
    BeforeEpoch { field: &'static str },

    #[error("'end' ({end}) must not be earlier than 'since' ({start})")]
    EndBeforeStart { start: String, end: String },

    #[error("--stream and --stream-prefix are mutually exclusive")]
    ConflictingStreamSelection,

    #[error("invalid {field} pattern: {source}")]
    InvalidPattern {
        field: &'static str,
        #[source]
        source: regex::Error,
    },
}

// ─── Stream selection ─────────────────────────────────────────────

/// Which log streams of a group are eligible for polling.
///
/// In prefix mode CloudWatch cannot order streams by recency, so discovery
/// has to scan the full listing. The name regex is derived from the prefix.
#[derive(Debug, Clone)]
pub struct StreamFilter {
    /// `None` matches every stream.
    pattern: Option<Regex>,
    prefix: Option<String>,
}

impl StreamFilter {
    /// Build a filter from the mutually exclusive `--stream` / `--stream-prefix`
    /// options. Empty strings count as unset.
    pub fn new(pattern: Option<&str>, prefix: Option<&str>) -> Result<Self, ConfigError> {
        let pattern = pattern.filter(|p| !p.is_empty());
        let prefix = prefix.filter(|p| !p.is_empty());
        match (pattern, prefix) {
            (Some(_), Some(_)) => Err(ConfigError::ConflictingStreamSelection),
            (Some(p), None) => Ok(Self {
                pattern: Some(compile("stream", p)?),
                prefix: None,
            }),
            (None, Some(prefix)) => Ok(Self {
                pattern: Some(compile(
                    "stream-prefix",
                    &format!("^{}", regex::escape(prefix)),
                )?),
                prefix: Some(prefix.to_string()),
            }),
            (None, None) => Ok(Self::all()),
        }
    }

    /// Match every stream.
    pub fn all() -> Self {
        Self {
            pattern: None,
            prefix: None,
        }
    }

    pub fn matches(&self, stream_name: &str) -> bool {
        self.pattern
            .as_ref()
            .is_none_or(|re| re.is_match(stream_name))
    }

    pub fn prefix(&self) -> Option<&str> {
        self.prefix.as_deref()
    }

    pub fn is_prefix_mode(&self) -> bool {
        self.prefix.is_some()
    }
}

impl Default for StreamFilter {
    fn default() -> Self {
        Self::all()
    }
}

// ─── Session config ───────────────────────────────────────────────

/// Everything the tail engine needs to know about one session.
#[derive(Debug, Clone)]
pub struct TailConfig {
    pub group_filter: Regex,
    pub stream_filter: StreamFilter,
    /// Session start, epoch milliseconds. Initial watermark of every group.
    pub start_time: i64,
    /// Absolute end bound, epoch milliseconds.
    pub end_time: Option<i64>,
    /// CloudWatch filter pattern applied server-side.
    pub filter_pattern: Option<String>,
}

impl TailConfig {
    pub fn new(group_pattern: &str, start_time: i64) -> Result<Self, ConfigError> {
        Ok(Self {
            group_filter: compile("log group", group_pattern)?,
            stream_filter: StreamFilter::all(),
            start_time,
            end_time: None,
            filter_pattern: None,
        })
    }

    #[must_use]
    pub fn with_stream_filter(mut self, filter: StreamFilter) -> Self {
        self.stream_filter = filter;
        self
    }

    #[must_use]
    pub fn with_end_time(mut self, end_time: Option<i64>) -> Self {
        self.end_time = end_time;
        self
    }

    #[must_use]
    pub fn with_filter_pattern(mut self, pattern: Option<String>) -> Self {
        self.filter_pattern = pattern.filter(|p| !p.is_empty());
        self
    }

    /// True once the configured end bound is at or before `now_ms`.
    pub fn end_reached(&self, now_ms: i64) -> bool {
        self.end_time.is_some_and(|end| end <= now_ms)
    }
}

fn compile(field: &'static str, pattern: &str) -> Result<Regex, ConfigError> {
    Regex::new(pattern).map_err(|source| ConfigError::InvalidPattern { field, source })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stream_and_prefix_conflict() {
        let err = StreamFilter::new(Some("a"), Some("b")).unwrap_err();
        assert!(matches!(err, ConfigError::ConflictingStreamSelection));
    }

    #[test]
    fn empty_options_match_all() {
        let f = StreamFilter::new(Some(""), Some("")).expect("valid");
        assert!(f.matches("anything"));
        assert!(!f.is_prefix_mode());
    }

    #[test]
    fn prefix_is_anchored_and_escaped() {
        let f = StreamFilter::new(None, Some("app.1[")).expect("valid");
        assert!(f.is_prefix_mode());
        assert_eq!(f.prefix(), Some("app.1["));
        assert!(f.matches("app.1[/abc"));
        assert!(!f.matches("xapp.1["));
        assert!(!f.matches("appx1["));
    }

    #[test]
    fn stream_pattern_is_unanchored_regex() {
        let f = StreamFilter::new(Some("web-\\d+"), None).expect("valid");
        assert!(f.matches("prod/web-12/abc"));
        assert!(!f.matches("prod/api-12"));
    }

    #[test]
    fn invalid_group_pattern_is_rejected() {
        let err = TailConfig::new("(", 0).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidPattern { field: "log group", .. }));
    }

    #[test]
    fn end_reached_only_when_bound_passed() {
        let cfg = TailConfig::new("svc", 0).expect("valid");
        assert!(!cfg.end_reached(i64::MAX));
        let cfg = cfg.with_end_time(Some(500));
        assert!(!cfg.end_reached(499));
        assert!(cfg.end_reached(500));
    }

    #[test]
    fn empty_filter_pattern_is_dropped() {
        let cfg = TailConfig::new("svc", 0)
            .expect("valid")
            .with_filter_pattern(Some(String::new()));
        assert!(cfg.filter_pattern.is_none());
    }
}
