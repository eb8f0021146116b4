//! Turn parsed arguments into the immutable session configuration.

use anyhow::Context;
use chrono::{DateTime, Utc};
use cwtail_core::{StreamFilter, TailConfig, resolve_window};
use cwtail_engine::{DisplayOptions, OutputFormat};

use crate::cli::{Cli, OutputArg};

pub fn tail_config(cli: &Cli, now: DateTime<Utc>) -> anyhow::Result<TailConfig> {
    let (start, end) =
        resolve_window(&cli.since, cli.end.as_deref(), now).context("option error")?;
    let streams = StreamFilter::new(cli.stream.as_deref(), cli.stream_prefix.as_deref())
        .context("option error")?;
    let config = TailConfig::new(&cli.group, start)
        .context("option error")?
        .with_stream_filter(streams)
        .with_end_time(end)
        .with_filter_pattern(cli.filter.clone());
    Ok(config)
}

pub fn display_options(cli: &Cli) -> DisplayOptions {
    DisplayOptions {
        timestamps: cli.timestamps,
        event_id: cli.event_id,
        no_group: cli.no_log_group,
        no_stream: cli.no_log_stream,
        max_length: cli.max_length,
        format: match cli.output {
            OutputArg::Text => OutputFormat::Text,
            OutputArg::Json => OutputFormat::Json,
        },
    }
}
