//! CLI definition using clap derive.

use clap::{Parser, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "cwtail",
    version,
    about = "Tail many CloudWatch Logs groups at once"
)]
pub struct Cli {
    /// Regular expression selecting the log groups to tail
    pub group: String,

    /// Regular expression selecting log streams
    #[arg(long, short = 'n')]
    pub stream: Option<String>,

    /// Log stream name prefix (faster listing than --stream)
    #[arg(long, short = 'p')]
    pub stream_prefix: Option<String>,

    /// Start of the window: a duration ago (e.g. 5m, 1h30m) or an RFC 3339 time
    #[arg(long, short = 's', default_value = "5m")]
    pub since: String,

    /// End of the window: a duration ago or an RFC 3339 time
    #[arg(long, short = 'e')]
    pub end: Option<String>,

    /// AWS region
    #[arg(long, short = 'r', env = "AWS_REGION")]
    pub region: Option<String>,

    /// AWS shared config profile
    #[arg(long, env = "AWS_PROFILE")]
    pub profile: Option<String>,

    /// CloudWatch Logs filter pattern
    #[arg(long)]
    pub filter: Option<String>,

    /// Print the ingestion time of each event
    #[arg(long)]
    pub timestamps: bool,

    /// Print the event id of each event
    #[arg(long)]
    pub event_id: bool,

    /// Do not print the log group name
    #[arg(long)]
    pub no_log_group: bool,

    /// Do not print the log stream name
    #[arg(long)]
    pub no_log_stream: bool,

    /// Truncate messages to this many characters (0: no limit)
    #[arg(long, default_value_t = 0)]
    pub max_length: usize,

    /// Colorize output
    #[arg(long, value_enum, default_value_t = ColorArg::Auto)]
    pub color: ColorArg,

    /// Output format
    #[arg(long, short = 'o', value_enum, default_value_t = OutputArg::Text)]
    pub output: OutputArg,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ColorArg {
    /// Color when the output is a terminal
    #[default]
    Auto,
    Always,
    Never,
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputArg {
    #[default]
    Text,
    Json,
}
