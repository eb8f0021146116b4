//! cwtail-engine: the tail engine.
//!
//! One `TailWorker` per log group polls CloudWatch behind a shared
//! `RateGate`, dedups through its `DedupCache` partition and feeds a single
//! bounded queue drained by the `OutputSink`. The `Orchestrator` wires them
//! together and owns cancellation and fatal-error propagation.

pub mod announce;
pub mod discovery;
pub mod error;
pub mod format;
pub mod orchestrator;
pub mod rate_gate;
pub mod sink;
pub mod worker;

pub use announce::{Announcer, Progress};
pub use discovery::list_streams;
pub use error::TailError;
pub use format::{DisplayOptions, LineFormatter, OutputFormat, Palette};
pub use orchestrator::{Orchestrator, TailSettings};
pub use rate_gate::{Permit, RateGate};
pub use sink::OutputSink;
pub use worker::{TailContext, TailWorker};
