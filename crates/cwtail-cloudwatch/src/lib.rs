//! cwtail-cloudwatch: CloudWatch Logs IO boundary.
//! Provides the mock-injectable `LogsBackend` trait, its AWS SDK
//! implementation, and log group enumeration. No tailing logic.

pub mod aws;
pub mod backend;
pub mod error;
pub mod groups;

pub use aws::CloudWatchBackend;
pub use backend::{
    EventPage, FilterQuery, GroupPage, LogsBackend, RawLogStream, StreamOrder, StreamPage,
    StreamQuery,
};
pub use error::ApiError;
pub use groups::list_log_groups;
