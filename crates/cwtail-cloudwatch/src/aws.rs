//! `LogsBackend` over the AWS SDK. Credentials and region resolution are left
//! to `aws-config`'s default provider chain.

use async_trait::async_trait;
use aws_sdk_cloudwatchlogs::Client;
use aws_sdk_cloudwatchlogs::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use aws_sdk_cloudwatchlogs::types::OrderBy;
use cwtail_core::LogEvent;

use crate::backend::{
    EventPage, FilterQuery, GroupPage, LogsBackend, RawLogStream, StreamOrder, StreamPage,
    StreamQuery,
};
use crate::error::ApiError;

pub struct CloudWatchBackend {
    client: Client,
}

impl CloudWatchBackend {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Load shared AWS config, overriding region and profile when given.
    pub async fn from_env(region: Option<String>, profile: Option<String>) -> Self {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());
        if let Some(region) = region {
            loader = loader.region(aws_config::Region::new(region));
        }
        if let Some(profile) = profile {
            loader = loader.profile_name(profile);
        }
        let config = loader.load().await;
        tracing::debug!(region = ?config.region(), "aws config loaded");
        Self::new(Client::new(&config))
    }
}

fn classify<E, R>(operation: &'static str, err: SdkError<E, R>) -> ApiError
where
    E: ProvideErrorMetadata + std::error::Error + 'static,
    R: std::fmt::Debug,
{
    match err.as_service_error() {
        Some(service) => ApiError::from_code(operation, service.code(), service.message()),
        None => ApiError::Service {
            operation,
            code: "Transport".to_string(),
            message: DisplayErrorContext(&err).to_string(),
        },
    }
}

#[async_trait]
impl LogsBackend for CloudWatchBackend {
    async fn describe_log_groups(
        &self,
        next_token: Option<String>,
    ) -> Result<GroupPage, ApiError> {
        let out = self
            .client
            .describe_log_groups()
            .set_next_token(next_token)
            .send()
            .await
            .map_err(|e| classify("DescribeLogGroups", e))?;

        Ok(GroupPage {
            group_names: out
                .log_groups()
                .iter()
                .filter_map(|g| g.log_group_name().map(str::to_string))
                .collect(),
            next_token: out.next_token().map(str::to_string),
        })
    }

    async fn describe_log_streams(
        &self,
        query: &StreamQuery,
        next_token: Option<String>,
    ) -> Result<StreamPage, ApiError> {
        let mut req = self
            .client
            .describe_log_streams()
            .log_group_name(&query.group)
            .set_next_token(next_token);
        req = match (query.order, &query.prefix) {
            (StreamOrder::NamePrefix, Some(prefix)) => req.log_stream_name_prefix(prefix),
            (StreamOrder::NamePrefix, None) => req,
            (StreamOrder::LastEventTimeDescending, _) => {
                req.order_by(OrderBy::LastEventTime).descending(true)
            }
        };
        let out = req
            .send()
            .await
            .map_err(|e| classify("DescribeLogStreams", e))?;

        Ok(StreamPage {
            streams: out
                .log_streams()
                .iter()
                .filter_map(|s| {
                    Some(RawLogStream {
                        name: s.log_stream_name()?.to_string(),
                        first_event_timestamp: s.first_event_timestamp(),
                        last_event_timestamp: s.last_event_timestamp(),
                        last_ingestion_time: s.last_ingestion_time(),
                    })
                })
                .collect(),
            next_token: out.next_token().map(str::to_string),
        })
    }

    async fn filter_log_events(
        &self,
        query: &FilterQuery,
        next_token: Option<String>,
    ) -> Result<EventPage, ApiError> {
        #[allow(deprecated)]
        let req = self
            .client
            .filter_log_events()
            .log_group_name(&query.group)
            .set_log_stream_names(Some(query.stream_names.clone()))
            .interleaved(true)
            .start_time(query.start_time)
            .set_end_time(query.end_time)
            .set_filter_pattern(query.filter_pattern.clone())
            .set_next_token(next_token);
        let out = req
            .send()
            .await
            .map_err(|e| classify("FilterLogEvents", e))?;

        Ok(EventPage {
            events: out
                .events()
                .iter()
                .filter_map(|e| {
                    Some(LogEvent {
                        event_id: e.event_id()?.to_string(),
                        group: query.group.clone(),
                        stream: e.log_stream_name().unwrap_or_default().to_string(),
                        ingestion_time: e.ingestion_time()?,
                        timestamp: e.timestamp().unwrap_or_default(),
                        message: e.message().unwrap_or_default().to_string(),
                    })
                })
                .collect(),
            next_token: out.next_token().map(str::to_string),
        })
    }
}
