mod common;

use common::*;
use cwtail_cloudwatch::{ApiError, StreamOrder};
use cwtail_core::StreamFilter;
use cwtail_engine::list_streams;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

const G: &str = "/ecs/web";

fn names(streams: &[cwtail_core::LogStream]) -> Vec<&str> {
    streams.iter().map(|s| s.name.as_str()).collect()
}

#[tokio::test]
async fn recency_listing_stops_at_first_stale_page_without_matches() {
    let backend = ScriptedBackend::new(&[G]).streams(
        G,
        vec![
            vec![stream("a", 900), stream("b", 800)],
            vec![stream("c", 700), stream("d", 50)],
            vec![stream("e", 40)],
        ],
    );
    let filter = StreamFilter::new(Some("^[ab]$"), None).expect("filter");
    let found = list_streams(&backend, G, 100, &filter, &CancellationToken::new(), BACKOFF)
        .await
        .expect("streams");

    assert_eq!(names(&found), vec!["a", "b"]);
    let calls = backend.stream_calls.lock().expect("lock");
    assert_eq!(calls.len(), 2, "third page should not be requested");
    assert_eq!(calls[0].0.order, StreamOrder::LastEventTimeDescending);
}

#[tokio::test]
async fn recency_listing_continues_past_stale_page_with_fresh_match() {
    let backend = ScriptedBackend::new(&[G]).streams(
        G,
        vec![
            vec![stream("a", 900), stream("old", 10)],
            vec![stream("b", 20)],
        ],
    );
    let found = list_streams(&backend, G, 100, &StreamFilter::all(), &CancellationToken::new(), BACKOFF)
        .await
        .expect("streams");

    assert_eq!(names(&found), vec!["a"]);
    assert_eq!(backend.stream_calls.lock().expect("lock").len(), 2);
}

#[tokio::test]
async fn prefix_listing_scans_every_page() {
    let backend = ScriptedBackend::new(&[G]).streams(
        G,
        vec![
            vec![stream("web-1", 10)],
            vec![stream("web-2", 500)],
            vec![stream("web-3", 20)],
        ],
    );
    let filter = StreamFilter::new(None, Some("web-")).expect("filter");
    let found = list_streams(&backend, G, 100, &filter, &CancellationToken::new(), BACKOFF)
        .await
        .expect("streams");

    assert_eq!(names(&found), vec!["web-2"]);
    let calls = backend.stream_calls.lock().expect("lock");
    assert_eq!(calls.len(), 3);
    assert_eq!(calls[0].0.order, StreamOrder::NamePrefix);
    assert_eq!(calls[0].0.prefix.as_deref(), Some("web-"));
}

#[tokio::test]
async fn streams_without_activity_are_ignored() {
    let dormant = cwtail_cloudwatch::RawLogStream {
        name: "never-written".into(),
        ..Default::default()
    };
    let backend = ScriptedBackend::new(&[G]).streams(G, vec![vec![dormant, stream("live", 500)]]);
    let found = list_streams(&backend, G, 100, &StreamFilter::all(), &CancellationToken::new(), BACKOFF)
        .await
        .expect("streams");
    assert_eq!(names(&found), vec!["live"]);
}

#[tokio::test]
async fn vanished_group_yields_nothing() {
    let gone = ApiError::from_code("DescribeLogStreams", Some(ApiError::NOT_FOUND_CODE), Some("gone"));
    let backend = ScriptedBackend::new(&[G]).stream_error(G, gone);
    let found = list_streams(&backend, G, 0, &StreamFilter::all(), &CancellationToken::new(), BACKOFF)
        .await
        .expect("not fatal");
    assert!(found.is_empty());
}

#[tokio::test(start_paused = true)]
async fn throttled_listing_backs_off_and_yields_nothing() {
    let throttled = ApiError::from_code("DescribeLogStreams", Some(ApiError::THROTTLING_CODE), None);
    let backend = ScriptedBackend::new(&[G])
        .streams(G, vec![vec![stream("a", 500)]])
        .stream_error(G, throttled);
    let start = Instant::now();
    let found = list_streams(&backend, G, 0, &StreamFilter::all(), &CancellationToken::new(), BACKOFF)
        .await
        .expect("not fatal");
    assert!(found.is_empty());
    assert!(start.elapsed() >= BACKOFF);
}

#[tokio::test]
async fn other_errors_are_returned() {
    let backend = ScriptedBackend::new(&[G]).stream_error(G, service_error("DescribeLogStreams"));
    let err = list_streams(&backend, G, 0, &StreamFilter::all(), &CancellationToken::new(), BACKOFF)
        .await
        .expect_err("fatal");
    assert!(!err.is_throttled() && !err.is_not_found());
}

#[tokio::test]
async fn cancelled_listing_yields_nothing() {
    let backend = ScriptedBackend::new(&[G]).streams(G, vec![vec![stream("a", 500)]]);
    let cancel = CancellationToken::new();
    cancel.cancel();
    let found = list_streams(&backend, G, 0, &StreamFilter::all(), &cancel, BACKOFF)
        .await
        .expect("ok");
    assert!(found.is_empty());
    assert!(backend.stream_calls.lock().expect("lock").is_empty());
}
