#![cfg(feature = "metrics")]
//! Tests for collector metrics helpers.
//!
//! These tests verify that counters and gauges update as expected using
//! `metrics_util::debugging::DebuggingRecorder`.
use metrics_util::debugging::{DebugValue, DebuggingRecorder, Snapshotter};
use rstest::rstest;
use weather_collector::metrics::{self as collector_metrics, ErrorKind};

/// Creates a debugging recorder and snapshotter for metrics testing.
fn debugging_recorder_setup() -> (Snapshotter, DebuggingRecorder) {
    let recorder = DebuggingRecorder::new();
    let snapshotter = recorder.snapshotter();
    (snapshotter, recorder)
}

fn counter_value(snapshotter: &Snapshotter, name: &str, label: Option<(&str, &str)>) -> u64 {
    snapshotter
        .snapshot()
        .into_vec()
        .into_iter()
        .find_map(|(k, _, _, v)| {
            let key = k.key();
            let labelled = label.is_none_or(|(lk, lv)| {
                key.labels().any(|l| l.key() == lk && l.value() == lv)
            });
            match v {
                DebugValue::Counter(c) if key.name() == name && labelled => Some(c),
                _ => None,
            }
        })
        .unwrap_or(0)
}

#[test]
fn message_counter_adds_batch_size() {
    let (snapshotter, recorder) = debugging_recorder_setup();
    metrics::with_local_recorder(&recorder, || {
        collector_metrics::inc_messages(3);
        collector_metrics::inc_messages(2);
    });
    assert_eq!(
        counter_value(&snapshotter, collector_metrics::MESSAGES_RECEIVED, None),
        5
    );
}

#[test]
fn reply_counter_increments() {
    let (snapshotter, recorder) = debugging_recorder_setup();
    metrics::with_local_recorder(&recorder, collector_metrics::inc_replies);
    assert_eq!(
        counter_value(&snapshotter, collector_metrics::REPLIES_SENT, None),
        1
    );
}

#[rstest]
#[case(ErrorKind::Accept, "accept")]
#[case(ErrorKind::Io, "io")]
#[case(ErrorKind::Consumer, "consumer")]
#[case(ErrorKind::Framing, "framing")]
fn error_counter_is_labelled_by_kind(#[case] kind: ErrorKind, #[case] label: &str) {
    let (snapshotter, recorder) = debugging_recorder_setup();
    metrics::with_local_recorder(&recorder, || collector_metrics::inc_errors(kind));
    assert_eq!(
        counter_value(&snapshotter, collector_metrics::ERRORS_TOTAL, Some(("kind", label))),
        1
    );
}

#[test]
fn connection_gauge_returns_to_zero() {
    let (snapshotter, recorder) = debugging_recorder_setup();
    metrics::with_local_recorder(&recorder, || {
        collector_metrics::inc_connections();
        collector_metrics::dec_connections();
    });

    let metrics = snapshotter.snapshot().into_vec();
    let found = metrics.iter().any(|(k, _, _, v)| {
        k.key().name() == collector_metrics::CONNECTIONS_ACTIVE
            && matches!(v, DebugValue::Gauge(g) if g.into_inner() == 0.0)
    });
    assert!(found, "connection gauge not recorded");
}
