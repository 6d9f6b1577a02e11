//! Metric helpers for the collector.
//!
//! This module defines metric names and simple helper functions wrapping the
//! [`metrics`](https://docs.rs/metrics) crate. Without the `metrics` feature
//! every helper compiles to a no-op.

#[cfg(feature = "metrics")]
use metrics::{counter, gauge};

/// Name of the gauge tracking whether a station connection is open.
pub const CONNECTIONS_ACTIVE: &str = "collector_connections_active";
/// Name of the counter tracking received messages.
pub const MESSAGES_RECEIVED: &str = "collector_messages_received_total";
/// Name of the counter tracking replies written to the station.
pub const REPLIES_SENT: &str = "collector_replies_sent_total";
/// Name of the counter tracking error occurrences.
pub const ERRORS_TOTAL: &str = "collector_errors_total";

/// Category of a recorded error.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ErrorKind {
    /// `accept()` failed.
    Accept,
    /// A read or reply write failed.
    Io,
    /// The consumer returned an error or panicked.
    Consumer,
    /// The scanner or buffer bound rejected data.
    Framing,
}

impl ErrorKind {
    #[cfg_attr(not(feature = "metrics"), allow(dead_code))]
    fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Accept => "accept",
            ErrorKind::Io => "io",
            ErrorKind::Consumer => "consumer",
            ErrorKind::Framing => "framing",
        }
    }
}

/// Increment the active connections gauge.
pub fn inc_connections() {
    #[cfg(feature = "metrics")]
    gauge!(CONNECTIONS_ACTIVE).increment(1.0);
}

/// Decrement the active connections gauge.
pub fn dec_connections() {
    #[cfg(feature = "metrics")]
    gauge!(CONNECTIONS_ACTIVE).decrement(1.0);
}

/// Record `count` messages handed to the consumer.
pub fn inc_messages(count: usize) {
    #[cfg(feature = "metrics")]
    counter!(MESSAGES_RECEIVED).increment(u64::try_from(count).unwrap_or(u64::MAX));
    #[cfg(not(feature = "metrics"))]
    let _ = count;
}

/// Record a reply written to the peer.
pub fn inc_replies() {
    #[cfg(feature = "metrics")]
    counter!(REPLIES_SENT).increment(1);
}

/// Record an error occurrence of the given kind.
pub fn inc_errors(kind: ErrorKind) {
    #[cfg(feature = "metrics")]
    counter!(ERRORS_TOTAL, "kind" => kind.as_str()).increment(1);
    #[cfg(not(feature = "metrics"))]
    let _ = kind;
}
