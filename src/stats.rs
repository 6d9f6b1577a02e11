//! Counters owned by a single collector instance.
//!
//! Each [`CollectorServer`](crate::server::CollectorServer) carries its own
//! [`CollectorStats`]; readers take a [`StatsSnapshot`] through the
//! [`ControlHandle`](crate::server::ControlHandle).

use std::sync::atomic::{AtomicU64, Ordering};

/// Live counters updated by the lifecycle loop and the framer.
#[derive(Debug, Default)]
pub struct CollectorStats {
    connections_accepted: AtomicU64,
    accept_failures: AtomicU64,
    bytes_received: AtomicU64,
    read_failures: AtomicU64,
    messages_received: AtomicU64,
    replies_sent: AtomicU64,
    consumer_failures: AtomicU64,
    scan_faults: AtomicU64,
    oversize_discards: AtomicU64,
}

/// Point-in-time copy of [`CollectorStats`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    /// Connections accepted since start-up.
    pub connections_accepted: u64,
    /// `accept()` calls that failed.
    pub accept_failures: u64,
    /// Raw bytes read from peers.
    pub bytes_received: u64,
    /// Connections dropped because a read failed.
    pub read_failures: u64,
    /// Tokens handed to the consumer.
    pub messages_received: u64,
    /// Replies written back to peers.
    pub replies_sent: u64,
    /// Consumer invocations that returned an error or panicked.
    pub consumer_failures: u64,
    /// Scanner results rejected as out of range.
    pub scan_faults: u64,
    /// Pending buffers dropped for exceeding the configured bound.
    pub oversize_discards: u64,
}

impl CollectorStats {
    /// Copy the current counter values.
    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            connections_accepted: self.connections_accepted.load(Ordering::Relaxed),
            accept_failures: self.accept_failures.load(Ordering::Relaxed),
            bytes_received: self.bytes_received.load(Ordering::Relaxed),
            read_failures: self.read_failures.load(Ordering::Relaxed),
            messages_received: self.messages_received.load(Ordering::Relaxed),
            replies_sent: self.replies_sent.load(Ordering::Relaxed),
            consumer_failures: self.consumer_failures.load(Ordering::Relaxed),
            scan_faults: self.scan_faults.load(Ordering::Relaxed),
            oversize_discards: self.oversize_discards.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn record_connection(&self) {
        self.connections_accepted.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_accept_failure(&self) {
        self.accept_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_bytes(&self, count: usize) {
        self.bytes_received
            .fetch_add(u64::try_from(count).unwrap_or(u64::MAX), Ordering::Relaxed);
    }

    pub(crate) fn record_read_failure(&self) {
        self.read_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_messages(&self, count: usize) {
        self.messages_received
            .fetch_add(u64::try_from(count).unwrap_or(u64::MAX), Ordering::Relaxed);
    }

    pub(crate) fn record_reply(&self) { self.replies_sent.fetch_add(1, Ordering::Relaxed); }

    pub(crate) fn record_consumer_failure(&self) {
        self.consumer_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_scan_fault(&self) { self.scan_faults.fetch_add(1, Ordering::Relaxed); }

    pub(crate) fn record_oversize_discard(&self) {
        self.oversize_discards.fetch_add(1, Ordering::Relaxed);
    }
}
