//! Stream framing for the collector protocol.
//!
//! A [`StreamFramer`] is bound to one connection. Each arrival of raw bytes
//! is decoded as 7-bit ASCII and appended to an accumulation buffer, which is
//! then drained of every complete token the [`TokenScanner`] can find. The
//! tokens from one arrival form a single batch for the [`MessageConsumer`];
//! its optional reply is written back before the next read.
//!
//! Between arrivals the buffer only ever holds an incomplete message.
//!
//! # Error Handling
//!
//! Framing faults are reported through [`FramingError`] in the logs and the
//! [`CollectorStats`] counters. They never end the connection:
//!
//! - an out-of-range boundary is treated as "no boundary yet";
//! - a consumer error or panic is treated as "no reply";
//! - an oversized pending message is discarded up to the next boundary.

use std::{io, sync::Arc};

use log::warn;
use tokio::io::{AsyncWrite, AsyncWriteExt};

use crate::{
    consumer::MessageConsumer,
    metrics::{self, ErrorKind},
    panic::catch_consumer_panic,
    scanner::TokenScanner,
    stats::CollectorStats,
};

pub mod error;

pub use error::FramingError;

pub use crate::defaults::DEFAULT_MAX_PENDING;

/// Replacement for bytes outside the 7-bit ASCII range.
const REPLACEMENT: u8 = b'?';

/// Per-connection tokenizer and dispatcher.
#[derive(Debug)]
pub struct StreamFramer<S> {
    scanner: S,
    buffer: String,
    max_pending: Option<usize>,
    discarding: bool,
    stats: Arc<CollectorStats>,
}

impl<S: TokenScanner> StreamFramer<S> {
    /// Create a framer with an empty buffer and the default pending bound.
    #[must_use]
    pub fn new(scanner: S) -> Self {
        Self {
            scanner,
            buffer: String::new(),
            max_pending: Some(DEFAULT_MAX_PENDING),
            discarding: false,
            stats: Arc::new(CollectorStats::default()),
        }
    }

    /// Bound the undelimited data kept between arrivals. `None` keeps
    /// buffering without limit.
    #[must_use]
    pub fn with_max_pending(mut self, max_pending: Option<usize>) -> Self {
        self.max_pending = max_pending;
        self
    }

    /// Record counters into `stats` instead of a private instance.
    #[must_use]
    pub fn with_stats(mut self, stats: Arc<CollectorStats>) -> Self {
        self.stats = stats;
        self
    }

    /// Text buffered without a complete boundary.
    #[must_use]
    pub fn pending(&self) -> &str { &self.buffer }

    /// Counters this framer records into.
    #[must_use]
    pub fn stats(&self) -> &Arc<CollectorStats> { &self.stats }

    /// Decode `bytes`, append them to the buffer, and remove every complete
    /// token in delimiter order.
    ///
    /// Empty tokens (two delimiters back to back) are returned as empty
    /// strings.
    pub fn extract_tokens(&mut self, bytes: &[u8]) -> Vec<String> {
        self.stats.record_bytes(bytes.len());
        decode_ascii_into(&mut self.buffer, bytes);

        let mut tokens = Vec::new();
        while let Some(end) = self.next_boundary() {
            let token_end = end - self.scanner.terminator_len();
            let token = self.buffer[..token_end].to_owned();
            self.buffer.drain(..end);
            if self.discarding {
                self.discarding = false;
                log::debug!("resynchronised after oversized message: dropped_tail={}", token.len());
                continue;
            }
            tokens.push(token);
        }
        self.enforce_pending_bound();

        tracing::trace!(
            bytes = bytes.len(),
            tokens = tokens.len(),
            pending = self.buffer.len(),
            "framed arrival"
        );
        tokens
    }

    /// Hand `messages` to `consumer`, isolating failures.
    ///
    /// Returns the reply to send, if any. Empty replies are dropped. Errors
    /// and panics are logged and yield `None`.
    pub fn dispatch<C>(&self, consumer: &mut C, messages: &[String]) -> Option<String>
    where
        C: MessageConsumer + ?Sized,
    {
        self.stats.record_messages(messages.len());
        metrics::inc_messages(messages.len());

        match catch_consumer_panic(|| consumer.consume_messages(messages)) {
            Ok(Ok(reply)) => reply.filter(|r| !r.is_empty()),
            Ok(Err(e)) => {
                warn!("consumer failed: error={e}, messages={}", messages.len());
                self.stats.record_consumer_failure();
                metrics::inc_errors(ErrorKind::Consumer);
                None
            }
            Err(panic) => {
                tracing::error!(panic = %panic, messages = messages.len(), "consumer panicked");
                self.stats.record_consumer_failure();
                metrics::inc_errors(ErrorKind::Consumer);
                None
            }
        }
    }

    /// Process one arrival: extract tokens, invoke the consumer once if any
    /// were found, and write its reply to `writer`.
    ///
    /// Returns the number of tokens delivered.
    ///
    /// # Errors
    ///
    /// Returns an [`io::Error`] if writing the reply fails. Consumer failures
    /// are not errors.
    pub async fn process_arrival<C, W>(
        &mut self,
        bytes: &[u8],
        consumer: &mut C,
        writer: &mut W,
    ) -> io::Result<usize>
    where
        C: MessageConsumer + ?Sized,
        W: AsyncWrite + Unpin + ?Sized,
    {
        let messages = self.extract_tokens(bytes);
        if messages.is_empty() {
            return Ok(0);
        }
        if let Some(reply) = self.dispatch(consumer, &messages) {
            tracing::debug!(reply = %reply, "responding");
            writer.write_all(&encode_ascii(&reply)).await?;
            writer.flush().await?;
            self.stats.record_reply();
            metrics::inc_replies();
        }
        Ok(messages.len())
    }

    fn next_boundary(&self) -> Option<usize> {
        let end = self.scanner.find_token(&self.buffer)?;
        match self.check_boundary(end) {
            Ok(()) => Some(end),
            Err(e) => {
                warn!("ignoring scanner result: error={e}");
                self.stats.record_scan_fault();
                metrics::inc_errors(ErrorKind::Framing);
                None
            }
        }
    }

    fn check_boundary(&self, end: usize) -> Result<(), FramingError> {
        let len = self.buffer.len();
        let terminator_len = self.scanner.terminator_len();
        if end > len {
            return Err(FramingError::BoundaryOutOfRange { boundary: end, len });
        }
        if end == 0 || end < terminator_len {
            return Err(FramingError::BoundaryTooShort {
                boundary: end,
                terminator_len,
            });
        }
        Ok(())
    }

    fn enforce_pending_bound(&mut self) {
        let Some(max) = self.max_pending else {
            return;
        };
        let pending = self.buffer.len();
        if pending <= max {
            return;
        }
        if !self.discarding {
            let e = FramingError::PendingOverflow { pending, max };
            warn!("discarding pending message: error={e}");
            self.stats.record_oversize_discard();
            metrics::inc_errors(ErrorKind::Framing);
            self.discarding = true;
        }
        self.buffer.clear();
    }
}

/// Append `bytes` to `buffer`, replacing non-ASCII bytes with `?`.
///
/// Keeping the buffer pure ASCII means byte offsets and character offsets
/// coincide, so scanner results can always be sliced.
fn decode_ascii_into(buffer: &mut String, bytes: &[u8]) {
    buffer.reserve(bytes.len());
    buffer.extend(
        bytes
            .iter()
            .map(|&b| char::from(if b.is_ascii() { b } else { REPLACEMENT })),
    );
}

/// Encode `reply` as ASCII, replacing anything outside the range with `?`.
fn encode_ascii(reply: &str) -> Vec<u8> {
    reply
        .chars()
        .map(|c| u8::try_from(c).ok().filter(u8::is_ascii).unwrap_or(REPLACEMENT))
        .collect()
}

#[cfg(test)]
mod tests;
