//! Message consumer boundary.
//!
//! A [`MessageConsumer`] receives every batch of complete tokens extracted by
//! the [`StreamFramer`](crate::framer::StreamFramer) and may answer with a
//! single reply written verbatim back to the peer. Consumers run on the
//! lifecycle loop's task, so they must return promptly.

use std::{error::Error, fmt, net::SocketAddr};

use log::warn;
use thiserror::Error;
use tokio::sync::mpsc::{self, error::TrySendError};

/// Error raised by a consumer while handling a batch.
pub type ConsumeError = Box<dyn Error + Send + Sync + 'static>;

/// Outcome of [`MessageConsumer::consume_messages`]: an optional reply.
pub type ConsumeResult = Result<Option<String>, ConsumeError>;

/// Interprets batches of complete tokens.
///
/// Errors and panics raised here are caught by the framer, logged, and
/// treated as "no reply". They never close the connection.
pub trait MessageConsumer: Send + 'static {
    /// Handle the tokens extracted since the previous call, in arrival order.
    ///
    /// # Errors
    ///
    /// Implementations may return any error; the framer logs it and carries
    /// on with the next arrival.
    fn consume_messages(&mut self, messages: &[String]) -> ConsumeResult;

    /// Called after a new connection has been accepted.
    fn on_connect(&mut self, _peer: Option<SocketAddr>) {}

    /// Called once the current connection has been closed.
    fn on_disconnect(&mut self) {}
}

impl<C: MessageConsumer + ?Sized> MessageConsumer for Box<C> {
    fn consume_messages(&mut self, messages: &[String]) -> ConsumeResult {
        (**self).consume_messages(messages)
    }

    fn on_connect(&mut self, peer: Option<SocketAddr>) { (**self).on_connect(peer); }

    fn on_disconnect(&mut self) { (**self).on_disconnect(); }
}

/// Adapter turning a closure into a [`MessageConsumer`].
///
/// # Examples
///
/// ```
/// use weather_collector::consumer::{FnConsumer, MessageConsumer};
///
/// let mut consumer = FnConsumer::new(|messages: &[String]| {
///     Ok(messages.first().map(|m| format!("ack {m};")))
/// });
/// let reply = consumer
///     .consume_messages(&["42".to_string()])
///     .expect("consume");
/// assert_eq!(reply.as_deref(), Some("ack 42;"));
/// ```
pub struct FnConsumer<F> {
    f: F,
}

impl<F> FnConsumer<F>
where
    F: FnMut(&[String]) -> ConsumeResult + Send + 'static,
{
    /// Wrap `f` as a consumer.
    pub fn new(f: F) -> Self { Self { f } }
}

impl<F> fmt::Debug for FnConsumer<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnConsumer").finish_non_exhaustive()
    }
}

impl<F> MessageConsumer for FnConsumer<F>
where
    F: FnMut(&[String]) -> ConsumeResult + Send + 'static,
{
    fn consume_messages(&mut self, messages: &[String]) -> ConsumeResult { (self.f)(messages) }
}

/// Events forwarded by [`ChannelConsumer`] to another task.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum IngestEvent {
    /// A peer connected.
    Connected {
        /// Remote address, when the transport reports one.
        peer: Option<SocketAddr>,
    },
    /// One batch of complete messages, in arrival order.
    Messages(Vec<String>),
    /// The current peer went away.
    Disconnected,
}

/// Failure to hand an event to the receiving task.
#[derive(Clone, Copy, Debug, Error, PartialEq, Eq)]
pub enum ChannelError {
    /// The receiver is not keeping up.
    #[error("ingest channel is full")]
    Full,
    /// The receiver has been dropped.
    #[error("ingest channel is closed")]
    Closed,
}

impl<T> From<TrySendError<T>> for ChannelError {
    fn from(err: TrySendError<T>) -> Self {
        match err {
            TrySendError::Full(_) => Self::Full,
            TrySendError::Closed(_) => Self::Closed,
        }
    }
}

/// Consumer forwarding every batch over a bounded channel.
///
/// Sending never waits: when the channel is full the batch is reported as a
/// consumer failure instead of stalling the read loop. No reply is produced.
#[derive(Clone, Debug)]
pub struct ChannelConsumer {
    tx: mpsc::Sender<IngestEvent>,
}

impl ChannelConsumer {
    /// Create a consumer and the receiver for its events.
    ///
    /// `capacity` is raised to at least one.
    #[must_use]
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<IngestEvent>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (Self { tx }, rx)
    }

    fn send(&self, event: IngestEvent) -> Result<(), ChannelError> {
        self.tx.try_send(event).map_err(ChannelError::from)
    }
}

impl MessageConsumer for ChannelConsumer {
    fn consume_messages(&mut self, messages: &[String]) -> ConsumeResult {
        self.send(IngestEvent::Messages(messages.to_vec()))?;
        Ok(None)
    }

    fn on_connect(&mut self, peer: Option<SocketAddr>) {
        if let Err(e) = self.send(IngestEvent::Connected { peer }) {
            warn!("failed to forward connect event: error={e}, peer_addr={peer:?}");
        }
    }

    fn on_disconnect(&mut self) {
        if let Err(e) = self.send(IngestEvent::Disconnected) {
            warn!("failed to forward disconnect event: error={e}");
        }
    }
}
