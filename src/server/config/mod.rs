//! Configuration utilities for [`CollectorServer`].

use std::time::Duration;

use super::{BackoffConfig, CollectorServer, ControlHandle, ServerState, Unbound};
pub use crate::defaults::{DEFAULT_PORT, DEFAULT_READ_BUFFER_SIZE, DEFAULT_READ_TIMEOUT};
use crate::{consumer::MessageConsumer, defaults::DEFAULT_MAX_PENDING, scanner::TokenScanner};

mod binding;


/// Tunables applied to every connection served by the loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LoopSettings {
    /// Upper bound on a single blocking read.
    pub read_timeout: Duration,
    /// Bytes requested per read.
    pub read_buffer_size: usize,
    /// Bound on undelimited data held per connection; `None` is unbounded.
    pub max_pending: Option<usize>,
    /// Retry timing after `accept()` failures.
    pub backoff: BackoffConfig,
}

impl Default for LoopSettings {
    fn default() -> Self {
        Self {
            read_timeout: DEFAULT_READ_TIMEOUT,
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
            max_pending: Some(DEFAULT_MAX_PENDING),
            backoff: BackoffConfig::default(),
        }
    }
}

impl<S, C> CollectorServer<S, C, Unbound>
where
    S: TokenScanner,
    C: MessageConsumer,
{
    /// Create a new server from a scan policy and a consumer.
    ///
    /// The listener is unset; call [`bind`](Self::bind) before running.
    #[must_use]
    pub fn new(scanner: S, consumer: C) -> Self {
        Self {
            scanner,
            consumer,
            settings: LoopSettings::default(),
            control: ControlHandle::new(),
            state: Unbound,
        }
    }
}

impl<S, C, St> CollectorServer<S, C, St>
where
    S: TokenScanner,
    C: MessageConsumer,
    St: ServerState,
{
    /// Set the timeout applied to each read.
    ///
    /// Zero is raised to one millisecond.
    #[must_use]
    pub fn read_timeout(mut self, timeout: Duration) -> Self {
        self.settings.read_timeout = timeout.max(Duration::from_millis(1));
        self
    }

    /// Set the number of bytes requested per read. Zero is raised to one.
    #[must_use]
    pub fn read_buffer_size(mut self, size: usize) -> Self {
        self.settings.read_buffer_size = size.max(1);
        self
    }

    /// Bound undelimited data held for one connection. `None` disables the
    /// bound.
    #[must_use]
    pub fn max_pending(mut self, max: Option<usize>) -> Self {
        self.settings.max_pending = max;
        self
    }

    /// Configure the back-off applied after `accept()` failures.
    #[must_use]
    pub fn accept_backoff(mut self, backoff: BackoffConfig) -> Self {
        self.settings.backoff = backoff.normalized();
        self
    }

    /// Current settings.
    #[must_use]
    pub const fn settings(&self) -> &LoopSettings { &self.settings }

    /// Handle for stopping and observing the loop once it runs.
    #[must_use]
    pub fn control_handle(&self) -> ControlHandle { self.control.clone() }
}
