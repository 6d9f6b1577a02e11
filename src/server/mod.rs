//! Single-connection collector server.
//!
//! `CollectorServer` owns a listening socket and drives one connection at a
//! time through a [`StreamFramer`](crate::framer::StreamFramer). The loop
//! moves between [`LoopState::WaitingForConnection`] and
//! [`LoopState::Connected`] until termination is requested, then settles in
//! [`LoopState::Stopped`] and closes the listener.

use std::sync::Arc;

use tokio::net::TcpListener;

use crate::{consumer::MessageConsumer, scanner::TokenScanner};

/// Collector server for one station connection at a time.
///
/// The server carries a typestate `St` indicating whether it is [`Unbound`]
/// (not yet bound to a TCP listener) or [`Bound`]. New servers start
/// `Unbound` and must call [`CollectorServer::bind`],
/// [`CollectorServer::bind_port`] or [`CollectorServer::bind_listener`]
/// before running. Binding failures surface immediately to the caller.
pub struct CollectorServer<S, C, St = Unbound>
where
    S: TokenScanner,
    C: MessageConsumer,
    St: ServerState,
{
    pub(crate) scanner: S,
    pub(crate) consumer: C,
    pub(crate) settings: LoopSettings,
    /// Handle shared with external controllers. Created with the server so
    /// it can be cloned out before [`run`](CollectorServer::run) consumes
    /// `self`.
    pub(crate) control: ControlHandle,
    /// Typestate tracking whether the server has been bound to a listener.
    pub(crate) state: St,
}

/// Marker indicating the server has not yet bound a listener.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unbound;

/// Marker indicating the server is bound to a TCP listener.
#[derive(Debug, Clone)]
pub struct Bound {
    pub(crate) listener: Arc<TcpListener>,
}

/// Trait implemented by [`Unbound`] and [`Bound`] to model binding typestate.
pub trait ServerState: sealed::Sealed {}

mod sealed {
    //! Prevent external implementations of [`ServerState`].

    pub trait Sealed {}
    impl Sealed for super::Unbound {}
    impl Sealed for super::Bound {}
}

impl ServerState for Unbound {}
impl ServerState for Bound {}

mod config;
pub use config::{DEFAULT_PORT, DEFAULT_READ_BUFFER_SIZE, DEFAULT_READ_TIMEOUT, LoopSettings};
mod control;
pub use control::{ControlHandle, LoopState};
pub mod error;
pub use error::ServerError;
mod runtime;

/// Re-exported configuration types for server backoff behaviour.
pub use runtime::BackoffConfig;

#[cfg(test)]
pub(crate) mod test_util;
