//! Errors raised by [`CollectorServer`](super::CollectorServer) operations.

use std::{io, net::SocketAddr};

use thiserror::Error;

/// Errors that may occur while setting up or running the server.
///
/// Only start-up can fail: once the loop is running, accept and read
/// failures are logged and retried rather than returned.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The listening socket could not be bound.
    #[error("failed to bind {addr}: {source}")]
    Bind {
        /// Address the server tried to listen on.
        addr: SocketAddr,
        /// Underlying socket error.
        #[source]
        source: io::Error,
    },

    /// An existing listener could not be adopted by the runtime.
    #[error("listener setup failed: {0}")]
    Listener(#[source] io::Error),
}
