//! Accepting station connections.

use std::{io, net::SocketAddr};

use async_trait::async_trait;
use log::warn;
use tokio::{
    net::{TcpListener, TcpStream},
    select,
    time::{Duration, sleep},
};

use crate::{
    metrics::{self, ErrorKind},
    server::ControlHandle,
};

/// Abstraction for sources of incoming connections consumed by the loop.
///
/// Implementations must be cancellation-safe: dropping a pending `accept()`
/// future must not leak resources.
#[async_trait]
#[cfg_attr(test, mockall::automock)]
pub(in crate::server) trait AcceptListener: Send + Sync {
    async fn accept(&self) -> io::Result<(TcpStream, SocketAddr)>;
    fn local_addr(&self) -> io::Result<SocketAddr>;
}

#[async_trait]
impl AcceptListener for TcpListener {
    async fn accept(&self) -> io::Result<(TcpStream, SocketAddr)> {
        TcpListener::accept(self).await
    }

    fn local_addr(&self) -> io::Result<SocketAddr> { TcpListener::local_addr(self) }
}

/// Result of one wait for a connection.
#[derive(Debug)]
pub(in crate::server) enum AcceptOutcome {
    /// A station connected.
    Accepted(TcpStream, SocketAddr),
    /// `accept()` failed and the back-off sleep has elapsed.
    Retry,
    /// Termination was requested.
    Shutdown,
}

/// Wait for one connection, sleeping for `delay` after a failure.
///
/// Both the accept and the back-off sleep end as soon as termination is
/// requested.
pub(in crate::server) async fn accept_connection<L>(
    listener: &L,
    control: &ControlHandle,
    delay: Duration,
) -> AcceptOutcome
where
    L: AcceptListener + ?Sized,
{
    let shutdown = control.shutdown_token();
    select! {
        biased;

        () = shutdown.cancelled() => AcceptOutcome::Shutdown,
        res = listener.accept() => match res {
            Ok((stream, peer)) => AcceptOutcome::Accepted(stream, peer),
            Err(e) => {
                let local_addr = listener.local_addr().ok();
                warn!("accept error: error={e:?}, local_addr={local_addr:?}");
                control.stats_handle().record_accept_failure();
                metrics::inc_errors(ErrorKind::Accept);
                select! {
                    biased;

                    () = shutdown.cancelled() => AcceptOutcome::Shutdown,
                    () = sleep(delay) => AcceptOutcome::Retry,
                }
            }
        },
    }
}
