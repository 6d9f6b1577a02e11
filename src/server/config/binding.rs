//! Listener binding for [`CollectorServer`].

use std::{
    net::{Ipv4Addr, SocketAddr, TcpListener as StdTcpListener},
    sync::Arc,
};

use tokio::net::TcpListener;

use super::{CollectorServer, Unbound};
use crate::{
    consumer::MessageConsumer,
    scanner::TokenScanner,
    server::{Bound, ServerError},
};

impl<S, C> CollectorServer<S, C, Unbound>
where
    S: TokenScanner,
    C: MessageConsumer,
{
    /// Bind to `addr`.
    ///
    /// Must be called from within a Tokio runtime.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::net::{Ipv4Addr, SocketAddr};
    ///
    /// use weather_collector::{
    ///     consumer::ChannelConsumer,
    ///     scanner::DelimiterScanner,
    ///     server::CollectorServer,
    /// };
    ///
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), weather_collector::server::ServerError> {
    /// let (consumer, _events) = ChannelConsumer::channel(16);
    /// let server = CollectorServer::new(DelimiterScanner::default(), consumer)
    ///     .bind(SocketAddr::from((Ipv4Addr::LOCALHOST, 0)))?;
    /// assert!(server.local_addr().is_some());
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// # Errors
    /// Returns [`ServerError::Bind`] if the port cannot be bound; this is
    /// never retried.
    pub fn bind(self, addr: SocketAddr) -> Result<CollectorServer<S, C, Bound>, ServerError> {
        let std_listener =
            StdTcpListener::bind(addr).map_err(|source| ServerError::Bind { addr, source })?;
        self.bind_listener(std_listener)
    }

    /// Bind to `port` on all IPv4 interfaces.
    ///
    /// # Errors
    /// Returns [`ServerError::Bind`] if the port cannot be bound.
    pub fn bind_port(self, port: u16) -> Result<CollectorServer<S, C, Bound>, ServerError> {
        self.bind(SocketAddr::from((Ipv4Addr::UNSPECIFIED, port)))
    }

    /// Adopt an already bound standard listener.
    ///
    /// # Errors
    /// Returns [`ServerError::Listener`] if the listener cannot be switched to
    /// non-blocking mode or registered with the runtime.
    pub fn bind_listener(
        self,
        std_listener: StdTcpListener,
    ) -> Result<CollectorServer<S, C, Bound>, ServerError> {
        let CollectorServer {
            scanner,
            consumer,
            settings,
            control,
            ..
        } = self;

        std_listener
            .set_nonblocking(true)
            .map_err(ServerError::Listener)?;
        let listener = TcpListener::from_std(std_listener).map_err(ServerError::Listener)?;
        if let Ok(addr) = listener.local_addr() {
            log::debug!("collector listening: local_addr={addr}");
        }

        Ok(CollectorServer {
            scanner,
            consumer,
            settings,
            control,
            state: Bound {
                listener: Arc::new(listener),
            },
        })
    }
}

impl<S, C> CollectorServer<S, C, Bound>
where
    S: TokenScanner,
    C: MessageConsumer,
{
    /// Address the server is listening on.
    #[must_use]
    pub fn local_addr(&self) -> Option<SocketAddr> { self.state.listener.local_addr().ok() }
}
