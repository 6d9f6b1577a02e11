//! Runtime control for [`CollectorServer`].

mod accept;
mod backoff;
mod lifecycle;
mod session;

use std::future::Future;

pub use backoff::BackoffConfig;
use lifecycle::Lifecycle;
use tokio::{pin, select, signal};

use super::{Bound, CollectorServer, ServerError};
use crate::{consumer::MessageConsumer, scanner::TokenScanner};

impl<S, C> CollectorServer<S, C, Bound>
where
    S: TokenScanner,
    C: MessageConsumer,
{
    /// Run the collector until Ctrl+C or a termination request.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use weather_collector::{
    ///     consumer::ChannelConsumer,
    ///     scanner::DelimiterScanner,
    ///     server::{CollectorServer, DEFAULT_PORT},
    /// };
    ///
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), weather_collector::server::ServerError> {
    /// let (consumer, _events) = ChannelConsumer::channel(64);
    /// CollectorServer::new(DelimiterScanner::default(), consumer)
    ///     .bind_port(DEFAULT_PORT)?
    ///     .run()
    ///     .await?;
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// # Errors
    ///
    /// Currently always returns `Ok(())`: accept and read failures are
    /// retried rather than surfaced.
    pub async fn run(self) -> Result<(), ServerError> {
        self.run_with_shutdown(async {
            let _ = signal::ctrl_c().await;
        })
        .await
    }

    /// Run the collector until `shutdown` resolves or a termination request
    /// arrives through a [`ControlHandle`](super::ControlHandle).
    ///
    /// The loop owns the listener and at most one connection; both are
    /// closed before this returns.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::net::{Ipv4Addr, SocketAddr};
    ///
    /// use tokio::sync::oneshot;
    /// use weather_collector::{
    ///     consumer::ChannelConsumer,
    ///     scanner::DelimiterScanner,
    ///     server::CollectorServer,
    /// };
    ///
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), weather_collector::server::ServerError> {
    /// let (consumer, _events) = ChannelConsumer::channel(64);
    /// let server = CollectorServer::new(DelimiterScanner::default(), consumer)
    ///     .bind(SocketAddr::from((Ipv4Addr::LOCALHOST, 0)))?;
    ///
    /// let (tx, rx) = oneshot::channel::<()>();
    /// let handle = tokio::spawn(async move {
    ///     server
    ///         .run_with_shutdown(async {
    ///             let _ = rx.await;
    ///         })
    ///         .await
    /// });
    ///
    /// let _ = tx.send(());
    /// handle
    ///     .await
    ///     .expect("join collector task")
    ///     .expect("collector run failed");
    /// # Ok(())
    /// # }
    /// ```
    ///
    /// # Errors
    ///
    /// Currently always returns `Ok(())`: accept and read failures are
    /// retried rather than surfaced.
    pub async fn run_with_shutdown<F>(self, shutdown: F) -> Result<(), ServerError>
    where
        F: Future<Output = ()> + Send,
    {
        let CollectorServer {
            scanner,
            consumer,
            settings,
            control,
            state: Bound { listener },
        } = self;

        let lifecycle = Lifecycle::new(listener, scanner, consumer, settings, control.clone()).run();
        pin!(lifecycle);

        select! {
            biased;

            () = &mut lifecycle => {},
            () = shutdown => {
                control.request_termination();
                lifecycle.await;
            }
        }
        Ok(())
    }
}
