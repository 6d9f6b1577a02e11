//! Helpers for exercising a [`CollectorServer`](weather_collector::CollectorServer)
//! over real sockets during tests.
//!
//! ```rust,no_run
//! use collector_testing::{RecordingConsumer, StationClient, spawn_collector, unused_listener};
//!
//! # async fn example() -> collector_testing::TestResult {
//! let consumer = RecordingConsumer::default();
//! let collector = spawn_collector(consumer.clone(), unused_listener()?)?;
//! let mut station = StationClient::connect(collector.addr()).await?;
//! station.send("T=21.4;").await?;
//! assert!(consumer.wait_for_messages(1).await);
//! collector.shutdown().await?;
//! # Ok(())
//! # }
//! ```

pub mod logging;
mod recording;
mod station;

use std::{
    net::{Ipv4Addr, SocketAddr, TcpListener as StdTcpListener},
    time::Duration,
};

pub use logging::{LoggerHandle, logger};
pub use recording::RecordingConsumer;
pub use station::StationClient;
use tokio::task::JoinHandle;
use weather_collector::{
    CollectorServer,
    ControlHandle,
    DelimiterScanner,
    MessageConsumer,
    ServerError,
};

/// Shared result type for integration tests.
pub type TestResult<T = ()> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Read timeout used by [`spawn_collector`] so close requests land quickly.
pub const TEST_READ_TIMEOUT: Duration = Duration::from_millis(50);

/// Create a TCP listener bound to a free local port.
///
/// # Errors
///
/// Returns any IO error encountered while binding to an ephemeral localhost
/// port.
pub fn unused_listener() -> std::io::Result<StdTcpListener> {
    StdTcpListener::bind(SocketAddr::new(Ipv4Addr::LOCALHOST.into(), 0))
}

/// Poll `check` every few milliseconds until it holds or a second passes.
///
/// Returns the final outcome so callers can assert on it.
pub async fn eventually(mut check: impl FnMut() -> bool) -> bool {
    for _ in 0..200 {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    check()
}

/// A collector running on a background task.
pub struct RunningCollector {
    control: ControlHandle,
    addr: SocketAddr,
    task: JoinHandle<Result<(), ServerError>>,
}

impl RunningCollector {
    /// Address stations should connect to.
    #[must_use]
    pub fn addr(&self) -> SocketAddr { self.addr }

    /// Handle controlling the running loop.
    #[must_use]
    pub fn control(&self) -> &ControlHandle { &self.control }

    /// Request termination and wait for the loop to exit.
    ///
    /// # Errors
    ///
    /// Returns an error if the loop does not stop within a second, panicked,
    /// or reported a [`ServerError`].
    pub async fn shutdown(self) -> TestResult {
        self.control.request_termination();
        tokio::time::timeout(Duration::from_secs(1), self.task).await???;
        Ok(())
    }
}

/// Bind a `;`-delimited collector to `listener` and run it until shut down.
///
/// # Errors
///
/// Returns [`ServerError`] if `listener` cannot be adopted.
pub fn spawn_collector<C>(consumer: C, listener: StdTcpListener) -> Result<RunningCollector, ServerError>
where
    C: MessageConsumer,
{
    spawn_with(
        CollectorServer::new(DelimiterScanner::default(), consumer).read_timeout(TEST_READ_TIMEOUT),
        listener,
    )
}

/// Run a preconfigured collector on `listener` until shut down.
///
/// # Errors
///
/// Returns [`ServerError`] if `listener` cannot be adopted.
pub fn spawn_with<S, C>(
    server: CollectorServer<S, C>,
    listener: StdTcpListener,
) -> Result<RunningCollector, ServerError>
where
    S: weather_collector::TokenScanner,
    C: MessageConsumer,
{
    let server = server.bind_listener(listener)?;
    let control = server.control_handle();
    let addr = server
        .local_addr()
        .ok_or_else(|| ServerError::Listener(std::io::Error::other("listener has no address")))?;
    let task = tokio::spawn(server.run_with_shutdown(std::future::pending()));
    Ok(RunningCollector {
        control,
        addr,
        task,
    })
}
