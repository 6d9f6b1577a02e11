//! Collector binary: listens for a station console driver and logs every
//! reading it sends.

mod cli;

use std::{net::SocketAddr, process::ExitCode, time::Duration};

use clap::Parser;
use tokio::sync::mpsc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
// `cli` reads its defaults through `crate::defaults`.
use weather_collector::{ChannelConsumer, CollectorServer, DelimiterScanner, IngestEvent, defaults};

async fn log_events(mut events: mpsc::Receiver<IngestEvent>) {
    while let Some(event) = events.recv().await {
        match event {
            IngestEvent::Connected { peer } => info!(?peer, "station connected"),
            IngestEvent::Messages(readings) => {
                for reading in readings {
                    info!(%reading, "reading received");
                }
            }
            IngestEvent::Disconnected => info!("station disconnected"),
        }
    }
}

#[cfg(feature = "metrics")]
fn install_exporter(addr: SocketAddr) -> Result<(), String> {
    metrics_exporter_prometheus::PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| e.to_string())
}

#[cfg(not(feature = "metrics"))]
fn install_exporter(_addr: SocketAddr) -> Result<(), String> {
    Err("built without the `metrics` feature".into())
}

#[tokio::main]
async fn main() -> ExitCode {
    // Applications embedding the library should install their own subscriber.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = cli::Cli::parse();

    if let Some(addr) = cli.metrics_addr
        && let Err(e) = install_exporter(addr)
    {
        error!(%addr, error = %e, "failed to start metrics exporter");
        return ExitCode::FAILURE;
    }

    let (consumer, events) = ChannelConsumer::channel(cli.queue_capacity);
    let logger = tokio::spawn(log_events(events));

    let scanner = match DelimiterScanner::new(cli.delimiter) {
        Ok(scanner) => scanner,
        Err(e) => {
            error!(error = %e, "invalid delimiter");
            return ExitCode::FAILURE;
        }
    };
    let max_pending = (cli.max_pending > 0).then_some(cli.max_pending);
    let server = CollectorServer::new(scanner, consumer)
        .read_timeout(Duration::from_millis(cli.read_timeout_ms))
        .max_pending(max_pending)
        .bind(SocketAddr::new(cli.bind, cli.port));

    let server = match server {
        Ok(server) => server,
        Err(e) => {
            error!(error = %e, "failed to start collector");
            return ExitCode::FAILURE;
        }
    };
    if let Some(addr) = server.local_addr() {
        info!(%addr, delimiter = ?cli.delimiter, "waiting for station");
    }

    let result = server.run().await;
    // The consumer was dropped with the server, so the logger drains and ends.
    let _ = logger.await;
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!(error = %e, "collector stopped with an error");
            ExitCode::FAILURE
        }
    }
}
