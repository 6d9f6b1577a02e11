//! Command line interface for the `weather-collector` binary.

use std::net::IpAddr;

use clap::Parser;

use crate::defaults::{DEFAULT_DELIMITER, DEFAULT_MAX_PENDING, DEFAULT_PORT, DEFAULT_READ_TIMEOUT_MS};

/// Parse a single 7-bit ASCII character.
fn ascii_char(value: &str) -> Result<char, String> {
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii() => Ok(c),
        (Some(c), None) => Err(format!("{c:?} is not a 7-bit ASCII character")),
        _ => Err("expected exactly one character".to_owned()),
    }
}

/// Command line arguments for the `weather-collector` binary.
#[derive(Debug, Parser)]
#[command(
    name = "weather-collector",
    version,
    about = "Collect readings streamed by a weather-station console driver"
)]
pub struct Cli {
    /// TCP port the console driver connects to.
    #[arg(short, long, default_value_t = DEFAULT_PORT)]
    pub port: u16,

    /// Address to listen on.
    #[arg(short, long, default_value = "0.0.0.0")]
    pub bind: IpAddr,

    /// Character terminating each reading; must be 7-bit ASCII.
    #[arg(short, long, default_value_t = DEFAULT_DELIMITER, value_parser = ascii_char)]
    pub delimiter: char,

    /// Upper bound on a single blocking read, in milliseconds.
    #[arg(long, default_value_t = DEFAULT_READ_TIMEOUT_MS)]
    pub read_timeout_ms: u64,

    /// Bytes of undelimited data kept per connection; 0 disables the bound.
    #[arg(long, default_value_t = DEFAULT_MAX_PENDING)]
    pub max_pending: usize,

    /// Capacity of the queue between the socket loop and the event logger.
    #[arg(long, default_value_t = 1024)]
    pub queue_capacity: usize,

    /// Serve Prometheus metrics on this address.
    #[arg(long)]
    pub metrics_addr: Option<std::net::SocketAddr>,
}
