#![doc(html_root_url = "https://docs.rs/weather_collector/latest")]
//! Socket ingestion for a weather-station collector.
//!
//! A station console driver connects over TCP and streams delimiter
//! terminated readings. [`CollectorServer`] accepts one station at a time,
//! reassembles readings across reads with a [`StreamFramer`], hands each
//! batch to a [`MessageConsumer`] and writes back any reply it produces.

pub mod consumer;
pub mod defaults;
pub mod framer;
pub mod metrics;
pub mod panic;
pub mod scanner;
pub mod server;
pub mod stats;

pub use consumer::{ChannelConsumer, FnConsumer, IngestEvent, MessageConsumer};
pub use framer::{FramingError, StreamFramer};
pub use metrics::{CONNECTIONS_ACTIVE, ERRORS_TOTAL, MESSAGES_RECEIVED, REPLIES_SENT};
pub use scanner::{
    DelimiterScanner,
    FixedLengthScanner,
    ScannerError,
    TerminatorScanner,
    TokenScanner,
};
pub use server::{CollectorServer, ControlHandle, LoopState, ServerError};
pub use stats::StatsSnapshot;
