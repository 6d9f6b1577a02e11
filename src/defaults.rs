//! Protocol and tuning defaults shared by the library and the command line.
//!
//! Kept free of crate imports so the build script can include it alongside
//! `cli.rs` when rendering the man page.

use std::time::Duration;

/// Port the station console driver connects to.
pub const DEFAULT_PORT: u16 = 11461;

/// Delimiter used by the reference collector protocol.
pub const DEFAULT_DELIMITER: char = ';';

/// [`DEFAULT_READ_TIMEOUT`] in milliseconds.
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 2000;

/// How long one read may block before the loop re-checks its stop flags.
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_millis(DEFAULT_READ_TIMEOUT_MS);

/// Size of the chunk requested from the socket on each read.
pub const DEFAULT_READ_BUFFER_SIZE: usize = 16 * 1024;

/// Default bound on undelimited data held for one connection (1 MiB).
pub const DEFAULT_MAX_PENDING: usize = 1024 * 1024;
