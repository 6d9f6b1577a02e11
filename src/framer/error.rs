//! Error types for the framing layer.
//!
//! None of these errors close the connection. Scanner faults leave the
//! buffer untouched until more data arrives; an overflow drops the pending
//! message and resynchronises at the next boundary.

use thiserror::Error;

/// Problems detected while turning buffered text into tokens.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum FramingError {
    /// The scanner reported a boundary past the end of the buffer.
    #[error("token boundary {boundary} beyond buffer length {len}")]
    BoundaryOutOfRange {
        /// Offset reported by the scanner.
        boundary: usize,
        /// Buffer length at the time of the scan.
        len: usize,
    },

    /// The reported boundary is too short to hold the terminator, or would
    /// consume nothing.
    #[error("token boundary {boundary} cannot hold a {terminator_len} byte terminator")]
    BoundaryTooShort {
        /// Offset reported by the scanner.
        boundary: usize,
        /// Terminator length declared by the scanner.
        terminator_len: usize,
    },

    /// Undelimited data grew past the configured bound.
    #[error("pending message exceeds max length: {pending} > {max}")]
    PendingOverflow {
        /// Bytes buffered without a boundary.
        pending: usize,
        /// Configured maximum.
        max: usize,
    },
}
