//! Token boundary policies for the stream framer.
//!
//! A [`TokenScanner`] is the single policy point deciding where one message
//! ends and the next begins. The framer hands it the full contents of the
//! accumulation buffer and receives either the exclusive end of the first
//! token (delimiter included) or `None` when no complete token is buffered.
//!
//! Scanners must be pure: calling [`TokenScanner::find_token`] twice on the
//! same input returns the same answer.
//!
//! Incoming bytes are decoded as 7-bit ASCII, so delimiters and terminators
//! must be ASCII too; the constructors reject anything else.

use thiserror::Error;

pub use crate::defaults::DEFAULT_DELIMITER;

/// A scan policy was configured with a boundary that can never appear in
/// decoded input.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ScannerError {
    /// The delimiter lies outside 7-bit ASCII.
    #[error("delimiter {0:?} is not 7-bit ASCII")]
    NonAsciiDelimiter(char),
    /// The terminator contains characters outside 7-bit ASCII.
    #[error("terminator {0:?} is not 7-bit ASCII")]
    NonAsciiTerminator(String),
}

/// Policy locating the next complete token in buffered text.
pub trait TokenScanner: Send + Sync + 'static {
    /// Return the exclusive end offset of the first token including its
    /// terminator, or `None` if `buffer` holds no complete token.
    fn find_token(&self, buffer: &str) -> Option<usize>;

    /// Number of bytes at the end of each boundary span that belong to the
    /// terminator rather than the token.
    fn terminator_len(&self) -> usize { 1 }
}

impl<T: TokenScanner + ?Sized> TokenScanner for std::sync::Arc<T> {
    fn find_token(&self, buffer: &str) -> Option<usize> { (**self).find_token(buffer) }

    fn terminator_len(&self) -> usize { (**self).terminator_len() }
}

/// Splits on a single designated character.
///
/// # Examples
///
/// ```
/// use weather_collector::scanner::{DelimiterScanner, TokenScanner};
///
/// let scanner = DelimiterScanner::default();
/// assert_eq!(scanner.find_token("Hello;World"), Some(6));
/// assert_eq!(scanner.find_token("Hello"), None);
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DelimiterScanner {
    delimiter: char,
}

impl DelimiterScanner {
    /// Create a scanner splitting on `delimiter`.
    ///
    /// # Errors
    ///
    /// Returns [`ScannerError::NonAsciiDelimiter`] if `delimiter` is not
    /// 7-bit ASCII.
    ///
    /// ```
    /// use weather_collector::scanner::DelimiterScanner;
    ///
    /// assert!(DelimiterScanner::new('|').is_ok());
    /// assert!(DelimiterScanner::new('°').is_err());
    /// ```
    pub fn new(delimiter: char) -> Result<Self, ScannerError> {
        if delimiter.is_ascii() {
            Ok(Self { delimiter })
        } else {
            Err(ScannerError::NonAsciiDelimiter(delimiter))
        }
    }

    /// Scanner for newline-terminated messages.
    #[must_use]
    pub const fn newline() -> Self { Self { delimiter: '\n' } }

    /// The character ending each token.
    #[must_use]
    pub const fn delimiter(&self) -> char { self.delimiter }
}

impl Default for DelimiterScanner {
    fn default() -> Self {
        Self {
            delimiter: DEFAULT_DELIMITER,
        }
    }
}

impl TokenScanner for DelimiterScanner {
    fn find_token(&self, buffer: &str) -> Option<usize> {
        buffer
            .find(self.delimiter)
            .map(|idx| idx + self.delimiter.len_utf8())
    }

    fn terminator_len(&self) -> usize { self.delimiter.len_utf8() }
}

/// Splits on a multi-character terminator such as `"\r\n"`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TerminatorScanner {
    terminator: String,
}

impl TerminatorScanner {
    /// Create a scanner splitting on `terminator`.
    ///
    /// An empty terminator never matches, so every byte stays buffered.
    ///
    /// # Errors
    ///
    /// Returns [`ScannerError::NonAsciiTerminator`] if `terminator` contains
    /// anything outside 7-bit ASCII.
    pub fn new(terminator: impl Into<String>) -> Result<Self, ScannerError> {
        let terminator = terminator.into();
        if terminator.is_ascii() {
            Ok(Self { terminator })
        } else {
            Err(ScannerError::NonAsciiTerminator(terminator))
        }
    }

    /// Scanner for CRLF-terminated lines.
    #[must_use]
    pub fn crlf() -> Self {
        Self {
            terminator: "\r\n".to_owned(),
        }
    }
}

impl TokenScanner for TerminatorScanner {
    fn find_token(&self, buffer: &str) -> Option<usize> {
        if self.terminator.is_empty() {
            return None;
        }
        buffer
            .find(self.terminator.as_str())
            .map(|idx| idx + self.terminator.len())
    }

    fn terminator_len(&self) -> usize { self.terminator.len() }
}

/// Splits the stream into records of a fixed length with no terminator.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FixedLengthScanner {
    record_len: usize,
}

impl FixedLengthScanner {
    /// Create a scanner producing records of `record_len` bytes.
    ///
    /// Zero is raised to one so every record makes progress.
    #[must_use]
    pub fn new(record_len: usize) -> Self {
        Self {
            record_len: record_len.max(1),
        }
    }

    /// Length of each record in bytes.
    #[must_use]
    pub const fn record_len(&self) -> usize { self.record_len }
}

impl TokenScanner for FixedLengthScanner {
    fn find_token(&self, buffer: &str) -> Option<usize> {
        (buffer.len() >= self.record_len).then_some(self.record_len)
    }

    fn terminator_len(&self) -> usize { 0 }
}
