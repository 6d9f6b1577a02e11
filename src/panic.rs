//! Panic isolation for consumer callbacks.
//!
//! A consumer that panics must not take down the ingestion loop. The framer
//! runs each callback through [`catch_consumer_panic`] and logs the payload
//! rendered by [`PanicMessage`].

use std::{
    any::Any,
    fmt,
    panic::{AssertUnwindSafe, catch_unwind},
};

/// Wrapper that formats a panic payload when logged or displayed.
///
/// The payload is downcast to `String` or `&'static str` if possible and falls
/// back to `Debug` formatting otherwise.
///
/// ```
/// use weather_collector::panic::format_panic;
/// assert_eq!(format_panic(Box::new("boom")).to_string(), "boom");
/// assert!(format_panic(Box::new(5_u32)).to_string().contains("Any"));
/// ```
#[derive(Debug)]
#[must_use]
pub struct PanicMessage(Box<dyn Any + Send>);

impl fmt::Display for PanicMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(s) = self.0.downcast_ref::<String>() {
            f.write_str(s)
        } else if let Some(s) = self.0.downcast_ref::<&'static str>() {
            f.write_str(s)
        } else {
            write!(f, "{:?}", self.0)
        }
    }
}

/// Create a [`PanicMessage`] for the given payload.
pub fn format_panic(panic: Box<dyn Any + Send>) -> PanicMessage { PanicMessage(panic) }

/// Run `f`, converting a panic into `Err` with its formatted payload.
///
/// The closure usually borrows the consumer mutably. A consumer that panics
/// mid-update may be left in whatever state it reached; the framer keeps
/// using it, matching how a consumer error is treated.
///
/// # Errors
///
/// Returns the [`PanicMessage`] if `f` panicked.
pub fn catch_consumer_panic<T>(f: impl FnOnce() -> T) -> Result<T, PanicMessage> {
    catch_unwind(AssertUnwindSafe(f)).map_err(format_panic)
}
