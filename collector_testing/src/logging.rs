//! Exclusive access to captured `log` records.

use std::sync::{Mutex, MutexGuard, OnceLock};

use log::Level;
use logtest::Logger;
use rstest::fixture;

/// Handle to the global logger with exclusive access.
///
/// `logtest` installs a process-wide logger, so tests sharing it must hold
/// this guard (and usually run `#[serial]`) to avoid reading each other's
/// records.
pub struct LoggerHandle {
    guard: MutexGuard<'static, Logger>,
}

impl LoggerHandle {
    /// Acquire the global [`Logger`] instance.
    #[must_use]
    pub fn new() -> Self {
        static LOGGER: OnceLock<Mutex<Logger>> = OnceLock::new();

        let logger = LOGGER.get_or_init(|| Mutex::new(Logger::start()));
        let guard = logger
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);

        Self { guard }
    }

    /// Drop every record captured so far.
    pub fn clear(&mut self) { while self.guard.pop().is_some() {} }

    /// Drain the buffer, returning the first record at `level` whose message
    /// contains `needle`.
    pub fn find(&mut self, level: Level, needle: &str) -> Option<String> {
        let mut found = None;
        while let Some(record) = self.guard.pop() {
            if found.is_none() && record.level() == level && record.args().contains(needle) {
                found = Some(record.args().to_string());
            }
        }
        found
    }

    /// Drain the buffer, counting records at `level` whose message contains
    /// `needle`.
    pub fn count(&mut self, level: Level, needle: &str) -> usize {
        let mut count = 0;
        while let Some(record) = self.guard.pop() {
            if record.level() == level && record.args().contains(needle) {
                count += 1;
            }
        }
        count
    }
}

impl Default for LoggerHandle {
    fn default() -> Self { Self::new() }
}

impl std::ops::Deref for LoggerHandle {
    type Target = Logger;

    fn deref(&self) -> &Self::Target { &self.guard }
}

impl std::ops::DerefMut for LoggerHandle {
    fn deref_mut(&mut self) -> &mut Self::Target { &mut self.guard }
}

#[allow(
    unused_braces,
    reason = "rustc false positive for single line rstest fixtures"
)]
#[fixture]
pub fn logger() -> LoggerHandle { LoggerHandle::new() }
