//! External control of a running collector loop.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::stats::{CollectorStats, StatsSnapshot};

/// Observable state of the lifecycle loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopState {
    /// Blocked in `accept()` waiting for a station to connect.
    WaitingForConnection,
    /// Reading from a connected station.
    Connected,
    /// The loop has exited and released its listener.
    Stopped,
}

#[derive(Debug)]
struct Shared {
    terminate: AtomicBool,
    close_requested: AtomicBool,
    shutdown: CancellationToken,
    state: watch::Sender<LoopState>,
    stats: Arc<CollectorStats>,
}

/// Cloneable handle used to stop, nudge and observe a collector loop.
///
/// Termination is both cooperative and forced: the flag is checked between
/// reads, and the pending `accept()` or `read()` is interrupted at once so
/// the loop reaches [`LoopState::Stopped`] without waiting for the read
/// timeout.
#[derive(Clone, Debug)]
pub struct ControlHandle {
    shared: Arc<Shared>,
}

impl ControlHandle {
    pub(crate) fn new() -> Self {
        let (state, _) = watch::channel(LoopState::WaitingForConnection);
        Self {
            shared: Arc::new(Shared {
                terminate: AtomicBool::new(false),
                close_requested: AtomicBool::new(false),
                shutdown: CancellationToken::new(),
                state,
                stats: Arc::new(CollectorStats::default()),
            }),
        }
    }

    /// Ask the loop to close any connection and exit.
    pub fn request_termination(&self) {
        self.shared.terminate.store(true, Ordering::Release);
        self.shared.shutdown.cancel();
    }

    /// Returns `true` once termination has been requested.
    #[must_use]
    pub fn is_terminating(&self) -> bool { self.shared.terminate.load(Ordering::Acquire) }

    /// Ask the loop to drop the current connection and wait for a new one.
    ///
    /// The request is observed between reads, so it takes effect within one
    /// read timeout. Requests made while no station is connected are
    /// discarded when the next connection is accepted.
    pub fn close_connection(&self) { self.shared.close_requested.store(true, Ordering::Release); }

    /// Current loop state.
    #[must_use]
    pub fn state(&self) -> LoopState { *self.shared.state.borrow() }

    /// Wait until the loop reaches `target`, or stops.
    ///
    /// Returns the state that ended the wait, which is `target` unless the
    /// loop stopped first.
    pub async fn wait_for_state(&self, target: LoopState) -> LoopState {
        let mut rx = self.shared.state.subscribe();
        match rx
            .wait_for(|state| *state == target || *state == LoopState::Stopped)
            .await
        {
            Ok(state) => *state,
            Err(_) => self.state(),
        }
    }

    /// Snapshot of the counters for this loop instance.
    #[must_use]
    pub fn stats(&self) -> StatsSnapshot { self.shared.stats.snapshot() }

    pub(crate) fn stats_handle(&self) -> Arc<CollectorStats> { Arc::clone(&self.shared.stats) }

    pub(crate) fn shutdown_token(&self) -> &CancellationToken { &self.shared.shutdown }

    pub(crate) fn take_close_request(&self) -> bool {
        self.shared.close_requested.swap(false, Ordering::AcqRel)
    }

    pub(crate) fn set_state(&self, state: LoopState) {
        let previous = self.shared.state.send_replace(state);
        if previous != state {
            log::debug!("collector loop state: from={previous:?}, to={state:?}");
        }
    }
}
