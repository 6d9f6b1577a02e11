//! The accept/serve/reconnect state machine.

use std::{net::SocketAddr, sync::Arc};

use log::{debug, info, warn};
use tokio::net::TcpStream;

use super::{
    accept::{AcceptListener, AcceptOutcome, accept_connection},
    session::{SessionEnd, serve_connection},
};
use crate::{
    consumer::MessageConsumer,
    framer::StreamFramer,
    metrics,
    panic::catch_consumer_panic,
    scanner::TokenScanner,
    server::{ControlHandle, LoopSettings, LoopState},
};

/// State owned by the single worker driving the loop.
pub(in crate::server) struct Lifecycle<L, S, C> {
    listener: Arc<L>,
    scanner: Arc<S>,
    consumer: C,
    settings: LoopSettings,
    control: ControlHandle,
}

impl<L, S, C> Lifecycle<L, S, C>
where
    L: AcceptListener + 'static,
    S: TokenScanner,
    C: MessageConsumer,
{
    pub(in crate::server) fn new(
        listener: Arc<L>,
        scanner: S,
        consumer: C,
        settings: LoopSettings,
        control: ControlHandle,
    ) -> Self {
        Self {
            listener,
            scanner: Arc::new(scanner),
            consumer,
            settings,
            control,
        }
    }

    /// Run until termination is requested. The listener is released when
    /// this returns.
    pub(in crate::server) async fn run(mut self) {
        let backoff = self.settings.backoff.normalized();
        let mut delay = backoff.initial_delay;

        while !self.control.is_terminating() {
            self.control.set_state(LoopState::WaitingForConnection);
            match accept_connection(self.listener.as_ref(), &self.control, delay).await {
                AcceptOutcome::Accepted(stream, peer) => {
                    delay = backoff.initial_delay;
                    self.serve(stream, peer).await;
                }
                AcceptOutcome::Retry => delay = backoff.next_delay(delay),
                AcceptOutcome::Shutdown => break,
            }
        }

        self.control.set_state(LoopState::Stopped);
        info!("collector loop stopped");
    }

    async fn serve(&mut self, mut stream: TcpStream, peer: SocketAddr) {
        if let Err(e) = stream.set_nodelay(true) {
            debug!("failed to set TCP_NODELAY: error={e}, peer_addr={peer}");
        }
        self.control.stats_handle().record_connection();
        metrics::inc_connections();
        // A close request aimed at an earlier connection must not drop this one.
        let _ = self.control.take_close_request();
        self.control.set_state(LoopState::Connected);
        info!("station connected: peer_addr={peer}");
        self.notify_consumer(|consumer| consumer.on_connect(Some(peer)));

        let mut framer = StreamFramer::new(Arc::clone(&self.scanner))
            .with_max_pending(self.settings.max_pending)
            .with_stats(self.control.stats_handle());
        let end = serve_connection(
            &mut stream,
            &mut framer,
            &mut self.consumer,
            &self.settings,
            &self.control,
        )
        .await;

        let pending = framer.pending().len();
        if pending > 0 {
            debug!("discarding partial message: pending={pending}, peer_addr={peer}");
        }
        drop(framer);
        drop(stream);

        self.notify_consumer(|consumer| consumer.on_disconnect());
        metrics::dec_connections();
        info!("station disconnected: peer_addr={peer}, reason={end}");
        if matches!(end, SessionEnd::ReadFailed(_) | SessionEnd::WriteFailed(_)) {
            tracing::debug!(%peer, reason = %end, "connection dropped after I/O error");
        }
    }

    fn notify_consumer(&mut self, hook: impl FnOnce(&mut C)) {
        let consumer = &mut self.consumer;
        if let Err(panic) = catch_consumer_panic(|| hook(consumer)) {
            warn!("consumer lifecycle hook panicked: panic={panic}");
            self.control.stats_handle().record_consumer_failure();
        }
    }
}
