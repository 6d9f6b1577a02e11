//! Test helpers shared across server modules.

use std::{
    net::{Ipv4Addr, SocketAddr, TcpListener as StdTcpListener},
    sync::{Arc, Mutex},
};

use rstest::fixture;

use super::{Bound, CollectorServer};
use crate::{
    consumer::{ConsumeResult, MessageConsumer},
    scanner::DelimiterScanner,
};

/// Batches observed by a [`SharedRecorder`].
pub type Batches = Arc<Mutex<Vec<Vec<String>>>>;

/// Consumer recording batches into shared storage and replying with a fixed
/// string.
#[derive(Clone, Default)]
pub struct SharedRecorder {
    pub batches: Batches,
    pub connects: Arc<Mutex<usize>>,
    pub disconnects: Arc<Mutex<usize>>,
    pub reply: Option<String>,
}

impl SharedRecorder {
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_owned()),
            ..Self::default()
        }
    }

    pub fn flattened(&self) -> Vec<String> {
        self.batches
            .lock()
            .expect("batches lock")
            .iter()
            .flatten()
            .cloned()
            .collect()
    }

    pub fn disconnect_count(&self) -> usize { *self.disconnects.lock().expect("disconnects lock") }
}

impl MessageConsumer for SharedRecorder {
    fn consume_messages(&mut self, messages: &[String]) -> ConsumeResult {
        self.batches
            .lock()
            .expect("batches lock")
            .push(messages.to_vec());
        Ok(self.reply.clone())
    }

    fn on_connect(&mut self, _peer: Option<SocketAddr>) {
        *self.connects.lock().expect("connects lock") += 1;
    }

    fn on_disconnect(&mut self) { *self.disconnects.lock().expect("disconnects lock") += 1; }
}

#[fixture]
pub fn recorder() -> SharedRecorder { SharedRecorder::default() }

#[fixture]
/// Returns a bound [`StdTcpListener`] on a free port for use in tests.
///
/// Keeping the listener bound prevents race conditions where another
/// process could claim the port between discovery and use.
pub fn free_listener() -> StdTcpListener {
    let addr = SocketAddr::new(Ipv4Addr::LOCALHOST.into(), 0);
    StdTcpListener::bind(addr).expect("Failed to bind free port listener")
}

pub fn bind_server<C>(
    consumer: C,
    listener: StdTcpListener,
) -> CollectorServer<DelimiterScanner, C, Bound>
where
    C: MessageConsumer,
{
    CollectorServer::new(DelimiterScanner::default(), consumer)
        .bind_listener(listener)
        .expect("Failed to bind")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_listener_uses_localhost() {
        let listener = free_listener();
        let addr = listener.local_addr().expect("failed to get address");
        assert_eq!(addr.ip(), std::net::IpAddr::from(Ipv4Addr::LOCALHOST));
    }
}
