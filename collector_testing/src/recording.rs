//! A consumer that remembers everything it was handed.

use std::{
    net::SocketAddr,
    sync::{Arc, Mutex, PoisonError},
    time::Duration,
};

use weather_collector::consumer::{ConsumeResult, MessageConsumer};

#[derive(Debug, Default)]
struct Log {
    batches: Vec<Vec<String>>,
    peers: Vec<Option<SocketAddr>>,
    disconnects: usize,
}

/// Cloneable consumer recording batches and lifecycle hooks.
///
/// Clones share storage, so a test keeps one clone and moves another into
/// the server.
#[derive(Clone, Debug, Default)]
pub struct RecordingConsumer {
    log: Arc<Mutex<Log>>,
    reply: Option<String>,
}

impl RecordingConsumer {
    /// A recorder answering every batch with `reply`.
    #[must_use]
    pub fn replying(reply: &str) -> Self {
        Self {
            reply: Some(reply.to_owned()),
            ..Self::default()
        }
    }

    fn with_log<T>(&self, f: impl FnOnce(&mut Log) -> T) -> T {
        f(&mut self.log.lock().unwrap_or_else(PoisonError::into_inner))
    }

    /// Batches in the order they were consumed.
    #[must_use]
    pub fn batches(&self) -> Vec<Vec<String>> { self.with_log(|log| log.batches.clone()) }

    /// Every message received, flattened across batches.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.with_log(|log| log.batches.iter().flatten().cloned().collect())
    }

    /// Peers reported to `on_connect`.
    #[must_use]
    pub fn peers(&self) -> Vec<Option<SocketAddr>> { self.with_log(|log| log.peers.clone()) }

    /// Number of `on_disconnect` calls.
    #[must_use]
    pub fn disconnects(&self) -> usize { self.with_log(|log| log.disconnects) }

    /// Wait up to a second for at least `count` messages.
    pub async fn wait_for_messages(&self, count: usize) -> bool {
        self.wait_until(|log| log.batches.iter().map(Vec::len).sum::<usize>() >= count)
            .await
    }

    /// Wait up to a second for at least `count` disconnects.
    pub async fn wait_for_disconnects(&self, count: usize) -> bool {
        self.wait_until(|log| log.disconnects >= count).await
    }

    async fn wait_until(&self, check: impl Fn(&Log) -> bool) -> bool {
        for _ in 0..200 {
            if self.with_log(|log| check(log)) {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        self.with_log(|log| check(log))
    }
}

impl MessageConsumer for RecordingConsumer {
    fn consume_messages(&mut self, messages: &[String]) -> ConsumeResult {
        self.with_log(|log| log.batches.push(messages.to_vec()));
        Ok(self.reply.clone())
    }

    fn on_connect(&mut self, peer: Option<SocketAddr>) { self.with_log(|log| log.peers.push(peer)); }

    fn on_disconnect(&mut self) { self.with_log(|log| log.disconnects += 1); }
}
