//! Outbound side of a node: deliver a message to every known peer.
//!
//! Each peer gets its own task, its own connection and exactly one write.
//! A failure is logged and ends that task only; nothing is reported back to
//! the caller and nothing is retried. Dials are bounded by a connect timeout
//! so one black-holed address cannot hold a permit for long.

use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpStream;
use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::CodecError;
use crate::net::write_message;
use crate::peers::PeerRegistry;
use crate::types::{Message, PeerAddress};

#[derive(Clone)]
pub struct Broadcaster {
    peers: Arc<PeerRegistry>,
    limit: Arc<Semaphore>,
    connect_timeout: Duration,
}

impl Broadcaster {
    /// `max_in_flight` caps how many peer deliveries run at once; the rest
    /// queue for a permit. A dial that takes longer than `connect_timeout`
    /// is abandoned.
    pub fn new(peers: Arc<PeerRegistry>, max_in_flight: usize, connect_timeout: Duration) -> Self {
        Self {
            peers,
            limit: Arc::new(Semaphore::new(max_in_flight.max(1))),
            connect_timeout,
        }
    }

    /// Fan `message` out to a snapshot of the peer list and return
    /// immediately. Peers added after this call are not included.
    pub fn broadcast(&self, message: Message) {
        let _ = self.dispatch(message);
    }

    /// Like [`Broadcaster::broadcast`], but hands back the per-peer tasks.
    /// The tasks never fail; awaiting them only tells you they finished.
    pub fn dispatch(&self, message: Message) -> Vec<JoinHandle<()>> {
        let targets = self.peers.snapshot();
        if targets.is_empty() {
            return Vec::new();
        }
        let message = Arc::new(message);
        targets
            .into_iter()
            .map(|addr| {
                let message = Arc::clone(&message);
                let limit = Arc::clone(&self.limit);
                let connect_timeout = self.connect_timeout;
                tokio::spawn(async move {
                    let Ok(_permit) = limit.acquire_owned().await else {
                        return;
                    };
                    deliver(addr, &message, connect_timeout).await;
                })
            })
            .collect()
    }
}

async fn deliver(addr: PeerAddress, message: &Message, connect_timeout: Duration) {
    let dial = TcpStream::connect(addr.as_str());
    let mut stream = match tokio::time::timeout(connect_timeout, dial).await {
        Ok(Ok(stream)) => stream,
        Ok(Err(err)) => {
            warn!(peer = %addr, error = %err, "Failed to connect to {addr}");
            return;
        }
        Err(_) => {
            warn!(peer = %addr, timeout = ?connect_timeout, "Failed to connect to {addr}: timed out");
            return;
        }
    };
    match write_message(&mut stream, message).await {
        Ok(()) => debug!(peer = %addr, "message delivered"),
        Err(CodecError::Io(err)) => warn!(peer = %addr, error = %err, "write to peer failed"),
        Err(err) => warn!(peer = %addr, error = %err, "could not encode message"),
    }
}
