//! Inbound side of a node:
//! - bind the listening socket (the only fatal failure)
//! - accept connections for the rest of the process lifetime
//! - read exactly one message per connection and hand it to a sink
//!
//! Nothing is ever written back to the sender. A connection that has not
//! produced a message within the read deadline is dropped, so silent peers
//! cannot hold on to the listener's permits.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::{mpsc, Semaphore};
use tracing::{debug, warn};

use crate::error::{CodecError, ListenerError};
use crate::net::read_message;
use crate::types::Message;

/// Where decoded inbound messages go.
pub trait MessageSink: Send + Sync {
    fn deliver(&self, message: Message);
}

impl MessageSink for mpsc::UnboundedSender<Message> {
    fn deliver(&self, message: Message) {
        // A closed receiver just means nobody is watching any more.
        let _ = self.send(message);
    }
}

/// A bound listening socket. Created by [`ConnectionListener::bind`] and
/// consumed by [`ConnectionListener::run`].
pub struct ConnectionListener {
    listener: TcpListener,
    limit: Arc<Semaphore>,
    read_timeout: Duration,
}

impl ConnectionListener {
    /// Bind `addr` (`host:port`). At most `max_in_flight` connections are
    /// read at the same time; further connections wait in the OS backlog.
    /// Each connection gets `read_timeout` to deliver its message.
    pub async fn bind(
        addr: &str,
        max_in_flight: usize,
        read_timeout: Duration,
    ) -> Result<Self, ListenerError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ListenerError::Bind {
                addr: addr.to_string(),
                source,
            })?;
        Ok(Self {
            listener,
            limit: Arc::new(Semaphore::new(max_in_flight.max(1))),
            read_timeout,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Accept connections forever. Accept errors are logged and the loop
    /// carries on; this only returns if the permit pool is closed, which
    /// nothing in the crate does.
    pub async fn run(self, sink: Arc<dyn MessageSink>) {
        let ConnectionListener {
            listener,
            limit,
            read_timeout,
        } = self;
        loop {
            let Ok(permit) = Arc::clone(&limit).acquire_owned().await else {
                return;
            };
            match listener.accept().await {
                Ok((stream, peer)) => {
                    let sink = Arc::clone(&sink);
                    tokio::spawn(async move {
                        receive_one(stream, peer, read_timeout, sink.as_ref()).await;
                        drop(permit);
                    });
                }
                Err(err) => warn!(error = %err, "failed to accept connection"),
            }
        }
    }
}

async fn receive_one(
    mut stream: TcpStream,
    peer: SocketAddr,
    deadline: Duration,
    sink: &dyn MessageSink,
) {
    let Ok(read) = tokio::time::timeout(deadline, read_message(&mut stream)).await else {
        debug!(peer = %peer, ?deadline, "no message before deadline, dropping connection");
        return;
    };
    match read {
        Ok(message) => {
            debug!(peer = %peer, from = message.sender(), "received message");
            sink.deliver(message);
        }
        Err(CodecError::Truncated) => {
            debug!(peer = %peer, "connection closed before a complete message");
        }
        Err(err) => warn!(peer = %peer, error = %err, "dropping inbound connection"),
    }
}
