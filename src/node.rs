//! Wiring for an authenticated node: bind the listener, start accepting in
//! the background, and set up the outbound side.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use tracing::info;

use crate::client::Broadcaster;
use crate::config::NodeConfig;
use crate::console::Chat;
use crate::error::ListenerError;
use crate::peers::PeerRegistry;
use crate::server::{ConnectionListener, MessageSink};
use crate::session::Active;

pub struct Node {
    local_addr: SocketAddr,
    peers: Arc<PeerRegistry>,
    chat: Chat,
}

impl Node {
    /// Bind and start listening. Inbound messages go to `sink` until the
    /// process exits. A bind failure is returned and nothing is started.
    pub async fn start(
        config: &NodeConfig,
        user: Active,
        sink: Arc<dyn MessageSink>,
    ) -> Result<Self, ListenerError> {
        let listener = ConnectionListener::bind(
            &config.listen_addr(),
            config.max_concurrency,
            config.read_timeout,
        )
        .await?;
        let local_addr = listener
            .local_addr()
            .map_err(|source| ListenerError::Bind {
                addr: config.listen_addr(),
                source,
            })?;
        info!(addr = %local_addr, user = user.username(), "node listening");
        tokio::spawn(listener.run(sink));

        let peers = Arc::new(PeerRegistry::new());
        let broadcaster = Broadcaster::new(
            Arc::clone(&peers),
            config.max_concurrency,
            config.connect_timeout,
        );
        let chat = Chat::new(user, Arc::clone(&peers), broadcaster);
        Ok(Self {
            local_addr,
            peers,
            chat,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    pub fn peers(&self) -> &PeerRegistry {
        &self.peers
    }

    pub fn chat(&self) -> &Chat {
        &self.chat
    }

    /// Interactive loop on stdin; returns on `/quit` or end of input.
    pub async fn run_interactive(&self) -> io::Result<()> {
        self.chat.run().await
    }
}
