use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

pub const DEFAULT_MAX_CONCURRENCY: usize = 64;
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Parser, Debug)]
#[command(author, version, about = "Peer-to-peer text messenger", long_about = None)]
pub struct Cli {
    /// Port to listen on for messages from peers
    #[arg(value_parser)]
    pub port: Option<u16>,

    /// Host to bind the listener to
    #[arg(long, default_value = "0.0.0.0")]
    pub bind: String,

    /// Credential database file
    #[arg(long, default_value = "users.db")]
    pub db: PathBuf,

    /// Most connections handled at once, per direction
    #[arg(long, default_value = "64")]
    pub max_concurrency: NonZeroUsize,

    /// Seconds an inbound peer has to send its message
    #[arg(long, default_value = "10", value_parser = clap::value_parser!(u64).range(1..))]
    pub read_timeout: u64,

    /// Seconds allowed for dialing a peer
    #[arg(long, default_value = "10", value_parser = clap::value_parser!(u64).range(1..))]
    pub connect_timeout: u64,
}

impl Cli {
    /// `None` when no port was given.
    pub fn into_config(self) -> Option<NodeConfig> {
        Some(NodeConfig {
            port: self.port?,
            bind: self.bind,
            db_path: self.db,
            max_concurrency: self.max_concurrency.get(),
            read_timeout: Duration::from_secs(self.read_timeout),
            connect_timeout: Duration::from_secs(self.connect_timeout),
        })
    }
}

/// Everything a running node needs to know.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeConfig {
    pub port: u16,
    pub bind: String,
    pub db_path: PathBuf,
    pub max_concurrency: usize,
    /// How long an inbound connection may stay silent before it is dropped.
    pub read_timeout: Duration,
    pub connect_timeout: Duration,
}

impl NodeConfig {
    /// Loopback node on `port`, defaults elsewhere.
    pub fn local(port: u16) -> Self {
        Self {
            port,
            bind: "127.0.0.1".to_string(),
            db_path: PathBuf::from("users.db"),
            max_concurrency: DEFAULT_MAX_CONCURRENCY,
            read_timeout: DEFAULT_READ_TIMEOUT,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
        }
    }

    pub fn listen_addr(&self) -> String {
        if self.bind.contains(':') {
            format!("[{}]:{}", self.bind, self.port)
        } else {
            format!("{}:{}", self.bind, self.port)
        }
    }
}
