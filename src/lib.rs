//! PostScriptum - a small peer-to-peer text messenger.
//!
//! Every node is both a server and a client. It listens for peers that send
//! it one JSON message per TCP connection, and it delivers what the local
//! user types to every peer it knows, one connection per peer. Access to the
//! chat is gated by a local username/password store.
//!
//! - [`store`] and [`auth`] persist and verify credentials.
//! - [`session`] is the login gate (`Authenticating` -> `Active`).
//! - [`net`] is the wire codec.
//! - [`server`] accepts inbound connections; [`client`] broadcasts.
//! - [`peers`] holds the list of known peers.
//! - [`console`], [`utils`] and [`config`] are the terminal and CLI glue;
//!   [`node`] wires an authenticated node together.

pub mod auth;
pub mod client;
pub mod config;
pub mod console;
pub mod error;
pub mod net;
pub mod node;
pub mod peers;
pub mod server;
pub mod session;
pub mod store;
pub mod types;
pub mod utils;
