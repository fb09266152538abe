//! Error types for the node. Each concern gets its own enum so callers can
//! match on what they actually handle; the binary wraps them in `anyhow`.

use std::io;

use thiserror::Error;

/// Failures while moving a [`crate::types::Message`] across a stream.
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("malformed message: {0}")]
    Malformed(#[source] serde_json::Error),
    #[error("connection closed before a complete message arrived")]
    Truncated,
    #[error("message exceeds {limit} bytes")]
    TooLarge { limit: usize },
}

/// Failures of the credential backing store.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("username `{0}` is already taken")]
    DuplicateUser(String),
    #[error("database error: {0}")]
    Database(#[from] polodb_core::Error),
    #[error("password hashing failed: {0}")]
    Hash(String),
}

/// The one unrecoverable error: the listening port cannot be bound.
#[derive(Error, Debug)]
pub enum ListenerError {
    #[error("cannot bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },
}

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("username must not be empty")]
    EmptyUsername,
    #[error(transparent)]
    Store(#[from] StoreError),
}
