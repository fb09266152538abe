//! Shared types used across the project to keep signatures concise.
use serde::{Deserialize, Serialize};

/// A peer endpoint as typed by the user (`host:port`). It is not resolved or
/// validated until a broadcast dials it.
pub type PeerAddress = String;

/// A single chat line as it travels between nodes.
///
/// Fields are private so a message cannot change after construction.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Message {
    from: String,
    content: String,
}

impl Message {
    pub fn new(from: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            content: content.into(),
        }
    }

    pub fn sender(&self) -> &str {
        &self.from
    }

    pub fn content(&self) -> &str {
        &self.content
    }
}
