//! Login gate in front of the chat.
//!
//! A session starts in [`Authenticating`], where any number of register and
//! login attempts may happen. The first successful login consumes it and
//! yields [`Active`], which carries the username for the rest of the
//! process and cannot go back.

use tracing::info;

use crate::auth::CredentialStore;
use crate::error::SessionError;
use crate::types::Message;

#[derive(Debug)]
pub struct Authenticating {
    credentials: CredentialStore,
}

impl Authenticating {
    pub fn new(credentials: CredentialStore) -> Self {
        Self { credentials }
    }

    /// Create an account. Registering does not log in.
    pub fn register(&self, username: &str, password: &str) -> Result<(), SessionError> {
        if username.is_empty() {
            return Err(SessionError::EmptyUsername);
        }
        self.credentials.register(username, password)?;
        Ok(())
    }

    /// Try to log in. On failure the caller gets the same state back to try
    /// again; the reason for the failure is deliberately not exposed.
    pub fn login(self, username: &str, password: &str) -> Result<Active, Authenticating> {
        if !username.is_empty() && self.credentials.login(username, password) {
            info!(username, "logged in");
            Ok(Active {
                username: username.to_string(),
            })
        } else {
            Err(self)
        }
    }
}

/// An authenticated session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Active {
    username: String,
}

impl Active {
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Wrap a line typed by the local user.
    pub fn compose(&self, content: impl Into<String>) -> Message {
        Message::new(self.username.clone(), content)
    }
}
