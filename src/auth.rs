use std::sync::{Arc, OnceLock};

use pbkdf2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use pbkdf2::{Params, Pbkdf2};
use rand::RngCore;
use tracing::{debug, warn};

use crate::error::StoreError;
use crate::store::UserStore;

/// PBKDF2-HMAC-SHA256 iteration count for newly registered users.
pub const HASH_ROUNDS: u32 = 100_000;

const SALT_LEN: usize = 16;
const HASH_LEN: usize = 32;

/// Register and verify users against a [`UserStore`].
///
/// Passwords are stored as PHC strings
/// (`$pbkdf2-sha256$i=<rounds>,l=32$<salt>$<hash>`), each with its own
/// random salt. Verification reads the rounds back from the stored string,
/// so changing [`HASH_ROUNDS`] does not lock out existing users.
#[derive(Clone)]
pub struct CredentialStore {
    users: Arc<dyn UserStore>,
    rounds: u32,
}

impl CredentialStore {
    pub fn new(users: Arc<dyn UserStore>) -> Self {
        Self::with_rounds(users, HASH_ROUNDS)
    }

    /// Same as [`CredentialStore::new`] with a custom iteration count.
    pub fn with_rounds(users: Arc<dyn UserStore>, rounds: u32) -> Self {
        Self { users, rounds }
    }

    /// Create a user. Fails with [`StoreError::DuplicateUser`] if the name
    /// is taken, in which case the existing record is left as it was.
    pub fn register(&self, username: &str, password: &str) -> Result<(), StoreError> {
        let hash = hash_password(password, self.rounds)?;
        self.users.insert_user(username, &hash)?;
        debug!(username, "registered user");
        Ok(())
    }

    /// Check a username/password pair.
    ///
    /// Unknown users and wrong passwords both yield `false`. An unknown user
    /// is still run through a full verification so the two cases cost the
    /// same.
    pub fn login(&self, username: &str, password: &str) -> bool {
        let stored = match self.users.lookup_hash(username) {
            Ok(stored) => stored,
            Err(err) => {
                warn!(username, error = %err, "credential lookup failed");
                return false;
            }
        };
        match stored {
            Some(hash) => verify_password(password, &hash),
            None => {
                let _ = verify_password(password, decoy_hash());
                false
            }
        }
    }
}

impl std::fmt::Debug for CredentialStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialStore")
            .field("rounds", &self.rounds)
            .finish_non_exhaustive()
    }
}

/// Hash `password` with a fresh random salt.
pub fn hash_password(password: &str, rounds: u32) -> Result<String, StoreError> {
    let mut salt = [0u8; SALT_LEN];
    rand::rngs::OsRng.fill_bytes(&mut salt);
    let salt = SaltString::b64_encode(&salt).map_err(|e| StoreError::Hash(e.to_string()))?;

    let params = Params {
        rounds,
        output_length: HASH_LEN,
    };
    let hash = Pbkdf2
        .hash_password_customized(password.as_bytes(), None, None, params, salt.as_salt())
        .map_err(|e| StoreError::Hash(e.to_string()))?;
    Ok(hash.to_string())
}

/// `true` if `password` matches the PHC string `stored`. Unparseable
/// stored values never match.
pub fn verify_password(password: &str, stored: &str) -> bool {
    match PasswordHash::new(stored) {
        Ok(parsed) => Pbkdf2.verify_password(password.as_bytes(), &parsed).is_ok(),
        Err(err) => {
            warn!(error = %err, "stored password hash is not a valid PHC string");
            false
        }
    }
}

/// Used when the decoy cannot be hashed at startup. It parses and costs
/// the same [`HASH_ROUNDS`] to check, and its all-zero digest matches no
/// realistic password.
const FALLBACK_DECOY: &str = "$pbkdf2-sha256$i=100000,l=32$c2FsdHNhbHRzYWx0c2FsdA$AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA";

fn decoy_hash() -> &'static str {
    static DECOY: OnceLock<String> = OnceLock::new();
    DECOY.get_or_init(|| decoy_or_fallback(hash_password("decoy", HASH_ROUNDS)))
}

fn decoy_or_fallback(hashed: Result<String, StoreError>) -> String {
    hashed.unwrap_or_else(|err| {
        warn!(error = %err, "cannot hash decoy password, using fixed decoy");
        FALLBACK_DECOY.to_string()
    })
}
